//! File-level recipe operations.
//!
//! `create` overwrites unconditionally; `update` patches the fetch directive
//! of an existing recipe and leaves every other byte alone. Both return the
//! text now on disk.

use std::io::ErrorKind;
use std::path::Path;

use portwright_core::json_store::write_atomic;

use crate::directive::{self, FetchSpec};
use crate::engine::{RecipeContext, RecipeEngine};
use crate::error::{io_err, RecipeError};

/// Render a fresh recipe for `port` and write it to `path`.
pub fn create(
    engine: &RecipeEngine,
    path: &Path,
    port: &str,
    spec: &FetchSpec,
) -> Result<String, RecipeError> {
    let text = engine.render(&RecipeContext::new(port, spec))?;
    write_atomic(path, &text)?;
    tracing::info!("created recipe {}", path.display());
    Ok(text)
}

/// Patch `REF`, `SHA512`, and `HEAD_REF` of the recipe at `path` in place.
///
/// The file is only rewritten when the patch changes it.
pub fn update(path: &Path, spec: &FetchSpec) -> Result<String, RecipeError> {
    let Some(current) = read(path)? else {
        return Err(io_err(path, std::io::Error::from(ErrorKind::NotFound)));
    };
    let patched = directive::patch(&current, spec)?;
    if patched == current {
        tracing::debug!("recipe unchanged: {}", path.display());
    } else {
        write_atomic(path, &patched)?;
        tracing::info!("patched recipe {}", path.display());
    }
    Ok(patched)
}

/// Read the recipe at `path`; `None` if it does not exist.
pub fn read(path: &Path) -> Result<Option<String>, RecipeError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn spec(git_ref: &str) -> FetchSpec {
        FetchSpec {
            repo: "owner/zlib-ng".into(),
            git_ref: git_ref.into(),
            sha512: format!("sha-of-{git_ref}"),
            head_ref: "main".into(),
        }
    }

    #[test]
    fn create_then_update_round() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ports").join("zlib-ng").join("portfile.cmake");
        let engine = RecipeEngine::new().unwrap();
        create(&engine, &path, "zlib-ng", &spec("abc")).unwrap();

        let updated = update(&path, &spec("def")).unwrap();
        assert!(updated.contains("REF def\n"));
        assert!(updated.contains("SHA512 sha-of-def\n"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), updated);
    }

    #[test]
    fn create_overwrites_existing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("portfile.cmake");
        std::fs::write(&path, "garbage").unwrap();
        let engine = RecipeEngine::new().unwrap();
        create(&engine, &path, "x", &spec("abc")).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("vcpkg_from_github("));
    }

    #[test]
    fn update_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = update(&tmp.path().join("absent.cmake"), &spec("abc")).unwrap_err();
        assert!(matches!(err, RecipeError::Io { .. }));
    }

    #[test]
    fn update_without_directive_leaves_file_alone() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("portfile.cmake");
        std::fs::write(&path, "vcpkg_cmake_install()\n").unwrap();
        let err = update(&path, &spec("abc")).unwrap_err();
        assert!(matches!(err, RecipeError::Malformed { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "vcpkg_cmake_install()\n");
    }
}
