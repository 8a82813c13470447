//! Registry layout.
//!
//! ```text
//! <root>/
//!   ports/<name>/portfile.cmake
//!   ports/<name>/vcpkg.json
//!   versions/<first char>-/<name>.json
//!   versions/baseline.json
//! ```
//!
//! Everything here is pure path arithmetic; nothing touches the filesystem.

use std::path::{Path, PathBuf};

use crate::error::RegistryError;
use crate::types::{PortName, PortPaths};

pub const PORTS_DIR: &str = "ports";
pub const VERSIONS_DIR: &str = "versions";
pub const RECIPE_FILE: &str = "portfile.cmake";
pub const MANIFEST_FILE: &str = "vcpkg.json";
pub const BASELINE_FILE: &str = "baseline.json";

/// Map a port name onto its four artifact paths under `root`.
pub fn resolve(root: &Path, port: &PortName) -> Result<PortPaths, RegistryError> {
    let name = port.as_str();
    let Some(first) = name.chars().next() else {
        return Err(invalid(name, "name is empty"));
    };
    if name.contains(['/', '\\']) {
        return Err(invalid(name, "name contains a path separator"));
    }
    if name == "." || name == ".." {
        return Err(invalid(name, "name is a relative path component"));
    }

    let port_dir = root.join(PORTS_DIR).join(name);
    Ok(PortPaths {
        recipe: port_dir.join(RECIPE_FILE),
        manifest: port_dir.join(MANIFEST_FILE),
        port_dir,
        ledger: root
            .join(VERSIONS_DIR)
            .join(format!("{first}-"))
            .join(format!("{name}.json")),
        baseline: baseline_path(root),
    })
}

/// `<root>/versions/baseline.json`
pub fn baseline_path(root: &Path) -> PathBuf {
    root.join(VERSIONS_DIR).join(BASELINE_FILE)
}

/// `./ports/<name>` with `/` separators, for a `<rev>:<path>` expression.
///
/// The `./` prefix makes git resolve the path against the working directory
/// (the registry root) rather than the top of the repository, which differ
/// when the registry lives in a subdirectory.
pub fn port_tree_spec(port: &PortName) -> String {
    format!("./{PORTS_DIR}/{}", port.as_str())
}

fn invalid(name: &str, reason: &'static str) -> RegistryError {
    RegistryError::InvalidPortName {
        name: name.to_owned(),
        reason,
    }
}
