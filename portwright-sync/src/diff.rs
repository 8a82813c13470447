//! Dry-run unified diff support for `--dry-run`.

use std::path::{Path, PathBuf};

use similar::TextDiff;

use crate::orchestrator::{ArtifactPlan, FileAction, PlannedFile};

/// A single planned file diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: PathBuf,
    pub action: FileAction,
    pub unified_diff: String,
}

/// Diff the planned recipe and manifest against what is on disk. Files the
/// plan leaves unchanged are omitted.
pub fn plan_diffs(plan: &ArtifactPlan, root: &Path) -> Vec<FileDiff> {
    [&plan.recipe, &plan.manifest]
        .into_iter()
        .filter_map(|file| file_diff(file, root))
        .collect()
}

fn file_diff(file: &PlannedFile, root: &Path) -> Option<FileDiff> {
    let action = file.action();
    if action == FileAction::Unchanged {
        return None;
    }
    let existing = normalize_line_endings(file.before.as_deref().unwrap_or_default());
    let planned = normalize_line_endings(&file.after);

    let relative = file.path.strip_prefix(root).unwrap_or(file.path.as_path());
    let relative = relative.display().to_string().replace('\\', "/");
    let old_header = match action {
        FileAction::Create => "/dev/null".to_string(),
        _ => format!("a/{relative}"),
    };
    let new_header = format!("b/{relative}");
    let unified = TextDiff::from_lines(&existing, &planned)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string();

    Some(FileDiff {
        path: file.path.clone(),
        action,
        unified_diff: unified,
    })
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}

#[cfg(test)]
mod tests {
    use portwright_core::{paths, PortName, VersionScheme};
    use portwright_recipe::FetchSpec;

    use super::*;
    use crate::orchestrator::{Operation, PortRequest, Validated};

    fn plan_with(recipe_before: Option<&str>, manifest_before: Option<&str>) -> ArtifactPlan {
        let root = Path::new("/registry");
        let port = PortName::from("zlib");
        let paths = paths::resolve(root, &port).unwrap();
        ArtifactPlan {
            recipe: PlannedFile {
                path: paths.recipe.clone(),
                before: recipe_before.map(str::to_owned),
                after: "vcpkg_from_github(REF new)\n".into(),
            },
            manifest: PlannedFile {
                path: paths.manifest.clone(),
                before: manifest_before.map(str::to_owned),
                after: "{\n  \"version\": \"2\"\n}\n".into(),
            },
            validated: Validated {
                request: PortRequest::new(Operation::Update, port),
                paths,
                upstream_repo: "o/zlib".into(),
                git_ref: "new".into(),
                head_ref: "main".into(),
                version: "2".into(),
                port_revision: 0,
            },
            fetch: FetchSpec {
                repo: "o/zlib".into(),
                git_ref: "new".into(),
                sha512: "0".into(),
                head_ref: "main".into(),
            },
            scheme: VersionScheme::Plain,
        }
    }

    #[test]
    fn modified_file_has_a_and_b_headers() {
        let plan = plan_with(
            Some("vcpkg_from_github(REF old)\n"),
            Some("{\n  \"version\": \"2\"\n}\n"),
        );
        let diffs = plan_diffs(&plan, Path::new("/registry"));
        assert_eq!(diffs.len(), 1, "unchanged manifest is skipped");
        let diff = &diffs[0];
        assert_eq!(diff.action, FileAction::Modify);
        assert!(diff.unified_diff.contains("--- a/ports/zlib/portfile.cmake"));
        assert!(diff.unified_diff.contains("+++ b/ports/zlib/portfile.cmake"));
        assert!(diff.unified_diff.contains("-vcpkg_from_github(REF old)"));
        assert!(diff.unified_diff.contains("+vcpkg_from_github(REF new)"));
    }

    #[test]
    fn new_files_diff_against_dev_null() {
        let plan = plan_with(None, None);
        let diffs = plan_diffs(&plan, Path::new("/registry"));
        assert_eq!(diffs.len(), 2);
        assert!(diffs
            .iter()
            .all(|d| d.unified_diff.starts_with("--- /dev/null\n")));
    }

    #[test]
    fn crlf_only_changes_do_not_produce_noise_lines() {
        let plan = plan_with(Some("vcpkg_from_github(REF old)\r\n"), None);
        let diffs = plan_diffs(&plan, Path::new("/registry"));
        assert!(!diffs[0].unified_diff.contains('\r'));
    }
}
