//! Fetch inputs taken from a local checkout of the upstream project.

use crate::error::SyncError;
use crate::remote::repo_slug;
use crate::vcs::VersionControl;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSource {
    /// The checkout's `HEAD` commit.
    pub git_ref: String,
    /// `owner/name` of the checkout's remote, if it has one in a recognised
    /// form.
    pub upstream_repo: Option<String>,
}

/// Read `HEAD` and the `remote` URL of the checkout `vcs` is rooted at.
pub fn resolve_local_source(
    vcs: &impl VersionControl,
    remote: &str,
) -> Result<LocalSource, SyncError> {
    let git_ref = vcs.resolve_tree_hash("HEAD")?;
    let upstream_repo = vcs.remote_url(remote)?.as_deref().and_then(repo_slug);
    tracing::debug!("local source at {git_ref} ({upstream_repo:?})");
    Ok(LocalSource {
        git_ref,
        upstream_repo,
    })
}

#[cfg(test)]
mod tests {
    use std::process::Command;

    use tempfile::TempDir;

    use super::*;
    use crate::vcs::GitCli;

    fn git_available() -> bool {
        Command::new("git").arg("--version").output().is_ok()
    }

    fn run_git(root: &std::path::Path, args: &[&str]) {
        let status = Command::new("git")
            .arg("-C")
            .arg(root)
            .args(args)
            .status()
            .expect("run git");
        assert!(status.success(), "git command failed: {args:?}");
    }

    #[test]
    fn reads_head_and_origin_slug() {
        if !git_available() {
            return;
        }
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        run_git(root, &["init", "-q"]);
        run_git(root, &["config", "user.email", "dev@example.com"]);
        run_git(root, &["config", "user.name", "Dev"]);
        run_git(root, &["config", "commit.gpgsign", "false"]);
        std::fs::write(root.join("README"), "hi\n").unwrap();
        run_git(root, &["add", "README"]);
        run_git(root, &["commit", "-q", "-m", "init"]);
        run_git(
            root,
            &["remote", "add", "origin", "https://github.com/zlib-ng/zlib-ng.git"],
        );

        let git = GitCli::new(root);
        let source = resolve_local_source(&git, "origin").unwrap();
        assert_eq!(source.git_ref, git.resolve_tree_hash("HEAD").unwrap());
        assert_eq!(source.upstream_repo.as_deref(), Some("zlib-ng/zlib-ng"));
    }

    #[test]
    fn missing_remote_leaves_repo_unset() {
        if !git_available() {
            return;
        }
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        run_git(root, &["init", "-q"]);
        run_git(root, &["config", "user.email", "dev@example.com"]);
        run_git(root, &["config", "user.name", "Dev"]);
        run_git(root, &["config", "commit.gpgsign", "false"]);
        run_git(root, &["commit", "-q", "--allow-empty", "-m", "init"]);

        let source = resolve_local_source(&GitCli::new(root), "origin").unwrap();
        assert_eq!(source.upstream_repo, None);
        assert_eq!(source.git_ref.len(), 40);
    }
}
