//! Version-control collaborator.
//!
//! The orchestrator only needs five operations from git; they sit behind
//! [`VersionControl`] so phases can be exercised against a recording fake.
//! [`GitCli`] shells out to the `git` binary with `-C <root>` so the process
//! working directory never matters.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::error::SyncError;

pub trait VersionControl {
    /// Stage `paths` (relative to the repository root).
    fn stage(&self, paths: &[PathBuf]) -> Result<(), SyncError>;

    /// Commit the index with `message`.
    fn commit(&self, message: &str) -> Result<(), SyncError>;

    /// Fold the index into the last commit, keeping its message.
    fn amend_last_commit(&self) -> Result<(), SyncError>;

    /// Object id of `rev`, e.g. `HEAD` or `HEAD:./ports/zlib`.
    fn resolve_tree_hash(&self, rev: &str) -> Result<String, SyncError>;

    /// Fetch URL of the remote called `name`; `None` if there is no such
    /// remote.
    fn remote_url(&self, name: &str) -> Result<Option<String>, SyncError>;
}

/// [`VersionControl`] backed by the `git` command line.
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
}

impl GitCli {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn output<I, S>(&self, args: I) -> Result<(String, Output), SyncError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<_> = args.into_iter().map(|a| a.as_ref().to_owned()).collect();
        let command = format!(
            "git {}",
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );
        tracing::debug!("{command} (in {})", self.root.display());
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(&args)
            .output()
            .map_err(|err| SyncError::VersionControl {
                command: command.clone(),
                stderr: err.to_string(),
            })?;
        Ok((command, output))
    }

    fn run<I, S>(&self, args: I) -> Result<String, SyncError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let (command, output) = self.output(args)?;
        if !output.status.success() {
            let mut stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.is_empty() {
                // `git commit` with nothing staged reports on stdout.
                stderr = String::from_utf8_lossy(&output.stdout).trim().to_string();
            }
            return Err(SyncError::VersionControl { command, stderr });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl VersionControl for GitCli {
    fn stage(&self, paths: &[PathBuf]) -> Result<(), SyncError> {
        let mut args: Vec<&OsStr> = vec![OsStr::new("add"), OsStr::new("--")];
        args.extend(paths.iter().map(|p| p.as_os_str()));
        self.run(args).map(drop)
    }

    fn commit(&self, message: &str) -> Result<(), SyncError> {
        self.run(["commit", "-m", message]).map(drop)
    }

    fn amend_last_commit(&self) -> Result<(), SyncError> {
        self.run(["commit", "--amend", "--no-edit"]).map(drop)
    }

    fn resolve_tree_hash(&self, rev: &str) -> Result<String, SyncError> {
        self.run(["rev-parse", "--verify", rev])
    }

    fn remote_url(&self, name: &str) -> Result<Option<String>, SyncError> {
        let (command, output) = self.output(["remote", "get-url", name])?;
        if !output.status.success() {
            tracing::debug!(
                "{command}: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Ok(None);
        }
        let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!url.is_empty()).then_some(url))
    }
}
