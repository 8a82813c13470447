//! Error types for portwright-sync.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use portwright_core::RegistryError;
use portwright_recipe::RecipeError;

/// One precondition a create/update request failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// The name cannot be mapped onto registry paths.
    InvalidName { name: String, reason: String },
    NameNotLowercase { name: String },
    /// A create would clobber an existing artifact.
    ArtifactExists { path: PathBuf },
    /// An update needs version history to extend.
    LedgerMissing { path: PathBuf },
    MissingRepo,
    MissingRef,
    MissingVersion,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName { name, reason } => write!(f, "invalid port name '{name}': {reason}"),
            Self::NameNotLowercase { name } => {
                write!(f, "port name '{name}' must be lowercase")
            }
            Self::ArtifactExists { path } => write!(f, "{} already exists", path.display()),
            Self::LedgerMissing { path } => write!(
                f,
                "{} does not exist; create the port before updating it",
                path.display()
            ),
            Self::MissingRepo => f.write_str(
                "no upstream repository: pass --repo or keep REPO in the existing recipe",
            ),
            Self::MissingRef => f.write_str("no source ref: pass --ref or --source-dir"),
            Self::MissingVersion => {
                f.write_str("no version: pass --version or keep one in the existing manifest")
            }
        }
    }
}

/// All errors that can arise from creating or updating a port.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("recipe error: {0}")]
    Recipe(#[from] RecipeError),

    /// Every precondition that failed, reported together.
    #[error("{} validation error(s): {}", .0.len(), join_issues(.0))]
    Validation(Vec<ValidationIssue>),

    /// A `git` invocation could not be spawned or exited non-zero.
    #[error("`{command}` failed: {stderr}")]
    VersionControl { command: String, stderr: String },

    #[error("GET {url} returned HTTP {status}")]
    Http { url: String, status: u16 },

    #[error("GET {url} failed: {message}")]
    Network { url: String, message: String },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_every_issue() {
        let err = SyncError::Validation(vec![
            ValidationIssue::NameNotLowercase {
                name: "ZLib".into(),
            },
            ValidationIssue::MissingRef,
        ]);
        let text = err.to_string();
        assert!(text.starts_with("2 validation error(s): "), "{text}");
        assert!(text.contains("'ZLib' must be lowercase"));
        assert!(text.contains("--ref or --source-dir"));
    }
}
