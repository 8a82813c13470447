//! Error types for portwright-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from registry artifact operations.
///
/// Malformed JSON in an existing manifest, ledger, or baseline is deliberately
/// absent: those files are loaded leniently and treated as empty.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization failure on the write path.
    #[error("failed to serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// YAML parse error in a configuration file.
    #[error("failed to parse config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The port name cannot be mapped onto registry paths.
    #[error("invalid port name '{name}': {reason}")]
    InvalidPortName { name: String, reason: &'static str },

    /// The ledger already holds an entry for this (version, port-version) pair.
    #[error("ledger already has an entry for version {version} port-version {port_version}")]
    DuplicateLedgerEntry { version: String, port_version: u32 },

    /// Version `version` already carries the largest representable port-version.
    #[error("no port-version left for version {version}")]
    PortVersionExhausted { version: String },
}

/// Convenience constructor for [`RegistryError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RegistryError {
    RegistryError::Io {
        path: path.into(),
        source,
    }
}
