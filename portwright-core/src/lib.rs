//! Portwright core library — registry layout, artifact persistence, errors.
//!
//! - [`paths`] — where a port's four artifacts live
//! - [`manifest`] — `vcpkg.json` generation and patching
//! - [`ledger`] — per-port version history and port-version derivation
//! - [`baseline`] — registry-wide baseline index
//! - [`config`] — `portwright.yaml` loading
//! - [`types`] / [`error`] — domain types and [`RegistryError`]

pub mod baseline;
pub mod config;
pub mod error;
pub mod json_store;
pub mod ledger;
pub mod manifest;
pub mod paths;
pub mod types;

pub use config::RegistryConfig;
pub use error::RegistryError;
pub use types::{
    BaselineEntry, Dependency, Ledger, LedgerEntry, Port, PortName, PortPaths, VersionScheme,
};
