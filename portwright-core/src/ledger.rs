//! Per-port version ledger (`versions/<c>-/<name>.json`).
//!
//! Entries are ordered newest first. New entries are only ever inserted at
//! the head; existing entries are rewritten byte-for-byte as loaded.

use std::path::Path;

use crate::error::RegistryError;
use crate::json_store;
use crate::manifest;
use crate::types::{Ledger, LedgerEntry, VersionScheme};

/// Load a ledger; missing or malformed files read as an empty ledger.
///
/// Only a file that fails to parse as a ledger document is dropped. Rows that
/// parse as JSON but not as a [`LedgerEntry`] are kept.
pub fn load(path: &Path) -> Result<Ledger, RegistryError> {
    json_store::load_lenient(path)
}

/// The newest readable entry, if any.
pub fn head(path: &Path) -> Result<Option<LedgerEntry>, RegistryError> {
    Ok(load(path)?.entries().next())
}

/// The port-version a new entry for `version` must carry.
///
/// One more than the highest port-version already recorded for exactly this
/// version string (under either version key), or 0 if there is none.
pub fn next_port_revision(path: &Path, version: &str) -> Result<u32, RegistryError> {
    next_revision_in(&load(path)?, version)
}

pub(crate) fn next_revision_in(ledger: &Ledger, version: &str) -> Result<u32, RegistryError> {
    let highest = ledger
        .entries()
        .filter(|entry| entry.matches_version(version))
        .map(|entry| entry.port_version)
        .max();
    match highest {
        None => Ok(0),
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| RegistryError::PortVersionExhausted {
                version: version.to_owned(),
            }),
    }
}

/// Insert a new head entry and save the ledger.
///
/// Fails with [`RegistryError::DuplicateLedgerEntry`] if the
/// (version, port-version) pair is already recorded.
pub fn record(
    path: &Path,
    git_tree: &str,
    version: &str,
    port_revision: u32,
    scheme: VersionScheme,
) -> Result<LedgerEntry, RegistryError> {
    let mut ledger = load(path)?;
    if ledger
        .entries()
        .any(|e| e.matches_version(version) && e.port_version == port_revision)
    {
        return Err(RegistryError::DuplicateLedgerEntry {
            version: version.to_owned(),
            port_version: port_revision,
        });
    }

    let entry = LedgerEntry::new(git_tree, version, port_revision, scheme);
    let row = serde_json::to_value(&entry).map_err(|source| RegistryError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    ledger.versions.insert(0, row);
    json_store::save_atomic(path, &ledger)?;
    tracing::info!(
        "recorded {} port-version {} ({}) in {}",
        version,
        port_revision,
        git_tree,
        path.display()
    );
    Ok(entry)
}

/// Whether the manifest at `manifest_path` uses the `version-semver` key.
/// Missing or malformed manifests count as plain.
pub fn uses_semver(manifest_path: &Path) -> Result<bool, RegistryError> {
    let map = manifest::load(manifest_path)?;
    Ok(VersionScheme::detect(&map) == VersionScheme::Semver)
}
