//! Domain types for a port registry.
//!
//! Serde field names follow the on-disk JSON formats exactly (`git-tree`,
//! `port-version`, `version-semver`), so these structs can be read and written
//! without an intermediate representation.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for a port in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortName(pub String);

impl PortName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Port names are stored lowercase; mixed case is a validation failure.
    pub fn is_lowercase(&self) -> bool {
        !self.0.chars().any(|c| c.is_uppercase())
    }
}

impl fmt::Display for PortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for PortName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PortName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Versions
// ---------------------------------------------------------------------------

/// Which manifest/ledger key carries the version string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionScheme {
    /// `"version"`
    #[default]
    Plain,
    /// `"version-semver"`
    Semver,
}

impl VersionScheme {
    pub const PLAIN_KEY: &'static str = "version";
    pub const SEMVER_KEY: &'static str = "version-semver";

    pub fn key(self) -> &'static str {
        match self {
            VersionScheme::Plain => Self::PLAIN_KEY,
            VersionScheme::Semver => Self::SEMVER_KEY,
        }
    }

    /// The key that must not appear alongside [`key`](Self::key).
    pub fn other_key(self) -> &'static str {
        match self {
            VersionScheme::Plain => Self::SEMVER_KEY,
            VersionScheme::Semver => Self::PLAIN_KEY,
        }
    }

    /// Scheme implied by a JSON object: semver iff the semver key is present.
    pub fn detect(object: &Map<String, Value>) -> Self {
        if object.contains_key(Self::SEMVER_KEY) {
            VersionScheme::Semver
        } else {
            VersionScheme::Plain
        }
    }
}

impl fmt::Display for VersionScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// Port
// ---------------------------------------------------------------------------

/// A declared dependency of a port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub host: bool,
}

impl Dependency {
    pub fn host(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            host: true,
        }
    }
}

/// Everything the registry knows about one port at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub name: PortName,
    pub version: String,
    pub scheme: VersionScheme,
    pub port_revision: u32,
    pub description: Option<String>,
    pub dependencies: Vec<Dependency>,
    /// `owner/name` on the source host.
    pub upstream_repo: String,
    pub git_ref: String,
    pub branch: String,
    /// SHA-512 hex digest of the upstream source archive.
    pub content_digest: String,
}

// ---------------------------------------------------------------------------
// Artifact paths
// ---------------------------------------------------------------------------

/// Canonical locations of the four artifacts that describe a port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortPaths {
    /// `<root>/ports/<name>/` — the subtree whose git-tree hash is recorded.
    pub port_dir: PathBuf,
    pub recipe: PathBuf,
    pub manifest: PathBuf,
    pub ledger: PathBuf,
    pub baseline: PathBuf,
}

// ---------------------------------------------------------------------------
// Ledger and baseline
// ---------------------------------------------------------------------------

fn is_zero(n: &u32) -> bool {
    *n == 0
}

/// One row of a port's version history.
///
/// Exactly one of `version` / `version_semver` is set for entries written by
/// this crate. Keys written by other tools survive a read/write cycle via
/// `extra`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(rename = "git-tree")]
    pub git_tree: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(
        rename = "version-semver",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub version_semver: Option<String>,
    #[serde(rename = "port-version", default, skip_serializing_if = "is_zero")]
    pub port_version: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LedgerEntry {
    pub fn new(git_tree: &str, version: &str, port_version: u32, scheme: VersionScheme) -> Self {
        let (plain, semver) = match scheme {
            VersionScheme::Plain => (Some(version.to_owned()), None),
            VersionScheme::Semver => (None, Some(version.to_owned())),
        };
        Self {
            git_tree: git_tree.to_owned(),
            version: plain,
            version_semver: semver,
            port_version,
            extra: Map::new(),
        }
    }

    /// True if either version key equals `version`.
    pub fn matches_version(&self, version: &str) -> bool {
        self.version.as_deref() == Some(version) || self.version_semver.as_deref() == Some(version)
    }

    /// Semver when the entry uses `version-semver`.
    pub fn scheme(&self) -> VersionScheme {
        if self.version_semver.is_some() {
            VersionScheme::Semver
        } else {
            VersionScheme::Plain
        }
    }

    /// The recorded version string, whichever key carries it.
    pub fn version_text(&self) -> Option<&str> {
        self.version.as_deref().or(self.version_semver.as_deref())
    }
}

/// On-disk ledger document: `{"versions": [...]}`, newest first.
///
/// Rows stay raw JSON so a row this crate cannot read is written back as it
/// was loaded. [`Ledger::entries`] yields the readable ones.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default)]
    pub versions: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Ledger {
    /// Rows that parse as [`LedgerEntry`], in file order.
    pub fn entries(&self) -> impl Iterator<Item = LedgerEntry> + '_ {
        self.versions
            .iter()
            .filter_map(|row| LedgerEntry::deserialize(row).ok())
    }
}

/// The baseline's view of one port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineEntry {
    pub baseline: String,
    #[serde(rename = "port-version", default)]
    pub port_version: u32,
}

impl From<&LedgerEntry> for BaselineEntry {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            baseline: entry.git_tree.clone(),
            port_version: entry.port_version,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn port_name_casing() {
        assert!(PortName::from("zlib-ng").is_lowercase());
        assert!(PortName::from("zlib_ng2").is_lowercase());
        assert!(!PortName::from("ZLib").is_lowercase());
    }

    #[test]
    fn ledger_entry_omits_zero_port_version() {
        let entry = LedgerEntry::new("abc", "1.0.0", 0, VersionScheme::Plain);
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value, json!({"git-tree": "abc", "version": "1.0.0"}));
    }

    #[test]
    fn ledger_entry_semver_key() {
        let entry = LedgerEntry::new("abc", "2.0.0", 2, VersionScheme::Semver);
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            json!({"git-tree": "abc", "version-semver": "2.0.0", "port-version": 2})
        );
    }

    #[test]
    fn ledger_entry_keeps_foreign_keys() {
        let raw = json!({"git-tree": "t", "version-date": "2024-01-01", "port-version": 3});
        let entry: LedgerEntry = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(entry.port_version, 3);
        assert!(entry.version_text().is_none());
        assert_eq!(serde_json::to_value(&entry).unwrap(), raw);
    }

    #[test]
    fn dependency_host_flag_only_when_true() {
        let value = serde_json::to_value(Dependency::host("vcpkg-cmake")).unwrap();
        assert_eq!(value, json!({"name": "vcpkg-cmake", "host": true}));
        let plain = Dependency {
            name: "zlib".into(),
            host: false,
        };
        assert_eq!(serde_json::to_value(plain).unwrap(), json!({"name": "zlib"}));
    }

    #[test]
    fn scheme_detect() {
        let semver = json!({"version-semver": "1.0.0"});
        let plain = json!({"version": "1.0.0"});
        assert_eq!(
            VersionScheme::detect(semver.as_object().unwrap()),
            VersionScheme::Semver
        );
        assert_eq!(
            VersionScheme::detect(plain.as_object().unwrap()),
            VersionScheme::Plain
        );
    }
}
