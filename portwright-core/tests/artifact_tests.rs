//! Artifact persistence tests: manifest, ledger, and baseline files laid out
//! under a registry root exactly as `paths::resolve` describes.

use assert_fs::prelude::*;
use portwright_core::{
    baseline, ledger, manifest,
    manifest::ManifestSeed,
    paths, BaselineEntry, PortName, RegistryError, VersionScheme,
};
use predicates::prelude::predicate;
use serde_json::{json, Value};
use std::fs;

fn port() -> PortName {
    PortName::from("zlib-ng")
}

fn read_json(path: &std::path::Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).expect("read")).expect("parse")
}

// ---------------------------------------------------------------------------
// 1. Layout
// ---------------------------------------------------------------------------

#[test]
fn artifacts_land_at_resolved_paths() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let paths = paths::resolve(root.path(), &port()).expect("resolve");

    manifest::create(
        &paths.manifest,
        &ManifestSeed {
            name: &port(),
            version: "2.2.0",
            scheme: VersionScheme::Plain,
            description: None,
            upstream_repo: "owner/zlib-ng",
            host: "github.com",
            port_revision: 0,
        },
    )
    .expect("manifest");
    ledger::record(&paths.ledger, "tree", "2.2.0", 0, VersionScheme::Plain).expect("ledger");
    baseline::set_baseline(
        &paths.baseline,
        &port(),
        &BaselineEntry {
            baseline: "tree".into(),
            port_version: 0,
        },
    )
    .expect("baseline");

    root.child("ports/zlib-ng/vcpkg.json")
        .assert(predicate::path::exists());
    root.child("versions/z-/zlib-ng.json")
        .assert(predicate::path::exists());
    root.child("versions/baseline.json")
        .assert(predicate::str::contains("\"port-version\": 0"));
    root.child("versions/z-/zlib-ng.json.tmp")
        .assert(predicate::path::missing());
}

// ---------------------------------------------------------------------------
// 2. Version key stability across manifest and ledger
// ---------------------------------------------------------------------------

#[test]
fn semver_manifest_keeps_semver_through_updates() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let paths = paths::resolve(root.path(), &port()).expect("resolve");
    root.child("ports/zlib-ng/vcpkg.json")
        .write_str(r#"{"name": "zlib-ng", "version-semver": "2.2.0"}"#)
        .expect("seed manifest");

    for (version, rev) in [("2.2.0", 1), ("2.3.0", 0), ("2.3.0", 1)] {
        manifest::update(&paths.manifest, version, rev).expect("update");
        let doc = read_json(&paths.manifest);
        assert_eq!(doc["version-semver"], json!(version));
        assert!(doc.get("version").is_none(), "plain key must never appear");
    }
    assert!(ledger::uses_semver(&paths.manifest).expect("uses_semver"));
}

#[test]
fn plain_manifest_never_gains_semver_key() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let paths = paths::resolve(root.path(), &port()).expect("resolve");
    root.child("ports/zlib-ng/vcpkg.json")
        .write_str(r#"{"name": "zlib-ng", "version": "1.0"}"#)
        .expect("seed manifest");

    manifest::update(&paths.manifest, "1.1", 2).expect("update");
    let doc = read_json(&paths.manifest);
    assert_eq!(doc["version"], json!("1.1"));
    assert_eq!(doc["port-version"], json!(2));
    assert!(doc.get("version-semver").is_none());
}

// ---------------------------------------------------------------------------
// 3. Ledger semantics
// ---------------------------------------------------------------------------

#[test]
fn ledger_history_grows_at_head() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let paths = paths::resolve(root.path(), &port()).expect("resolve");

    ledger::record(&paths.ledger, "t0", "2.2.0", 0, VersionScheme::Plain).expect("first");
    let rev = ledger::next_port_revision(&paths.ledger, "2.2.0").expect("next");
    assert_eq!(rev, 1);
    ledger::record(&paths.ledger, "t1", "2.2.0", rev, VersionScheme::Plain).expect("second");

    let doc = read_json(&paths.ledger);
    assert_eq!(
        doc,
        json!({"versions": [
            {"git-tree": "t1", "version": "2.2.0", "port-version": 1},
            {"git-tree": "t0", "version": "2.2.0"}
        ]})
    );
}

#[test]
fn duplicate_entry_error_names_version() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let paths = paths::resolve(root.path(), &port()).expect("resolve");
    ledger::record(&paths.ledger, "t0", "2.2.0", 0, VersionScheme::Plain).expect("first");
    let err = ledger::record(&paths.ledger, "t9", "2.2.0", 0, VersionScheme::Plain).unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateLedgerEntry { .. }), "got: {err}");
    assert!(err.to_string().contains("2.2.0"));
}

#[test]
#[cfg(unix)]
fn unreadable_ledger_is_an_error_not_empty() {
    use std::os::unix::fs::PermissionsExt;

    let root = assert_fs::TempDir::new().expect("tempdir");
    let paths = paths::resolve(root.path(), &port()).expect("resolve");
    ledger::record(&paths.ledger, "t0", "1.0", 0, VersionScheme::Plain).expect("record");
    fs::set_permissions(&paths.ledger, fs::Permissions::from_mode(0o000)).expect("chmod");

    // Root can read anything; only assert when the permission actually bites.
    if fs::read(&paths.ledger).is_err() {
        let err = ledger::next_port_revision(&paths.ledger, "1.0").unwrap_err();
        assert!(matches!(err, RegistryError::Io { .. }), "got: {err}");
    }
    fs::set_permissions(&paths.ledger, fs::Permissions::from_mode(0o644)).expect("chmod back");
}
