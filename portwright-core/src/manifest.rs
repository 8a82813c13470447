//! Port manifest (`vcpkg.json`) generation and in-place patching.
//!
//! Manifests are handled as ordered JSON objects rather than typed structs so
//! that keys this crate does not manage (features, supports, license, custom
//! dependencies) survive an update untouched and in their original order.

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::RegistryError;
use crate::json_store;
use crate::types::{Dependency, PortName, VersionScheme};

pub const PORT_VERSION_KEY: &str = "port-version";

/// Host-tool dependencies every generated recipe relies on.
pub const HOST_DEPENDENCIES: &[&str] = &["vcpkg-cmake", "vcpkg-cmake-config"];

/// Inputs for a freshly generated manifest.
#[derive(Debug, Clone)]
pub struct ManifestSeed<'a> {
    pub name: &'a PortName,
    pub version: &'a str,
    pub scheme: VersionScheme,
    pub description: Option<&'a str>,
    /// `owner/name` on `host`.
    pub upstream_repo: &'a str,
    pub host: &'a str,
    pub port_revision: u32,
}

/// The fields of an existing manifest that reporting cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSummary {
    pub name: Option<String>,
    pub version: Option<String>,
    pub scheme: VersionScheme,
    pub port_revision: u32,
}

/// Build the JSON object for a new manifest.
pub fn render_new(seed: &ManifestSeed<'_>) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("name".into(), Value::from(seed.name.as_str()));
    map.insert(seed.scheme.key().into(), Value::from(seed.version));
    if seed.port_revision > 0 {
        map.insert(PORT_VERSION_KEY.into(), Value::from(seed.port_revision));
    }
    if let Some(description) = seed.description {
        map.insert("description".into(), Value::from(description));
    }
    map.insert(
        "homepage".into(),
        Value::from(format!("https://{}/{}", seed.host, seed.upstream_repo)),
    );
    let deps: Vec<Value> = HOST_DEPENDENCIES
        .iter()
        .map(|name| serde_json::to_value(Dependency::host(name)).unwrap_or(Value::Null))
        .collect();
    map.insert("dependencies".into(), Value::Array(deps));
    map
}

/// Set the version and port-version of an existing manifest object.
///
/// The version key already in use is kept (`version-semver` wins if present);
/// a stray key of the other scheme is removed. `port-version` is deleted when
/// `port_revision` is 0.
pub fn apply_update(map: &mut Map<String, Value>, version: &str, port_revision: u32) {
    let scheme = VersionScheme::detect(map);
    map.remove(scheme.other_key());
    if map.contains_key(scheme.key()) {
        map.insert(scheme.key().into(), Value::from(version));
    } else {
        insert_after(map, "name", scheme.key(), Value::from(version));
    }

    if port_revision == 0 {
        map.remove(PORT_VERSION_KEY);
    } else if map.contains_key(PORT_VERSION_KEY) {
        map.insert(PORT_VERSION_KEY.into(), Value::from(port_revision));
    } else {
        insert_after(map, scheme.key(), PORT_VERSION_KEY, Value::from(port_revision));
    }
}

/// Load a manifest object; missing or malformed files read as `{}`.
pub fn load(path: &Path) -> Result<Map<String, Value>, RegistryError> {
    json_store::load_lenient(path)
}

/// Write a new manifest, replacing whatever is at `path`.
pub fn create(path: &Path, seed: &ManifestSeed<'_>) -> Result<(), RegistryError> {
    json_store::save_atomic(path, &render_new(seed))
}

/// Patch the version fields of the manifest at `path` in place.
pub fn update(path: &Path, version: &str, port_revision: u32) -> Result<(), RegistryError> {
    let mut map = load(path)?;
    apply_update(&mut map, version, port_revision);
    json_store::save_atomic(path, &map)
}

/// Summarise the manifest at `path`, or `None` if it is missing/unreadable.
pub fn read(path: &Path) -> Result<Option<ManifestSummary>, RegistryError> {
    let map = load(path)?;
    if map.is_empty() {
        return Ok(None);
    }
    let scheme = VersionScheme::detect(&map);
    let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_owned);
    Ok(Some(ManifestSummary {
        name: text("name"),
        version: text(scheme.key()),
        scheme,
        port_revision: map
            .get(PORT_VERSION_KEY)
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0),
    }))
}

/// Insert `key` directly after `anchor`, or at the end if `anchor` is absent.
fn insert_after(map: &mut Map<String, Value>, anchor: &str, key: &str, value: Value) {
    if !map.contains_key(anchor) {
        map.insert(key.into(), value);
        return;
    }
    let old = std::mem::take(map);
    let mut pending = Some(value);
    for (k, v) in old {
        let is_anchor = k == anchor;
        map.insert(k, v);
        if is_anchor {
            if let Some(value) = pending.take() {
                map.insert(key.into(), value);
            }
        }
    }
}
