//! Registry-wide baseline index (`versions/baseline.json`).
//!
//! ```json
//! { "default": { "<port>": { "baseline": "<git-tree>", "port-version": 0 } } }
//! ```
//!
//! Setting a port's baseline replaces its entry outright; the baseline only
//! ever mirrors the newest ledger entry.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::RegistryError;
use crate::json_store;
use crate::types::{BaselineEntry, PortName};

pub const DEFAULT_KEY: &str = "default";

/// Replace the baseline entry for `port`, preserving all other ports and any
/// other top-level keys in the document.
pub fn set_baseline(
    path: &Path,
    port: &PortName,
    entry: &BaselineEntry,
) -> Result<(), RegistryError> {
    let mut doc: Map<String, Value> = json_store::load_lenient(path)?;
    let default = doc
        .entry(DEFAULT_KEY)
        .or_insert_with(|| Value::Object(Map::new()));
    if !default.is_object() {
        tracing::warn!("replacing non-object \"default\" in {}", path.display());
        *default = Value::Object(Map::new());
    }
    if let Value::Object(ports) = default {
        let value = serde_json::to_value(entry).map_err(|source| RegistryError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
        ports.insert(port.as_str().to_owned(), value);
    }
    json_store::save_atomic(path, &doc)?;
    tracing::info!("baseline for {} -> {}", port, entry.baseline);
    Ok(())
}

/// All well-formed baseline entries, sorted by port name.
pub fn load(path: &Path) -> Result<BTreeMap<PortName, BaselineEntry>, RegistryError> {
    let doc: Map<String, Value> = json_store::load_lenient(path)?;
    let mut out = BTreeMap::new();
    if let Some(Value::Object(ports)) = doc.get(DEFAULT_KEY) {
        for (name, value) in ports {
            match serde_json::from_value::<BaselineEntry>(value.clone()) {
                Ok(entry) => {
                    out.insert(PortName::from(name.as_str()), entry);
                }
                Err(err) => tracing::warn!("skipping baseline entry {name}: {err}"),
            }
        }
    }
    Ok(out)
}

/// The baseline entry for one port.
pub fn get(path: &Path, port: &PortName) -> Result<Option<BaselineEntry>, RegistryError> {
    Ok(load(path)?.remove(port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn entry(tree: &str, rev: u32) -> BaselineEntry {
        BaselineEntry {
            baseline: tree.into(),
            port_version: rev,
        }
    }

    #[test]
    fn set_on_missing_file_creates_document() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("versions").join("baseline.json");
        set_baseline(&path, &PortName::from("zlib"), &entry("t1", 0)).unwrap();
        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            raw,
            json!({"default": {"zlib": {"baseline": "t1", "port-version": 0}}})
        );
    }

    #[test]
    fn set_replaces_only_named_port() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("baseline.json");
        set_baseline(&path, &PortName::from("a"), &entry("ta", 0)).unwrap();
        set_baseline(&path, &PortName::from("b"), &entry("tb", 0)).unwrap();
        set_baseline(&path, &PortName::from("a"), &entry("ta2", 1)).unwrap();

        let all = load(&path).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[&PortName::from("a")], entry("ta2", 1));
        assert_eq!(all[&PortName::from("b")], entry("tb", 0));
    }

    #[test]
    fn corrupt_baseline_is_replaced() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("baseline.json");
        std::fs::write(&path, "garbage").unwrap();
        set_baseline(&path, &PortName::from("x"), &entry("t", 2)).unwrap();
        assert_eq!(get(&path, &PortName::from("x")).unwrap(), Some(entry("t", 2)));
    }

    #[test]
    fn unrelated_top_level_keys_survive() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("baseline.json");
        std::fs::write(&path, r#"{"default": {}, "custom": {"y": 1}}"#).unwrap();
        set_baseline(&path, &PortName::from("x"), &entry("t", 0)).unwrap();
        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["custom"], json!({"y": 1}));
    }
}
