//! Configuration store — canonical keys, deep merge, file loading.
//!
//! One store exists per manifest definition; every instance of that
//! definition reads and writes the same store. Keys are coerced to a
//! canonical symbolic form: string keys keep their text (a leading `:` is
//! dropped so `:nginx` and `nginx` name the same setting) and scalar keys
//! are stringified. Nested mappings are canonicalized recursively.

use super::error::{ManifestError, Result};
use indexmap::IndexMap;
use serde_yaml_ng::{Mapping, Value};
use std::path::Path;
use std::sync::{PoisonError, RwLock};

/// Resolved configuration: canonical key → value.
pub type Configuration = IndexMap<String, Value>;

/// Coerce a mapping key to its canonical form.
pub fn canonical_key(key: &Value) -> String {
    match key {
        Value::String(s) => s.strip_prefix(':').unwrap_or(s).to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Tagged(tagged) => canonical_key(&tagged.value),
        other => format!("{:?}", other),
    }
}

/// Canonicalize keys in every nested mapping of a value.
pub fn canonical_value(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(k, v)| (Value::String(canonical_key(&k)), canonical_value(v)))
                .collect(),
        ),
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(canonical_value).collect()),
        other => other,
    }
}

/// Canonicalize a set of settings into a configuration map.
pub fn canonicalize<K, V, I>(settings: I) -> Configuration
where
    K: Into<Value>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    settings
        .into_iter()
        .map(|(k, v)| (canonical_key(&k.into()), canonical_value(v.into())))
        .collect()
}

/// Deep-merge `overlay` into `base`. Overlay values win on conflict, except
/// that two mappings under the same key are merged recursively.
pub fn deep_merge(base: &mut Configuration, overlay: Configuration) {
    for (key, value) in overlay {
        match base.get_mut(&key) {
            Some(existing) => merge_value(existing, value),
            None => {
                base.insert(key, value);
            }
        }
    }
}

/// Merge one value over another with the same rules as [`deep_merge`].
pub fn merge_value(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (k, v) in overlay_map {
                match base_map.get_mut(&k) {
                    Some(existing) => merge_value(existing, v),
                    None => {
                        base_map.insert(k, v);
                    }
                }
            }
        }
        (slot, overlay) => *slot = overlay,
    }
}

/// Convert a mapping value into a configuration map, canonicalizing keys.
/// Non-mapping values yield an empty map.
pub fn mapping_to_configuration(value: &Value) -> Configuration {
    match value {
        Value::Mapping(map) => canonicalize(map.clone()),
        _ => Configuration::new(),
    }
}

/// Shared, writable configuration store for one manifest definition.
#[derive(Debug, Default)]
pub struct ConfigStore {
    inner: RwLock<Configuration>,
}

impl ConfigStore {
    pub fn new(initial: Configuration) -> Self {
        Self {
            inner: RwLock::new(initial),
        }
    }

    /// Deep-merge settings into the store.
    pub fn configure<K, V, I>(&self, settings: I)
    where
        K: Into<Value>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let overlay = canonicalize(settings);
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        deep_merge(&mut guard, overlay);
    }

    /// Snapshot of the fully resolved configuration.
    pub fn configuration(&self) -> Configuration {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Look up one top-level setting.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(canonical_key(&Value::String(key.to_string())).as_str())
            .cloned()
    }
}

/// Parse a configuration mapping from a YAML file on disk.
pub fn parse_config_file(path: &Path) -> Result<Mapping> {
    let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

/// Parse a configuration mapping from a YAML string. An empty document is an
/// empty mapping.
pub fn parse_config(yaml: &str) -> Result<Mapping> {
    let value: Value = serde_yaml_ng::from_str(yaml)?;
    match value {
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(map) => Ok(map),
        other => Err(ManifestError::Config(format!(
            "configuration must be a mapping, got {:?}",
            other
        ))),
    }
}
