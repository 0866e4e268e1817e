//! The user-settings overrides blob.
//!
//! User-modified configuration is persisted as one flat JSON object of
//! dotted paths over the camelCase wire names:
//!
//! ```json
//! { "logs.gui": false, "gui.modals.behaviour.modalHopping": true }
//! ```
//!
//! Applying a blob projects it onto the serialized configuration tree and
//! deserializes the result, so override values are validated exactly as the
//! underlying config fields are.

use crate::config::Config;
use crate::error::ConfigError;
use crate::store::SettingsStore;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A set of dotted-path configuration overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    entries: BTreeMap<String, Value>,
}

impl Overrides {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one override, replacing any previous value for the path.
    pub fn set(&mut self, path: impl Into<String>, value: Value) {
        self.entries.insert(path.into(), value);
    }

    /// Drop one override.
    pub fn unset(&mut self, path: &str) {
        self.entries.remove(path);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Parse a persisted blob.
    pub fn parse(blob: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(blob)?;
        let Value::Object(map) = value else {
            return Err(ConfigError::BlobNotObject);
        };
        Ok(Self {
            entries: map.into_iter().collect(),
        })
    }

    /// Serialize to the persisted blob form.
    #[must_use]
    pub fn serialize(&self) -> String {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Value::Object(map).to_string()
    }

    /// Apply these overrides over `config`, yielding the effective
    /// configuration.
    pub fn apply_to(&self, config: &Config) -> Result<Config, ConfigError> {
        let mut tree = serde_json::to_value(config)?;
        for (path, value) in &self.entries {
            set_path(&mut tree, path, value)?;
        }
        Ok(serde_json::from_value(tree)?)
    }

    /// Load the blob stored under `key`, or an empty set when absent.
    pub fn load(store: &dyn SettingsStore, key: &str) -> Result<Self, ConfigError> {
        match store.get(key) {
            Some(blob) => Self::parse(&blob),
            None => Ok(Self::new()),
        }
    }

    /// Persist the blob under `key`.
    pub fn persist(&self, store: &dyn SettingsStore, key: &str) {
        store.set(key, &self.serialize());
    }
}

fn set_path(tree: &mut Value, path: &str, value: &Value) -> Result<(), ConfigError> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(ConfigError::BadOverride {
            path: path.to_string(),
            reason: "empty path segment".to_string(),
        });
    }

    let mut node = tree;
    for segment in &segments[..segments.len() - 1] {
        let map = node.as_object_mut().ok_or_else(|| ConfigError::BadOverride {
            path: path.to_string(),
            reason: format!("segment '{segment}' addresses into a non-object value"),
        })?;
        node = map
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    let leaf = segments[segments.len() - 1];
    let map = node.as_object_mut().ok_or_else(|| ConfigError::BadOverride {
        path: path.to_string(),
        reason: format!("segment '{leaf}' addresses into a non-object value"),
    })?;
    map.insert(leaf.to_string(), value.clone());
    Ok(())
}
