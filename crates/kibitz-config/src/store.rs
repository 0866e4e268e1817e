//! Client-side settings storage.
//!
//! The overlay persists exactly one value: the serialized overrides blob.
//! Where it lands (cookie, local storage, a file) is the embedder's concern;
//! the core only sees this narrow surface.

use parking_lot::Mutex;
use std::collections::HashMap;

/// Conventional key the overrides blob is stored under.
pub const SETTINGS_KEY: &str = "settings";

/// Minimal named-value storage.
pub trait SettingsStore: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str);
    fn del(&self, name: &str);

    fn exists(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// In-memory store for tests and embeddings without persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, name: &str) -> Option<String> {
        self.entries.lock().get(name).cloned()
    }

    fn set(&self, name: &str, value: &str) {
        self.entries
            .lock()
            .insert(name.to_string(), value.to_string());
    }

    fn del(&self, name: &str) {
        self.entries.lock().remove(name);
    }
}
