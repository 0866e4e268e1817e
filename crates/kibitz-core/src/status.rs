//! Which overlay components are currently attached.
//!
//! Components announce themselves by publishing `{component, status}` on the
//! [`topics::STATUS`] topic; a watched registry folds those events into a
//! flag map that gatekeepers (e.g. the logger's GUI publication) consult.

use crate::events::{EventBus, Handler};
use crate::topics;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Well-known component names.
pub mod component {
    pub const APP: &str = "app";
    pub const GUI: &str = "gui";
    pub const CONSOLE: &str = "console";
    pub const MODAL: &str = "modal";
}

/// Component name → attached flag. Absent components read as detached.
#[derive(Debug, Default)]
pub struct StatusRegistry {
    flags: Mutex<HashMap<String, bool>>,
}

impl StatusRegistry {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, component: &str, attached: bool) {
        self.flags.lock().insert(component.to_string(), attached);
    }

    #[must_use]
    pub fn get(&self, component: &str) -> bool {
        self.flags.lock().get(component).copied().unwrap_or(false)
    }

    /// Subscribe this registry to the status topic, folding
    /// `{component, status}` payloads into the flag map. Malformed payloads
    /// are dropped — a status observer must never disturb the publisher.
    ///
    /// Returns the subscribed handler so the caller can unsubscribe it.
    pub fn watch(self: &Arc<Self>, bus: &EventBus) -> Handler {
        let registry = Arc::downgrade(self);
        let handler = Handler::new(move |data: &Value, _topic: &str| {
            let Some(registry) = registry.upgrade() else {
                return;
            };
            let component = data.get("component").and_then(Value::as_str);
            let status = data.get("status").and_then(Value::as_bool);
            match (component, status) {
                (Some(component), Some(status)) => registry.set(component, status),
                _ => tracing::debug!(payload = %data, "malformed status payload dropped"),
            }
        });
        bus.subscribe(topics::STATUS, handler.clone());
        handler
    }
}
