//! The typed configuration tree.
//!
//! Field names serialize in camelCase so the on-disk/persisted form uses the
//! same dotted paths the overrides blob does (`logs.contextFlag`,
//! `gui.modals.behaviour.modalHopping`).

use crate::error::ConfigError;
use crate::filter::{FilterMode, LogFilter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Root configuration for one overlay instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Fallback label for log lines carrying no context.
    pub app_name: String,
    pub version: String,
    /// Master kill switch for the whole overlay.
    pub enabled: bool,
    pub events: EventsConfig,
    pub logs: LogsConfig,
    pub gui: GuiConfig,
    /// Component → operation → path, e.g. `routes.console.save`.
    pub routes: HashMap<String, HashMap<String, String>>,
    pub tooltips: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventsConfig {
    /// Suppress the unknown-topic publish error.
    pub silent: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogsConfig {
    /// Master kill switch for logging.
    pub enabled: bool,
    /// Whether formatted entries are published for the console to render.
    pub gui: bool,
    /// Whether the context/subcontext machinery is active at all.
    pub contexts: bool,
    /// Prefix marking a log argument as a context token.
    pub context_flag: String,
    /// Dump attached objects into the buffer instead of a placeholder.
    pub obj2buffer: bool,
    /// Blocklist of log kinds to suppress.
    pub filter: LogFilter,
    /// How filter entries match kinds; see [`FilterMode`].
    pub filter_mode: FilterMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GuiConfig {
    pub enabled: bool,
    /// Refresh the console on `gui/update` events.
    pub autorefresh: bool,
    pub console: ConsoleConfig,
    pub modals: ModalsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsoleConfig {
    /// Initial state class on the console wrapper.
    pub state: String,
    pub autoscroll: bool,
    /// Toolbar tool → icon name.
    pub icons: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModalsConfig {
    pub behaviour: ModalBehaviourConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModalBehaviourConfig {
    /// Displace the open modal instead of queueing behind it.
    pub modal_hopping: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "kbs".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            enabled: true,
            events: EventsConfig::default(),
            logs: LogsConfig::default(),
            gui: GuiConfig::default(),
            routes: default_routes(),
            tooltips: default_tooltips(),
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { silent: false }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            gui: true,
            contexts: true,
            context_flag: "context:".to_string(),
            obj2buffer: false,
            filter: LogFilter::default(),
            filter_mode: FilterMode::default(),
        }
    }
}

impl Default for GuiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            autorefresh: true,
            console: ConsoleConfig::default(),
            modals: ModalsConfig::default(),
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        let icons = [
            ("save", "file-text"),
            ("clear", "trash"),
            ("toggle", "terminal"),
            ("close", "times"),
            ("destroy", "unlink"),
            ("expand", "caret-square-o-right"),
        ]
        .into_iter()
        .map(|(tool, icon)| (tool.to_string(), icon.to_string()))
        .collect();

        Self {
            state: "kbs-close".to_string(),
            autoscroll: true,
            icons,
        }
    }
}

impl Default for ModalsConfig {
    fn default() -> Self {
        Self {
            behaviour: ModalBehaviourConfig::default(),
        }
    }
}

impl Default for ModalBehaviourConfig {
    fn default() -> Self {
        Self {
            modal_hopping: false,
        }
    }
}

fn default_routes() -> HashMap<String, HashMap<String, String>> {
    let mut console = HashMap::new();
    console.insert("save".to_string(), "endpoint/console/save".to_string());

    let mut routes = HashMap::new();
    routes.insert("console".to_string(), console);
    routes
}

fn default_tooltips() -> HashMap<String, String> {
    [
        ("save", "Save the output buffer to text file"),
        ("clear", "Clear all logs"),
        ("toggle", "GUI Console State"),
        ("close", "Close the console"),
        ("destroy", "Destroy this console instance"),
    ]
    .into_iter()
    .map(|(tool, tip)| (tool.to_string(), tip.to_string()))
    .collect()
}

impl Config {
    /// Look up a route path for a component operation.
    #[must_use]
    pub fn route(&self, component: &str, operation: &str) -> Option<&str> {
        self.routes
            .get(component)
            .and_then(|ops| ops.get(operation))
            .map(String::as_str)
    }

    /// Parse a configuration document from JSON. Missing fields take their
    /// defaults.
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(document)?)
    }

    /// Load a configuration document from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let document = std::fs::read_to_string(path)?;
        Self::from_json_str(&document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_contract() {
        let config = Config::default();
        assert_eq!(config.app_name, "kbs");
        assert!(config.enabled);
        assert!(!config.events.silent);
        assert!(config.logs.enabled);
        assert!(config.logs.gui);
        assert!(config.logs.contexts);
        assert_eq!(config.logs.context_flag, "context:");
        assert!(!config.logs.obj2buffer);
        assert!(!config.logs.filter.is_active());
        assert_eq!(config.logs.filter_mode, FilterMode::Word);
        assert!(!config.gui.modals.behaviour.modal_hopping);
        assert_eq!(config.route("console", "save"), Some("endpoint/console/save"));
        assert_eq!(config.route("console", "nope"), None);
    }

    #[test]
    fn test_camel_case_field_names_on_the_wire() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(json["appName"], "kbs");
        assert_eq!(json["logs"]["contextFlag"], "context:");
        assert_eq!(json["logs"]["filterMode"], "word");
        assert_eq!(json["gui"]["modals"]["behaviour"]["modalHopping"], false);
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let config = Config::from_json_str(
            r#"{ "appName": "probe", "logs": { "gui": false, "filter": ["debug"] } }"#,
        )
        .unwrap();
        assert_eq!(config.app_name, "probe");
        assert!(!config.logs.gui);
        assert!(config.logs.enabled);
        assert!(config.logs.filter.is_active());
        assert!(config.gui.enabled);
    }

    #[test]
    fn test_from_json_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "events": {{ "silent": true }} }}"#).unwrap();

        let config = Config::from_json_file(file.path()).unwrap();
        assert!(config.events.silent);
    }

    #[test]
    fn test_invalid_document_is_an_error() {
        assert!(Config::from_json_str("not json").is_err());
    }
}
