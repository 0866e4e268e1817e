//! Configuration for the kibitz overlay.
//!
//! The overlay is configured once at attach time from a [`Config`] value —
//! defaults, optionally a JSON document, optionally a user [`Overrides`]
//! blob on top. Components hold the resulting `Arc<Config>` read-only; there
//! is no runtime reconfiguration.
//!
//! # Quick start
//!
//! ```
//! use kibitz_config::{Config, Overrides};
//!
//! let overrides = Overrides::parse(r#"{ "logs.gui": false }"#).unwrap();
//! let config = overrides.apply_to(&Config::default()).unwrap();
//! assert!(!config.logs.gui);
//! ```
//!
//! The overrides blob — a flat JSON object of dotted paths — is also the
//! persisted user-settings format; see [`SettingsStore`].

mod config;
mod error;
mod filter;
mod overrides;
mod store;

pub use config::{
    Config, ConsoleConfig, EventsConfig, GuiConfig, LogsConfig, ModalBehaviourConfig, ModalsConfig,
};
pub use error::ConfigError;
pub use filter::{FilterMode, LogFilter};
pub use overrides::Overrides;
pub use store::{MemoryStore, SettingsStore, SETTINGS_KEY};
