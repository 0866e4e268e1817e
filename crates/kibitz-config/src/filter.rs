//! The log kind blocklist.

use kibitz_core::matching;
use serde::{Deserialize, Serialize};

/// Blocklist of log kinds, as configured under `logs.filter`.
///
/// The persisted forms mirror the configurator surface: `false` (filtering
/// off), a single kind, or a list of kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogFilter {
    /// `false` disables filtering. `true` carries no kind names and is
    /// treated the same.
    Switch(bool),
    One(String),
    Many(Vec<String>),
}

impl Default for LogFilter {
    fn default() -> Self {
        Self::Switch(false)
    }
}

impl LogFilter {
    /// Whether any filtering is configured.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Switch(_))
    }

    /// Whether a log of `kind` should be dropped.
    #[must_use]
    pub fn suppresses(&self, kind: &str, mode: FilterMode) -> bool {
        let whole_word = mode == FilterMode::Word;
        match self {
            Self::Switch(_) => false,
            Self::One(entry) => matching::contains(entry, kind, whole_word),
            Self::Many(entries) => matching::list_contains(entries, kind, whole_word),
        }
    }
}

/// How filter entries match log kinds.
///
/// The original deployments mixed whole-word and substring matching between
/// call sites; here the policy is a single explicit configuration knob
/// (`logs.filterMode`) applied uniformly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Entries match whole words only: `debug` suppresses `debug`, not
    /// `debugger`.
    #[default]
    Word,
    /// Entries match anywhere in the kind name.
    Substring,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_is_inactive() {
        assert!(!LogFilter::Switch(false).is_active());
        assert!(!LogFilter::Switch(true).is_active());
        assert!(!LogFilter::Switch(false).suppresses("debug", FilterMode::Word));
    }

    #[test]
    fn test_word_mode_boundaries() {
        let filter = LogFilter::Many(vec!["debug".into()]);
        assert!(filter.suppresses("debug", FilterMode::Word));
        assert!(!filter.suppresses("debugger", FilterMode::Word));
    }

    #[test]
    fn test_substring_mode() {
        let filter = LogFilter::One("debugging noise".into());
        assert!(filter.suppresses("debug", FilterMode::Substring));
        assert!(!filter.suppresses("debug", FilterMode::Word));
    }

    #[test]
    fn test_deserialize_all_shapes() {
        assert_eq!(
            serde_json::from_str::<LogFilter>("false").unwrap(),
            LogFilter::Switch(false)
        );
        assert_eq!(
            serde_json::from_str::<LogFilter>(r#""debug""#).unwrap(),
            LogFilter::One("debug".into())
        );
        assert_eq!(
            serde_json::from_str::<LogFilter>(r#"["debug", "info"]"#).unwrap(),
            LogFilter::Many(vec!["debug".into(), "info".into()])
        );
    }
}
