//! Substring and whole-word containment.
//!
//! Backs the log type filter: whole-word mode matches the needle only at
//! word boundaries, so a filter entry `debug` suppresses `debug` but not
//! `debugger`.

use regex::Regex;

/// Whether `host` contains `target`. In whole-word mode the target must sit
/// at word boundaries (`(\W|^)target(\W|$)` with the target escaped).
///
/// An empty target never matches.
#[must_use]
pub fn contains(host: &str, target: &str, whole_word: bool) -> bool {
    if target.is_empty() {
        return false;
    }
    if !whole_word {
        return host.contains(target);
    }
    word_pattern(target).is_match(host)
}

/// Whether any element of `hosts` contains `target`.
#[must_use]
pub fn list_contains(hosts: &[String], target: &str, whole_word: bool) -> bool {
    hosts.iter().any(|host| contains(host, target, whole_word))
}

fn word_pattern(target: &str) -> Regex {
    let pattern = format!(r"(\W|^){}(\W|$)", regex::escape(target));
    // An escaped needle inside a fixed wrapper is always a valid pattern.
    Regex::new(&pattern).expect("escaped needle forms a valid pattern")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_mode() {
        assert!(contains("debugger", "debug", false));
        assert!(contains("a debug b", "debug", false));
        assert!(!contains("info", "debug", false));
    }

    #[test]
    fn test_whole_word_mode_respects_boundaries() {
        assert!(contains("debug", "debug", true));
        assert!(contains("a debug b", "debug", true));
        assert!(contains("[debug]", "debug", true));
        assert!(!contains("debugger", "debug", true));
        assert!(!contains("undebug", "debug", true));
    }

    #[test]
    fn test_regex_metacharacters_are_escaped() {
        assert!(contains("a c.d b", "c.d", true));
        assert!(!contains("a cxd b", "c.d", true));
        assert!(contains("x (y) z", "(y)", true));
    }

    #[test]
    fn test_empty_target_never_matches() {
        assert!(!contains("anything", "", false));
        assert!(!contains("anything", "", true));
    }

    #[test]
    fn test_list_contains() {
        let hosts = vec!["debug".to_string(), "info".to_string()];
        assert!(list_contains(&hosts, "debug", true));
        assert!(!list_contains(&hosts, "debugger", true));
        assert!(list_contains(&hosts, "inf", false));
    }
}
