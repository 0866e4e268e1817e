//! Topic names the overlay publishes and consumes.
//!
//! These strings are the overlay's wire surface — external listeners match
//! on them verbatim, so they are fixed constants rather than derived from
//! configuration.

/// A formatted log entry ready for rendering.
/// Payload: `{ msg, type, obj, context, subcontext }`.
pub const GUI_LOG: &str = "gui/log";

/// Request to drop a named rendering context. Payload: the context name.
pub const CONTEXT_CLEAR: &str = "gui/contexts/clear";

/// Component attach/detach announcements.
/// Payload: `{ component, status }`.
pub const STATUS: &str = "kbs/status";

/// The overlay finished attaching.
pub const LOADED: &str = "kbs/loaded";

/// Request for the GUI to refresh itself (autoscroll etc.).
pub const GUI_UPDATE: &str = "gui/update";

/// Aggregate modal lifecycle topic, e.g. `gui/modal/open`.
#[must_use]
pub fn modal(event: &str) -> String {
    format!("gui/modal/{event}")
}

/// Per-modal lifecycle topic, e.g. `gui/modal/settings/open`.
#[must_use]
pub fn modal_view(view: &str, event: &str) -> String {
    format!("gui/modal/{view}/{event}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modal_topic_shapes() {
        assert_eq!(modal("open"), "gui/modal/open");
        assert_eq!(modal_view("settings", "confirm"), "gui/modal/settings/confirm");
    }
}
