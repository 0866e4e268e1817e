//! The logger itself.

use crate::call::{normalize, LogArg, LogCall};
use crate::format;
use kibitz_config::Config;
use kibitz_core::{component, topics, Buffer, EventBus, StatusRegistry};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

/// Formats structured log entries, manages the active context slot, applies
/// the kind filter, writes the console buffer channel, and publishes render
/// events.
///
/// One logger per overlay instance. All collaborators are injected; the
/// logger holds no ambient state beyond its own context slot.
pub struct Logger {
    config: Arc<Config>,
    bus: Arc<EventBus>,
    status: Arc<StatusRegistry>,
    sink: Buffer,
    active_context: Mutex<Option<String>>,
}

impl Logger {
    pub fn new(
        config: Arc<Config>,
        bus: Arc<EventBus>,
        status: Arc<StatusRegistry>,
        sink: Buffer,
    ) -> Self {
        Self {
            config,
            bus,
            status,
            sink,
            active_context: Mutex::new(None),
        }
    }

    /// Record one entry. Infallible by contract: logging must never crash
    /// the code that logs.
    pub fn log(&self, call: LogCall) {
        let logs = &self.config.logs;
        if !logs.enabled {
            return;
        }

        let (context, subcontext) = self.resolve_context(call.context);

        let kind = call.kind.unwrap_or_else(|| "log".to_string());
        if logs.filter.is_active() && logs.filter.suppresses(&kind, logs.filter_mode) {
            return;
        }

        let message = call.message.unwrap_or_default();
        let label = subcontext
            .as_deref()
            .or(context.as_deref())
            .unwrap_or(&self.config.app_name)
            .to_string();
        let line = format::compose_line(&format::ftime(), &label, &kind, &message);
        let dump = call.object.as_ref().map(format::object_dump);

        self.sink
            .write(&format::buffer_line(&line, dump.as_deref(), logs.obj2buffer));

        if logs.gui && self.status.get(component::CONSOLE) {
            let payload = json!({
                "msg": format::flatten_whitespace(&line),
                "type": kind,
                "obj": dump.as_deref().unwrap_or(""),
                "context": context,
                "subcontext": subcontext,
            });
            if let Err(err) = self.bus.publish(topics::GUI_LOG, &payload) {
                tracing::warn!(%err, "dropping gui log event");
            }
        }

        match kind.as_str() {
            "error" => tracing::error!(context = %label, "{message}"),
            "warn" => tracing::warn!(context = %label, "{message}"),
            "debug" => tracing::debug!(context = %label, "{message}"),
            _ => tracing::info!(context = %label, kind = %kind, "{message}"),
        }
    }

    /// Record one entry from a positional argument list (see
    /// [`crate::call`] for the normalization rules).
    pub fn log_args(&self, args: &[LogArg]) {
        let logs = &self.config.logs;
        if !logs.enabled {
            return;
        }
        self.log(normalize(args, logs.contexts, &logs.context_flag));
    }

    /// Shorthand for a kind + message entry.
    pub fn entry(&self, kind: &str, message: &str) {
        self.log(LogCall::new().kind(kind).message(message));
    }

    pub fn info(&self, message: &str) {
        self.entry("info", message);
    }

    pub fn debug(&self, message: &str) {
        self.entry("debug", message);
    }

    pub fn warn(&self, message: &str) {
        self.entry("warn", message);
    }

    pub fn error(&self, message: &str) {
        self.entry("error", message);
    }

    /// Success entries use the `okay` kind.
    pub fn okay(&self, message: &str) {
        self.entry("okay", message);
    }

    /// Begin a continuous logging context. Callers pass the bare name —
    /// a flagged name is reported as an error-typed entry and ignored.
    pub fn begin_context(&self, name: &str) {
        if !self.config.logs.contexts {
            return;
        }
        if name.contains(&self.config.logs.context_flag) {
            self.error("the context flag must not be passed to begin_context");
            return;
        }
        *self.active_context.lock() = Some(name.to_string());
    }

    /// End the active context unconditionally.
    pub fn end_context(&self) {
        *self.active_context.lock() = None;
    }

    /// The currently active context, if any.
    #[must_use]
    pub fn current_context(&self) -> Option<String> {
        self.active_context.lock().clone()
    }

    /// Ask consumers to drop a named rendering context. Does not touch the
    /// active-context slot.
    pub fn clear_context(&self, name: &str) {
        if let Err(err) = self.bus.publish(topics::CONTEXT_CLEAR, &json!(name)) {
            tracing::warn!(%err, "dropping context clear event");
        }
    }

    /// Resolve the display context pair for one call.
    ///
    /// An explicit token establishes a new active context when none exists;
    /// when one is active the token nests as a subcontext and the slot is
    /// left alone. Tokenless calls inherit the active context.
    fn resolve_context(&self, token: Option<String>) -> (Option<String>, Option<String>) {
        if !self.config.logs.contexts {
            return (None, None);
        }
        let mut active = self.active_context.lock();
        match token {
            Some(token) => match active.clone() {
                Some(current) => (Some(current), Some(token)),
                None => {
                    *active = Some(token.clone());
                    (Some(token), None)
                }
            },
            None => (active.clone(), None),
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("context", &self.current_context())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kibitz_config::{FilterMode, LogFilter};
    use kibitz_core::{BufferPool, Handler};
    use parking_lot::Mutex as PlMutex;
    use serde_json::Value;
    use tracing_test::traced_test;

    struct Fixture {
        logger: Logger,
        bus: Arc<EventBus>,
        status: Arc<StatusRegistry>,
        sink: Buffer,
    }

    fn fixture(config: Config) -> Fixture {
        let config = Arc::new(config);
        let bus = Arc::new(EventBus::new(config.events.silent));
        let status = StatusRegistry::new();
        let pool = BufferPool::new();
        let sink = Buffer::text(&pool);
        let logger = Logger::new(
            Arc::clone(&config),
            Arc::clone(&bus),
            Arc::clone(&status),
            sink.clone(),
        );
        Fixture {
            logger,
            bus,
            status,
            sink,
        }
    }

    fn buffer_lines(sink: &Buffer) -> Vec<String> {
        let contents = sink.contents();
        let text = contents.as_text().unwrap();
        text.lines()
            .map(|line| urlencoding::decode(line).unwrap().into_owned())
            .collect()
    }

    #[test]
    fn test_disabled_logging_is_a_total_noop() {
        let mut config = Config::default();
        config.logs.enabled = false;
        let fx = fixture(config);
        fx.status.set(component::CONSOLE, true);

        fx.logger.info("dropped");
        fx.logger.log_args(&["also dropped".into()]);

        assert!(fx.sink.contents().is_empty());
        assert!(!fx.bus.topic_exists(topics::GUI_LOG));
    }

    #[test]
    fn test_basic_entry_lands_in_buffer_with_app_name_label() {
        let fx = fixture(Config::default());
        fx.logger.entry("info", "ready");

        let lines = buffer_lines(&fx.sink);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("[kbs] [info]:> ready"), "{}", lines[0]);
    }

    #[test]
    fn test_single_argument_defaults_kind_to_log() {
        let fx = fixture(Config::default());
        fx.logger.log_args(&["just a message".into()]);

        let lines = buffer_lines(&fx.sink);
        assert!(lines[0].contains("[log]:> just a message"));
    }

    #[test]
    fn test_context_token_establishes_and_persists() {
        let fx = fixture(Config::default());

        fx.logger
            .log_args(&["context:save".into(), "info".into(), "starting".into()]);
        assert_eq!(fx.logger.current_context().as_deref(), Some("save"));

        fx.logger.log_args(&["info".into(), "done".into()]);

        let lines = buffer_lines(&fx.sink);
        assert!(lines[0].contains("[save] [info]:> starting"));
        assert!(lines[1].contains("[save] [info]:> done"));

        fx.logger.end_context();
        fx.logger.log_args(&["info".into(), "idle".into()]);
        let lines = buffer_lines(&fx.sink);
        assert!(lines[2].contains("[kbs] [info]:> idle"));
    }

    #[test]
    fn test_subcontext_nests_without_replacing_active() {
        let fx = fixture(Config::default());
        fx.logger.begin_context("a");

        fx.logger.log(LogCall::new().context("b").kind("info").message("x"));

        // Rendered label is the subcontext; the active slot is untouched.
        let lines = buffer_lines(&fx.sink);
        assert!(lines[0].contains("[b] [info]:> x"));
        assert_eq!(fx.logger.current_context().as_deref(), Some("a"));
    }

    #[test]
    fn test_begin_context_rejects_flagged_names() {
        let fx = fixture(Config::default());
        fx.logger.begin_context("context:save");

        assert_eq!(fx.logger.current_context(), None);
        let lines = buffer_lines(&fx.sink);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("[error]:>"));
    }

    #[test]
    fn test_contexts_disabled_skips_machinery() {
        let mut config = Config::default();
        config.logs.contexts = false;
        let fx = fixture(config);

        fx.logger.begin_context("ignored");
        assert_eq!(fx.logger.current_context(), None);

        // The flagged first argument is dropped, not treated as a kind.
        fx.logger
            .log_args(&["context:save".into(), "info".into(), "x".into()]);
        let lines = buffer_lines(&fx.sink);
        assert!(lines[0].contains("[kbs] [info]:> x"));
    }

    #[test]
    fn test_filter_word_mode_respects_boundaries() {
        let mut config = Config::default();
        config.logs.filter = LogFilter::Many(vec!["debug".into()]);
        config.logs.filter_mode = FilterMode::Word;
        let fx = fixture(config);

        fx.logger.log_args(&["debug".into(), "x".into()]);
        assert!(fx.sink.contents().is_empty());

        fx.logger.log_args(&["debugger".into(), "x".into()]);
        let lines = buffer_lines(&fx.sink);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("[debugger]:> x"));
    }

    #[test]
    fn test_suppressed_entry_publishes_nothing() {
        let mut config = Config::default();
        config.logs.filter = LogFilter::One("debug".into());
        let fx = fixture(config);
        fx.status.set(component::CONSOLE, true);

        let events = Arc::new(PlMutex::new(Vec::<Value>::new()));
        let events_in = Arc::clone(&events);
        fx.bus.subscribe(
            topics::GUI_LOG,
            Handler::new(move |data, _| events_in.lock().push(data.clone())),
        );

        fx.logger.debug("dropped");
        assert!(events.lock().is_empty());
        assert!(fx.sink.contents().is_empty());
    }

    #[test]
    fn test_gui_event_payload_shape() {
        let fx = fixture(Config::default());
        fx.status.set(component::CONSOLE, true);

        let events = Arc::new(PlMutex::new(Vec::<Value>::new()));
        let events_in = Arc::clone(&events);
        fx.bus.subscribe(
            topics::GUI_LOG,
            Handler::new(move |data, _| events_in.lock().push(data.clone())),
        );

        fx.logger.log(
            LogCall::new()
                .context("save")
                .kind("info")
                .message("two  words")
                .object(json!({ "n": 1 })),
        );

        let events = events.lock();
        assert_eq!(events.len(), 1);
        let payload = &events[0];
        assert_eq!(payload["type"], "info");
        assert_eq!(payload["context"], "save");
        assert_eq!(payload["subcontext"], Value::Null);
        assert!(payload["msg"].as_str().unwrap().contains("[save] [info]:> two  words"));
        assert!(payload["obj"].as_str().unwrap().starts_with("Object {"));
    }

    #[test]
    fn test_no_gui_event_when_console_detached() {
        let fx = fixture(Config::default());

        let events = Arc::new(PlMutex::new(0u32));
        let events_in = Arc::clone(&events);
        fx.bus.subscribe(
            topics::GUI_LOG,
            Handler::new(move |_, _| *events_in.lock() += 1),
        );

        fx.logger.info("nobody is rendering");
        assert_eq!(*events.lock(), 0);
        // The buffer still records it.
        assert_eq!(buffer_lines(&fx.sink).len(), 1);
    }

    #[test]
    fn test_no_gui_event_when_gui_logging_disabled() {
        let mut config = Config::default();
        config.logs.gui = false;
        let fx = fixture(config);
        fx.status.set(component::CONSOLE, true);

        fx.logger.info("buffer only");
        assert!(!fx.bus.topic_exists(topics::GUI_LOG));
        assert_eq!(buffer_lines(&fx.sink).len(), 1);
    }

    #[test]
    fn test_console_attached_but_unsubscribed_does_not_panic() {
        // The status flag claims a console, but nothing ever subscribed:
        // the publish error is swallowed, the buffer write survives.
        let fx = fixture(Config::default());
        fx.status.set(component::CONSOLE, true);

        fx.logger.info("still fine");
        assert_eq!(buffer_lines(&fx.sink).len(), 1);
    }

    #[test]
    fn test_object_buffer_placeholder_and_dump() {
        let fx = fixture(Config::default());
        fx.logger
            .log(LogCall::new().message("has object").object(json!({ "k": "v" })));

        let contents = fx.sink.contents();
        assert!(contents.as_text().unwrap().contains("[object omitted]"));

        let mut config = Config::default();
        config.logs.obj2buffer = true;
        let fx = fixture(config);
        fx.logger
            .log(LogCall::new().message("has object").object(json!({ "k": "v" })));
        assert!(fx.sink.contents().as_text().unwrap().contains("Object {"));
    }

    #[test]
    fn test_clear_context_publishes_request() {
        let fx = fixture(Config::default());
        let seen = Arc::new(PlMutex::new(Vec::<Value>::new()));
        let seen_in = Arc::clone(&seen);
        fx.bus.subscribe(
            topics::CONTEXT_CLEAR,
            Handler::new(move |data, _| seen_in.lock().push(data.clone())),
        );

        fx.logger.begin_context("bench");
        fx.logger.clear_context("bench");

        assert_eq!(*seen.lock(), vec![json!("bench")]);
        // The active slot is unaffected.
        assert_eq!(fx.logger.current_context().as_deref(), Some("bench"));
    }

    #[traced_test]
    #[test]
    fn test_kinds_map_to_tracing_levels() {
        let fx = fixture(Config::default());
        fx.logger.warn("warned about something");
        fx.logger.okay("went well");

        assert!(logs_contain("warned about something"));
        assert!(logs_contain("went well"));
    }
}
