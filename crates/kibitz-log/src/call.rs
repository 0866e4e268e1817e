//! Log call construction and positional normalization.
//!
//! [`LogCall`] is the tagged-argument form: every field explicit and
//! optional. [`normalize`] converts the historical positional form — up to
//! four loosely-typed arguments — into a `LogCall` using the exact
//! disambiguation rules host call sites rely on:
//!
//! 1. A leading string starting with the configured context flag is a
//!    context token; it is stripped and the remaining arguments shift left.
//!    With contexts disabled the token is dropped entirely.
//! 2. One remaining argument: it is the message (kind defaults to `log`);
//!    a structured value becomes the attached object with an empty message.
//! 3. Two remaining arguments: a structured first value is the object (kind
//!    `log`); otherwise the first is the kind, and a structured second value
//!    is the object with an empty message.
//! 4. Three-plus remaining arguments: kind, then message — but a structured
//!    value in the message position becomes the object and the next
//!    argument is the real message. A structured value *after* a textual
//!    message does not attach; use [`LogCall::object`] for that.

use serde_json::Value;

/// One positional argument: plain text or a structured value.
#[derive(Debug, Clone)]
pub enum LogArg {
    Text(String),
    Object(Value),
}

impl From<&str> for LogArg {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for LogArg {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Value> for LogArg {
    fn from(value: Value) -> Self {
        Self::Object(value)
    }
}

impl LogArg {
    fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Object(_) => None,
        }
    }
}

/// A fully-tagged log call.
///
/// ```
/// use kibitz_log::LogCall;
/// use serde_json::json;
///
/// let call = LogCall::new()
///     .kind("info")
///     .message("saving")
///     .object(json!({ "items": 3 }));
/// assert_eq!(call.kind.as_deref(), Some("info"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct LogCall {
    /// Explicit context token (bare name, no flag prefix). Establishes a new
    /// context when none is active, otherwise nests a subcontext.
    pub context: Option<String>,
    /// Log kind; defaults to `log` when absent.
    pub kind: Option<String>,
    pub message: Option<String>,
    /// Structured value rendered alongside the message.
    pub object: Option<Value>,
}

impl LogCall {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn object(mut self, object: Value) -> Self {
        self.object = Some(object);
        self
    }
}

/// Normalize a positional argument list into a [`LogCall`].
pub(crate) fn normalize(args: &[LogArg], contexts_enabled: bool, context_flag: &str) -> LogCall {
    let mut call = LogCall::new();

    let rest = match args.first() {
        Some(LogArg::Text(first)) if !context_flag.is_empty() && first.starts_with(context_flag) => {
            if contexts_enabled {
                call.context = Some(first[context_flag.len()..].to_string());
            }
            &args[1..]
        }
        _ => args,
    };

    match rest {
        [] => {}
        [only] => match only {
            LogArg::Text(message) => call.message = Some(message.clone()),
            LogArg::Object(object) => {
                call.object = Some(object.clone());
                call.message = Some(String::new());
            }
        },
        [first, second] => match first {
            LogArg::Object(object) => {
                call.object = Some(object.clone());
                call.message = Some(second.as_text().unwrap_or_default().to_string());
            }
            LogArg::Text(kind) => {
                call.kind = Some(kind.clone());
                match second {
                    LogArg::Text(message) => call.message = Some(message.clone()),
                    LogArg::Object(object) => {
                        call.object = Some(object.clone());
                        call.message = Some(String::new());
                    }
                }
            }
        },
        [first, second, third, ..] => {
            match first {
                LogArg::Text(kind) => call.kind = Some(kind.clone()),
                LogArg::Object(object) => call.object = Some(object.clone()),
            }
            match second {
                LogArg::Text(message) => call.message = Some(message.clone()),
                LogArg::Object(object) => {
                    call.object = Some(object.clone());
                    call.message = Some(third.as_text().unwrap_or_default().to_string());
                }
            }
        }
    }

    call
}
