//! Log line formatting.

use chrono::Local;
use serde_json::Value;

/// Current time as `HH:MM:SS.mmm`.
#[must_use]
pub fn ftime() -> String {
    Local::now().format("%H:%M:%S%.3f").to_string()
}

/// Current date as `YYYY-MM-DD`.
#[must_use]
pub fn fdate() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Assemble one display line: `<timestamp> [<label>] [<kind>]:> <message>`.
#[must_use]
pub fn compose_line(timestamp: &str, label: &str, kind: &str, message: &str) -> String {
    format!("{timestamp} [{label}] [{kind}]:> {message}")
}

/// Map every whitespace character to a plain space.
#[must_use]
pub fn flatten_whitespace(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect()
}

/// Render an attached object for display: `Object <pretty JSON>`.
#[must_use]
pub fn object_dump(object: &Value) -> String {
    let pretty = serde_json::to_string_pretty(object)
        .unwrap_or_else(|_| String::from("<unprintable>"));
    format!("Object {pretty}")
}

/// Assemble the percent-encoded buffer form of a display line, with the
/// object postfix (full dump or placeholder) and trailing newline.
#[must_use]
pub fn buffer_line(line: &str, object_dump: Option<&str>, include_object: bool) -> String {
    let mut out = urlencoding::encode(&flatten_whitespace(line)).into_owned();
    match object_dump {
        Some(dump) if include_object => {
            out.push('\n');
            out.push_str(dump);
        }
        Some(_) => {
            out.push('\n');
            out.push_str("[object omitted]");
        }
        None => {}
    }
    out.push('\n');
    out
}
