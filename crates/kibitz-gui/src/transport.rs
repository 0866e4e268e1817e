//! Outbound save transport.
//!
//! Saving the console buffer is a fire-and-forget POST of
//! `{ type, date, buffer }` to the configured save route. The transport is a
//! collaborator: the core hands it a request and a single completion
//! callback, and never retries — success or failure is reported once.

use serde::Serialize;
use thiserror::Error;

/// The save payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveRequest {
    /// Buffer category, e.g. `log`.
    #[serde(rename = "type")]
    pub kind: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    /// The raw buffer contents.
    pub buffer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("save request failed: {0}")]
    Failed(String),
}

/// Continuation invoked once when the request settles.
pub type TransportCallback = Box<dyn FnOnce(Result<String, TransportError>) + Send>;

pub trait SaveTransport: Send + Sync {
    fn post(&self, route: &str, request: SaveRequest, done: TransportCallback);
}

/// Transport for embeddings with nowhere to save to: every request settles
/// immediately as a failure, which the console reports as a single error
/// entry.
#[derive(Debug, Default)]
pub struct NullTransport;

impl SaveTransport for NullTransport {
    fn post(&self, _route: &str, _request: SaveRequest, done: TransportCallback) {
        done(Err(TransportError::Failed(
            "no save transport configured".to_string(),
        )));
    }
}
