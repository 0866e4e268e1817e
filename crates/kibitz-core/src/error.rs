//! Error types for the core event machinery.

use thiserror::Error;

/// Errors surfaced by [`EventBus`](crate::EventBus) operations.
///
/// Publishing to a topic nobody has ever subscribed to is a wiring mistake in
/// the embedding application and is reported loudly unless the bus was
/// configured silent. Handler failures are not represented here: handlers run
/// on the publisher's call stack and any panic propagates to the publisher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// The topic has never been subscribed to.
    #[error("event topic '{0}' does not exist")]
    TopicNotFound(String),
}
