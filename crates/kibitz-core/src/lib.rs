//! Core plumbing for the kibitz overlay.
//!
//! This crate holds the pieces everything else is wired through:
//!
//! - [`EventBus`]: named-topic publish/subscribe with synchronous,
//!   subscription-ordered delivery
//! - [`Buffer`] / [`BufferPool`]: append-only log accumulators, one slot
//!   per channel
//! - [`Cache`]: the conventional `app` + `console` buffer channels
//! - [`StatusRegistry`]: which overlay components are currently attached
//! - [`topics`]: the topic names the overlay publishes and consumes
//! - [`matching`]: substring / whole-word containment used by the log filter
//!
//! # Architecture
//!
//! ```text
//! caller ──► Logger ──► Buffer (console channel)
//!               │
//!               └──► EventBus ──► "gui/log" ──► Console (render consumer)
//!
//! Modal ──► EventBus ──► "gui/modal/<view>/<event>"  (targeted listeners)
//!               └──────► "gui/modal/<event>"         (aggregate observers)
//! ```
//!
//! All registries are plain values intended to be wrapped in `Arc` and passed
//! into constructors — there are no ambient globals. The runtime model is one
//! cooperative thread: dispatch is synchronous and in subscription order, and
//! the only suspension points are the callback continuations of external
//! collaborators (view loading, save transport).

pub mod buffer;
pub mod cache;
pub mod error;
pub mod events;
pub mod matching;
pub mod status;
pub mod topics;

pub use buffer::{Buffer, BufferContents, BufferKind, BufferPool};
pub use cache::Cache;
pub use error::EventError;
pub use events::{envelope, EventBus, Handler};
pub use status::{component, StatusRegistry};
