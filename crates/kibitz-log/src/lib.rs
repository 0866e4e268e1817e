//! The overlay's structured logger.
//!
//! Every log call flows through one pipeline:
//!
//! ```text
//! LogCall ──► context resolution ──► kind filter ──► format
//!                                                      │
//!                    ┌─────────────────────────────────┤
//!                    ▼                  ▼              ▼
//!              console buffer      "gui/log"       tracing
//!              (percent-encoded)   (when a console  (kind → level)
//!                                   is attached)
//! ```
//!
//! Calls are built either with the [`LogCall`] builder (explicit optional
//! fields) or from a positional argument list via [`Logger::log_args`],
//! which preserves the historical disambiguation rules host call sites
//! depend on — see [`call`].
//!
//! Logging never fails and never panics: misuse is reported as error-typed
//! entries through the logger itself, and a failed `gui/log` publication is
//! dropped with a tracing warning.
//!
//! # Contexts
//!
//! At most one context is active at a time, set by
//! [`Logger::begin_context`] / cleared by [`Logger::end_context`] or
//! established by the first context-tokenized call. A tokenized call while a
//! context is active nests a one-shot *subcontext* under it instead of
//! replacing it. Display precedence: subcontext, else context, else the
//! configured application name.

pub mod call;
pub mod format;
mod logger;

pub use call::{LogArg, LogCall};
pub use logger::Logger;
