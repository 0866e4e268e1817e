//! Modal view loading.
//!
//! Views are fetched through a callback continuation: the loader may
//! complete synchronously, on a later turn, or never. A modal whose view
//! never arrives simply never progresses past its loading state — the core
//! does not block and does not time out.

use crate::dom::{Dom, NodeId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// View name of the built-in console-destruction prompt.
pub const DESTROY_CONSOLE_VIEW: &str = "destroy-console";

type RenderFn = Arc<dyn Fn(&dyn Dom, NodeId) + Send + Sync>;

/// A loaded view: a title and a body renderer.
#[derive(Clone)]
pub struct ViewSpec {
    pub title: String,
    render: RenderFn,
}

impl ViewSpec {
    pub fn new<F>(title: impl Into<String>, render: F) -> Self
    where
        F: Fn(&dyn Dom, NodeId) + Send + Sync + 'static,
    {
        Self {
            title: title.into(),
            render: Arc::new(render),
        }
    }

    /// A view with a title and an empty body.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self::new(title, |_, _| {})
    }

    /// Draw the view body into `body`.
    pub fn render(&self, dom: &dyn Dom, body: NodeId) {
        (self.render)(dom, body);
    }
}

impl std::fmt::Debug for ViewSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewSpec").field("title", &self.title).finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("no view registered under '{0}'")]
    UnknownView(String),
}

/// Continuation invoked when a view load completes.
pub type ViewCallback = Box<dyn FnOnce(Result<ViewSpec, ViewError>) + Send>;

/// Asynchronous view source.
pub trait ViewLoader: Send + Sync {
    fn load(&self, view: &str, done: ViewCallback);
}

/// A loader over views registered up front. Completes callbacks
/// synchronously, which is the common case for embeddings that ship their
/// views with the overlay.
#[derive(Default)]
pub struct StaticViews {
    views: Mutex<HashMap<String, ViewSpec>>,
}

impl StaticViews {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty registry plus the views the overlay itself needs.
    #[must_use]
    pub fn with_builtins() -> Self {
        let views = Self::new();
        views.register(DESTROY_CONSOLE_VIEW, ViewSpec::titled("Destroy console"));
        views
    }

    pub fn register(&self, name: impl Into<String>, spec: ViewSpec) {
        self.views.lock().insert(name.into(), spec);
    }
}

impl ViewLoader for StaticViews {
    fn load(&self, view: &str, done: ViewCallback) {
        let spec = self.views.lock().get(view).cloned();
        match spec {
            Some(spec) => done(Ok(spec)),
            None => done(Err(ViewError::UnknownView(view.to_string()))),
        }
    }
}
