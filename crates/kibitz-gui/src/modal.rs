//! A single modal view.
//!
//! Lifecycle:
//!
//! ```text
//! uninitialized ──load──► loaded ──init──► inited+open ◄──► inited+closed
//!                                              │
//!                                          destroy (terminal; view name freed)
//! ```
//!
//! Instances are memoized by view name — construct them through
//! [`ModalController::modal`](crate::controller::ModalController::modal).
//! Re-initializing an inited modal re-opens it rather than rebuilding, and
//! opening while another modal is on screen defers to the controller's
//! queueing/hopping policy.
//!
//! Every transition publishes twice: on the per-modal topic
//! (`gui/modal/<view>/<event>`) for targeted listeners, then on the
//! aggregate topic (`gui/modal/<event>`) for global observation. Confirm,
//! cancel, and proceed interactions also route through the bus, so the
//! supplied actions run exactly where a targeted listener would; a missing
//! action degrades to a warn-typed log entry instead of an error.

use crate::controller::ModalController;
use crate::dom::NodeId;
use crate::view::ViewSpec;
use kibitz_core::Handler;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::{Arc, Weak};

/// Modal lifecycle events, in the order they usually occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalEvent {
    Init,
    Load,
    Open,
    Close,
    Destruct,
    Confirm,
    Proceed,
    Cancel,
}

impl ModalEvent {
    pub const ALL: [ModalEvent; 8] = [
        ModalEvent::Init,
        ModalEvent::Load,
        ModalEvent::Open,
        ModalEvent::Close,
        ModalEvent::Destruct,
        ModalEvent::Confirm,
        ModalEvent::Proceed,
        ModalEvent::Cancel,
    ];

    /// The user-interaction events that dispatch to supplied actions.
    pub const ACTIONS: [ModalEvent; 3] =
        [ModalEvent::Confirm, ModalEvent::Cancel, ModalEvent::Proceed];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Load => "load",
            Self::Open => "open",
            Self::Close => "close",
            Self::Destruct => "destruct",
            Self::Confirm => "confirm",
            Self::Proceed => "proceed",
            Self::Cancel => "cancel",
        }
    }
}

impl std::fmt::Display for ModalEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an instance is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalState {
    Uninitialized,
    /// A view load is in flight. The continuation may land on a later turn
    /// or never; until it does the modal stays here.
    Loading,
    Loaded,
    /// DOM built and attached; the open/closed distinction lives in the
    /// controller's open set.
    Inited,
}

/// Handler for a user interaction, receiving the interaction's args payload.
pub type ModalAction = Arc<dyn Fn(&Value) + Send + Sync>;

/// Construction parameters for [`ModalController::modal`].
///
/// `title` falls back to the loaded view's title when absent. Actions left
/// unset degrade to logged warnings when invoked.
#[derive(Clone, Default)]
pub struct ModalParams {
    pub title: Option<String>,
    pub message: Option<String>,
    pub confirm: Option<ModalAction>,
    pub cancel: Option<ModalAction>,
    pub proceed: Option<ModalAction>,
    /// Initialize (load, build, open) immediately on construction.
    pub auto_init: bool,
}

impl ModalParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn on_confirm<F>(mut self, action: F) -> Self
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.confirm = Some(Arc::new(action));
        self
    }

    #[must_use]
    pub fn on_cancel<F>(mut self, action: F) -> Self
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.cancel = Some(Arc::new(action));
        self
    }

    #[must_use]
    pub fn on_proceed<F>(mut self, action: F) -> Self
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.proceed = Some(Arc::new(action));
        self
    }

    #[must_use]
    pub fn auto_init(mut self) -> Self {
        self.auto_init = true;
        self
    }
}

impl std::fmt::Debug for ModalParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModalParams")
            .field("title", &self.title)
            .field("message", &self.message)
            .field("confirm", &self.confirm.is_some())
            .field("cancel", &self.cancel.is_some())
            .field("proceed", &self.proceed.is_some())
            .field("auto_init", &self.auto_init)
            .finish()
    }
}

/// One modal instance, uniquely identified by its view name.
pub struct Modal {
    view: String,
    controller: Weak<ModalController>,
    state: Mutex<ModalState>,
    node: Mutex<Option<NodeId>>,
    title: Mutex<String>,
    message: String,
    confirm: Option<ModalAction>,
    cancel: Option<ModalAction>,
    proceed: Option<ModalAction>,
    spec: Mutex<Option<ViewSpec>>,
    /// Per-view bus subscriptions installed at registration, removed again
    /// when the modal leaves the registry.
    subscriptions: Mutex<Vec<(String, Handler)>>,
}

impl Modal {
    pub(crate) fn with(
        view: &str,
        params: ModalParams,
        controller: Weak<ModalController>,
    ) -> Self {
        Self {
            view: view.to_string(),
            controller,
            state: Mutex::new(ModalState::Uninitialized),
            node: Mutex::new(None),
            title: Mutex::new(params.title.unwrap_or_default()),
            message: params.message.unwrap_or_default(),
            confirm: params.confirm,
            cancel: params.cancel,
            proceed: params.proceed,
            spec: Mutex::new(None),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn view(&self) -> &str {
        &self.view
    }

    #[must_use]
    pub fn state(&self) -> ModalState {
        *self.state.lock()
    }

    #[must_use]
    pub fn title(&self) -> String {
        self.title.lock().clone()
    }

    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        *self.node.lock()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.controller
            .upgrade()
            .is_some_and(|ctrl| ctrl.is_open(self.view.as_str()))
    }

    pub(crate) fn action(&self, event: ModalEvent) -> Option<ModalAction> {
        match event {
            ModalEvent::Confirm => self.confirm.clone(),
            ModalEvent::Cancel => self.cancel.clone(),
            ModalEvent::Proceed => self.proceed.clone(),
            _ => None,
        }
    }

    pub(crate) fn record_subscription(&self, topic: String, handler: Handler) {
        self.subscriptions.lock().push((topic, handler));
    }

    pub(crate) fn take_subscriptions(&self) -> Vec<(String, Handler)> {
        std::mem::take(&mut *self.subscriptions.lock())
    }

    /// Initialize this modal: load its view if necessary, build and attach
    /// its node, then open. Re-initializing an inited modal just re-opens.
    pub fn init(self: &Arc<Self>) {
        let Some(ctrl) = self.controller.upgrade() else {
            return;
        };
        match self.state() {
            ModalState::Inited => self.open(),
            ModalState::Loading => {}
            ModalState::Loaded => self.build_and_open(&ctrl),
            ModalState::Uninitialized => {
                *self.state.lock() = ModalState::Loading;
                let weak = Arc::downgrade(self);
                ctrl.loader().load(
                    &self.view,
                    Box::new(move |result| {
                        let Some(modal) = weak.upgrade() else {
                            return;
                        };
                        match result {
                            Ok(spec) => modal.finish_load(spec),
                            Err(err) => modal.fail_load(&err.to_string()),
                        }
                    }),
                );
            }
        }
    }

    fn finish_load(self: &Arc<Self>, spec: ViewSpec) {
        {
            let mut title = self.title.lock();
            if title.is_empty() {
                *title = spec.title.clone();
            }
        }
        *self.spec.lock() = Some(spec);
        *self.state.lock() = ModalState::Loaded;

        let Some(ctrl) = self.controller.upgrade() else {
            return;
        };
        ctrl.publish_modal_event(&self.view, ModalEvent::Load);
        self.build_and_open(&ctrl);
    }

    fn fail_load(&self, reason: &str) {
        *self.state.lock() = ModalState::Uninitialized;
        if let Some(ctrl) = self.controller.upgrade() {
            ctrl.logger()
                .error(&format!("modal '{}' view failed to load: {reason}", self.view));
        }
    }

    fn build_and_open(self: &Arc<Self>, ctrl: &Arc<ModalController>) {
        let dom = ctrl.dom();

        let wrapper = dom.create_node("div", &format!("kbs-modal kbs-modal-{}", self.view), None);
        dom.hide(wrapper);

        let title_node = dom.create_node("h2", "kbs-modal-title", None);
        dom.set_text(title_node, &self.title());
        dom.append_child(wrapper, title_node);

        if !self.message.is_empty() {
            let message_node = dom.create_node("p", "kbs-modal-msg", None);
            dom.set_text(message_node, &self.message);
            dom.append_child(wrapper, message_node);
        }

        let body = dom.create_node("div", "kbs-modal-body", None);
        dom.append_child(wrapper, body);
        let spec = self.spec.lock().clone();
        if let Some(spec) = spec {
            spec.render(dom.as_ref(), body);
        }

        dom.append_child(dom.root(), wrapper);
        *self.node.lock() = Some(wrapper);
        *self.state.lock() = ModalState::Inited;

        ctrl.publish_modal_event(&self.view, ModalEvent::Init);
        self.open();
    }

    /// Show this modal. Defers to the controller's policy when another modal
    /// is open; initializes first when not yet built. No-op when already
    /// open.
    pub fn open(self: &Arc<Self>) {
        let Some(ctrl) = self.controller.upgrade() else {
            return;
        };
        if ctrl.is_open(self.view.as_str()) {
            return;
        }
        if ctrl.another_open(&self.view) {
            ctrl.add_to_queue(self);
            return;
        }
        if self.state() != ModalState::Inited {
            self.init();
            return;
        }
        if let Some(node) = self.node() {
            ctrl.dom().show(node);
        }
        ctrl.mark_open(&self.view);
        ctrl.publish_modal_event(&self.view, ModalEvent::Open);
    }

    /// Hide this modal and release the screen. Does not destroy.
    pub fn close(self: &Arc<Self>) {
        let Some(ctrl) = self.controller.upgrade() else {
            return;
        };
        if let Some(node) = self.node() {
            ctrl.dom().hide(node);
        }
        ctrl.mark_closed(&self.view);
        ctrl.publish_modal_event(&self.view, ModalEvent::Close);
    }

    /// Tear this modal down: close if open, drop the node, leave the
    /// registry. The view name becomes available for a fresh instance.
    pub fn destroy(self: &Arc<Self>) {
        let Some(ctrl) = self.controller.upgrade() else {
            return;
        };
        if ctrl.is_open(self.view.as_str()) {
            self.close();
        }
        *self.state.lock() = ModalState::Uninitialized;
        *self.spec.lock() = None;
        if let Some(node) = self.node.lock().take() {
            ctrl.dom().remove(node);
        }
        ctrl.remove_modal(&self.view);
        ctrl.publish_modal_event(&self.view, ModalEvent::Destruct);
    }

    /// Fire the confirm interaction with an args payload.
    pub fn confirm(&self, args: &Value) {
        self.fire(ModalEvent::Confirm, args);
    }

    /// Fire the cancel interaction with an args payload.
    pub fn cancel(&self, args: &Value) {
        self.fire(ModalEvent::Cancel, args);
    }

    /// Fire the proceed interaction with an args payload (e.g. the value of
    /// an input view).
    pub fn proceed(&self, args: &Value) {
        self.fire(ModalEvent::Proceed, args);
    }

    fn fire(&self, event: ModalEvent, args: &Value) {
        if let Some(ctrl) = self.controller.upgrade() {
            ctrl.publish_modal_event_with(&self.view, event, args);
        }
    }
}

impl std::fmt::Debug for Modal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Modal")
            .field("view", &self.view)
            .field("state", &self.state())
            .finish()
    }
}
