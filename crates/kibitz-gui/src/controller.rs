//! Modal coordination.
//!
//! The controller owns the modal registry (memoized by view name), the open
//! set, and the queue, and enforces the at-most-one-visible policy:
//!
//! - **Queueing** (default): a modal requested while another is open waits
//!   in FIFO order; every close/destruct pumps the queue.
//! - **Hopping** (`gui.modals.behaviour.modalHopping`): the requested modal
//!   displaces the open one, and a one-shot subscription reopens the
//!   displaced modal — exactly once — when the interloper closes.
//!
//! The controller subscribes to its own aggregate lifecycle topics: that is
//! both the global observation point and the queue pump. Per-view topics are
//! seeded with observers when a modal registers, so targeted listeners can
//! attach at any time and lifecycle publishes can never hit an unknown
//! topic.

use crate::dom::Dom;
use crate::modal::{Modal, ModalEvent, ModalParams};
use crate::view::ViewLoader;
use kibitz_config::Config;
use kibitz_core::{component, topics, EventBus, Handler, StatusRegistry};
use kibitz_log::Logger;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Anything that names a modal view: a name, or a modal instance.
pub trait AsViewName {
    fn view_name(&self) -> &str;
}

impl AsViewName for &str {
    fn view_name(&self) -> &str {
        self
    }
}

impl AsViewName for String {
    fn view_name(&self) -> &str {
        self
    }
}

impl AsViewName for &Modal {
    fn view_name(&self) -> &str {
        self.view()
    }
}

impl AsViewName for &Arc<Modal> {
    fn view_name(&self) -> &str {
        self.view()
    }
}

/// Tracks which modals exist, which is open, and which are waiting.
pub struct ModalController {
    config: Arc<Config>,
    bus: Arc<EventBus>,
    logger: Arc<Logger>,
    dom: Arc<dyn Dom>,
    loader: Arc<dyn ViewLoader>,
    status: Arc<StatusRegistry>,
    modals: Mutex<HashMap<String, Arc<Modal>>>,
    open: Mutex<Vec<String>>,
    queued: Mutex<Vec<String>>,
}

impl ModalController {
    pub fn new(
        config: Arc<Config>,
        bus: Arc<EventBus>,
        logger: Arc<Logger>,
        dom: Arc<dyn Dom>,
        loader: Arc<dyn ViewLoader>,
        status: Arc<StatusRegistry>,
    ) -> Arc<Self> {
        let controller = Arc::new(Self {
            config,
            bus,
            logger,
            dom,
            loader,
            status,
            modals: Mutex::new(HashMap::new()),
            open: Mutex::new(Vec::new()),
            queued: Mutex::new(Vec::new()),
        });
        controller.install_aggregate_observers();
        controller
    }

    fn install_aggregate_observers(self: &Arc<Self>) {
        for event in ModalEvent::ALL {
            let weak = Arc::downgrade(self);
            self.bus.subscribe(
                &topics::modal(event.as_str()),
                Handler::new(move |data: &Value, topic: &str| {
                    tracing::debug!(%topic, payload = %data, "modal lifecycle");
                    if matches!(event, ModalEvent::Close | ModalEvent::Destruct) {
                        if let Some(controller) = weak.upgrade() {
                            controller.process_queue();
                        }
                    }
                }),
            );
        }
    }

    /// Fetch or create the modal registered under `view`.
    ///
    /// Construction is memoized: a live instance is returned as-is (its
    /// `init()` re-triggered when `params.auto_init` asks for it) and the
    /// supplied params are otherwise ignored. A destroyed view name
    /// constructs fresh.
    pub fn modal(self: &Arc<Self>, view: &str, params: ModalParams) -> Arc<Modal> {
        let existing = self.modals.lock().get(view).cloned();
        if let Some(existing) = existing {
            if params.auto_init {
                existing.init();
            }
            return existing;
        }

        let auto_init = params.auto_init;
        let modal = Arc::new(Modal::with(view, params, Arc::downgrade(self)));
        self.add_modal(&modal);
        if auto_init {
            modal.init();
        }
        modal
    }

    /// Register an instance and seed its per-view topics.
    pub fn add_modal(self: &Arc<Self>, modal: &Arc<Modal>) {
        let view = modal.view().to_string();
        self.modals.lock().insert(view.clone(), Arc::clone(modal));

        for event in ModalEvent::ALL {
            let topic = topics::modal_view(&view, event.as_str());
            let handler = if ModalEvent::ACTIONS.contains(&event) {
                self.action_dispatcher(modal, event)
            } else {
                Handler::new(move |_data: &Value, topic: &str| {
                    tracing::trace!(%topic, "modal event");
                })
            };
            self.bus.subscribe(&topic, handler.clone());
            modal.record_subscription(topic, handler);
        }
    }

    /// Route a user interaction to the modal's supplied action, or degrade
    /// to a logged warning when none was supplied.
    fn action_dispatcher(self: &Arc<Self>, modal: &Arc<Modal>, event: ModalEvent) -> Handler {
        let weak_modal = Arc::downgrade(modal);
        let weak_ctrl = Arc::downgrade(self);
        Handler::new(move |data: &Value, _topic: &str| {
            let Some(modal) = weak_modal.upgrade() else {
                return;
            };
            match modal.action(event) {
                Some(action) => action(data.get("args").unwrap_or(&Value::Null)),
                None => {
                    if let Some(controller) = weak_ctrl.upgrade() {
                        controller.logger.warn(&format!(
                            "modal '{}' has no {} handler",
                            modal.view(),
                            event
                        ));
                    }
                }
            }
        })
    }

    /// Drop an instance from the registry and remove its per-view
    /// subscriptions. Queue membership is dropped too; the open set is left
    /// to `close()`.
    pub fn remove_modal(&self, view: &str) {
        let removed = self.modals.lock().remove(view);
        if let Some(modal) = removed {
            for (topic, handler) in modal.take_subscriptions() {
                self.bus.unsubscribe(&topic, &handler);
            }
        }
        self.queued.lock().retain(|queued| queued != view);
    }

    /// Look up a registered instance.
    #[must_use]
    pub fn get(&self, view: &str) -> Option<Arc<Modal>> {
        self.modals.lock().get(view).cloned()
    }

    /// Ask for `modal` to be shown once the screen frees up. No-op when it
    /// is already open or already waiting. Under hopping it is shown
    /// immediately instead, displacing whatever is open.
    pub fn add_to_queue(self: &Arc<Self>, modal: &Arc<Modal>) {
        if self.is_open(modal) || self.is_queued(modal) {
            return;
        }
        if self.config.gui.modals.behaviour.modal_hopping {
            self.hop(modal);
        } else {
            self.queued.lock().push(modal.view().to_string());
        }
    }

    /// Displace the open modal with `modal`, reopening the displaced one
    /// exactly once when `modal` closes.
    fn hop(self: &Arc<Self>, modal: &Arc<Modal>) {
        let displaced = self.open.lock().first().cloned();
        if let Some(displaced_view) = displaced {
            if let Some(displaced_modal) = self.get(&displaced_view) {
                displaced_modal.close();
            }
            let weak = Arc::downgrade(self);
            self.bus.subscribe_once(
                &topics::modal_view(modal.view(), ModalEvent::Close.as_str()),
                Handler::new(move |_data: &Value, _topic: &str| {
                    let Some(controller) = weak.upgrade() else {
                        return;
                    };
                    if let Some(returning) = controller.get(&displaced_view) {
                        returning.open();
                    }
                }),
            );
        }
        modal.open();
    }

    /// Open the head of the queue when nothing is on screen. Runs on every
    /// close/destruct, which guarantees queued modals display in FIFO
    /// order, one at a time.
    pub fn process_queue(self: &Arc<Self>) {
        if !self.open.lock().is_empty() {
            return;
        }
        let next = {
            let mut queued = self.queued.lock();
            if queued.is_empty() {
                None
            } else {
                Some(queued.remove(0))
            }
        };
        if let Some(view) = next {
            if let Some(modal) = self.get(&view) {
                modal.init();
            }
        }
    }

    #[must_use]
    pub fn is_open(&self, modal: impl AsViewName) -> bool {
        let view = modal.view_name();
        self.open.lock().iter().any(|open| open == view)
    }

    #[must_use]
    pub fn is_queued(&self, modal: impl AsViewName) -> bool {
        let view = modal.view_name();
        self.queued.lock().iter().any(|queued| queued == view)
    }

    /// Whether some other view is currently open.
    #[must_use]
    pub fn another_open(&self, view: &str) -> bool {
        self.open.lock().iter().any(|open| open != view)
    }

    #[must_use]
    pub fn open_views(&self) -> Vec<String> {
        self.open.lock().clone()
    }

    #[must_use]
    pub fn queued_views(&self) -> Vec<String> {
        self.queued.lock().clone()
    }

    pub(crate) fn mark_open(&self, view: &str) {
        self.queued.lock().retain(|queued| queued != view);
        let mut open = self.open.lock();
        if !open.iter().any(|existing| existing == view) {
            open.push(view.to_string());
        }
        drop(open);
        self.status.set(component::MODAL, true);
    }

    pub(crate) fn mark_closed(&self, view: &str) {
        let mut open = self.open.lock();
        open.retain(|existing| existing != view);
        let none_open = open.is_empty();
        drop(open);
        if none_open {
            self.status.set(component::MODAL, false);
        }
    }

    pub(crate) fn publish_modal_event(&self, view: &str, event: ModalEvent) {
        self.publish_modal_event_with(view, event, &Value::Null);
    }

    /// Dual publish: the per-view topic first (targeted listeners, e.g. a
    /// hopping reopen), then the aggregate (observation + queue pump).
    pub(crate) fn publish_modal_event_with(&self, view: &str, event: ModalEvent, args: &Value) {
        let payload = json!({
            "modal": view,
            "event": event.as_str(),
            "args": args,
        });
        for topic in [
            topics::modal_view(view, event.as_str()),
            topics::modal(event.as_str()),
        ] {
            if let Err(err) = self.bus.publish(&topic, &payload) {
                tracing::warn!(%err, %topic, "dropping modal event");
            }
        }
    }

    pub(crate) fn dom(&self) -> Arc<dyn Dom> {
        Arc::clone(&self.dom)
    }

    pub(crate) fn loader(&self) -> Arc<dyn ViewLoader> {
        Arc::clone(&self.loader)
    }

    pub(crate) fn logger(&self) -> Arc<Logger> {
        Arc::clone(&self.logger)
    }
}

impl std::fmt::Debug for ModalController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModalController")
            .field("modals", &self.modals.lock().len())
            .field("open", &*self.open.lock())
            .field("queued", &*self.queued.lock())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDom;
    use crate::modal::ModalState;
    use crate::view::{StaticViews, ViewCallback, ViewSpec};
    use kibitz_core::{Buffer, BufferPool};
    use parking_lot::Mutex as PlMutex;

    struct Fixture {
        controller: Arc<ModalController>,
        bus: Arc<EventBus>,
        dom: Arc<MemoryDom>,
        status: Arc<StatusRegistry>,
        sink: Buffer,
    }

    fn fixture_with(config: Config, loader: Arc<dyn ViewLoader>) -> Fixture {
        let config = Arc::new(config);
        let bus = Arc::new(EventBus::new(config.events.silent));
        let status = StatusRegistry::new();
        let pool = BufferPool::new();
        let sink = Buffer::text(&pool);
        let logger = Arc::new(Logger::new(
            Arc::clone(&config),
            Arc::clone(&bus),
            Arc::clone(&status),
            sink.clone(),
        ));
        let dom = Arc::new(MemoryDom::new());
        let controller = ModalController::new(
            config,
            Arc::clone(&bus),
            logger,
            dom.clone(),
            loader,
            Arc::clone(&status),
        );
        Fixture {
            controller,
            bus,
            dom,
            status,
            sink,
        }
    }

    fn fixture(config: Config) -> Fixture {
        let views = StaticViews::new();
        for name in ["a", "b", "c", "settings"] {
            views.register(name, ViewSpec::titled(name.to_uppercase()));
        }
        fixture_with(config, Arc::new(views))
    }

    /// A loader whose continuations never complete.
    struct StalledViews;

    impl ViewLoader for StalledViews {
        fn load(&self, _view: &str, _done: ViewCallback) {}
    }

    #[test]
    fn test_modal_construction_is_memoized() {
        let fx = fixture(Config::default());
        let first = fx.controller.modal("settings", ModalParams::new());
        let second = fx.controller.modal("settings", ModalParams::new());

        assert!(Arc::ptr_eq(&first, &second));
        assert!(fx.controller.get("settings").is_some());
        assert_eq!(fx.controller.open_views().len(), 0);
    }

    #[test]
    fn test_auto_init_builds_and_opens() {
        let fx = fixture(Config::default());
        let modal = fx
            .controller
            .modal("settings", ModalParams::new().auto_init());

        assert_eq!(modal.state(), ModalState::Inited);
        assert!(fx.controller.is_open(&modal));
        assert!(fx.status.get(component::MODAL));

        let node = modal.node().unwrap();
        assert!(fx.dom.is_visible(node));
        assert!(fx.dom.has_class(node, "kbs-modal"));
    }

    #[test]
    fn test_title_falls_back_to_view_title() {
        let fx = fixture(Config::default());
        let modal = fx
            .controller
            .modal("settings", ModalParams::new().auto_init());
        assert_eq!(modal.title(), "SETTINGS");

        let fx = fixture(Config::default());
        let modal = fx.controller.modal(
            "settings",
            ModalParams::new().title("Custom").auto_init(),
        );
        assert_eq!(modal.title(), "Custom");
    }

    #[test]
    fn test_second_modal_queues_until_first_closes() {
        let fx = fixture(Config::default());
        let a = fx.controller.modal("a", ModalParams::new().auto_init());
        let b = fx.controller.modal("b", ModalParams::new().auto_init());

        assert!(fx.controller.is_open(&a));
        assert!(!fx.controller.is_open(&b));
        assert!(fx.controller.is_queued(&b));

        a.close();

        // Closing pumps the queue with no further caller action.
        assert!(fx.controller.is_open(&b));
        assert!(!fx.controller.is_queued(&b));
        assert!(!fx.controller.is_open(&a));
    }

    #[test]
    fn test_queue_is_fifo_one_at_a_time() {
        let fx = fixture(Config::default());
        let a = fx.controller.modal("a", ModalParams::new().auto_init());
        let b = fx.controller.modal("b", ModalParams::new().auto_init());
        let c = fx.controller.modal("c", ModalParams::new().auto_init());

        assert_eq!(fx.controller.queued_views(), vec!["b", "c"]);

        a.close();
        assert!(fx.controller.is_open(&b));
        assert!(fx.controller.is_queued(&c));

        b.close();
        assert!(fx.controller.is_open(&c));
        assert!(fx.controller.queued_views().is_empty());
        c.close();
        assert!(fx.controller.open_views().is_empty());
        assert!(!fx.status.get(component::MODAL));
    }

    #[test]
    fn test_queue_request_is_idempotent() {
        let fx = fixture(Config::default());
        let _a = fx.controller.modal("a", ModalParams::new().auto_init());
        let b = fx.controller.modal("b", ModalParams::new().auto_init());
        b.open();
        b.open();

        assert_eq!(fx.controller.queued_views(), vec!["b"]);
    }

    #[test]
    fn test_hopping_displaces_and_reopens_exactly_once() {
        let mut config = Config::default();
        config.gui.modals.behaviour.modal_hopping = true;
        let fx = fixture(config);

        let a = fx.controller.modal("a", ModalParams::new().auto_init());
        let b = fx.controller.modal("b", ModalParams::new().auto_init());

        // b displaced a immediately.
        assert!(fx.controller.is_open(&b));
        assert!(!fx.controller.is_open(&a));
        assert!(fx.controller.queued_views().is_empty());

        b.close();

        // a came back on its own.
        assert!(fx.controller.is_open(&a));
        assert!(!fx.controller.is_open(&b));

        // The reopen handler was one-shot: closing b again changes nothing.
        a.close();
        b.close();
        assert!(fx.controller.open_views().is_empty());
    }

    #[test]
    fn test_stalled_view_never_progresses() {
        let fx = fixture_with(Config::default(), Arc::new(StalledViews));
        let modal = fx
            .controller
            .modal("slow", ModalParams::new().auto_init());

        assert_eq!(modal.state(), ModalState::Loading);
        assert!(!fx.controller.is_open(&modal));
        assert!(modal.node().is_none());

        // Re-init while the load is in flight is a no-op, not a second load.
        modal.init();
        assert_eq!(modal.state(), ModalState::Loading);
    }

    #[test]
    fn test_unknown_view_logs_error_and_resets() {
        let fx = fixture(Config::default());
        let modal = fx
            .controller
            .modal("ghost", ModalParams::new().auto_init());

        assert_eq!(modal.state(), ModalState::Uninitialized);
        let contents = fx.sink.contents();
        assert!(contents.as_text().unwrap().contains("ghost"));
    }

    #[test]
    fn test_destroy_frees_the_view_name() {
        let fx = fixture(Config::default());
        let first = fx
            .controller
            .modal("settings", ModalParams::new().auto_init());
        let node = first.node().unwrap();

        first.destroy();

        assert!(fx.controller.get("settings").is_none());
        assert!(!fx.controller.is_open("settings"));
        assert!(!fx.dom.contains(node));
        assert_eq!(first.state(), ModalState::Uninitialized);

        // A fresh construction under the same name is a new instance.
        let second = fx.controller.modal("settings", ModalParams::new());
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_destroy_pumps_queue() {
        let fx = fixture(Config::default());
        let a = fx.controller.modal("a", ModalParams::new().auto_init());
        let b = fx.controller.modal("b", ModalParams::new().auto_init());

        a.destroy();
        assert!(fx.controller.is_open(&b));
    }

    #[test]
    fn test_lifecycle_events_publish_dual_topics() {
        let fx = fixture(Config::default());
        let order = Arc::new(PlMutex::new(Vec::<String>::new()));

        for topic in [
            topics::modal_view("settings", "open"),
            topics::modal("open"),
        ] {
            let order_in = Arc::clone(&order);
            let label = topic.clone();
            fx.bus.subscribe(
                &topic,
                Handler::new(move |data: &Value, _| {
                    assert_eq!(data["modal"], "settings");
                    assert_eq!(data["event"], "open");
                    order_in.lock().push(label.clone());
                }),
            );
        }

        let _modal = fx
            .controller
            .modal("settings", ModalParams::new().auto_init());

        // Per-view topic fires before the aggregate.
        assert_eq!(
            *order.lock(),
            vec!["gui/modal/settings/open", "gui/modal/open"]
        );
    }

    #[test]
    fn test_confirm_routes_to_supplied_action() {
        let fx = fixture(Config::default());
        let seen = Arc::new(PlMutex::new(Vec::<Value>::new()));
        let seen_in = Arc::clone(&seen);

        let modal = fx.controller.modal(
            "settings",
            ModalParams::new()
                .on_confirm(move |args| seen_in.lock().push(args.clone()))
                .auto_init(),
        );

        modal.confirm(&json!({ "choice": 1 }));
        assert_eq!(*seen.lock(), vec![json!({ "choice": 1 })]);
    }

    #[test]
    fn test_missing_action_degrades_to_warning() {
        let fx = fixture(Config::default());
        let modal = fx
            .controller
            .modal("settings", ModalParams::new().auto_init());

        modal.cancel(&Value::Null);

        let contents = fx.sink.contents();
        let text = contents.as_text().unwrap();
        assert!(text.contains("no%20cancel%20handler") || text.contains("no cancel handler"));
    }

    #[test]
    fn test_targeted_listener_sees_specific_confirm() {
        let fx = fixture(Config::default());
        let count = Arc::new(PlMutex::new(0u32));

        let modal = fx
            .controller
            .modal("settings", ModalParams::new().auto_init());
        let other = fx.controller.modal("a", ModalParams::new());

        let count_in = Arc::clone(&count);
        fx.bus.subscribe(
            &topics::modal_view("settings", "confirm"),
            Handler::new(move |_, _| *count_in.lock() += 1),
        );

        modal.confirm(&Value::Null);
        other.confirm(&Value::Null);

        assert_eq!(*count.lock(), 1);
    }

    #[test]
    fn test_reinit_of_inited_modal_reopens() {
        let fx = fixture(Config::default());
        let modal = fx
            .controller
            .modal("settings", ModalParams::new().auto_init());
        let node = modal.node().unwrap();

        modal.close();
        assert!(!fx.dom.is_visible(node));

        // Memoized fetch with auto_init re-opens without rebuilding.
        let again = fx
            .controller
            .modal("settings", ModalParams::new().auto_init());
        assert!(Arc::ptr_eq(&modal, &again));
        assert_eq!(again.node(), Some(node));
        assert!(fx.dom.is_visible(node));
    }
}
