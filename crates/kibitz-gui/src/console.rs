//! The console panel.
//!
//! The console is a pure subscriber: it renders `gui/log` payloads into its
//! output tree and reacts to `gui/contexts/clear`. It owns no log state —
//! the buffer channel it exports and clears belongs to the cache, and the
//! entries it draws arrive over the bus in emission order.
//!
//! Toolbar nodes are built from the configured icons and tooltips; wiring
//! clicks to [`Console::clear`], [`Console::save`], [`Console::toggle`],
//! [`Console::close`], and [`Console::destroy`] is the embedder's job,
//! since input events never cross the [`Dom`] seam.

use crate::controller::ModalController;
use crate::dom::{Dom, NodeId};
use crate::modal::ModalParams;
use crate::transport::{SaveRequest, SaveTransport};
use crate::view::DESTROY_CONSOLE_VIEW;
use kibitz_config::Config;
use kibitz_core::{component, envelope, topics, Buffer, EventBus, Handler};
use kibitz_log::format::fdate;
use kibitz_log::{LogCall, Logger};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Name of the always-present default rendering context.
const DEFAULT_CONTEXT: &str = "def";

/// The console render consumer.
pub struct Console {
    config: Arc<Config>,
    bus: Arc<EventBus>,
    logger: Arc<Logger>,
    dom: Arc<dyn Dom>,
    transport: Arc<dyn SaveTransport>,
    modals: Arc<ModalController>,
    sink: Buffer,
    wrapper: NodeId,
    cons: NodeId,
    out: NodeId,
    contexts: Mutex<HashMap<String, NodeId>>,
    subscriptions: Mutex<Vec<(String, Handler)>>,
}

impl Console {
    /// Build the console tree and subscribe it to the bus.
    ///
    /// Returns `None` when GUI logging is disabled — without `logs.gui`
    /// there is nothing for a console to render.
    #[allow(clippy::too_many_arguments)]
    pub fn attach(
        config: Arc<Config>,
        bus: Arc<EventBus>,
        logger: Arc<Logger>,
        dom: Arc<dyn Dom>,
        transport: Arc<dyn SaveTransport>,
        modals: Arc<ModalController>,
        sink: Buffer,
    ) -> Option<Arc<Self>> {
        if !config.logs.gui {
            return None;
        }

        let wrapper = dom.create_node(
            "div",
            &format!("kbs-cons-box {}", config.gui.console.state),
            None,
        );

        let toolbar = dom.create_node("div", "kbs-cons-toolbar", None);
        dom.append_child(wrapper, toolbar);

        let title = dom.create_node("div", "kbs-cons-title", None);
        dom.set_text(title, &format!("{} v{}", config.app_name, config.version));
        dom.append_child(toolbar, title);

        for tool in ["toggle", "save", "clear", "destroy", "close"] {
            create_tool(dom.as_ref(), &config, toolbar, tool);
        }

        let cons = dom.create_node("div", "kbs-cons", None);
        dom.append_child(wrapper, cons);
        let out = dom.create_node("div", "kbs-cons-out", None);
        dom.append_child(cons, out);
        dom.append_child(dom.root(), wrapper);

        let console = Arc::new(Self {
            config,
            bus,
            logger,
            dom,
            transport,
            modals,
            sink,
            wrapper,
            cons,
            out,
            contexts: Mutex::new(HashMap::from([(DEFAULT_CONTEXT.to_string(), out)])),
            subscriptions: Mutex::new(Vec::new()),
        });
        console.install_subscriptions();
        console.announce(true);
        Some(console)
    }

    fn install_subscriptions(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let write = Handler::new(move |data: &Value, _topic: &str| {
            if let Some(console) = weak.upgrade() {
                console.write(data);
            }
        });
        self.bus.subscribe(topics::GUI_LOG, write.clone());
        self.subscriptions
            .lock()
            .push((topics::GUI_LOG.to_string(), write));

        let weak = Arc::downgrade(self);
        let clear = Handler::new(move |data: &Value, _topic: &str| {
            let Some(console) = weak.upgrade() else {
                return;
            };
            if let Some(name) = data.as_str() {
                console.clear_context(name);
            }
        });
        self.bus.subscribe(topics::CONTEXT_CLEAR, clear.clone());
        self.subscriptions
            .lock()
            .push((topics::CONTEXT_CLEAR.to_string(), clear));

        if self.config.gui.autorefresh {
            let weak = Arc::downgrade(self);
            let refresh = Handler::new(move |_data: &Value, _topic: &str| {
                if let Some(console) = weak.upgrade() {
                    console.refresh();
                }
            });
            self.bus.subscribe(topics::GUI_UPDATE, refresh.clone());
            self.subscriptions
                .lock()
                .push((topics::GUI_UPDATE.to_string(), refresh));
        }
    }

    /// Render one `gui/log` payload into the output tree.
    pub fn write(&self, payload: &Value) {
        let payload = envelope(payload);
        let msg = payload.get("msg").and_then(Value::as_str).unwrap_or("");
        let kind = payload.get("type").and_then(Value::as_str).unwrap_or("log");
        let obj = payload.get("obj").and_then(Value::as_str).unwrap_or("");
        let context = payload.get("context").and_then(Value::as_str);
        let subcontext = payload.get("subcontext").and_then(Value::as_str);

        // Pick the target context node; remember a context that has to be
        // created from this very entry's node.
        let mut create_from_entry: Option<String> = None;
        let target = match (context, subcontext) {
            (Some(context), Some(sub)) => match self.context_node(sub) {
                Some(node) => node,
                None => {
                    create_from_entry = Some(sub.to_string());
                    self.context_node(context).unwrap_or(self.out)
                }
            },
            (Some(context), None) => match self.context_node(context) {
                Some(node) => node,
                None => {
                    create_from_entry = Some(context.to_string());
                    self.out
                }
            },
            _ => self.out,
        };

        let entry = self
            .dom
            .create_node("div", &format!("kbs-log-node kbs-{kind}"), None);
        self.dom.set_text(entry, msg);

        if !obj.is_empty() {
            let object_wrap = self.dom.create_node("pre", "kbs-object", None);
            let expand_icon = self
                .config
                .gui
                .console
                .icons
                .get("expand")
                .map(String::as_str)
                .unwrap_or("plus");
            let expander = self.dom.create_node(
                "i",
                &format!("fa fa-{expand_icon} kbs-object-expand"),
                None,
            );
            self.dom.append_child(object_wrap, expander);
            self.dom.set_text(object_wrap, obj);
            self.dom.append_child(entry, object_wrap);
        }

        self.dom.append_child(target, entry);

        if let Some(name) = create_from_entry {
            self.create_context(&name, entry);
        }

        self.refresh();
    }

    /// Register a rendering context hosted inside `host`.
    pub fn create_context(&self, name: &str, host: NodeId) {
        if !self.config.logs.contexts {
            return;
        }
        if self.contexts.lock().contains_key(name) {
            self.logger
                .error(&format!("log context '{name}' is already defined"));
            return;
        }
        let node = self
            .dom
            .create_node("div", "kbs-log-context", Some(&format!("kbs-ctx-{name}")));
        self.dom.append_child(host, node);
        self.contexts.lock().insert(name.to_string(), node);
    }

    fn context_node(&self, name: &str) -> Option<NodeId> {
        self.contexts.lock().get(name).copied()
    }

    /// Drop a named rendering context. The default context is protected.
    pub fn clear_context(&self, name: &str) {
        if name == DEFAULT_CONTEXT {
            return;
        }
        self.contexts.lock().remove(name);
    }

    /// Reveal the panel.
    pub fn open(&self) {
        self.dom.remove_class(self.wrapper, "kbs-close");
        self.dom.add_class(self.wrapper, "kbs-open");
    }

    /// Collapse the panel.
    pub fn close(&self) {
        self.dom.remove_class(self.wrapper, "kbs-open");
        self.dom.add_class(self.wrapper, "kbs-close");
    }

    pub fn toggle(&self) {
        if self.dom.has_class(self.wrapper, "kbs-close") {
            self.open();
        } else {
            self.close();
        }
    }

    /// Autoscroll hook; also runs on every rendered entry and on
    /// `gui/update` when autorefresh is configured.
    pub fn refresh(&self) {
        if self.config.gui.console.autoscroll {
            self.dom.scroll_to_bottom(self.cons);
        }
    }

    /// Remove every rendered entry and reset the buffer channel.
    pub fn clear(&self) {
        let started = Instant::now();
        let count = self.dom.child_count(self.out);
        self.dom.clear_children(self.out);
        self.contexts
            .lock()
            .retain(|name, _| name == DEFAULT_CONTEXT);

        self.logger.okay(&format!(
            "cleared {count} logs in {} ms",
            started.elapsed().as_millis()
        ));
        self.sink.clear();
    }

    /// Post the buffer channel to the configured save route. Fire and
    /// forget: the outcome is reported once, under a `log/save` context.
    pub fn save(&self) {
        let Some(route) = self.config.route("console", "save") else {
            self.logger.warn("no console save route configured");
            return;
        };

        self.logger.begin_context("log/save");
        self.logger.info("saving log buffer...");

        let contents = self.sink.contents();
        let request = SaveRequest {
            kind: "log".to_string(),
            date: fdate(),
            buffer: contents.as_text().unwrap_or_default().to_string(),
        };

        let logger = Arc::downgrade(&self.logger);
        self.transport.post(
            route,
            request,
            Box::new(move |result| {
                let Some(logger) = logger.upgrade() else {
                    return;
                };
                match result {
                    Ok(response) => {
                        logger.log(LogCall::new().context("log/save").kind("okay").message(response));
                        logger.end_context();
                        logger.clear_context("log/save");
                    }
                    Err(err) => {
                        logger.log(
                            LogCall::new()
                                .context("log/save")
                                .kind("error")
                                .message(err.to_string()),
                        );
                        logger.end_context();
                    }
                }
            }),
        );
    }

    /// Tear the console down behind a confirmation modal.
    pub fn destroy(self: &Arc<Self>) {
        let console = Arc::downgrade(self);
        let confirm_controller = Arc::downgrade(&self.modals);
        let cancel_controller = Arc::downgrade(&self.modals);

        let params = ModalParams::new()
            .title("Destroy the console instance?")
            .message("Confirm destruction of the GUI console (irreversible until re-attach).")
            .on_confirm(move |_args| {
                if let Some(console) = console.upgrade() {
                    console.teardown();
                }
                dismiss(&confirm_controller);
            })
            .on_cancel(move |_args| {
                dismiss(&cancel_controller);
            })
            .auto_init();

        self.modals.modal(DESTROY_CONSOLE_VIEW, params);
    }

    fn teardown(&self) {
        for (topic, handler) in std::mem::take(&mut *self.subscriptions.lock()) {
            self.bus.unsubscribe(&topic, &handler);
        }
        self.dom.remove(self.wrapper);
        self.contexts.lock().clear();
        self.sink.clear();
        self.announce(false);
    }

    fn announce(&self, attached: bool) {
        let payload = json!({
            "component": component::CONSOLE,
            "status": attached,
        });
        if let Err(err) = self.bus.publish(topics::STATUS, &payload) {
            tracing::warn!(%err, "dropping console status announcement");
        }
    }

    /// The console's outermost node.
    #[must_use]
    pub fn wrapper(&self) -> NodeId {
        self.wrapper
    }

    /// The output node rendered entries land in.
    #[must_use]
    pub fn out(&self) -> NodeId {
        self.out
    }
}

fn create_tool(dom: &dyn Dom, config: &Config, toolbar: NodeId, tool: &str) -> NodeId {
    let icon = config
        .gui
        .console
        .icons
        .get(tool)
        .map(String::as_str)
        .unwrap_or("plus");
    let node = dom.create_node("i", &format!("fa fa-{icon} kbs-tool kbs-{tool}"), None);
    if let Some(tip) = config.tooltips.get(tool) {
        dom.set_attr(node, "title", tip);
    }
    dom.append_child(toolbar, node);
    node
}

fn dismiss(controller: &std::sync::Weak<ModalController>) {
    if let Some(controller) = controller.upgrade() {
        if let Some(modal) = controller.get(DESTROY_CONSOLE_VIEW) {
            modal.destroy();
        }
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("contexts", &self.contexts.lock().len())
            .finish()
    }
}
