//! Overlay assembly.
//!
//! [`Overlay::builder`] wires the whole stack in boot order: configuration,
//! bus, buffer pool and cache, status watcher, logger, console, modal
//! controller. The console comes up before anything logs through the GUI
//! path, so no render event is ever published into the void, and components
//! announce themselves on the status topic as they attach.

use crate::console::Console;
use crate::controller::ModalController;
use crate::dom::{Dom, MemoryDom};
use crate::transport::{NullTransport, SaveTransport};
use crate::view::{StaticViews, ViewLoader};
use kibitz_config::Config;
use kibitz_core::{component, topics, BufferPool, Cache, EventBus, Handler, StatusRegistry};
use kibitz_log::Logger;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

/// A fully wired overlay instance.
pub struct Overlay {
    config: Arc<Config>,
    bus: Arc<EventBus>,
    pool: Arc<BufferPool>,
    cache: Cache,
    status: Arc<StatusRegistry>,
    logger: Arc<Logger>,
    modals: Arc<ModalController>,
    console: Option<Arc<Console>>,
    dom: Arc<dyn Dom>,
}

impl Overlay {
    #[must_use]
    pub fn builder() -> OverlayBuilder {
        OverlayBuilder::default()
    }

    #[must_use]
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    #[must_use]
    pub fn bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.bus)
    }

    #[must_use]
    pub fn pool(&self) -> Arc<BufferPool> {
        Arc::clone(&self.pool)
    }

    #[must_use]
    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    #[must_use]
    pub fn status(&self) -> Arc<StatusRegistry> {
        Arc::clone(&self.status)
    }

    #[must_use]
    pub fn logger(&self) -> Arc<Logger> {
        Arc::clone(&self.logger)
    }

    #[must_use]
    pub fn modals(&self) -> Arc<ModalController> {
        Arc::clone(&self.modals)
    }

    /// The console, when GUI logging brought one up.
    #[must_use]
    pub fn console(&self) -> Option<Arc<Console>> {
        self.console.clone()
    }

    #[must_use]
    pub fn dom(&self) -> Arc<dyn Dom> {
        Arc::clone(&self.dom)
    }
}

impl std::fmt::Debug for Overlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Overlay")
            .field("app", &self.config.app_name)
            .field("console", &self.console.is_some())
            .finish()
    }
}

/// Collects collaborators before attach. Missing pieces fall back to the
/// headless defaults: [`MemoryDom`], [`StaticViews::with_builtins`],
/// [`NullTransport`].
pub struct OverlayBuilder {
    config: Config,
    dom: Option<Arc<dyn Dom>>,
    views: Option<Arc<dyn ViewLoader>>,
    transport: Option<Arc<dyn SaveTransport>>,
}

impl Default for OverlayBuilder {
    fn default() -> Self {
        Self {
            config: Config::default(),
            dom: None,
            views: None,
            transport: None,
        }
    }
}

impl OverlayBuilder {
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn dom(mut self, dom: Arc<dyn Dom>) -> Self {
        self.dom = Some(dom);
        self
    }

    #[must_use]
    pub fn views(mut self, views: Arc<dyn ViewLoader>) -> Self {
        self.views = Some(views);
        self
    }

    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn SaveTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Wire everything up. A disabled overlay (`enabled == false`) still
    /// returns a usable handle set but attaches no console and announces
    /// nothing.
    #[must_use]
    pub fn attach(self) -> Overlay {
        let started = Instant::now();

        let config = Arc::new(self.config);
        let dom = self
            .dom
            .unwrap_or_else(|| Arc::new(MemoryDom::new()) as Arc<dyn Dom>);
        let views = self
            .views
            .unwrap_or_else(|| Arc::new(StaticViews::with_builtins()) as Arc<dyn ViewLoader>);
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(NullTransport) as Arc<dyn SaveTransport>);

        let bus = Arc::new(EventBus::new(config.events.silent));
        let pool = BufferPool::new();
        let cache = Cache::new(&pool);
        let status = StatusRegistry::new();
        status.watch(&bus);

        let logger = Arc::new(Logger::new(
            Arc::clone(&config),
            Arc::clone(&bus),
            Arc::clone(&status),
            cache.console.clone(),
        ));

        let modals = ModalController::new(
            Arc::clone(&config),
            Arc::clone(&bus),
            Arc::clone(&logger),
            Arc::clone(&dom),
            views,
            Arc::clone(&status),
        );

        let console = if config.enabled && config.gui.enabled {
            Console::attach(
                Arc::clone(&config),
                Arc::clone(&bus),
                Arc::clone(&logger),
                Arc::clone(&dom),
                transport,
                Arc::clone(&modals),
                cache.console.clone(),
            )
        } else {
            None
        };

        if config.enabled {
            let boot_logger = Arc::downgrade(&logger);
            bus.subscribe(
                topics::LOADED,
                Handler::new(move |_data: &Value, _topic: &str| {
                    if let Some(logger) = boot_logger.upgrade() {
                        logger.okay(&format!(
                            "overlay initialised in {} ms",
                            started.elapsed().as_millis()
                        ));
                    }
                }),
            );

            announce(&bus, component::GUI, config.gui.enabled);
            announce(&bus, component::APP, true);
            if let Err(err) = bus.publish(topics::LOADED, &Value::Null) {
                tracing::warn!(%err, "dropping overlay loaded event");
            }
        }

        Overlay {
            config,
            bus,
            pool,
            cache,
            status,
            logger,
            modals,
            console,
            dom,
        }
    }
}

fn announce(bus: &EventBus, component: &str, attached: bool) {
    let payload = json!({ "component": component, "status": attached });
    if let Err(err) = bus.publish(topics::STATUS, &payload) {
        tracing::warn!(%err, component, "dropping status announcement");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_attach_brings_up_everything() {
        let overlay = Overlay::builder().attach();

        assert!(overlay.console().is_some());
        assert!(overlay.status().get(component::APP));
        assert!(overlay.status().get(component::GUI));
        assert!(overlay.status().get(component::CONSOLE));

        let contents = overlay.cache().console.contents();
        let text = contents.as_text().unwrap();
        assert!(text.contains("initialised"), "{text}");
    }

    #[test]
    fn test_disabled_overlay_attaches_nothing() {
        let mut config = Config::default();
        config.enabled = false;
        let overlay = Overlay::builder().config(config).attach();

        assert!(overlay.console().is_none());
        assert!(!overlay.status().get(component::APP));
        assert!(overlay.cache().console.contents().is_empty());
    }

    #[test]
    fn test_gui_disabled_still_logs_to_buffer() {
        let mut config = Config::default();
        config.gui.enabled = false;
        let overlay = Overlay::builder().config(config).attach();

        assert!(overlay.console().is_none());
        overlay.logger().info("buffer only");
        let contents = overlay.cache().console.contents();
        assert!(contents.as_text().unwrap().contains("buffer%20only"));
    }
}
