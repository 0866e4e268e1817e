//! The visible half of the kibitz overlay.
//!
//! Everything here is a consumer of the core: the [`Console`] renders
//! `gui/log` events, the [`ModalController`] coordinates which modal is on
//! screen, and [`Overlay`] wires the whole stack together in the right
//! order. Rendering goes through the [`Dom`] trait — the embedder supplies
//! real bindings; [`MemoryDom`] is the headless implementation the test
//! suite (and any DOM-less embedding) uses.
//!
//! ```
//! use kibitz_gui::Overlay;
//!
//! let overlay = Overlay::builder().attach();
//! overlay.logger().info("overlay is up");
//! ```

pub mod console;
pub mod controller;
pub mod dom;
pub mod modal;
pub mod overlay;
pub mod transport;
pub mod view;

pub use console::Console;
pub use controller::{AsViewName, ModalController};
pub use dom::{Dom, MemoryDom, NodeId};
pub use modal::{Modal, ModalEvent, ModalParams, ModalState};
pub use overlay::{Overlay, OverlayBuilder};
pub use transport::{NullTransport, SaveRequest, SaveTransport, TransportError};
pub use view::{StaticViews, ViewError, ViewLoader, ViewSpec, DESTROY_CONSOLE_VIEW};
