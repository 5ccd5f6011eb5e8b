//! # Tessera
//!
//! Fine-grained reactive state and an incremental, interruptible renderer for
//! Rust web frontends.
//!
//! ## Crates
//!
//! - [`reactive`]: dependency tracking, reactive objects, effects and computed values
//! - `pages`: virtual nodes, fibers, reconciliation, the cooperative scheduler,
//!   state hooks, server-side rendering and the client-side router
//! - `server`: HTTP dispatcher, static files and server-rendered pages
//!
//! ## Feature Flags
//!
//! - `minimal` - Reactivity and the page renderer
//! - `full` (default) - Everything, including the HTTP server
//! - `pages`, `server` - Individual crates
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use tessera::prelude::*;
//!
//! fn counter(_: &Props) -> VNode {
//!     let (count, set_count) = use_state(0);
//!     element(
//!         "button",
//!         Props::new().on("click", move |_| set_count.update(|n| n + 1)),
//!         [text(format!("clicked {count}"))],
//!     )
//! }
//!
//! let mut host = MemoryHost::new();
//! let container = host.create_container("div");
//! let mut renderer = Renderer::new(host);
//! renderer.render(component(counter, Props::new()), container);
//! renderer.flush()?;
//! ```

pub use tessera_reactive as reactive;

#[cfg(feature = "pages")]
pub use tessera_pages as pages;

#[cfg(feature = "server")]
pub use tessera_server as server;

pub use tessera_reactive::{Computed, Effect, ReactiveObject, Tracker, computed, effect, untrack};

#[cfg(feature = "pages")]
pub use tessera_pages::{RenderError, Renderer, VNode};

#[cfg(feature = "server")]
pub use tessera_server::{Dispatcher, HttpServer, ServerConfig};

/// Commonly used items.
pub mod prelude {
	pub use tessera_reactive::{Computed, Effect, ReactiveObject, computed, effect, untrack};

	#[cfg(feature = "pages")]
	pub use tessera_pages::prelude::*;

	#[cfg(feature = "server")]
	pub use tessera_server::{
		Dispatcher, Handler, HttpServer, PageHandler, Request, Response, ServerConfig, handler_fn,
	};
}
