//! Tessera Pages - Virtual nodes, fibers and a cooperative renderer
//!
//! Components describe the UI as [`VNode`] trees. The [`Renderer`] mirrors them in
//! a double-buffered fiber tree, diffs children by position and applies the result
//! to a [`HostTree`] in one commit. Rendering is split into units of work that a
//! [`Scheduler`] runs in idle slots.
//!
//! ## Architecture
//!
//! - [`reactive`]: re-export of `tessera-reactive`
//! - [`vnode`]: element, text and component nodes, props and event handlers
//! - [`component`]: class components with lifecycle callbacks
//! - [`hooks`]: per-fiber hook cells and [`use_state`]
//! - [`fiber`]: fiber arenas and effect tags
//! - [`reconcile`]: child diffing behind [`DiffStrategy`]
//! - [`renderer`] / [`scheduler`]: render phase and time slicing
//! - [`commit`]: host mutations for a finished tree
//! - [`host`]: host tree primitives, an in-memory host and (WASM) the DOM host
//! - [`ssr`]: string rendering without fibers
//! - [`router`]: path-to-view registry and a reactive navigator
//!
//! ## Example
//!
//! ```ignore
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use tessera_pages::prelude::*;
//!
//! fn theme_toggle(_: &Props) -> VNode {
//!     let (theme, set_theme) = use_state("light".to_string());
//!     let next = if theme == "light" { "dark" } else { "light" };
//!     element(
//!         "button",
//!         Props::new()
//!             .attr("class", theme.clone())
//!             .on("click", move |_| set_theme.set(next.to_string())),
//!         [theme],
//!     )
//! }
//!
//! let mut host = MemoryHost::new();
//! let container = host.create_container("div");
//! let renderer = Rc::new(RefCell::new(Renderer::new(host)));
//! let driver = Rc::new(SliceDriver::default());
//! let _scheduler = Scheduler::start(renderer.clone(), driver.clone());
//!
//! renderer.borrow_mut().render(component(theme_toggle, Props::new()), container);
//! driver.run_until_idle();
//! ```

pub use tessera_reactive as reactive;

pub mod commit;
pub mod component;
pub mod config;
pub mod error;
pub mod fiber;
pub mod hooks;
pub mod host;
mod html;
pub mod prelude;
pub mod reconcile;
pub mod renderer;
pub mod router;
pub mod scheduler;
pub mod ssr;
pub mod vnode;

pub use commit::CommitStats;
pub use component::{Component, class};
pub use config::RendererConfig;
pub use error::{ConfigError, HostError, RenderError, RenderResult, RouterError};
pub use fiber::{EffectTag, Fiber, FiberId, Generation};
pub use hooks::{SetState, use_state};
pub use host::{HostTree, MemoryHost};
pub use reconcile::{DiffStrategy, PositionalDiff};
pub use renderer::{RenderEvent, Renderer};
pub use router::{Navigator, Route, Router};
pub use scheduler::{Deadline, IdleDriver, Scheduler, SliceDriver, WorkStatus};
pub use ssr::{SsrOptions, SsrRenderer};
pub use vnode::{Event, EventHandler, NodeType, PropValue, Props, VNode, component, element, text};
