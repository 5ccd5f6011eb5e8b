//! Tessera Reactive - Fine-grained dependency tracking
//!
//! This crate provides the reactive layer of Tessera:
//!
//! - [`runtime`]: thread-local dependency graph and observer stack
//! - [`Dependency`]: subscriber registry for one reactive key
//! - [`ReactiveObject`]: string-keyed map with instrumented reads and writes
//! - [`Effect`] / [`Tracker`]: computations that re-run (or are triggered) on change
//! - [`Computed`]: cached derived values
//!
//! Re-execution is synchronous. A write re-runs every subscriber of the written key
//! before returning.
//!
//! ## Example
//!
//! ```ignore
//! use tessera_reactive::{ReactiveObject, effect};
//!
//! let state: ReactiveObject<&'static str> = [("theme", "light")].into_iter().collect();
//!
//! let _effect = effect({
//!     let state = state.clone();
//!     move || println!("theme: {:?}", state.get("theme"))
//! });
//!
//! state.set("theme", "dark");
//! ```

pub mod computed;
pub mod dependency;
pub mod effect;
pub mod object;
pub mod runtime;

pub use computed::{Computed, computed};
pub use dependency::Dependency;
pub use effect::{Effect, Tracker, effect};
pub use object::ReactiveObject;
pub use runtime::{NodeId, untrack};
