//! Effect - Reactive Side Effects
//!
//! `Effect` runs a closure immediately and re-runs it from scratch whenever one of
//! the reactive keys it read is written. `Tracker` splits the two halves: the body
//! is run on demand through [`Tracker::track`], and a separate trigger is invoked
//! when a tracked key changes.
//!
//! ## Example
//!
//! ```ignore
//! use tessera_reactive::{ReactiveObject, effect};
//!
//! let state: ReactiveObject<i32> = [("count", 0)].into_iter().collect();
//!
//! let _effect = effect({
//!     let state = state.clone();
//!     move || println!("count is {:?}", state.get("count"))
//! });
//!
//! // Prints "count is Some(42)"
//! state.set("count", 42);
//! ```

use core::cell::Cell;
use std::rc::Rc;

use crate::runtime::{NodeId, NodeType, Observer, try_with_runtime, with_runtime};

/// A reactive effect that re-runs when its dependencies change
///
/// Re-execution is synchronous: it happens inside the write that triggered it.
/// Every run starts with an empty dependency set, so keys that a later run no
/// longer reads stop triggering it.
///
/// Dropping the handle disposes the effect.
pub struct Effect {
	id: NodeId,
	disposed: Rc<Cell<bool>>,
}

impl Effect {
	/// Create a new Effect that runs the given function
	///
	/// The function runs immediately, and again whenever any key it read changes.
	///
	/// # Arguments
	///
	/// * `f` - The effect function. Must be `FnMut() + 'static`.
	pub fn new<F>(mut f: F) -> Self
	where
		F: FnMut() + 'static,
	{
		let id = NodeId::new();
		let disposed = Rc::new(Cell::new(false));

		let flag = disposed.clone();
		with_runtime(|rt| {
			rt.register_subscriber(
				id,
				Box::new(move || {
					if flag.get() {
						return;
					}
					with_runtime(|rt| rt.run_tracked(Observer::new(id, NodeType::Effect), &mut f));
				}),
			);
		});
		with_runtime(|rt| rt.run_subscriber(id));

		Self { id, disposed }
	}

	/// ID of this effect in the runtime graph
	pub fn id(&self) -> NodeId {
		self.id
	}

	/// Run the effect again, outside of any notification
	pub fn run(&self) {
		with_runtime(|rt| rt.run_subscriber(self.id));
	}

	/// Stop the effect and detach it from every dependency
	pub fn dispose(&self) {
		if self.disposed.replace(true) {
			return;
		}
		let _ = try_with_runtime(|rt| {
			rt.remove_subscriber(self.id);
			rt.remove_node(self.id);
		});
	}

	pub fn is_disposed(&self) -> bool {
		self.disposed.get()
	}

	/// Number of keys the last run read
	pub fn dependency_count(&self) -> usize {
		with_runtime(|rt| rt.dependency_count(self.id))
	}
}

impl Drop for Effect {
	fn drop(&mut self) {
		self.dispose();
	}
}

impl core::fmt::Debug for Effect {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("Effect")
			.field("id", &self.id)
			.field("disposed", &self.disposed.get())
			.finish()
	}
}

/// Create an [`Effect`]
pub fn effect<F>(f: F) -> Effect
where
	F: FnMut() + 'static,
{
	Effect::new(f)
}

/// A dependency tracker with a decoupled trigger
///
/// Reads made inside [`Tracker::track`] subscribe the tracker. When any of them is
/// written, `on_trigger` is invoked instead of re-running the tracked body.
pub struct Tracker {
	id: NodeId,
}

impl Tracker {
	pub fn new<F>(on_trigger: F) -> Self
	where
		F: FnMut() + 'static,
	{
		let id = NodeId::new();
		with_runtime(|rt| rt.register_subscriber(id, Box::new(on_trigger)));
		Self { id }
	}

	pub fn id(&self) -> NodeId {
		self.id
	}

	/// Run `f` with this tracker as the active consumer
	///
	/// Replaces the dependency set recorded by the previous call.
	pub fn track<R>(&self, f: impl FnOnce() -> R) -> R {
		with_runtime(|rt| rt.run_tracked(Observer::new(self.id, NodeType::Tracker), f))
	}

	/// Number of keys read during the last [`Tracker::track`] call
	pub fn dependency_count(&self) -> usize {
		with_runtime(|rt| rt.dependency_count(self.id))
	}

	/// Forget every recorded read; the trigger fires again only after the next `track`
	pub fn clear(&self) {
		with_runtime(|rt| rt.clear_dependencies(self.id));
	}
}

impl Drop for Tracker {
	fn drop(&mut self) {
		let _ = try_with_runtime(|rt| {
			rt.remove_subscriber(self.id);
			rt.remove_node(self.id);
		});
	}
}

impl core::fmt::Debug for Tracker {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("Tracker").field("id", &self.id).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ReactiveObject;
	use rstest::rstest;
	use serial_test::serial;
	use std::cell::RefCell;

	fn counter() -> (Rc<Cell<usize>>, impl Fn() + Clone) {
		let runs = Rc::new(Cell::new(0));
		let bump = {
			let runs = runs.clone();
			move || runs.set(runs.get() + 1)
		};
		(runs, bump)
	}

	#[test]
	#[serial]
	fn test_effect_runs_immediately() {
		let (runs, bump) = counter();
		let _effect = Effect::new(move || bump());
		assert_eq!(runs.get(), 1);
	}

	#[rstest]
	#[case(1)]
	#[case(2)]
	#[case(5)]
	#[serial]
	fn test_effect_reruns_once_per_write_regardless_of_read_count(#[case] reads: usize) {
		let state: ReactiveObject<i32> = [("k", 0)].into_iter().collect();
		let (runs, bump) = counter();

		let _effect = Effect::new({
			let state = state.clone();
			move || {
				for _ in 0..reads {
					let _ = state.get("k");
				}
				bump();
			}
		});
		assert_eq!(runs.get(), 1);

		state.set("k", 1);
		assert_eq!(runs.get(), 2);
		state.set("k", 2);
		assert_eq!(runs.get(), 3);
	}

	#[test]
	#[serial]
	fn test_disposed_effect_does_not_rerun() {
		let state: ReactiveObject<i32> = [("k", 0)].into_iter().collect();
		let (runs, bump) = counter();

		let effect = Effect::new({
			let state = state.clone();
			move || {
				let _ = state.get("k");
				bump();
			}
		});
		effect.dispose();
		assert!(effect.is_disposed());

		state.set("k", 1);
		assert_eq!(runs.get(), 1);
		assert_eq!(state.subscriber_count("k"), 0);
	}

	#[test]
	#[serial]
	fn test_dropping_effect_unsubscribes() {
		let state: ReactiveObject<i32> = [("k", 0)].into_iter().collect();

		let effect = Effect::new({
			let state = state.clone();
			move || {
				let _ = state.get("k");
			}
		});
		assert_eq!(state.subscriber_count("k"), 1);

		drop(effect);
		assert_eq!(state.subscriber_count("k"), 0);
	}

	#[test]
	#[serial]
	fn test_effect_writing_its_own_key_reaches_fixpoint() {
		let state: ReactiveObject<i32> = [("k", 0)].into_iter().collect();
		let (runs, bump) = counter();

		let _effect = Effect::new({
			let state = state.clone();
			move || {
				bump();
				let current = state.get("k").unwrap_or_default();
				if current < 3 {
					state.set("k", current + 1);
				}
			}
		});

		assert_eq!(state.get_untracked("k"), Some(3));
		assert_eq!(runs.get(), 4);
	}

	#[test]
	#[serial]
	fn test_chained_effects_rerun_the_running_writer() {
		let state: ReactiveObject<i32> = [("a", 1)].into_iter().collect();
		let (doubler_runs, bump) = counter();

		// Writes `a` back once it sees the first doubled value.
		let _feedback = Effect::new({
			let state = state.clone();
			move || {
				if state.get("b") == Some(2) {
					state.set("a", 5);
				}
			}
		});
		let _doubler = Effect::new({
			let state = state.clone();
			move || {
				bump();
				let a = state.get("a").unwrap_or_default();
				state.set("b", a * 2);
			}
		});

		assert_eq!(state.get_untracked("a"), Some(5));
		assert_eq!(state.get_untracked("b"), Some(10));
		assert_eq!(doubler_runs.get(), 2);
	}

	#[test]
	#[serial]
	fn test_nested_effect_keeps_outer_tracking() {
		let state: ReactiveObject<i32> = [("outer", 0), ("inner", 0)].into_iter().collect();
		let inner_effects = Rc::new(RefCell::new(Vec::new()));
		let (outer_runs, bump) = counter();

		let _outer = Effect::new({
			let state = state.clone();
			let inner_effects = inner_effects.clone();
			move || {
				let inner = Effect::new({
					let state = state.clone();
					move || {
						let _ = state.get("inner");
					}
				});
				inner_effects.borrow_mut().push(inner);
				let _ = state.get("outer");
				bump();
			}
		});

		state.set("inner", 1);
		assert_eq!(outer_runs.get(), 1);

		state.set("outer", 1);
		assert_eq!(outer_runs.get(), 2);
	}

	#[test]
	#[serial]
	fn test_tracker_invokes_trigger_not_body() {
		let state: ReactiveObject<i32> = [("k", 0)].into_iter().collect();
		let (triggers, bump) = counter();
		let (bodies, body) = counter();

		let tracker = Tracker::new(bump);
		tracker.track(|| {
			let _ = state.get("k");
			body();
		});
		assert_eq!(bodies.get(), 1);
		assert_eq!(tracker.dependency_count(), 1);

		state.set("k", 3);
		assert_eq!(triggers.get(), 1);
		assert_eq!(bodies.get(), 1);
	}

	#[test]
	#[serial]
	fn test_tracker_retracks_from_scratch() {
		let state: ReactiveObject<i32> = [("a", 0), ("b", 0)].into_iter().collect();
		let (triggers, bump) = counter();

		let tracker = Tracker::new(bump);
		tracker.track(|| state.get("a"));
		tracker.track(|| state.get("b"));

		state.set("a", 1);
		assert_eq!(triggers.get(), 0);
		state.set("b", 1);
		assert_eq!(triggers.get(), 1);
	}

	#[test]
	#[serial]
	fn test_tracker_clear_stops_triggers() {
		let state: ReactiveObject<i32> = [("k", 0)].into_iter().collect();
		let (triggers, bump) = counter();

		let tracker = Tracker::new(bump);
		tracker.track(|| state.get("k"));
		tracker.clear();

		state.set("k", 1);
		assert_eq!(triggers.get(), 0);
		assert_eq!(tracker.dependency_count(), 0);
	}
}
