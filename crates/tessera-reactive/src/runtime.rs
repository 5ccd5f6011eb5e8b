//! Reactive Runtime
//!
//! This module provides the dependency graph that connects reactive keys to the
//! computations that read them.
//!
//! ## Architecture
//!
//! 1. **Observer Stack**: The computation currently being tracked sits on top of an
//!    explicit stack, so nested tracked runs restore the outer observer when they finish
//! 2. **Dependency Graph**: Every read performed while an observer is active records a
//!    `dependency -> observer` edge and its reverse
//! 3. **Subscribers**: Observers register a callback that the runtime invokes
//!    synchronously when one of their dependencies is notified
//!
//! ## Example
//!
//! ```ignore
//! use tessera_reactive::{Dependency, Effect};
//!
//! let dep = Dependency::new();
//!
//! let _effect = Effect::new(move || {
//!     // Subscribes this effect to `dep`
//!     dep.depend();
//! });
//!
//! // Re-runs the effect synchronously
//! dep.notify();
//! ```

use core::cell::RefCell;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::collections::{BTreeMap, BTreeSet};

/// Unique identifier for reactive nodes (dependencies, effects, trackers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
	/// Create a new unique NodeId
	pub fn new() -> Self {
		static COUNTER: AtomicUsize = AtomicUsize::new(0);
		Self(COUNTER.fetch_add(1, Ordering::Relaxed))
	}
}

impl Default for NodeId {
	fn default() -> Self {
		Self::new()
	}
}

/// Type of reactive node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
	/// A per-key dependency (source of reactivity)
	Dependency,
	/// An effect that re-runs its whole body on change
	Effect,
	/// A tracker whose trigger is decoupled from the tracked body
	Tracker,
	/// A scope whose reads must not be recorded
	Untracked,
}

/// Observer represents the computation currently being tracked
#[derive(Debug, Clone, Copy)]
pub struct Observer {
	/// Unique identifier for this observer
	pub id: NodeId,
	/// Type of this observer
	pub node_type: NodeType,
}

impl Observer {
	pub fn new(id: NodeId, node_type: NodeType) -> Self {
		Self { id, node_type }
	}
}

/// Dependency graph node
#[derive(Debug, Default)]
pub(crate) struct DependencyNode {
	/// IDs of nodes that depend on this node
	pub(crate) subscribers: BTreeSet<NodeId>,
	/// IDs of nodes this node depends on
	pub(crate) dependencies: BTreeSet<NodeId>,
}

type SubscriberFn = Box<dyn FnMut() + 'static>;

enum SubscriberSlot {
	Idle(SubscriberFn),
	/// `rerun` is set when the subscriber is notified again before it returns
	Running { rerun: bool },
}

/// Reactive runtime
///
/// Holds the observer stack, the dependency graph and the subscriber callbacks.
/// It lives in thread-local storage, one instance per thread.
pub struct Runtime {
	observer_stack: RefCell<Vec<Observer>>,
	pub(crate) dependency_graph: RefCell<BTreeMap<NodeId, DependencyNode>>,
	subscribers: RefCell<BTreeMap<NodeId, SubscriberSlot>>,
}

impl Runtime {
	/// Create a new Runtime instance
	pub fn new() -> Self {
		Self {
			observer_stack: RefCell::new(Vec::new()),
			dependency_graph: RefCell::new(BTreeMap::new()),
			subscribers: RefCell::new(BTreeMap::new()),
		}
	}

	/// Get the current observer
	///
	/// Returns `None` when nothing is tracked or when an untracked scope is on top.
	pub fn current_observer(&self) -> Option<NodeId> {
		self.observer_stack
			.borrow()
			.last()
			.filter(|observer| observer.node_type != NodeType::Untracked)
			.map(|observer| observer.id)
	}

	/// Depth of the observer stack (for testing)
	pub fn observer_depth(&self) -> usize {
		self.observer_stack.borrow().len()
	}

	/// Push an observer onto the stack
	pub fn push_observer(&self, observer: Observer) {
		self.observer_stack.borrow_mut().push(observer);
	}

	/// Pop an observer from the stack
	pub fn pop_observer(&self) -> Option<Observer> {
		self.observer_stack.borrow_mut().pop()
	}

	/// Record that the current observer reads `dependency_id`
	///
	/// Idempotent: reading the same key twice in one run adds a single edge.
	///
	/// # Arguments
	///
	/// * `dependency_id` - ID of the dependency being read
	pub fn track_dependency(&self, dependency_id: NodeId) {
		if let Some(observer_id) = self.current_observer() {
			let mut graph = self.dependency_graph.borrow_mut();
			graph
				.entry(dependency_id)
				.or_default()
				.subscribers
				.insert(observer_id);
			graph
				.entry(observer_id)
				.or_default()
				.dependencies
				.insert(dependency_id);
		}
	}

	/// Invoke every subscriber of `dependency_id` once
	///
	/// The subscriber set is snapshotted first, so subscribers that re-subscribe while
	/// running are not invoked a second time for the same notification.
	///
	/// # Arguments
	///
	/// * `dependency_id` - ID of the dependency that changed
	pub fn notify(&self, dependency_id: NodeId) {
		let subscribers: Vec<NodeId> = match self.dependency_graph.borrow().get(&dependency_id) {
			Some(node) => node.subscribers.iter().copied().collect(),
			None => return,
		};
		tracing::trace!(
			dependency = ?dependency_id,
			subscribers = subscribers.len(),
			"notifying subscribers"
		);
		for subscriber in subscribers {
			self.run_subscriber(subscriber);
		}
	}

	/// Register the callback invoked when a dependency of `id` is notified
	pub fn register_subscriber(&self, id: NodeId, f: Box<dyn FnMut() + 'static>) {
		self.subscribers
			.borrow_mut()
			.insert(id, SubscriberSlot::Idle(f));
	}

	/// Remove the callback registered for `id`
	pub fn remove_subscriber(&self, id: NodeId) {
		let removed = self.subscribers.borrow_mut().remove(&id);
		// Captured state may touch the runtime when dropped.
		drop(removed);
	}

	/// Run the callback registered for `id`
	///
	/// A subscriber notified again while it is running (it wrote to a key it reads,
	/// or a subscriber it triggered did) runs again from scratch as soon as the
	/// current run returns, until a run completes without being notified.
	pub fn run_subscriber(&self, id: NodeId) {
		let mut f = {
			let mut subscribers = self.subscribers.borrow_mut();
			let Some(slot) = subscribers.get_mut(&id) else {
				return;
			};
			match core::mem::replace(slot, SubscriberSlot::Running { rerun: false }) {
				SubscriberSlot::Idle(f) => f,
				SubscriberSlot::Running { .. } => {
					tracing::trace!(subscriber = ?id, "subscriber notified while running; rerun queued");
					*slot = SubscriberSlot::Running { rerun: true };
					return;
				}
			}
		};

		loop {
			tracing::trace!(subscriber = ?id, "running subscriber");
			f();

			let mut subscribers = self.subscribers.borrow_mut();
			match subscribers.get_mut(&id) {
				Some(slot) => {
					if matches!(slot, SubscriberSlot::Running { rerun: true }) {
						*slot = SubscriberSlot::Running { rerun: false };
					} else {
						*slot = SubscriberSlot::Idle(f);
						return;
					}
				}
				None => {
					// Disposed while running.
					drop(subscribers);
					drop(f);
					return;
				}
			}
		}
	}

	/// Run `f` with `observer` as the active consumer
	///
	/// Dependencies recorded by the previous run of the same observer are cleared
	/// first, so keys that are no longer read stop notifying it. The observer is
	/// popped when `f` returns or unwinds.
	pub fn run_tracked<R>(&self, observer: Observer, f: impl FnOnce() -> R) -> R {
		self.clear_dependencies(observer.id);
		self.push_observer(observer);
		let _guard = ObserverGuard;
		f()
	}

	/// Clear dependencies for a node
	///
	/// # Arguments
	///
	/// * `node_id` - ID of the node whose dependencies should be cleared
	pub fn clear_dependencies(&self, node_id: NodeId) {
		let mut graph = self.dependency_graph.borrow_mut();
		let dependencies = match graph.get_mut(&node_id) {
			Some(node) => core::mem::take(&mut node.dependencies),
			None => return,
		};
		for dep_id in dependencies {
			if let Some(dep_node) = graph.get_mut(&dep_id) {
				dep_node.subscribers.remove(&node_id);
			}
		}
	}

	/// Remove a node from the dependency graph
	///
	/// Both directions are cleaned: the node stops depending on anything, and
	/// nothing keeps it as a dependency.
	///
	/// # Arguments
	///
	/// * `node_id` - ID of the node to remove
	pub fn remove_node(&self, node_id: NodeId) {
		self.clear_dependencies(node_id);
		let mut graph = self.dependency_graph.borrow_mut();
		if let Some(node) = graph.remove(&node_id) {
			for subscriber in node.subscribers {
				if let Some(subscriber_node) = graph.get_mut(&subscriber) {
					subscriber_node.dependencies.remove(&node_id);
				}
			}
		}
	}

	/// Check if a node exists in the dependency graph (for testing)
	pub fn has_node(&self, node_id: NodeId) -> bool {
		self.dependency_graph.borrow().contains_key(&node_id)
	}

	/// Get the number of subscribers for a node (for testing)
	pub fn subscriber_count(&self, node_id: NodeId) -> usize {
		self.dependency_graph
			.borrow()
			.get(&node_id)
			.map(|node| node.subscribers.len())
			.unwrap_or(0)
	}

	/// Get the number of dependencies for a node (for testing)
	pub fn dependency_count(&self, node_id: NodeId) -> usize {
		self.dependency_graph
			.borrow()
			.get(&node_id)
			.map(|node| node.dependencies.len())
			.unwrap_or(0)
	}
}

impl Default for Runtime {
	fn default() -> Self {
		Self::new()
	}
}

struct ObserverGuard;

impl Drop for ObserverGuard {
	fn drop(&mut self) {
		let _ = try_with_runtime(|rt| rt.pop_observer());
	}
}

// Thread-local runtime instance
//
// In WASM there is only one thread, so this is effectively a global runtime.
thread_local! {
	static RUNTIME: Runtime = Runtime::new();
}

/// Get a reference to the thread's runtime
///
/// # Example
///
/// ```ignore
/// use tessera_reactive::runtime::with_runtime;
///
/// with_runtime(|rt| rt.track_dependency(dependency_id));
/// ```
pub fn with_runtime<F, R>(f: F) -> R
where
	F: FnOnce(&Runtime) -> R,
{
	RUNTIME.with(f)
}

/// Try to access the runtime (safe version for Drop implementations)
///
/// Returns None if the thread-local storage has been destroyed.
pub(crate) fn try_with_runtime<F, R>(f: F) -> Option<R>
where
	F: FnOnce(&Runtime) -> R,
{
	RUNTIME.try_with(f).ok()
}

/// Run `f` without recording any reads against the current observer
///
/// # Example
///
/// ```ignore
/// let snapshot = untrack(|| state.get("theme"));
/// ```
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
	with_runtime(|rt| {
		rt.push_observer(Observer::new(NodeId::new(), NodeType::Untracked));
	});
	let _guard = ObserverGuard;
	f()
}
