//! Per-key dependency
//!
//! A [`Dependency`] is the subscriber registry behind one reactive key. Reading
//! the key calls [`Dependency::depend`], writing it calls [`Dependency::notify`].

use core::fmt;

use crate::runtime::{NodeId, try_with_runtime, with_runtime};

/// Subscriber registry for a single reactive key
///
/// The registry does not own its subscribers; it only records their ids in the
/// runtime's dependency graph. Dropping the dependency detaches it from every
/// subscriber.
pub struct Dependency {
	id: NodeId,
}

impl Dependency {
	pub fn new() -> Self {
		Self { id: NodeId::new() }
	}

	/// ID of this dependency in the runtime graph
	pub fn id(&self) -> NodeId {
		self.id
	}

	/// Subscribe the active consumer, if any
	pub fn depend(&self) {
		with_runtime(|rt| rt.track_dependency(self.id));
	}

	/// Re-run every current subscriber once, synchronously
	pub fn notify(&self) {
		with_runtime(|rt| rt.notify(self.id));
	}

	/// Number of computations currently subscribed
	pub fn subscriber_count(&self) -> usize {
		with_runtime(|rt| rt.subscriber_count(self.id))
	}
}

impl Default for Dependency {
	fn default() -> Self {
		Self::new()
	}
}

impl Drop for Dependency {
	fn drop(&mut self) {
		let _ = try_with_runtime(|rt| rt.remove_node(self.id));
	}
}

impl fmt::Debug for Dependency {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Dependency")
			.field("id", &self.id)
			.field("subscribers", &self.subscriber_count())
			.finish()
	}
}
