//! Host tree abstraction
//!
//! The renderer mutates the host tree (a DOM document, an in-memory tree)
//! exclusively through [`HostTree`]. Every primitive may fail; failures are
//! propagated and halt the current scheduler turn.

#[cfg(target_arch = "wasm32")]
pub mod dom;
pub mod memory;

use core::fmt::Debug;

use crate::error::HostError;
use crate::vnode::{EventHandler, PropValue};

#[cfg(target_arch = "wasm32")]
pub use dom::{DomHost, IdleCallbackDriver};
pub use memory::{MemoryHost, MemoryNodeId, Mutation};

/// Mutable host tree primitives
pub trait HostTree {
	/// Handle to a host node. Handles are cheap to clone and compare.
	type Node: Clone + Debug + PartialEq + 'static;

	fn create_element(&mut self, tag: &str) -> Result<Self::Node, HostError>;

	fn create_text(&mut self, value: &str) -> Result<Self::Node, HostError>;

	fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), HostError>;

	fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), HostError>;

	fn get_property(&self, node: &Self::Node, name: &str) -> Result<Option<PropValue>, HostError>;

	fn set_property(
		&mut self,
		node: &Self::Node,
		name: &str,
		value: &PropValue,
	) -> Result<(), HostError>;

	fn remove_property(&mut self, node: &Self::Node, name: &str) -> Result<(), HostError>;

	/// `event` is the lower-case event name, without the `on` prefix.
	fn add_event_listener(
		&mut self,
		node: &Self::Node,
		event: &str,
		handler: &EventHandler,
	) -> Result<(), HostError>;

	fn remove_event_listener(
		&mut self,
		node: &Self::Node,
		event: &str,
		handler: &EventHandler,
	) -> Result<(), HostError>;
}

/// Property name used for the value of text nodes
pub const NODE_VALUE: &str = "nodeValue";
