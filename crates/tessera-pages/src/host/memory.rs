//! In-memory host tree
//!
//! [`MemoryHost`] keeps nodes in a flat arena and records every mutation in a
//! log. It serves non-browser targets and makes the commit phase observable in
//! tests.

use core::fmt;
use std::collections::BTreeSet;

use indexmap::IndexMap;

use super::{HostTree, NODE_VALUE};
use crate::error::HostError;
use crate::html::{escape, is_void_element, write_open_tag};
use crate::vnode::{Event, EventHandler, PropValue};

/// Handle to a node owned by a [`MemoryHost`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemoryNodeId(usize);

impl fmt::Display for MemoryNodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// One host mutation, in the order it was applied
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
	CreateElement { node: MemoryNodeId, tag: String },
	CreateText { node: MemoryNodeId, value: String },
	AppendChild { parent: MemoryNodeId, child: MemoryNodeId },
	RemoveChild { parent: MemoryNodeId, child: MemoryNodeId },
	SetProperty { node: MemoryNodeId, name: String, value: PropValue },
	RemoveProperty { node: MemoryNodeId, name: String },
	AddListener { node: MemoryNodeId, event: String },
	RemoveListener { node: MemoryNodeId, event: String },
}

#[derive(Debug)]
enum NodeKind {
	Element(String),
	Text,
}

#[derive(Debug)]
struct MemoryNode {
	kind: NodeKind,
	parent: Option<MemoryNodeId>,
	children: Vec<MemoryNodeId>,
	properties: IndexMap<String, PropValue>,
	listeners: Vec<(String, EventHandler)>,
}

impl MemoryNode {
	fn new(kind: NodeKind) -> Self {
		Self {
			kind,
			parent: None,
			children: Vec::new(),
			properties: IndexMap::new(),
			listeners: Vec::new(),
		}
	}
}

/// Arena-backed host tree with a mutation log
#[derive(Debug, Default)]
pub struct MemoryHost {
	nodes: Vec<MemoryNode>,
	log: Vec<Mutation>,
	rejected_properties: BTreeSet<String>,
}

impl MemoryHost {
	pub fn new() -> Self {
		Self::default()
	}

	/// Create a detached element to render into; not recorded in the log
	pub fn create_container(&mut self, tag: &str) -> MemoryNodeId {
		self.insert(MemoryNode::new(NodeKind::Element(tag.to_string())))
	}

	/// Make every later write of `name` fail with [`HostError::Property`]
	pub fn reject_property(&mut self, name: impl Into<String>) {
		self.rejected_properties.insert(name.into());
	}

	pub fn mutations(&self) -> &[Mutation] {
		&self.log
	}

	pub fn take_mutations(&mut self) -> Vec<Mutation> {
		core::mem::take(&mut self.log)
	}

	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	pub fn children(&self, node: MemoryNodeId) -> Vec<MemoryNodeId> {
		self.node(node)
			.map(|n| n.children.clone())
			.unwrap_or_default()
	}

	pub fn parent(&self, node: MemoryNodeId) -> Option<MemoryNodeId> {
		self.node(node).ok().and_then(|n| n.parent)
	}

	pub fn tag(&self, node: MemoryNodeId) -> Option<&str> {
		match &self.node(node).ok()?.kind {
			NodeKind::Element(tag) => Some(tag),
			NodeKind::Text => None,
		}
	}

	/// Value of a text node
	pub fn text(&self, node: MemoryNodeId) -> Option<&str> {
		let node = self.node(node).ok()?;
		match node.kind {
			NodeKind::Text => node.properties.get(NODE_VALUE).and_then(PropValue::as_str),
			NodeKind::Element(_) => None,
		}
	}

	pub fn property(&self, node: MemoryNodeId, name: &str) -> Option<&PropValue> {
		self.node(node).ok()?.properties.get(name)
	}

	pub fn listener_count(&self, node: MemoryNodeId) -> usize {
		self.node(node).map(|n| n.listeners.len()).unwrap_or(0)
	}

	/// Invoke every listener registered on `node` for `event.kind`
	///
	/// Returns the number of listeners called.
	pub fn dispatch(&self, node: MemoryNodeId, event: &Event) -> usize {
		let handlers: Vec<EventHandler> = match self.node(node) {
			Ok(n) => n
				.listeners
				.iter()
				.filter(|(name, _)| *name == event.kind)
				.map(|(_, handler)| handler.clone())
				.collect(),
			Err(_) => return 0,
		};
		for handler in &handlers {
			handler.call(event);
		}
		handlers.len()
	}

	/// First element with the given tag, depth first from `root`
	pub fn find_by_tag(&self, root: MemoryNodeId, tag: &str) -> Option<MemoryNodeId> {
		if self.tag(root) == Some(tag) {
			return Some(root);
		}
		self.children(root)
			.into_iter()
			.find_map(|child| self.find_by_tag(child, tag))
	}

	/// Serialise the children of `node`
	pub fn inner_html(&self, node: MemoryNodeId) -> String {
		let mut out = String::new();
		for child in self.children(node) {
			self.write_html(child, &mut out);
		}
		out
	}

	/// Serialise `node` and its subtree
	pub fn to_html(&self, node: MemoryNodeId) -> String {
		let mut out = String::new();
		self.write_html(node, &mut out);
		out
	}

	fn write_html(&self, id: MemoryNodeId, out: &mut String) {
		let Ok(node) = self.node(id) else {
			return;
		};
		match &node.kind {
			NodeKind::Text => {
				if let Some(value) = node.properties.get(NODE_VALUE).and_then(PropValue::as_str) {
					out.push_str(&escape(value));
				}
			}
			NodeKind::Element(tag) => {
				write_open_tag(out, tag, node.properties.iter().map(|(k, v)| (k.as_str(), v)));
				if is_void_element(tag) {
					return;
				}
				for child in &node.children {
					self.write_html(*child, out);
				}
				out.push_str(&format!("</{}>", tag));
			}
		}
	}

	fn insert(&mut self, node: MemoryNode) -> MemoryNodeId {
		self.nodes.push(node);
		MemoryNodeId(self.nodes.len() - 1)
	}

	fn node(&self, id: MemoryNodeId) -> Result<&MemoryNode, HostError> {
		self.nodes
			.get(id.0)
			.ok_or_else(|| HostError::UnknownNode(id.to_string()))
	}

	fn node_mut(&mut self, id: MemoryNodeId) -> Result<&mut MemoryNode, HostError> {
		self.nodes
			.get_mut(id.0)
			.ok_or_else(|| HostError::UnknownNode(id.to_string()))
	}

	fn detach(&mut self, child: MemoryNodeId) -> Result<(), HostError> {
		if let Some(parent) = self.node(child)?.parent {
			self.node_mut(parent)?.children.retain(|c| *c != child);
			self.node_mut(child)?.parent = None;
		}
		Ok(())
	}
}

impl HostTree for MemoryHost {
	type Node = MemoryNodeId;

	fn create_element(&mut self, tag: &str) -> Result<Self::Node, HostError> {
		let node = self.insert(MemoryNode::new(NodeKind::Element(tag.to_string())));
		self.log.push(Mutation::CreateElement {
			node,
			tag: tag.to_string(),
		});
		Ok(node)
	}

	fn create_text(&mut self, value: &str) -> Result<Self::Node, HostError> {
		let mut text = MemoryNode::new(NodeKind::Text);
		text.properties
			.insert(NODE_VALUE.to_string(), PropValue::Str(value.to_string()));
		let node = self.insert(text);
		self.log.push(Mutation::CreateText {
			node,
			value: value.to_string(),
		});
		Ok(node)
	}

	fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), HostError> {
		self.node(*parent)?;
		self.detach(*child)?;
		self.node_mut(*parent)?.children.push(*child);
		self.node_mut(*child)?.parent = Some(*parent);
		self.log.push(Mutation::AppendChild {
			parent: *parent,
			child: *child,
		});
		Ok(())
	}

	fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), HostError> {
		if !self.node(*parent)?.children.contains(child) {
			return Err(HostError::NotAChild {
				parent: parent.to_string(),
				child: child.to_string(),
			});
		}
		self.detach(*child)?;
		self.log.push(Mutation::RemoveChild {
			parent: *parent,
			child: *child,
		});
		Ok(())
	}

	fn get_property(&self, node: &Self::Node, name: &str) -> Result<Option<PropValue>, HostError> {
		Ok(self.node(*node)?.properties.get(name).cloned())
	}

	fn set_property(
		&mut self,
		node: &Self::Node,
		name: &str,
		value: &PropValue,
	) -> Result<(), HostError> {
		if self.rejected_properties.contains(name) {
			return Err(HostError::Property {
				name: name.to_string(),
				reason: "rejected by host".to_string(),
			});
		}
		self.node_mut(*node)?
			.properties
			.insert(name.to_string(), value.clone());
		self.log.push(Mutation::SetProperty {
			node: *node,
			name: name.to_string(),
			value: value.clone(),
		});
		Ok(())
	}

	fn remove_property(&mut self, node: &Self::Node, name: &str) -> Result<(), HostError> {
		self.node_mut(*node)?.properties.shift_remove(name);
		self.log.push(Mutation::RemoveProperty {
			node: *node,
			name: name.to_string(),
		});
		Ok(())
	}

	fn add_event_listener(
		&mut self,
		node: &Self::Node,
		event: &str,
		handler: &EventHandler,
	) -> Result<(), HostError> {
		self.node_mut(*node)?
			.listeners
			.push((event.to_string(), handler.clone()));
		self.log.push(Mutation::AddListener {
			node: *node,
			event: event.to_string(),
		});
		Ok(())
	}

	fn remove_event_listener(
		&mut self,
		node: &Self::Node,
		event: &str,
		handler: &EventHandler,
	) -> Result<(), HostError> {
		self.node_mut(*node)?
			.listeners
			.retain(|(name, existing)| !(name == event && existing == handler));
		self.log.push(Mutation::RemoveListener {
			node: *node,
			event: event.to_string(),
		});
		Ok(())
	}
}
