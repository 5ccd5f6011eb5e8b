//! Fiber tree
//!
//! A fiber is the mutable, per-position mirror of one [`VNode`]. Fibers of one
//! render cycle live in a [`Generation`], a `slotmap` arena addressed by
//! [`FiberId`]. Links use the first-child / next-sibling encoding. The
//! `alternate` of a fiber is the id of the fiber at the same position in the
//! previously committed generation, so it is only meaningful together with that
//! generation.

use core::fmt;
use std::rc::Rc;

use slotmap::SlotMap;
use tessera_reactive::Tracker;

use crate::hooks::HookList;
use crate::vnode::{NodeType, Props, VNode};

slotmap::new_key_type! {
	/// Handle to a fiber inside one [`Generation`]
	pub struct FiberId;
}

/// Host mutation a fiber requires at commit time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectTag {
	Placement,
	Update,
	Deletion,
}

/// Tag of the synthetic root fiber that owns the container node
pub const ROOT_TAG: &str = "#root";

pub struct Fiber<N> {
	pub node_type: NodeType,
	pub props: Rc<Props>,
	/// Host node; `None` for components and for host fibers not created yet
	pub node: Option<N>,
	pub parent: Option<FiberId>,
	pub child: Option<FiberId>,
	pub sibling: Option<FiberId>,
	/// Same position in the previously committed generation
	pub alternate: Option<FiberId>,
	pub effect_tag: Option<EffectTag>,
	/// Hook cells, in call order (components only)
	pub hooks: HookList,
	/// Records the reactive reads of the last render (components only)
	pub tracker: Option<Rc<Tracker>>,
}

impl<N> Fiber<N> {
	pub fn new(node_type: NodeType, props: Rc<Props>) -> Self {
		Self {
			node_type,
			props,
			node: None,
			parent: None,
			child: None,
			sibling: None,
			alternate: None,
			effect_tag: None,
			hooks: Vec::new(),
			tracker: None,
		}
	}

	/// Fiber for an element with no counterpart in the old tree
	pub fn placement(element: &VNode, parent: FiberId) -> Self {
		let mut fiber = Self::new(element.node_type().clone(), element.props().clone());
		fiber.parent = Some(parent);
		fiber.effect_tag = Some(EffectTag::Placement);
		fiber
	}

	/// Fiber reusing the host node of `old`, which sits at `old_id`
	pub fn update(element: &VNode, old: &Fiber<N>, old_id: FiberId, parent: FiberId) -> Self
	where
		N: Clone,
	{
		let mut fiber = Self::new(element.node_type().clone(), element.props().clone());
		fiber.node = old.node.clone();
		fiber.parent = Some(parent);
		fiber.alternate = Some(old_id);
		fiber.effect_tag = Some(EffectTag::Update);
		fiber
	}

	pub fn is_component(&self) -> bool {
		self.node_type.is_component()
	}
}

impl<N: fmt::Debug> fmt::Debug for Fiber<N> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Fiber")
			.field("node_type", &self.node_type)
			.field("node", &self.node)
			.field("parent", &self.parent)
			.field("child", &self.child)
			.field("sibling", &self.sibling)
			.field("alternate", &self.alternate)
			.field("effect_tag", &self.effect_tag)
			.field("hooks", &self.hooks.len())
			.finish()
	}
}

/// All fibers of one render cycle
pub struct Generation<N> {
	fibers: SlotMap<FiberId, Fiber<N>>,
	root: Option<FiberId>,
	/// Old fibers to delete, in diff order. Ids refer to the generation this one
	/// was diffed against, not to this one.
	deletions: Vec<FiberId>,
}

impl<N> Generation<N> {
	pub fn new() -> Self {
		Self {
			fibers: SlotMap::with_key(),
			root: None,
			deletions: Vec::new(),
		}
	}

	pub fn insert(&mut self, fiber: Fiber<N>) -> FiberId {
		self.fibers.insert(fiber)
	}

	pub fn get(&self, id: FiberId) -> Option<&Fiber<N>> {
		self.fibers.get(id)
	}

	pub fn get_mut(&mut self, id: FiberId) -> Option<&mut Fiber<N>> {
		self.fibers.get_mut(id)
	}

	pub fn root(&self) -> Option<FiberId> {
		self.root
	}

	pub fn set_root(&mut self, root: FiberId) {
		self.root = Some(root);
	}

	pub fn deletions(&self) -> &[FiberId] {
		&self.deletions
	}

	pub(crate) fn push_deletion(&mut self, old: FiberId) {
		self.deletions.push(old);
	}

	pub fn len(&self) -> usize {
		self.fibers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.fibers.is_empty()
	}

	/// Children of `id`, in sibling order
	pub fn children(&self, id: FiberId) -> Vec<FiberId> {
		let mut out = Vec::new();
		let mut next = self.get(id).and_then(|fiber| fiber.child);
		while let Some(child) = next {
			out.push(child);
			next = self.get(child).and_then(|fiber| fiber.sibling);
		}
		out
	}

	/// `start` and its descendants, depth first, parents before children
	pub fn subtree(&self, start: FiberId) -> Vec<FiberId> {
		let mut out = Vec::new();
		let mut stack = vec![start];
		while let Some(id) = stack.pop() {
			if self.get(id).is_none() {
				continue;
			}
			out.push(id);
			stack.extend(self.children(id).into_iter().rev());
		}
		out
	}

	/// Every fiber reachable from the root, depth first
	pub fn preorder(&self) -> Vec<FiberId> {
		self.root.map(|root| self.subtree(root)).unwrap_or_default()
	}

	/// Host node of the nearest ancestor of `id` that has one
	pub fn host_parent(&self, id: FiberId) -> Option<&N> {
		let mut next = self.get(id)?.parent;
		while let Some(parent) = next {
			let fiber = self.get(parent)?;
			if let Some(node) = &fiber.node {
				return Some(node);
			}
			next = fiber.parent;
		}
		None
	}

	/// Number of reachable fibers carrying `tag`
	pub fn count_tagged(&self, tag: EffectTag) -> usize {
		self.fibers
			.values()
			.filter(|fiber| fiber.effect_tag == Some(tag))
			.count()
	}

	/// Fibers carrying `tag`, depth first
	pub fn tagged(&self, tag: EffectTag) -> Vec<FiberId> {
		self.preorder()
			.into_iter()
			.filter(|id| self.get(*id).is_some_and(|fiber| fiber.effect_tag == Some(tag)))
			.collect()
	}
}

impl<N> Default for Generation<N> {
	fn default() -> Self {
		Self::new()
	}
}

impl<N: fmt::Debug> fmt::Debug for Generation<N> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Generation")
			.field("root", &self.root)
			.field("fibers", &self.fibers.len())
			.field("deletions", &self.deletions)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::vnode::{Props, element, text};

	fn host(tag: &'static str) -> Fiber<u32> {
		Fiber::new(NodeType::Host(tag.into()), Rc::new(Props::new()))
	}

	fn link(generation: &mut Generation<u32>, parent: FiberId, children: &[FiberId]) {
		let mut previous: Option<FiberId> = None;
		for &child in children {
			if let Some(fiber) = generation.get_mut(child) {
				fiber.parent = Some(parent);
			}
			match previous {
				None => generation.get_mut(parent).unwrap().child = Some(child),
				Some(prev) => generation.get_mut(prev).unwrap().sibling = Some(child),
			}
			previous = Some(child);
		}
	}

	#[test]
	fn test_preorder_visits_parents_first() {
		let mut generation = Generation::new();
		let root = generation.insert(host("root"));
		let a = generation.insert(host("a"));
		let b = generation.insert(host("b"));
		let a1 = generation.insert(host("a1"));
		generation.set_root(root);
		link(&mut generation, root, &[a, b]);
		link(&mut generation, a, &[a1]);

		assert_eq!(generation.preorder(), vec![root, a, a1, b]);
		assert_eq!(generation.children(root), vec![a, b]);
		assert_eq!(generation.subtree(a), vec![a, a1]);
	}

	#[test]
	fn test_host_parent_skips_nodeless_fibers() {
		let mut generation = Generation::new();
		let mut root_fiber = host("root");
		root_fiber.node = Some(1);
		let root = generation.insert(root_fiber);
		let component = generation.insert(host("component"));
		let leaf = generation.insert(host("leaf"));
		generation.set_root(root);
		link(&mut generation, root, &[component]);
		link(&mut generation, component, &[leaf]);

		assert_eq!(generation.host_parent(leaf), Some(&1));
		assert_eq!(generation.host_parent(root), None);
	}

	#[test]
	fn test_update_reuses_node_and_sets_alternate() {
		let mut old_generation = Generation::new();
		let mut old = Fiber::new(NodeType::Host("p".into()), Rc::new(Props::new()));
		old.node = Some(9u32);
		let old_id = old_generation.insert(old);

		let mut new_generation: Generation<u32> = Generation::new();
		let parent = new_generation.insert(host("root"));
		let element = element("p", Props::new().attr("id", "x"), [text("hi")]);
		let old = old_generation.get(old_id).unwrap();
		let fiber = Fiber::update(&element, old, old_id, parent);

		assert_eq!(fiber.node, Some(9));
		assert_eq!(fiber.alternate, Some(old_id));
		assert_eq!(fiber.effect_tag, Some(EffectTag::Update));
		assert_eq!(fiber.props.get_str("id"), Some("x"));
	}

	#[test]
	fn test_count_tagged() {
		let mut generation: Generation<u32> = Generation::new();
		let root = generation.insert(host("root"));
		let element = text("x");
		generation.insert(Fiber::placement(&element, root));
		generation.insert(Fiber::placement(&element, root));

		assert_eq!(generation.count_tagged(EffectTag::Placement), 2);
		assert_eq!(generation.count_tagged(EffectTag::Update), 0);
	}
}
