//! Commit phase
//!
//! Applies a finished work-in-progress generation to the host tree in one pass:
//!
//! 1. deletions collected during diffing, in order, before anything else; the
//!    listeners of every host node in a deleted subtree are released
//! 2. a depth-first walk appending `Placement` nodes and patching `Update` nodes
//!    under their nearest host ancestor
//! 3. commit callbacks for the hooks of every rendered component
//!
//! The phase is never interrupted. A host failure stops it where it is.

use crate::error::{HostError, RenderResult};
use crate::fiber::{EffectTag, FiberId, Generation};
use crate::hooks::CommitPhase;
use crate::host::{HostTree, NODE_VALUE};
use crate::vnode::{NodeType, PropValue, Props, event_name, is_listener};

/// Counts reported for one commit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitStats {
	/// Host nodes appended
	pub placements: usize,
	/// Host nodes patched in place
	pub updates: usize,
	/// Old subtrees detached
	pub deletions: usize,
	/// Components committed for the first time
	pub mounted: usize,
	/// Components removed
	pub unmounted: usize,
}

pub(crate) fn commit_root<H: HostTree>(
	host: &mut H,
	wip: &Generation<H::Node>,
	mut current: Option<&mut Generation<H::Node>>,
) -> RenderResult<CommitStats> {
	let mut stats = CommitStats::default();

	if let Some(current) = current.as_deref_mut() {
		for &old_id in wip.deletions() {
			if let Some(fiber) = current.get_mut(old_id) {
				fiber.effect_tag = Some(EffectTag::Deletion);
			}
			stats.unmounted += unmount_components(current, old_id);
			release_listeners(host, current, old_id)?;

			let Some(parent) = current.host_parent(old_id).cloned() else {
				continue;
			};
			commit_deletion(host, current, old_id, &parent)?;
			stats.deletions += 1;
		}
	}

	let current = current.as_deref();
	let preorder = wip.preorder();
	for &id in preorder.iter().skip(1) {
		let Some(fiber) = wip.get(id) else {
			continue;
		};
		let Some(node) = &fiber.node else {
			continue;
		};
		match fiber.effect_tag {
			Some(EffectTag::Placement) => {
				let parent = wip
					.host_parent(id)
					.ok_or_else(|| HostError::Operation(format!("fiber {id:?} has no host ancestor")))?;
				host.append_child(parent, node)?;
				stats.placements += 1;
			}
			Some(EffectTag::Update) => {
				let alternate = fiber
					.alternate
					.and_then(|alternate| current?.get(alternate));
				match alternate {
					Some(old) => update_dom(host, node, &old.node_type, &old.props, &fiber.node_type, &fiber.props)?,
					None => update_dom(host, node, &fiber.node_type, &Props::new(), &fiber.node_type, &fiber.props)?,
				}
				stats.updates += 1;
			}
			Some(EffectTag::Deletion) | None => {}
		}
	}

	for &id in &preorder {
		let Some(fiber) = wip.get(id).filter(|fiber| fiber.is_component()) else {
			continue;
		};
		let phase = match fiber.effect_tag {
			Some(EffectTag::Placement) => {
				stats.mounted += 1;
				CommitPhase::Mount
			}
			Some(EffectTag::Update) => CommitPhase::Update,
			_ => continue,
		};
		for hook in &fiber.hooks {
			hook.on_commit(phase);
		}
	}

	Ok(stats)
}

/// Run unmount callbacks for every component under `root`; returns how many
fn unmount_components<N>(generation: &Generation<N>, root: FiberId) -> usize {
	let mut unmounted = 0;
	for id in generation.subtree(root) {
		let Some(fiber) = generation.get(id).filter(|fiber| fiber.is_component()) else {
			continue;
		};
		for hook in &fiber.hooks {
			hook.on_commit(CommitPhase::Unmount);
		}
		if let Some(tracker) = &fiber.tracker {
			tracker.clear();
		}
		unmounted += 1;
	}
	unmounted
}

/// Drop the listeners the host holds for every node under `root`
fn release_listeners<H: HostTree>(
	host: &mut H,
	generation: &Generation<H::Node>,
	root: FiberId,
) -> Result<(), HostError> {
	for id in generation.subtree(root) {
		let Some(fiber) = generation.get(id) else {
			continue;
		};
		let (Some(node), NodeType::Host(_)) = (&fiber.node, &fiber.node_type) else {
			continue;
		};
		for (key, handler) in fiber.props.listeners() {
			host.remove_event_listener(node, &event_name(key), handler)?;
		}
	}
	Ok(())
}

/// Detach the host nodes of `id`, descending through fibers without one
fn commit_deletion<H: HostTree>(
	host: &mut H,
	generation: &Generation<H::Node>,
	id: FiberId,
	parent: &H::Node,
) -> Result<(), HostError> {
	let Some(fiber) = generation.get(id) else {
		return Ok(());
	};
	match &fiber.node {
		Some(node) => host.remove_child(parent, node),
		None => {
			for child in generation.children(id) {
				commit_deletion(host, generation, child, parent)?;
			}
			Ok(())
		}
	}
}

/// Patch `node` from the old props to the new ones
///
/// Order: drop vanished or changed listeners, drop vanished properties, write new
/// or changed properties, attach new or changed listeners. Text nodes only have
/// their value rewritten when it changed.
pub fn update_dom<H: HostTree>(
	host: &mut H,
	node: &H::Node,
	old_type: &NodeType,
	old_props: &Props,
	new_type: &NodeType,
	new_props: &Props,
) -> Result<(), HostError> {
	if let NodeType::Text(value) = new_type {
		if !matches!(old_type, NodeType::Text(old) if old == value) {
			host.set_property(node, NODE_VALUE, &PropValue::Str(value.clone()))?;
		}
		return Ok(());
	}

	for (key, handler) in old_props.listeners() {
		match new_props.get(key) {
			Some(PropValue::Handler(next)) if next == handler => {}
			_ => host.remove_event_listener(node, &event_name(key), handler)?,
		}
	}

	for (key, _) in old_props.properties() {
		match new_props.get(key) {
			Some(value) if !is_listener(key, value) => {}
			_ => host.remove_property(node, key)?,
		}
	}

	for (key, value) in new_props.properties() {
		if old_props.get(key) != Some(value) {
			host.set_property(node, key, value)?;
		}
	}

	for (key, handler) in new_props.listeners() {
		match old_props.get(key) {
			Some(PropValue::Handler(previous)) if previous == handler => {}
			_ => host.add_event_listener(node, &event_name(key), handler)?,
		}
	}

	Ok(())
}
