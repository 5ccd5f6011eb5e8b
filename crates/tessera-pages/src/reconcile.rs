//! Child reconciliation
//!
//! For every fiber with children the renderer asks a [`DiffStrategy`] to turn the
//! new child elements into fibers of the work-in-progress generation, classifying
//! each old child fiber on the way. The committed generation is only read; old
//! fibers scheduled for removal are recorded in the work-in-progress deletion
//! list and tagged when the deletion is committed.

use crate::fiber::{Fiber, FiberId, Generation};
use crate::vnode::VNode;

/// The two generations a diff works on
pub struct ReconcileScope<'a, N> {
	pub wip: &'a mut Generation<N>,
	/// Last committed generation; `None` on first mount
	pub current: Option<&'a Generation<N>>,
}

/// Turns child elements into fibers under `parent`
pub trait DiffStrategy<N> {
	fn reconcile_children(&self, scope: &mut ReconcileScope<'_, N>, parent: FiberId, elements: &[VNode]);
}

/// Index-by-index comparison of new elements with old child fibers
///
/// - same type at the same index: `Update`, host node and hooks carried over
/// - new element otherwise: `Placement`
/// - old fiber otherwise: appended to the deletion list, subtree included
///
/// Reordering is expressed as deletions plus placements; nothing is moved.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalDiff;

impl<N: Clone> DiffStrategy<N> for PositionalDiff {
	fn reconcile_children(&self, scope: &mut ReconcileScope<'_, N>, parent: FiberId, elements: &[VNode]) {
		let current = scope.current;
		let mut old = scope
			.wip
			.get(parent)
			.and_then(|fiber| fiber.alternate)
			.and_then(|alternate| current?.get(alternate))
			.and_then(|fiber| fiber.child);

		let mut previous: Option<FiberId> = None;
		let mut index = 0;

		while index < elements.len() || old.is_some() {
			let element = elements.get(index);
			let old_fiber = old.and_then(|id| Some((id, current?.get(id)?)));

			let new_fiber = match (element, old_fiber) {
				(Some(element), Some((old_id, old_fiber)))
					if element.node_type().same_type(&old_fiber.node_type) =>
				{
					Some(Fiber::update(element, old_fiber, old_id, parent))
				}
				(element, old_fiber) => {
					if let Some((old_id, _)) = old_fiber {
						scope.wip.push_deletion(old_id);
					}
					element.map(|element| Fiber::placement(element, parent))
				}
			};

			if let Some(fiber) = new_fiber {
				let id = scope.wip.insert(fiber);
				let link = match previous {
					None => scope.wip.get_mut(parent).map(|fiber| &mut fiber.child),
					Some(prev) => scope.wip.get_mut(prev).map(|fiber| &mut fiber.sibling),
				};
				if let Some(slot) = link {
					*slot = Some(id);
				}
				previous = Some(id);
			}

			old = old_fiber.and_then(|(_, fiber)| fiber.sibling);
			index += 1;
		}
	}
}
