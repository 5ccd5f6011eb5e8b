//! Class components
//!
//! Besides plain render functions (see [`component`](crate::vnode::component)),
//! a component can be an object implementing [`Component`]. The instance is kept
//! in a hook cell of its fiber, so it survives re-renders at the same position.
//! Its props are exposed as a [`ReactiveObject`]; any reactive read made while it
//! renders subscribes the component, and a later write schedules a new render.
//!
//! ## Example
//!
//! ```ignore
//! use tessera_pages::component::{Component, class};
//! use tessera_pages::vnode::{PropValue, Props, VNode, element};
//! use tessera_reactive::ReactiveObject;
//!
//! struct Counter {
//!     props: ReactiveObject<PropValue>,
//!     state: ReactiveObject<i32>,
//! }
//!
//! impl Component for Counter {
//!     fn create(props: ReactiveObject<PropValue>) -> Self {
//!         let state = [("count", 0)].into_iter().collect();
//!         Self { props, state }
//!     }
//!
//!     fn render(&self) -> VNode {
//!         let count = self.state.get("count").unwrap_or_default();
//!         let state = self.state.clone();
//!         element(
//!             "button",
//!             Props::new().on("click", move |_| {
//!                 state.update("count", |n| *n += 1);
//!             }),
//!             [count.to_string()],
//!         )
//!     }
//! }
//!
//! let view = class::<Counter>(Props::new());
//! ```

use core::any::Any;
use std::rc::Rc;

use tessera_reactive::{ReactiveObject, untrack};

use crate::hooks::{CommitPhase, Hook, next_slot};
use crate::vnode::{PropValue, Props, VNode, component};

/// Object-style component with lifecycle callbacks
pub trait Component: 'static {
	/// Build the instance the first time its position renders
	fn create(props: ReactiveObject<PropValue>) -> Self
	where
		Self: Sized;

	fn render(&self) -> VNode;

	/// After the first commit that attached this component
	fn component_did_mount(&self) {}

	/// After every later commit that re-rendered this component
	fn component_did_update(&self) {}

	/// Before the component's host nodes are detached
	fn component_will_unmount(&self) {}
}

/// Build a node for class component `C`
pub fn class<C: Component>(props: Props) -> VNode {
	component(class_render::<C>, props)
}

fn class_render<C: Component>(props: &Props) -> VNode {
	use_instance::<C>(props).instance.render()
}

struct InstanceHook<C> {
	instance: C,
	props: ReactiveObject<PropValue>,
}

impl<C: Component> Hook for InstanceHook<C> {
	fn on_commit(&self, phase: CommitPhase) {
		match phase {
			CommitPhase::Mount => self.instance.component_did_mount(),
			CommitPhase::Update => self.instance.component_did_update(),
			CommitPhase::Unmount => self.instance.component_will_unmount(),
		}
	}

	fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
		self
	}
}

fn use_instance<C: Component>(props: &Props) -> Rc<InstanceHook<C>> {
	let (hook, _) = next_slot(|| {
		let reactive = ReactiveObject::new();
		sync_props(&reactive, props);
		InstanceHook {
			instance: untrack(|| C::create(reactive.clone())),
			props: reactive,
		}
	});
	sync_props(&hook.props, props);
	hook
}

/// Copy incoming props without notifying; the component is rendering already.
fn sync_props(target: &ReactiveObject<PropValue>, props: &Props) {
	for stale in target.keys() {
		if props.get(&stale).is_none() {
			target.remove_untracked(&stale);
		}
	}
	for (key, value) in props.iter() {
		target.set_untracked(key, value.clone());
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::hooks::render_detached;
	use crate::vnode::{NodeType, text};

	struct Greeter {
		props: ReactiveObject<PropValue>,
	}

	impl Component for Greeter {
		fn create(props: ReactiveObject<PropValue>) -> Self {
			Self { props }
		}

		fn render(&self) -> VNode {
			let name = self
				.props
				.get("name")
				.and_then(|value| value.as_str().map(str::to_string))
				.unwrap_or_default();
			text(format!("Hello, {name}"))
		}
	}

	#[test]
	fn test_class_node_renders_instance() {
		let node = class::<Greeter>(Props::new().attr("name", "Ada"));
		let NodeType::Component(f) = node.node_type() else {
			panic!("expected component node");
		};

		let rendered = render_detached(|| f.call(node.props()));
		assert_eq!(rendered.node_type(), &NodeType::Text("Hello, Ada".into()));
	}

	#[test]
	fn test_class_identity_is_per_type() {
		struct Other;
		impl Component for Other {
			fn create(_: ReactiveObject<PropValue>) -> Self {
				Other
			}
			fn render(&self) -> VNode {
				text("")
			}
		}

		let a = class::<Greeter>(Props::new());
		let b = class::<Greeter>(Props::new().attr("name", "x"));
		let c = class::<Other>(Props::new());

		assert!(a.node_type().same_type(b.node_type()));
		assert!(!a.node_type().same_type(c.node_type()));
	}

	#[test]
	fn test_sync_props_drops_stale_keys() {
		let target = ReactiveObject::new();
		sync_props(&target, &Props::new().attr("a", 1).attr("b", 2));
		sync_props(&target, &Props::new().attr("b", 3));

		assert_eq!(target.keys(), vec!["b".to_string()]);
		assert_eq!(target.get_untracked("b"), Some(PropValue::Number(3.0)));
	}
}
