//! Hook slots
//!
//! Each component fiber owns an ordered list of hook cells. During a render the
//! n-th hook call receives the n-th cell of the alternate fiber, so cell identity
//! is the call index: a hook skipped conditionally shifts every later call onto a
//! different cell.
//!
//! Hooks are only available while a component renders; calling one elsewhere
//! panics.

use core::any::Any;
use core::cell::RefCell;
use core::fmt;
use std::rc::{Rc, Weak};

use crate::scheduler::UpdateQueue;

/// Commit event delivered to every hook of a committed component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitPhase {
	/// The component was placed for the first time
	Mount,
	/// The component was re-rendered at the same position
	Update,
	/// The component is being removed
	Unmount,
}

/// A hook cell stored on a fiber
pub trait Hook: Any {
	fn on_commit(&self, _phase: CommitPhase) {}

	fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

pub type HookList = Vec<Rc<dyn Hook>>;

struct HookFrame {
	previous: HookList,
	hooks: HookList,
	updates: Rc<UpdateQueue>,
}

thread_local! {
	static HOOK_FRAMES: RefCell<Vec<HookFrame>> = const { RefCell::new(Vec::new()) };
}

struct FrameGuard {
	armed: bool,
}

impl FrameGuard {
	fn finish(mut self) -> HookList {
		self.armed = false;
		HOOK_FRAMES
			.with(|frames| frames.borrow_mut().pop())
			.map(|frame| frame.hooks)
			.unwrap_or_default()
	}
}

impl Drop for FrameGuard {
	fn drop(&mut self) {
		if self.armed {
			let _ = HOOK_FRAMES.try_with(|frames| frames.borrow_mut().pop());
		}
	}
}

/// Run a component render with `previous` as the alternate's hook list
///
/// Returns the render result and the hook list built by this render.
pub(crate) fn with_hook_frame<R>(
	previous: HookList,
	updates: Rc<UpdateQueue>,
	f: impl FnOnce() -> R,
) -> (R, HookList) {
	HOOK_FRAMES.with(|frames| {
		frames.borrow_mut().push(HookFrame {
			previous,
			hooks: Vec::new(),
			updates,
		})
	});
	let guard = FrameGuard { armed: true };
	let result = f();
	(result, guard.finish())
}

/// Run a component render outside of any fiber
///
/// Every hook starts from its initial value and updates go nowhere. Used for
/// string rendering.
pub fn render_detached<R>(f: impl FnOnce() -> R) -> R {
	with_hook_frame(Vec::new(), Rc::new(UpdateQueue::new()), f).0
}

/// Claim the next hook cell of the rendering component
///
/// Reuses the alternate's cell at the same index when it has type `H`; otherwise
/// a fresh cell is built with `init`.
pub fn next_slot<H: Hook>(init: impl FnOnce() -> H) -> (Rc<H>, Rc<UpdateQueue>) {
	let (index, previous, updates) = HOOK_FRAMES.with(|frames| {
		let frames = frames.borrow();
		let Some(frame) = frames.last() else {
			panic!("hooks can only be called while a component renders");
		};
		let index = frame.hooks.len();
		(index, frame.previous.get(index).cloned(), frame.updates.clone())
	});

	let hook = match previous.map(|hook| hook.into_any().downcast::<H>()) {
		Some(Ok(hook)) => hook,
		Some(Err(_)) => {
			tracing::warn!(
				index,
				expected = core::any::type_name::<H>(),
				"hook slot changed type between renders; starting from a fresh cell"
			);
			Rc::new(init())
		}
		None => Rc::new(init()),
	};

	HOOK_FRAMES.with(|frames| {
		if let Some(frame) = frames.borrow_mut().last_mut() {
			frame.hooks.push(hook.clone());
		}
	});
	(hook, updates)
}

type Action<T> = Rc<dyn Fn(&T) -> T>;

struct StateCell<T> {
	state: T,
	queue: Vec<Action<T>>,
	/// Queue prefix replayed by the latest render
	rendered: usize,
}

/// Cell behind [`use_state`]
///
/// Updates are queued and replayed, oldest first, by the next render. They are
/// folded into the committed state only when that render commits, so an
/// abandoned render loses nothing.
pub struct StateHook<T> {
	cell: RefCell<StateCell<T>>,
}

impl<T: Clone + 'static> StateHook<T> {
	fn new(initial: T) -> Self {
		Self {
			cell: RefCell::new(StateCell {
				state: initial,
				queue: Vec::new(),
				rendered: 0,
			}),
		}
	}

	/// Committed state with every queued update applied
	fn render_value(&self) -> T {
		let mut cell = self.cell.borrow_mut();
		let value = cell
			.queue
			.iter()
			.fold(cell.state.clone(), |state, action| action(&state));
		cell.rendered = cell.queue.len();
		value
	}

	fn enqueue(&self, action: Action<T>) {
		self.cell.borrow_mut().queue.push(action);
	}

	fn pending(&self) -> usize {
		self.cell.borrow().queue.len()
	}
}

impl<T: Clone + 'static> Hook for StateHook<T> {
	fn on_commit(&self, phase: CommitPhase) {
		if phase == CommitPhase::Unmount {
			return;
		}
		let mut cell = self.cell.borrow_mut();
		let rendered = cell.rendered.min(cell.queue.len());
		let applied: Vec<Action<T>> = cell.queue.drain(..rendered).collect();
		cell.state = applied
			.iter()
			.fold(cell.state.clone(), |state, action| action(&state));
		cell.rendered = 0;
	}

	fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
		self
	}
}

/// Updater returned by [`use_state`]
///
/// Updating never changes the state synchronously: it queues the update and
/// requests a new render.
pub struct SetState<T> {
	cell: Weak<StateHook<T>>,
	updates: Rc<UpdateQueue>,
}

impl<T: Clone + 'static> SetState<T> {
	/// Replace the state
	pub fn set(&self, value: T) {
		self.push(Rc::new(move |_: &T| value.clone()));
	}

	/// Derive the next state from the previous one
	pub fn update<F>(&self, f: F)
	where
		F: Fn(&T) -> T + 'static,
	{
		self.push(Rc::new(f));
	}

	/// Number of queued updates not yet committed
	pub fn pending(&self) -> usize {
		self.cell.upgrade().map(|cell| cell.pending()).unwrap_or(0)
	}

	fn push(&self, action: Action<T>) {
		match self.cell.upgrade() {
			Some(cell) => {
				cell.enqueue(action);
				self.updates.request_render();
			}
			None => tracing::trace!("state update for an unmounted component ignored"),
		}
	}
}

impl<T> Clone for SetState<T> {
	fn clone(&self) -> Self {
		Self {
			cell: self.cell.clone(),
			updates: self.updates.clone(),
		}
	}
}

impl<T> fmt::Debug for SetState<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SetState")
			.field("mounted", &(self.cell.strong_count() > 0))
			.finish()
	}
}

/// Declares a piece of component state.
///
/// # Type Parameters
///
/// * `T` - The state type
///
/// # Arguments
///
/// * `initial` - Value used the first time this call index renders
///
/// # Returns
///
/// The current value and an updater that queues changes for the next render
///
/// # Example
///
/// ```ignore
/// use tessera_pages::hooks::use_state;
/// use tessera_pages::vnode::{Props, VNode, element};
///
/// fn theme_toggle(_: &Props) -> VNode {
///     let (theme, set_theme) = use_state("light".to_string());
///     let next = if theme == "light" { "dark" } else { "light" };
///
///     element(
///         "button",
///         Props::new()
///             .attr("class", theme.clone())
///             .on("click", move |_| set_theme.set(next.to_string())),
///         [theme],
///     )
/// }
/// ```
///
/// # Note
///
/// Cells are matched by call order. Call `use_state` unconditionally and in the
/// same order on every render.
pub fn use_state<T: Clone + 'static>(initial: T) -> (T, SetState<T>) {
	let (hook, updates) = next_slot(|| StateHook::new(initial));
	let value = hook.render_value();
	let setter = SetState {
		cell: Rc::downgrade(&hook),
		updates,
	};
	(value, setter)
}
