//! Computed values
//!
//! A [`Computed`] caches the result of a closure and recomputes it synchronously
//! whenever a key the closure read is written. Reading [`Computed::get`] is itself
//! a tracked read, so computed values can feed effects and other computed values.

use core::cell::RefCell;
use core::fmt;
use std::rc::Rc;

use crate::dependency::Dependency;
use crate::effect::Tracker;

struct ComputedInner<T> {
	value: RefCell<T>,
	compute: RefCell<Box<dyn FnMut() -> T>>,
	tracker: Tracker,
	dependency: Dependency,
}

impl<T: 'static> ComputedInner<T> {
	fn recompute(&self) {
		let next = self.tracker.track(|| {
			let mut compute = self.compute.borrow_mut();
			(*compute)()
		});
		*self.value.borrow_mut() = next;
		self.dependency.notify();
	}
}

/// A derived reactive value
///
/// # Example
///
/// ```ignore
/// let state: ReactiveObject<i32> = [("count", 2)].into_iter().collect();
/// let doubled = Computed::new({
///     let state = state.clone();
///     move || state.get("count").unwrap_or_default() * 2
/// });
///
/// state.set("count", 5);
/// assert_eq!(doubled.get(), 10);
/// ```
pub struct Computed<T: 'static> {
	inner: Rc<ComputedInner<T>>,
}

impl<T: 'static> Computed<T> {
	pub fn new<F>(mut f: F) -> Self
	where
		F: FnMut() -> T + 'static,
	{
		let inner = Rc::new_cyclic(|weak: &std::rc::Weak<ComputedInner<T>>| {
			let weak = weak.clone();
			let tracker = Tracker::new(move || {
				if let Some(inner) = weak.upgrade() {
					inner.recompute();
				}
			});
			let value = tracker.track(&mut f);
			ComputedInner {
				value: RefCell::new(value),
				compute: RefCell::new(Box::new(f)),
				tracker,
				dependency: Dependency::new(),
			}
		});
		Self { inner }
	}

	/// Tracked read of the current value
	pub fn get(&self) -> T
	where
		T: Clone,
	{
		self.inner.dependency.depend();
		self.inner.value.borrow().clone()
	}

	/// Tracked read by reference
	pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		self.inner.dependency.depend();
		f(&self.inner.value.borrow())
	}

	pub fn get_untracked(&self) -> T
	where
		T: Clone,
	{
		self.inner.value.borrow().clone()
	}
}

impl<T: 'static> Clone for Computed<T> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T: fmt::Debug + 'static> fmt::Debug for Computed<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Computed")
			.field("value", &*self.inner.value.borrow())
			.finish()
	}
}

/// Create a [`Computed`]
pub fn computed<T, F>(f: F) -> Computed<T>
where
	T: 'static,
	F: FnMut() -> T + 'static,
{
	Computed::new(f)
}
