//! Reactive object wrapper
//!
//! [`ReactiveObject`] is a string-keyed map whose reads and writes are
//! instrumented. The first read of a key creates the key's [`Dependency`] lazily;
//! writes notify only keys that have one.

use core::cell::RefCell;
use core::fmt;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::dependency::Dependency;
use crate::runtime::{NodeId, with_runtime};

struct ObjectInner<V> {
	values: RefCell<BTreeMap<String, V>>,
	dependencies: RefCell<BTreeMap<String, Dependency>>,
}

/// A map of reactive keys
///
/// Cloning shares the underlying state; every clone observes the same keys.
///
/// ## Example
///
/// ```ignore
/// use tessera_reactive::{ReactiveObject, effect};
///
/// let theme: ReactiveObject<String> = [("mode", "light".to_string())].into_iter().collect();
///
/// let _effect = effect({
///     let theme = theme.clone();
///     move || println!("{:?}", theme.get("mode"))
/// });
///
/// theme.set("mode", "dark".to_string());
/// ```
pub struct ReactiveObject<V> {
	inner: Rc<ObjectInner<V>>,
}

impl<V: 'static> ReactiveObject<V> {
	pub fn new() -> Self {
		Self::from_map(BTreeMap::new())
	}

	/// Wrap an existing map of values
	pub fn from_map(values: BTreeMap<String, V>) -> Self {
		Self {
			inner: Rc::new(ObjectInner {
				values: RefCell::new(values),
				dependencies: RefCell::new(BTreeMap::new()),
			}),
		}
	}

	/// Subscribe the active consumer to `key`, creating its dependency on first use
	fn depend(&self, key: &str) {
		let mut dependencies = self.inner.dependencies.borrow_mut();
		let id = match dependencies.get(key) {
			Some(dependency) => dependency.id(),
			None => {
				let dependency = Dependency::new();
				let id = dependency.id();
				dependencies.insert(key.to_string(), dependency);
				id
			}
		};
		drop(dependencies);
		with_runtime(|rt| rt.track_dependency(id));
	}

	fn dependency_id(&self, key: &str) -> Option<NodeId> {
		self.inner
			.dependencies
			.borrow()
			.get(key)
			.map(Dependency::id)
	}

	fn notify(&self, key: &str) {
		if let Some(id) = self.dependency_id(key) {
			with_runtime(|rt| rt.notify(id));
		}
	}

	/// Tracked read of `key`
	pub fn get(&self, key: &str) -> Option<V>
	where
		V: Clone,
	{
		self.depend(key);
		self.inner.values.borrow().get(key).cloned()
	}

	/// Tracked read of `key` by reference
	///
	/// # Panics
	///
	/// The values stay borrowed while `f` runs: writing to this object (or any
	/// clone of it) from inside `f` panics. Use [`ReactiveObject::get`] when the
	/// callback needs to write.
	pub fn with<R>(&self, key: &str, f: impl FnOnce(Option<&V>) -> R) -> R {
		self.depend(key);
		f(self.inner.values.borrow().get(key))
	}

	/// Read `key` without subscribing the active consumer
	pub fn get_untracked(&self, key: &str) -> Option<V>
	where
		V: Clone,
	{
		self.inner.values.borrow().get(key).cloned()
	}

	/// Write `key` and notify its subscribers
	///
	/// Returns the previous value.
	pub fn set(&self, key: impl Into<String>, value: V) -> Option<V> {
		let key = key.into();
		let previous = self.inner.values.borrow_mut().insert(key.clone(), value);
		self.notify(&key);
		previous
	}

	/// Write `key` without notifying anyone
	pub fn set_untracked(&self, key: impl Into<String>, value: V) -> Option<V> {
		self.inner.values.borrow_mut().insert(key.into(), value)
	}

	/// Mutate `key` in place and notify its subscribers
	///
	/// Returns `false` (and notifies nobody) when the key is absent.
	pub fn update(&self, key: &str, f: impl FnOnce(&mut V)) -> bool {
		let updated = match self.inner.values.borrow_mut().get_mut(key) {
			Some(value) => {
				f(value);
				true
			}
			None => false,
		};
		if updated {
			self.notify(key);
		}
		updated
	}

	/// Remove `key` and notify its subscribers
	pub fn remove(&self, key: &str) -> Option<V> {
		let removed = self.inner.values.borrow_mut().remove(key);
		if removed.is_some() {
			self.notify(key);
		}
		removed
	}

	/// Remove `key` without notifying anyone
	pub fn remove_untracked(&self, key: &str) -> Option<V> {
		self.inner.values.borrow_mut().remove(key)
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.inner.values.borrow().contains_key(key)
	}

	pub fn keys(&self) -> Vec<String> {
		self.inner.values.borrow().keys().cloned().collect()
	}

	pub fn len(&self) -> usize {
		self.inner.values.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.values.borrow().is_empty()
	}

	/// Untracked copy of every value
	pub fn snapshot(&self) -> BTreeMap<String, V>
	where
		V: Clone,
	{
		self.inner.values.borrow().clone()
	}

	/// Number of keys that have been read at least once
	pub fn tracker_count(&self) -> usize {
		self.inner.dependencies.borrow().len()
	}

	/// Number of computations subscribed to `key`
	pub fn subscriber_count(&self, key: &str) -> usize {
		self.dependency_id(key)
			.map(|id| with_runtime(|rt| rt.subscriber_count(id)))
			.unwrap_or(0)
	}

	/// Whether two handles share the same state
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}
}

impl<V: 'static> Default for ReactiveObject<V> {
	fn default() -> Self {
		Self::new()
	}
}

impl<V> Clone for ReactiveObject<V> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<K: Into<String>, V: 'static> FromIterator<(K, V)> for ReactiveObject<V> {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self::from_map(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
	}
}

impl<V: fmt::Debug> fmt::Debug for ReactiveObject<V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ReactiveObject")
			.field("values", &*self.inner.values.borrow())
			.field("tracked_keys", &self.inner.dependencies.borrow().len())
			.finish()
	}
}
