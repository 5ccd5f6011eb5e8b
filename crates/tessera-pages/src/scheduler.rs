//! Cooperative work scheduler
//!
//! Rendering is split into units of work, one fiber each. A [`Scheduler`] asks an
//! [`IdleDriver`] for idle slots and, in each slot, lets the renderer consume
//! units until the [`Deadline`] reports that the slot is nearly over. Once the
//! tree is exhausted the renderer commits within the same slot.
//!
//! ```text
//! request_render ──▶ waker ──▶ driver.request_idle_callback
//!                                        │
//!                     ┌──────────────────┘
//!                     ▼
//!               work_loop(deadline) ── Yielded ──▶ re-register
//!                     │
//!                  Committed / Idle
//! ```

use core::cell::{Cell, RefCell};
use core::time::Duration;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Instant;

use crate::config::RendererConfig;
use crate::host::HostTree;
use crate::renderer::Renderer;

/// Remaining time in the current idle slot
pub trait Deadline {
	fn time_remaining(&self) -> Duration;
}

/// A deadline that never runs out
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl Deadline for Unbounded {
	fn time_remaining(&self) -> Duration {
		Duration::MAX
	}
}

/// Wall-clock slice starting when the deadline is created
#[derive(Debug, Clone, Copy)]
pub struct SliceDeadline {
	started: Instant,
	budget: Duration,
}

impl SliceDeadline {
	pub fn new(budget: Duration) -> Self {
		Self {
			started: Instant::now(),
			budget,
		}
	}
}

impl Deadline for SliceDeadline {
	fn time_remaining(&self) -> Duration {
		self.budget.saturating_sub(self.started.elapsed())
	}
}

/// Callback run in an idle slot
pub type IdleCallback = Box<dyn FnOnce(&dyn Deadline)>;

/// Source of idle slots
pub trait IdleDriver {
	fn request_idle_callback(&self, callback: IdleCallback);
}

impl<D: IdleDriver + ?Sized> IdleDriver for Rc<D> {
	fn request_idle_callback(&self, callback: IdleCallback) {
		(**self).request_idle_callback(callback)
	}
}

/// Timer-sliced driver for targets without an idle callback
///
/// Callbacks are queued and run when the embedder calls [`SliceDriver::run_once`]
/// or [`SliceDriver::run_until_idle`]; each receives a fresh [`SliceDeadline`].
pub struct SliceDriver {
	queue: RefCell<VecDeque<IdleCallback>>,
	budget: Duration,
}

impl SliceDriver {
	pub fn new(budget: Duration) -> Self {
		Self {
			queue: RefCell::new(VecDeque::new()),
			budget,
		}
	}

	/// Driver whose slices last `slice_budget_ms` from `config`
	pub fn from_config(config: &RendererConfig) -> Self {
		Self::new(config.slice_budget_duration())
	}

	pub fn budget(&self) -> Duration {
		self.budget
	}

	pub fn pending(&self) -> usize {
		self.queue.borrow().len()
	}

	/// Run the oldest queued callback; returns `false` when none was queued
	pub fn run_once(&self) -> bool {
		let next = self.queue.borrow_mut().pop_front();
		match next {
			Some(callback) => {
				callback(&SliceDeadline::new(self.budget));
				true
			}
			None => false,
		}
	}

	/// Run callbacks, including ones queued meanwhile, until none is left
	///
	/// Returns the number of slices run.
	pub fn run_until_idle(&self) -> usize {
		let mut slices = 0;
		while self.run_once() {
			slices += 1;
		}
		slices
	}
}

impl Default for SliceDriver {
	fn default() -> Self {
		Self::from_config(&RendererConfig::default())
	}
}

impl IdleDriver for SliceDriver {
	fn request_idle_callback(&self, callback: IdleCallback) {
		self.queue.borrow_mut().push_back(callback);
	}
}

/// Render requests raised by state changes
///
/// Requests coalesce: any number of them before the next render starts result in
/// one render. The first request after a render started wakes the scheduler.
#[derive(Default)]
pub struct UpdateQueue {
	requested: Cell<bool>,
	waker: RefCell<Option<Rc<dyn Fn()>>>,
}

impl UpdateQueue {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn request_render(&self) {
		if self.requested.replace(true) {
			return;
		}
		tracing::trace!("render requested");
		self.wake();
	}

	/// Notify the scheduler that work exists without requesting a restart
	pub fn wake(&self) {
		let waker = self.waker.borrow().clone();
		if let Some(wake) = waker {
			wake();
		}
	}

	pub fn is_requested(&self) -> bool {
		self.requested.get()
	}

	/// Consume the pending request, if any
	pub fn take_request(&self) -> bool {
		self.requested.replace(false)
	}

	pub fn set_waker(&self, waker: Option<Rc<dyn Fn()>>) {
		*self.waker.borrow_mut() = waker;
	}
}

impl core::fmt::Debug for UpdateQueue {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("UpdateQueue")
			.field("requested", &self.requested.get())
			.field("waker", &self.waker.borrow().is_some())
			.finish()
	}
}

/// Outcome of one `work_loop` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkStatus {
	/// Nothing to do
	Idle,
	/// Units remain; the slot ran out
	Yielded,
	/// The work-in-progress tree was committed
	Committed,
}

/// Drives a renderer from an idle driver
///
/// The scheduler re-registers itself while work remains and wakes up again on the
/// next render request. Keep the returned `Rc` alive for as long as rendering
/// should continue.
pub struct Scheduler<H: HostTree, D: IdleDriver> {
	renderer: Rc<RefCell<Renderer<H>>>,
	driver: D,
	scheduled: Cell<bool>,
}

impl<H, D> Scheduler<H, D>
where
	H: HostTree + 'static,
	D: IdleDriver + 'static,
{
	pub fn start(renderer: Rc<RefCell<Renderer<H>>>, driver: D) -> Rc<Self> {
		let scheduler = Rc::new(Self {
			renderer,
			driver,
			scheduled: Cell::new(false),
		});

		let weak = Rc::downgrade(&scheduler);
		let waker: Rc<dyn Fn()> = Rc::new(move || {
			if let Some(scheduler) = weak.upgrade() {
				scheduler.schedule();
			}
		});
		scheduler.renderer.borrow().updates().set_waker(Some(waker));

		if scheduler.renderer.borrow().has_pending_work() {
			scheduler.schedule();
		}
		scheduler
	}

	pub fn is_scheduled(&self) -> bool {
		self.scheduled.get()
	}

	pub fn renderer(&self) -> &Rc<RefCell<Renderer<H>>> {
		&self.renderer
	}

	fn schedule(self: &Rc<Self>) {
		if self.scheduled.replace(true) {
			return;
		}
		let this = self.clone();
		self.driver
			.request_idle_callback(Box::new(move |deadline| this.run_slice(deadline)));
	}

	fn run_slice(self: &Rc<Self>, deadline: &dyn Deadline) {
		self.scheduled.set(false);

		let outcome = match self.renderer.try_borrow_mut() {
			Ok(mut renderer) => renderer
				.work_loop(deadline)
				.map(|status| (status, renderer.has_pending_work())),
			Err(_) => {
				// Renderer is borrowed by the embedder; try again next slot.
				self.schedule();
				return;
			}
		};

		match outcome {
			Ok((status, pending)) => {
				tracing::debug!(?status, pending, "scheduler slice finished");
				if pending {
					self.schedule();
				}
			}
			Err(err) => {
				tracing::error!(error = %err, "render halted");
			}
		}
	}
}

impl<H: HostTree, D: IdleDriver> Drop for Scheduler<H, D> {
	fn drop(&mut self) {
		if let Ok(renderer) = self.renderer.try_borrow() {
			renderer.updates().set_waker(None);
		}
	}
}
