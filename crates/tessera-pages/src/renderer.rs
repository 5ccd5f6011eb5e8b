//! Renderer
//!
//! [`Renderer`] owns the host tree and the double-buffered fiber generations. It
//! performs the render phase one unit of work at a time and hands the finished
//! work-in-progress generation to the commit phase.
//!
//! ## Example
//!
//! ```ignore
//! use tessera_pages::host::MemoryHost;
//! use tessera_pages::renderer::Renderer;
//! use tessera_pages::vnode::{Props, element};
//!
//! let mut host = MemoryHost::new();
//! let container = host.create_container("div");
//! let mut renderer = Renderer::new(host);
//!
//! renderer.render(element("h1", Props::new(), ["Hello"]), container);
//! renderer.flush()?;
//!
//! assert_eq!(renderer.host().inner_html(container), "<h1>Hello</h1>");
//! ```

use std::rc::Rc;

use tessera_reactive::Tracker;

use crate::commit::{self, CommitStats};
use crate::config::RendererConfig;
use crate::error::{RenderError, RenderResult};
use crate::fiber::{Fiber, FiberId, Generation, ROOT_TAG};
use crate::hooks::with_hook_frame;
use crate::host::HostTree;
use crate::reconcile::{DiffStrategy, PositionalDiff, ReconcileScope};
use crate::scheduler::{Deadline, Unbounded, UpdateQueue, WorkStatus};
use crate::vnode::{FunctionComponent, NodeType, Props, VNode};

/// Observable scheduling events
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
	/// A new work-in-progress tree was started
	Started,
	/// An unfinished work-in-progress tree was discarded by a newer request
	Cancelled { discarded_units: usize },
	/// The work loop gave the thread back with units remaining
	Yielded { units_performed: usize },
	/// The work-in-progress tree was committed
	Committed(CommitStats),
}

type EventListener = Box<dyn FnMut(&RenderEvent)>;

struct RootSpec<N> {
	container: N,
	element: VNode,
}

pub struct Renderer<H: HostTree> {
	host: H,
	config: RendererConfig,
	strategy: Box<dyn DiffStrategy<H::Node>>,
	root: Option<RootSpec<H::Node>>,
	current: Option<Generation<H::Node>>,
	previous: Option<Generation<H::Node>>,
	wip: Option<Generation<H::Node>>,
	next_unit_of_work: Option<FiberId>,
	units_performed: usize,
	updates: Rc<UpdateQueue>,
	listeners: Vec<EventListener>,
}

impl<H: HostTree> Renderer<H> {
	pub fn new(host: H) -> Self {
		Self::with_config(host, RendererConfig::default())
	}

	pub fn with_config(host: H, config: RendererConfig) -> Self {
		Self {
			host,
			config,
			strategy: Box::new(PositionalDiff),
			root: None,
			current: None,
			previous: None,
			wip: None,
			next_unit_of_work: None,
			units_performed: 0,
			updates: Rc::new(UpdateQueue::new()),
			listeners: Vec::new(),
		}
	}

	/// Replace the child diffing strategy.
	pub fn with_strategy(mut self, strategy: impl DiffStrategy<H::Node> + 'static) -> Self {
		self.strategy = Box::new(strategy);
		self
	}

	/// Render `element` into `container`
	///
	/// Only builds the root of a new work-in-progress tree; the work happens in
	/// [`Renderer::work_loop`]. Replaces any unfinished work-in-progress tree.
	pub fn render(&mut self, element: VNode, container: H::Node) {
		self.root = Some(RootSpec { container, element });
		self.updates.take_request();
		self.start_work();
		self.updates.wake();
	}

	fn start_work(&mut self) {
		let Some((element, container)) = self
			.root
			.as_ref()
			.map(|root| (root.element.clone(), root.container.clone()))
		else {
			return;
		};

		if self.wip.is_some() {
			let discarded_units = self.units_performed;
			tracing::warn!(discarded_units, "discarding unfinished render for a newer request");
			self.emit(RenderEvent::Cancelled { discarded_units });
		}

		let mut fiber = Fiber::new(
			NodeType::Host(ROOT_TAG.into()),
			Rc::new(Props::new().child(element)),
		);
		fiber.node = Some(container);
		fiber.alternate = self.current.as_ref().and_then(Generation::root);

		let mut wip = Generation::new();
		let root_id = wip.insert(fiber);
		wip.set_root(root_id);

		self.wip = Some(wip);
		self.next_unit_of_work = Some(root_id);
		self.units_performed = 0;
		tracing::debug!("render started");
		self.emit(RenderEvent::Started);
	}

	/// Perform units of work until `deadline` runs low, committing when done
	///
	/// At least one unit is performed per call. A pending render request restarts
	/// the render from the root first. On error the work-in-progress tree is
	/// dropped; host mutations already applied stay applied.
	pub fn work_loop(&mut self, deadline: &dyn Deadline) -> RenderResult<WorkStatus> {
		if self.updates.take_request() {
			self.start_work();
		}
		if self.wip.is_none() {
			return Ok(WorkStatus::Idle);
		}

		let threshold = self.config.yield_threshold_duration();
		let mut performed = 0usize;
		while let Some(unit) = self.next_unit_of_work {
			if performed > 0 && deadline.time_remaining() < threshold {
				tracing::debug!(units = self.units_performed, "yielding to host");
				let units_performed = self.units_performed;
				self.emit(RenderEvent::Yielded { units_performed });
				return Ok(WorkStatus::Yielded);
			}
			match self.perform_unit_of_work(unit) {
				Ok(next) => self.next_unit_of_work = next,
				Err(err) => {
					self.abandon();
					return Err(err);
				}
			}
			performed += 1;
			self.units_performed += 1;
		}

		if let Err(err) = self.commit_root() {
			self.abandon();
			return Err(err);
		}
		Ok(WorkStatus::Committed)
	}

	/// Run every pending render to completion
	///
	/// Returns the number of commits.
	pub fn flush(&mut self) -> RenderResult<usize> {
		let mut commits = 0;
		loop {
			match self.work_loop(&Unbounded)? {
				WorkStatus::Idle => return Ok(commits),
				WorkStatus::Committed => commits += 1,
				WorkStatus::Yielded => {}
			}
		}
	}

	fn abandon(&mut self) {
		self.wip = None;
		self.next_unit_of_work = None;
	}

	fn perform_unit_of_work(&mut self, id: FiberId) -> RenderResult<Option<FiberId>> {
		let Some((node_type, props)) = self
			.wip
			.as_ref()
			.and_then(|wip| wip.get(id))
			.map(|fiber| (fiber.node_type.clone(), fiber.props.clone()))
		else {
			return Ok(None);
		};
		tracing::trace!(fiber = ?id, node_type = ?node_type, "unit of work");

		let children = match &node_type {
			NodeType::Component(component) => vec![self.update_function_component(id, component, &props)],
			NodeType::Host(_) | NodeType::Text(_) => {
				self.update_host_component(id, &node_type, &props)?;
				props.children().to_vec()
			}
		};

		let Some(wip) = self.wip.as_mut() else {
			return Ok(None);
		};
		let mut scope = ReconcileScope {
			wip,
			current: self.current.as_ref(),
		};
		self.strategy.reconcile_children(&mut scope, id, &children);

		Ok(next_unit(self.wip.as_ref(), id))
	}

	fn update_function_component(&mut self, id: FiberId, component: &FunctionComponent, props: &Props) -> VNode {
		let alternate = self
			.wip
			.as_ref()
			.and_then(|wip| wip.get(id))
			.and_then(|fiber| fiber.alternate)
			.and_then(|alternate| self.current.as_ref()?.get(alternate));
		let previous_hooks = alternate.map(|fiber| fiber.hooks.clone()).unwrap_or_default();
		let tracker = alternate
			.and_then(|fiber| fiber.tracker.clone())
			.unwrap_or_else(|| {
				let updates = Rc::downgrade(&self.updates);
				Rc::new(Tracker::new(move || {
					if let Some(updates) = updates.upgrade() {
						updates.request_render();
					}
				}))
			});

		let (rendered, hooks) = with_hook_frame(previous_hooks, self.updates.clone(), || {
			tracker.track(|| component.call(props))
		});
		tracing::trace!(component = component.name(), hooks = hooks.len(), "component rendered");

		if let Some(fiber) = self.wip.as_mut().and_then(|wip| wip.get_mut(id)) {
			fiber.hooks = hooks;
			fiber.tracker = Some(tracker);
		}
		rendered
	}

	fn update_host_component(&mut self, id: FiberId, node_type: &NodeType, props: &Props) -> RenderResult<()> {
		let has_node = self
			.wip
			.as_ref()
			.and_then(|wip| wip.get(id))
			.is_some_and(|fiber| fiber.node.is_some());
		if has_node {
			return Ok(());
		}

		let node = match node_type {
			NodeType::Text(value) => self.host.create_text(value)?,
			NodeType::Host(tag) => {
				let node = self.host.create_element(tag)?;
				commit::update_dom(&mut self.host, &node, node_type, &Props::new(), node_type, props)?;
				node
			}
			NodeType::Component(_) => return Ok(()),
		};
		if let Some(fiber) = self.wip.as_mut().and_then(|wip| wip.get_mut(id)) {
			fiber.node = Some(node);
		}
		Ok(())
	}

	fn commit_root(&mut self) -> RenderResult<()> {
		let Some(wip) = self.wip.take() else {
			return Err(RenderError::NoRoot);
		};
		let stats = commit::commit_root(&mut self.host, &wip, self.current.as_mut())?;
		tracing::debug!(
			placements = stats.placements,
			updates = stats.updates,
			deletions = stats.deletions,
			units = self.units_performed,
			"commit finished"
		);

		self.previous = self.current.take();
		self.current = Some(wip);
		self.next_unit_of_work = None;
		self.emit(RenderEvent::Committed(stats));
		Ok(())
	}

	fn emit(&mut self, event: RenderEvent) {
		for listener in &mut self.listeners {
			listener(&event);
		}
	}

	/// Register a listener for [`RenderEvent`]s.
	pub fn on_event<F>(&mut self, f: F)
	where
		F: FnMut(&RenderEvent) + 'static,
	{
		self.listeners.push(Box::new(f));
	}

	/// Ask for a new render from the root, as a state change would
	pub fn request_render(&self) {
		self.updates.request_render();
	}

	pub fn updates(&self) -> &Rc<UpdateQueue> {
		&self.updates
	}

	/// Whether a render is in progress or requested
	pub fn has_pending_work(&self) -> bool {
		self.wip.is_some() || self.updates.is_requested()
	}

	pub fn host(&self) -> &H {
		&self.host
	}

	pub fn host_mut(&mut self) -> &mut H {
		&mut self.host
	}

	pub fn config(&self) -> &RendererConfig {
		&self.config
	}

	/// Last committed generation
	pub fn current(&self) -> Option<&Generation<H::Node>> {
		self.current.as_ref()
	}

	/// Generation committed before the current one, with its deletion tags
	pub fn previous(&self) -> Option<&Generation<H::Node>> {
		self.previous.as_ref()
	}

	/// Unfinished work-in-progress generation
	pub fn work_in_progress(&self) -> Option<&Generation<H::Node>> {
		self.wip.as_ref()
	}

	/// Units performed for the current work-in-progress tree
	pub fn units_performed(&self) -> usize {
		self.units_performed
	}
}

/// Depth-first successor: child, else the nearest next sibling going up
fn next_unit<N>(generation: Option<&Generation<N>>, id: FiberId) -> Option<FiberId> {
	let generation = generation?;
	let fiber = generation.get(id)?;
	if let Some(child) = fiber.child {
		return Some(child);
	}
	let mut next = Some(id);
	while let Some(current) = next {
		let fiber = generation.get(current)?;
		if let Some(sibling) = fiber.sibling {
			return Some(sibling);
		}
		next = fiber.parent;
	}
	None
}
