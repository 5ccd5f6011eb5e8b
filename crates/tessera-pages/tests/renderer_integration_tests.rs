//! Integration tests for the renderer
//!
//! These tests drive a [`Renderer`] over a [`MemoryHost`] and observe the host:
//! 1. State updates through `use_state` and the resulting host patches
//! 2. Deletion ordering and positional reconciliation
//! 3. Class components, reactive props and lifecycle callbacks
//! 4. Time slicing through the scheduler
//! 5. Cancellation and host failures

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use rstest::rstest;
use serial_test::serial;
use tessera_pages::component::{Component, class};
use tessera_pages::config::RendererConfig;
use tessera_pages::error::{HostError, RenderError};
use tessera_pages::fiber::EffectTag;
use tessera_pages::hooks::{SetState, use_state};
use tessera_pages::host::{HostTree, MemoryHost, MemoryNodeId, Mutation};
use tessera_pages::renderer::{RenderEvent, Renderer};
use tessera_pages::router::{Navigator, Router};
use tessera_pages::scheduler::{Deadline, Scheduler, SliceDriver, WorkStatus};
use tessera_pages::vnode::{Event, PropValue, Props, VNode, component, element, text};
use tessera_reactive::ReactiveObject;

struct Exhausted;

impl Deadline for Exhausted {
	fn time_remaining(&self) -> Duration {
		Duration::ZERO
	}
}

fn mount(view: VNode) -> (Renderer<MemoryHost>, MemoryNodeId) {
	let mut host = MemoryHost::new();
	let container = host.create_container("div");
	let mut renderer = Renderer::new(host);
	renderer.render(view, container);
	renderer.flush().unwrap();
	(renderer, container)
}

fn record_events(renderer: &mut Renderer<MemoryHost>) -> Rc<RefCell<Vec<RenderEvent>>> {
	let events = Rc::new(RefCell::new(Vec::new()));
	let log = events.clone();
	renderer.on_event(move |event| log.borrow_mut().push(event.clone()));
	events
}

fn empty() -> Vec<VNode> {
	Vec::new()
}

// ---------------------------------------------------------------------------
// use_state
// ---------------------------------------------------------------------------

thread_local! {
	static THEME_SETTER: RefCell<Option<SetState<String>>> = const { RefCell::new(None) };
}

fn themed(_: &Props) -> VNode {
	let (theme, set_theme) = use_state("light".to_string());
	THEME_SETTER.with(|slot| *slot.borrow_mut() = Some(set_theme));
	element("div", Props::new().attr("class", theme), ["content"])
}

fn theme_setter() -> SetState<String> {
	THEME_SETTER.with(|slot| slot.borrow().clone()).expect("component rendered")
}

#[test]
#[serial]
fn test_toggle_theme_patches_one_property() {
	let (mut renderer, container) = mount(component(themed, Props::new()));
	assert_eq!(
		renderer.host().inner_html(container),
		"<div class=\"light\">content</div>"
	);
	renderer.host_mut().take_mutations();

	let setter = theme_setter();
	setter.set("dark".to_string());
	assert_eq!(setter.pending(), 1);
	assert!(renderer.has_pending_work());

	assert_eq!(renderer.flush().unwrap(), 1);

	let div = renderer.host().find_by_tag(container, "div").unwrap();
	assert_eq!(
		renderer.host_mut().take_mutations(),
		vec![Mutation::SetProperty {
			node: div,
			name: "class".into(),
			value: "dark".into(),
		}]
	);
	assert_eq!(setter.pending(), 0);

	let current = renderer.current().unwrap();
	assert_eq!(current.count_tagged(EffectTag::Placement), 0);
	assert_eq!(current.count_tagged(EffectTag::Update), 3);
	assert!(current.deletions().is_empty());
}

#[test]
#[serial]
fn test_updates_replay_in_order() {
	thread_local! {
		static COUNT_SETTER: RefCell<Option<SetState<i32>>> = const { RefCell::new(None) };
	}
	fn counter(_: &Props) -> VNode {
		let (count, set_count) = use_state(1);
		COUNT_SETTER.with(|slot| *slot.borrow_mut() = Some(set_count));
		text(count)
	}

	let (mut renderer, container) = mount(component(counter, Props::new()));
	let setter = COUNT_SETTER.with(|slot| slot.borrow().clone()).unwrap();

	setter.update(|n| n + 1);
	setter.update(|n| n * 10);
	setter.set(7);
	setter.update(|n| n - 2);
	assert_eq!(setter.pending(), 4);

	assert_eq!(renderer.flush().unwrap(), 1);
	assert_eq!(renderer.host().inner_html(container), "5");
}

#[test]
#[serial]
fn test_click_handler_updates_state() {
	fn clicker(_: &Props) -> VNode {
		let (clicks, set_clicks) = use_state(0);
		element(
			"button",
			Props::new().on("click", move |_| set_clicks.update(|n| n + 1)),
			[format!("clicked {clicks}")],
		)
	}

	let (mut renderer, container) = mount(component(clicker, Props::new()));
	let button = renderer.host().find_by_tag(container, "button").unwrap();

	assert_eq!(renderer.host().dispatch(button, &Event::new("click")), 1);
	assert_eq!(renderer.host().dispatch(button, &Event::new("click")), 1);
	renderer.flush().unwrap();

	assert_eq!(
		renderer.host().inner_html(container),
		"<button>clicked 2</button>"
	);
	assert_eq!(renderer.host().listener_count(button), 1);
}

#[test]
#[serial]
fn test_skipped_hook_aliases_next_cell() {
	thread_local! {
		static SKIP_FIRST: Cell<bool> = const { Cell::new(false) };
	}
	fn aliasing(_: &Props) -> VNode {
		let first = if SKIP_FIRST.with(Cell::get) {
			None
		} else {
			Some(use_state("first".to_string()).0)
		};
		let (second, _) = use_state("second".to_string());
		text(format!("{}|{second}", first.unwrap_or_default()))
	}

	SKIP_FIRST.with(|skip| skip.set(false));
	let (mut renderer, container) = mount(component(aliasing, Props::new()));
	assert_eq!(renderer.host().inner_html(container), "first|second");

	SKIP_FIRST.with(|skip| skip.set(true));
	renderer.request_render();
	renderer.flush().unwrap();

	assert_eq!(renderer.host().inner_html(container), "|first");
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

#[test]
fn test_deletions_precede_placements() {
	let list = element(
		"ul",
		Props::new(),
		[
			element("li", Props::new(), ["a"]),
			element("li", Props::new(), ["b"]),
			element("li", Props::new(), ["c"]),
		],
	);
	let (mut renderer, container) = mount(list);
	let ul = renderer.host().find_by_tag(container, "ul").unwrap();
	let old_items = renderer.host().children(ul);
	renderer.host_mut().take_mutations();

	renderer.render(
		element("ul", Props::new(), [element("p", Props::new(), ["x"])]),
		container,
	);
	renderer.flush().unwrap();

	let mutations = renderer.host_mut().take_mutations();
	let removed: Vec<MemoryNodeId> = mutations
		.iter()
		.filter_map(|m| match m {
			Mutation::RemoveChild { parent, child } if *parent == ul => Some(*child),
			_ => None,
		})
		.collect();
	assert_eq!(removed, old_items);

	let last_removal = mutations
		.iter()
		.rposition(|m| matches!(m, Mutation::RemoveChild { .. }))
		.unwrap();
	let first_append = mutations
		.iter()
		.position(|m| matches!(m, Mutation::AppendChild { .. }))
		.unwrap();
	assert!(last_removal < first_append);
	assert_eq!(renderer.host().inner_html(container), "<ul><p>x</p></ul>");
}

#[rstest]
#[case(&["a", "b"], &["a", "b", "c"], "<li>a</li><li>b</li><li>c</li>")]
#[case(&["a", "b", "c"], &["a"], "<li>a</li>")]
#[case(&["a", "b"], &["b", "a"], "<li>b</li><li>a</li>")]
#[case(&[], &["x"], "<li>x</li>")]
fn test_list_changes_converge(#[case] before: &[&str], #[case] after: &[&str], #[case] expected: &str) {
	fn list(items: &[&str]) -> VNode {
		element(
			"ol",
			Props::new(),
			items
				.iter()
				.map(|item| element("li", Props::new(), [item.to_string()])),
		)
	}

	let (mut renderer, container) = mount(list(before));
	renderer.render(list(after), container);
	renderer.flush().unwrap();

	assert_eq!(
		renderer.host().inner_html(container),
		format!("<ol>{expected}</ol>")
	);
}

#[test]
fn test_type_change_replaces_subtree() {
	let (mut renderer, container) = mount(element(
		"section",
		Props::new(),
		[element("span", Props::new(), ["old"])],
	));
	let events = record_events(&mut renderer);

	renderer.render(
		element("article", Props::new(), [element("span", Props::new(), ["new"])]),
		container,
	);
	renderer.flush().unwrap();

	assert_eq!(
		renderer.host().inner_html(container),
		"<article><span>new</span></article>"
	);
	let previous = renderer.previous().unwrap();
	assert_eq!(previous.count_tagged(EffectTag::Deletion), 1);

	let stats = events
		.borrow()
		.iter()
		.find_map(|event| match event {
			RenderEvent::Committed(stats) => Some(*stats),
			_ => None,
		})
		.unwrap();
	assert_eq!(stats.deletions, 1);
	assert_eq!(stats.placements, 3);
}

#[test]
fn test_removed_props_and_listeners() {
	let (mut renderer, container) = mount(element(
		"input",
		Props::new()
			.attr("value", "x")
			.attr("disabled", true)
			.on("input", |_| {}),
		empty(),
	));
	let input = renderer.host().find_by_tag(container, "input").unwrap();
	assert_eq!(renderer.host().listener_count(input), 1);

	renderer.render(
		element("input", Props::new().attr("value", "x"), empty()),
		container,
	);
	renderer.flush().unwrap();

	assert_eq!(renderer.host().listener_count(input), 0);
	assert_eq!(renderer.host().property(input, "disabled"), None);
	assert_eq!(
		renderer.host().property(input, "value"),
		Some(&PropValue::from("x"))
	);
}

#[test]
fn test_deleted_subtree_releases_listeners() {
	let (mut renderer, container) = mount(element(
		"ul",
		Props::new(),
		[element(
			"li",
			Props::new().on("click", |_| {}),
			[element("button", Props::new().on("click", |_| {}).on("focus", |_| {}), ["x"])],
		)],
	));
	let li = renderer.host().find_by_tag(container, "li").unwrap();
	let button = renderer.host().find_by_tag(container, "button").unwrap();
	assert_eq!(renderer.host().listener_count(li), 1);
	assert_eq!(renderer.host().listener_count(button), 2);
	renderer.host_mut().take_mutations();

	renderer.render(element("ul", Props::new(), empty()), container);
	renderer.flush().unwrap();

	assert_eq!(renderer.host().listener_count(li), 0);
	assert_eq!(renderer.host().listener_count(button), 0);
	let released = renderer
		.host()
		.mutations()
		.iter()
		.filter(|m| matches!(m, Mutation::RemoveListener { .. }))
		.count();
	assert_eq!(released, 3);
	assert_eq!(renderer.host().inner_html(container), "<ul></ul>");
}

// ---------------------------------------------------------------------------
// Class components
// ---------------------------------------------------------------------------

thread_local! {
	static LIFECYCLE: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
	static COUNTER_STATE: RefCell<Option<ReactiveObject<i32>>> = const { RefCell::new(None) };
}

fn lifecycle_log() -> Vec<String> {
	LIFECYCLE.with(|log| log.borrow().clone())
}

struct Counter {
	props: ReactiveObject<PropValue>,
	state: ReactiveObject<i32>,
}

impl Component for Counter {
	fn create(props: ReactiveObject<PropValue>) -> Self {
		let state: ReactiveObject<i32> = [("count", 0)].into_iter().collect();
		COUNTER_STATE.with(|slot| *slot.borrow_mut() = Some(state.clone()));
		Self { props, state }
	}

	fn render(&self) -> VNode {
		let label = self
			.props
			.get("label")
			.and_then(|value| value.as_str().map(str::to_string))
			.unwrap_or_default();
		let count = self.state.get("count").unwrap_or_default();
		element("p", Props::new(), [format!("{label}: {count}")])
	}

	fn component_did_mount(&self) {
		LIFECYCLE.with(|log| log.borrow_mut().push("mount".into()));
	}

	fn component_did_update(&self) {
		LIFECYCLE.with(|log| log.borrow_mut().push("update".into()));
	}

	fn component_will_unmount(&self) {
		LIFECYCLE.with(|log| log.borrow_mut().push("unmount".into()));
	}
}

#[test]
#[serial]
fn test_class_component_lifecycle() {
	LIFECYCLE.with(|log| log.borrow_mut().clear());
	let (mut renderer, container) = mount(class::<Counter>(Props::new().attr("label", "Count")));
	assert_eq!(renderer.host().inner_html(container), "<p>Count: 0</p>");
	assert_eq!(lifecycle_log(), vec!["mount"]);

	renderer.render(class::<Counter>(Props::new().attr("label", "Total")), container);
	renderer.flush().unwrap();
	assert_eq!(renderer.host().inner_html(container), "<p>Total: 0</p>");
	assert_eq!(lifecycle_log(), vec!["mount", "update"]);

	renderer.render(text("gone"), container);
	renderer.flush().unwrap();
	assert_eq!(renderer.host().inner_html(container), "gone");
	assert_eq!(lifecycle_log(), vec!["mount", "update", "unmount"]);
}

#[test]
#[serial]
fn test_reactive_state_write_rerenders_component() {
	let (mut renderer, container) = mount(class::<Counter>(Props::new().attr("label", "n")));
	assert!(!renderer.has_pending_work());

	let state = COUNTER_STATE.with(|slot| slot.borrow().clone()).unwrap();
	state.set("count", 3);
	assert!(renderer.has_pending_work());

	assert_eq!(renderer.flush().unwrap(), 1);
	assert_eq!(renderer.host().inner_html(container), "<p>n: 3</p>");

	state.set_untracked("count", 4);
	assert!(!renderer.has_pending_work());
}

#[test]
#[serial]
fn test_unmounted_component_stops_rerendering() {
	let (mut renderer, container) = mount(class::<Counter>(Props::new()));
	let state = COUNTER_STATE.with(|slot| slot.borrow().clone()).unwrap();

	renderer.render(text("replaced"), container);
	renderer.flush().unwrap();

	state.set("count", 9);
	assert!(!renderer.has_pending_work());
}

// ---------------------------------------------------------------------------
// Router outlet
// ---------------------------------------------------------------------------

#[test]
#[serial]
fn test_outlet_follows_navigation() {
	let router = Rc::new(
		Router::new()
			.route("/", || element("h1", Props::new(), ["Home"]))
			.route("/about", || element("h1", Props::new(), ["About"])),
	);
	let navigator = Navigator::new("/");
	let (mut renderer, container) = mount(Router::outlet(&router, &navigator));
	assert_eq!(renderer.host().inner_html(container), "<h1>Home</h1>");

	navigator.navigate("/about");
	renderer.flush().unwrap();
	assert_eq!(renderer.host().inner_html(container), "<h1>About</h1>");

	navigator.navigate("/missing");
	renderer.flush().unwrap();
	assert_eq!(renderer.host().inner_html(container), "<h1>404 Not Found</h1>");
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

#[test]
#[serial]
fn test_scheduler_slices_until_commit() {
	let mut host = MemoryHost::new();
	let container = host.create_container("div");
	let config = RendererConfig::new().yield_threshold(Duration::from_secs(3600));
	let driver = Rc::new(SliceDriver::from_config(&config));
	let mut renderer = Renderer::with_config(host, config);
	let events = record_events(&mut renderer);

	let renderer = Rc::new(RefCell::new(renderer));
	let scheduler = Scheduler::start(renderer.clone(), driver.clone());
	assert!(!scheduler.is_scheduled());

	renderer.borrow_mut().render(
		element(
			"ul",
			Props::new(),
			[
				element("li", Props::new(), ["a"]),
				element("li", Props::new(), ["b"]),
				element("li", Props::new(), ["c"]),
			],
		),
		container,
	);
	assert!(scheduler.is_scheduled());

	// root, ul, then an element and a text unit per item
	assert_eq!(driver.run_until_idle(), 8);

	let events = events.borrow();
	let yielded = events
		.iter()
		.filter(|event| matches!(event, RenderEvent::Yielded { .. }))
		.count();
	let committed = events
		.iter()
		.filter(|event| matches!(event, RenderEvent::Committed(_)))
		.count();
	assert_eq!(yielded, 7);
	assert_eq!(committed, 1);
	assert_eq!(
		renderer.borrow().host().inner_html(container),
		"<ul><li>a</li><li>b</li><li>c</li></ul>"
	);
}

#[test]
#[serial]
fn test_scheduler_wakes_on_state_change() {
	let mut host = MemoryHost::new();
	let container = host.create_container("div");
	let renderer = Rc::new(RefCell::new(Renderer::new(host)));
	let driver = Rc::new(SliceDriver::default());
	let _scheduler = Scheduler::start(renderer.clone(), driver.clone());

	renderer
		.borrow_mut()
		.render(component(themed, Props::new()), container);
	driver.run_until_idle();
	assert_eq!(driver.pending(), 0);

	theme_setter().set("dark".to_string());
	assert_eq!(driver.pending(), 1);
	driver.run_until_idle();

	assert_eq!(
		renderer.borrow().host().inner_html(container),
		"<div class=\"dark\">content</div>"
	);
}

#[test]
fn test_newer_render_cancels_unfinished_tree() {
	let mut host = MemoryHost::new();
	let container = host.create_container("div");
	let mut renderer = Renderer::new(host);
	let events = record_events(&mut renderer);

	renderer.render(element("p", Props::new(), ["first"]), container);
	assert_eq!(renderer.work_loop(&Exhausted).unwrap(), WorkStatus::Yielded);

	renderer.render(element("p", Props::new(), ["second"]), container);
	assert!(
		events
			.borrow()
			.contains(&RenderEvent::Cancelled { discarded_units: 1 })
	);

	assert_eq!(renderer.flush().unwrap(), 1);
	assert_eq!(renderer.host().inner_html(container), "<p>second</p>");
}

#[test]
#[serial]
fn test_state_change_mid_render_restarts_from_root() {
	let mut host = MemoryHost::new();
	let container = host.create_container("div");
	let mut renderer = Renderer::new(host);
	renderer.render(component(themed, Props::new()), container);
	renderer.flush().unwrap();
	let events = record_events(&mut renderer);

	theme_setter().set("dark".to_string());
	assert_eq!(renderer.work_loop(&Exhausted).unwrap(), WorkStatus::Yielded);
	theme_setter().set("contrast".to_string());
	renderer.flush().unwrap();

	assert!(
		events
			.borrow()
			.iter()
			.any(|event| matches!(event, RenderEvent::Cancelled { .. }))
	);
	assert_eq!(
		renderer.host().inner_html(container),
		"<div class=\"contrast\">content</div>"
	);
}

// ---------------------------------------------------------------------------
// Host failures
// ---------------------------------------------------------------------------

#[test]
fn test_host_error_in_render_phase_halts_turn() {
	let mut host = MemoryHost::new();
	let container = host.create_container("div");
	host.reject_property("style");
	let mut renderer = Renderer::new(host);

	renderer.render(
		element("div", Props::new().attr("style", "color: red"), empty()),
		container,
	);
	let err = renderer.flush().unwrap_err();
	assert!(matches!(err, RenderError::Host(HostError::Property { .. })));
	assert!(renderer.work_in_progress().is_none());
	assert!(renderer.current().is_none());

	renderer.render(element("div", Props::new(), empty()), container);
	assert_eq!(renderer.flush().unwrap(), 1);
}

#[test]
fn test_host_error_in_commit_keeps_applied_mutations() {
	let (mut renderer, container) = mount(element("ul", Props::new(), [element("li", Props::new(), ["a"])]));
	let ul = renderer.host().find_by_tag(container, "ul").unwrap();
	let committed_root = renderer.current().and_then(|current| current.root());
	renderer.host_mut().reject_property("title");

	renderer.render(element("ul", Props::new().attr("title", "x"), empty()), container);
	let err = renderer.flush().unwrap_err();

	assert!(matches!(err, RenderError::Host(HostError::Property { .. })));
	// the deletion ran before the failing update and is not rolled back
	assert!(renderer.host().children(ul).is_empty());
	assert_eq!(renderer.current().and_then(|current| current.root()), committed_root);
	assert!(renderer.work_in_progress().is_none());
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn item_list(items: &[(String, Option<String>)]) -> VNode {
	element(
		"ul",
		Props::new(),
		items.iter().map(|(label, class)| {
			let props = match class {
				Some(class) => Props::new().attr("class", class.clone()),
				None => Props::new(),
			};
			element("li", props, [label.clone()])
		}),
	)
}

fn item_strategy() -> impl proptest::strategy::Strategy<Value = Vec<(String, Option<String>)>> {
	proptest::collection::vec(
		("[a-z]{1,4}", proptest::option::of("(hot|cold)")),
		0..6,
	)
}

proptest::proptest! {
	#[test]
	fn prop_rerender_matches_fresh_mount(before in item_strategy(), after in item_strategy()) {
		let (mut renderer, container) = mount(item_list(&before));
		renderer.render(item_list(&after), container);
		renderer.flush().unwrap();

		let (fresh, fresh_container) = mount(item_list(&after));
		proptest::prop_assert_eq!(
			renderer.host().inner_html(container),
			fresh.host().inner_html(fresh_container)
		);
	}

	#[test]
	fn prop_identical_rerender_is_silent(items in item_strategy()) {
		let (mut renderer, container) = mount(item_list(&items));
		renderer.host_mut().take_mutations();

		renderer.render(item_list(&items), container);
		renderer.flush().unwrap();

		proptest::prop_assert!(renderer.host().mutations().is_empty());
	}
}
