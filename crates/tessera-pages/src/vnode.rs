//! Virtual node model
//!
//! A [`VNode`] is an immutable description of one position in the element tree:
//! its [`NodeType`], its ordered [`Props`] and its children. Nodes have no identity
//! beyond their type at a tree position; the reconciler compares nothing else.
//!
//! ## Example
//!
//! ```ignore
//! use tessera_pages::vnode::{Props, element, text};
//!
//! let view = element(
//!     "button",
//!     Props::new().attr("class", "primary").on("click", |_| println!("clicked")),
//!     [text("Save")],
//! );
//! ```

use core::any::{Any, TypeId};
use core::fmt;
use std::borrow::Cow;
use std::rc::Rc;

use indexmap::IndexMap;

/// Event delivered to listeners
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
	/// Lower-case event name, e.g. `click`
	pub kind: String,
	/// Value carried by the event target, if any (input value, selected option)
	pub value: Option<String>,
}

impl Event {
	pub fn new(kind: impl Into<String>) -> Self {
		Self {
			kind: kind.into(),
			value: None,
		}
	}

	pub fn with_value(mut self, value: impl Into<String>) -> Self {
		self.value = Some(value.into());
		self
	}
}

/// Shared event listener
///
/// Two handlers are equal only when they are the same allocation, so re-creating
/// a closure on every render registers a fresh listener.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&Event)>);

impl EventHandler {
	pub fn new<F>(f: F) -> Self
	where
		F: Fn(&Event) + 'static,
	{
		Self(Rc::new(f))
	}

	pub fn call(&self, event: &Event) {
		(self.0)(event)
	}
}

impl PartialEq for EventHandler {
	fn eq(&self, other: &Self) -> bool {
		core::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
	}
}

impl fmt::Debug for EventHandler {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "EventHandler({:p})", Rc::as_ptr(&self.0) as *const ())
	}
}

/// Value of a single prop
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
	Str(String),
	Bool(bool),
	Number(f64),
	Handler(EventHandler),
}

impl PropValue {
	pub fn as_str(&self) -> Option<&str> {
		match self {
			PropValue::Str(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			PropValue::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_number(&self) -> Option<f64> {
		match self {
			PropValue::Number(n) => Some(*n),
			_ => None,
		}
	}

	pub fn as_handler(&self) -> Option<&EventHandler> {
		match self {
			PropValue::Handler(handler) => Some(handler),
			_ => None,
		}
	}

	/// Textual form used by string serialisation; handlers have none
	pub fn to_attribute_string(&self) -> Option<String> {
		match self {
			PropValue::Str(s) => Some(s.clone()),
			PropValue::Bool(b) => Some(b.to_string()),
			PropValue::Number(n) => Some(n.to_string()),
			PropValue::Handler(_) => None,
		}
	}
}

impl From<&str> for PropValue {
	fn from(value: &str) -> Self {
		PropValue::Str(value.to_string())
	}
}

impl From<String> for PropValue {
	fn from(value: String) -> Self {
		PropValue::Str(value)
	}
}

impl From<bool> for PropValue {
	fn from(value: bool) -> Self {
		PropValue::Bool(value)
	}
}

impl From<f64> for PropValue {
	fn from(value: f64) -> Self {
		PropValue::Number(value)
	}
}

impl From<i32> for PropValue {
	fn from(value: i32) -> Self {
		PropValue::Number(value.into())
	}
}

impl From<EventHandler> for PropValue {
	fn from(value: EventHandler) -> Self {
		PropValue::Handler(value)
	}
}

/// Reserved prop key holding the children
pub const CHILDREN: &str = "children";

const EVENT_PREFIX: &str = "on";

/// Whether `key` names an event listener
pub fn is_event_key(key: &str) -> bool {
	key.len() > EVENT_PREFIX.len() && key.starts_with(EVENT_PREFIX)
}

/// Lower-case event name for a listener key: `onClick` -> `click`
pub fn event_name(key: &str) -> String {
	key.strip_prefix(EVENT_PREFIX)
		.unwrap_or(key)
		.to_lowercase()
}

/// Ordered props of a node
///
/// Attribute order is insertion order. Children are stored apart from the
/// attributes under the reserved [`CHILDREN`] key, which `attr` refuses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props {
	attributes: IndexMap<String, PropValue>,
	children: Vec<VNode>,
}

impl Props {
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets an attribute.
	pub fn attr(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
		let key = key.into();
		if key != CHILDREN {
			self.attributes.insert(key, value.into());
		}
		self
	}

	/// Registers a listener for `event` under the `on<event>` key.
	pub fn on<F>(self, event: &str, f: F) -> Self
	where
		F: Fn(&Event) + 'static,
	{
		self.handler(event, EventHandler::new(f))
	}

	/// Registers an existing handler, keeping its identity across renders.
	pub fn handler(self, event: &str, handler: EventHandler) -> Self {
		self.attr(format!("{EVENT_PREFIX}{}", event.to_lowercase()), handler)
	}

	pub fn child(mut self, child: impl Into<VNode>) -> Self {
		self.children.push(child.into());
		self
	}

	pub fn with_children<I, C>(mut self, children: I) -> Self
	where
		I: IntoIterator<Item = C>,
		C: Into<VNode>,
	{
		self.children.extend(children.into_iter().map(Into::into));
		self
	}

	pub fn get(&self, key: &str) -> Option<&PropValue> {
		self.attributes.get(key)
	}

	pub fn get_str(&self, key: &str) -> Option<&str> {
		self.get(key).and_then(PropValue::as_str)
	}

	/// Attributes in insertion order
	pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
		self.attributes.iter().map(|(k, v)| (k.as_str(), v))
	}

	/// Attributes that are not listeners
	pub fn properties(&self) -> impl Iterator<Item = (&str, &PropValue)> {
		self.iter().filter(|(k, v)| !is_listener(k, v))
	}

	/// Listener attributes
	pub fn listeners(&self) -> impl Iterator<Item = (&str, &EventHandler)> {
		self.iter().filter_map(|(k, v)| match v {
			PropValue::Handler(handler) if is_event_key(k) => Some((k, handler)),
			_ => None,
		})
	}

	pub fn children(&self) -> &[VNode] {
		&self.children
	}

	pub fn len(&self) -> usize {
		self.attributes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.attributes.is_empty() && self.children.is_empty()
	}
}

pub(crate) fn is_listener(key: &str, value: &PropValue) -> bool {
	is_event_key(key) && matches!(value, PropValue::Handler(_))
}

/// A function component
///
/// Identity is the Rust type of the render function: two nodes built from the
/// same `fn` item (or the same closure expression) are the same component.
#[derive(Clone)]
pub struct FunctionComponent {
	id: TypeId,
	name: &'static str,
	render: Rc<dyn Fn(&Props) -> VNode>,
}

impl FunctionComponent {
	pub fn new<F>(f: F) -> Self
	where
		F: Fn(&Props) -> VNode + Any,
	{
		Self {
			id: TypeId::of::<F>(),
			name: core::any::type_name::<F>(),
			render: Rc::new(f),
		}
	}

	pub fn call(&self, props: &Props) -> VNode {
		(self.render)(props)
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn type_id(&self) -> TypeId {
		self.id
	}
}

impl PartialEq for FunctionComponent {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl fmt::Debug for FunctionComponent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("FunctionComponent").field(&self.name).finish()
	}
}

/// Kind of a node, resolved when the node is built
#[derive(Debug, Clone, PartialEq)]
pub enum NodeType {
	/// Host element by tag name
	Host(Cow<'static, str>),
	/// Function (or class) component
	Component(FunctionComponent),
	/// Text leaf carrying only its value
	Text(String),
}

impl NodeType {
	/// Type equality used by the reconciler
	///
	/// Host tags and component identities must match; any two text leaves match.
	pub fn same_type(&self, other: &NodeType) -> bool {
		match (self, other) {
			(NodeType::Host(a), NodeType::Host(b)) => a == b,
			(NodeType::Component(a), NodeType::Component(b)) => a == b,
			(NodeType::Text(_), NodeType::Text(_)) => true,
			_ => false,
		}
	}

	pub fn is_component(&self) -> bool {
		matches!(self, NodeType::Component(_))
	}

	pub fn tag(&self) -> Option<&str> {
		match self {
			NodeType::Host(tag) => Some(tag),
			_ => None,
		}
	}
}

/// Immutable description of one tree position
#[derive(Debug, Clone, PartialEq)]
pub struct VNode {
	node_type: NodeType,
	props: Rc<Props>,
}

impl VNode {
	pub fn new(node_type: NodeType, props: Props) -> Self {
		Self {
			node_type,
			props: Rc::new(props),
		}
	}

	pub fn node_type(&self) -> &NodeType {
		&self.node_type
	}

	pub fn props(&self) -> &Rc<Props> {
		&self.props
	}

	pub fn children(&self) -> &[VNode] {
		self.props.children()
	}
}

impl From<&str> for VNode {
	fn from(value: &str) -> Self {
		text(value)
	}
}

impl From<String> for VNode {
	fn from(value: String) -> Self {
		text(value)
	}
}

/// Build a host element; `children` are appended after any already in `props`.
pub fn element<I, C>(tag: impl Into<Cow<'static, str>>, props: Props, children: I) -> VNode
where
	I: IntoIterator<Item = C>,
	C: Into<VNode>,
{
	VNode::new(NodeType::Host(tag.into()), props.with_children(children))
}

/// Build a text leaf
pub fn text(value: impl fmt::Display) -> VNode {
	VNode::new(NodeType::Text(value.to_string()), Props::new())
}

/// Build a function component node
pub fn component<F>(f: F, props: Props) -> VNode
where
	F: Fn(&Props) -> VNode + Any,
{
	VNode::new(NodeType::Component(FunctionComponent::new(f)), props)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn greeting(props: &Props) -> VNode {
		text(props.get_str("name").unwrap_or("world"))
	}

	fn farewell(_: &Props) -> VNode {
		text("bye")
	}

	#[test]
	fn test_element_collects_children() {
		let node = element("ul", Props::new().attr("class", "list"), ["a", "b"]);

		assert_eq!(node.node_type().tag(), Some("ul"));
		assert_eq!(node.children().len(), 2);
		assert_eq!(node.props().get_str("class"), Some("list"));
		assert_eq!(node.children()[0].node_type(), &NodeType::Text("a".into()));
	}

	#[test]
	fn test_children_key_is_reserved() {
		let props = Props::new().attr(CHILDREN, "nope");
		assert!(props.get(CHILDREN).is_none());
	}

	#[rstest]
	#[case("onclick", true, "click")]
	#[case("onClick", true, "click")]
	#[case("onInput", true, "input")]
	#[case("on", false, "")]
	#[case("class", false, "class")]
	fn test_event_keys(#[case] key: &str, #[case] is_event: bool, #[case] name: &str) {
		assert_eq!(is_event_key(key), is_event);
		if is_event {
			assert_eq!(event_name(key), name);
		}
	}

	#[test]
	fn test_listeners_and_properties_are_split() {
		let props = Props::new()
			.attr("id", "save")
			.on("click", |_| {})
			.attr("online", true);

		let listeners: Vec<_> = props.listeners().map(|(k, _)| k).collect();
		let properties: Vec<_> = props.properties().map(|(k, _)| k).collect();

		assert_eq!(listeners, vec!["onclick"]);
		assert_eq!(properties, vec!["id", "online"]);
	}

	#[test]
	fn test_handler_identity() {
		let handler = EventHandler::new(|_| {});
		let same = handler.clone();
		let other = EventHandler::new(|_| {});

		assert_eq!(handler, same);
		assert_ne!(handler, other);
	}

	#[rstest]
	#[case(element("div", Props::new(), Vec::<VNode>::new()), element("div", Props::new().attr("id", "x"), ["child"]), true)]
	#[case(element("div", Props::new(), Vec::<VNode>::new()), element("span", Props::new(), Vec::<VNode>::new()), false)]
	#[case(text("a"), text("b"), true)]
	#[case(text("a"), element("a", Props::new(), Vec::<VNode>::new()), false)]
	#[case(component(greeting, Props::new()), component(greeting, Props::new().attr("name", "x")), true)]
	#[case(component(greeting, Props::new()), component(farewell, Props::new()), false)]
	fn test_same_type(#[case] a: VNode, #[case] b: VNode, #[case] expected: bool) {
		assert_eq!(a.node_type().same_type(b.node_type()), expected);
	}

	#[test]
	fn test_component_call() {
		let node = component(greeting, Props::new().attr("name", "tessera"));
		let NodeType::Component(f) = node.node_type() else {
			panic!("expected component");
		};
		assert_eq!(f.call(node.props()).node_type(), &NodeType::Text("tessera".into()));
		assert!(f.name().ends_with("greeting"));
	}
}
