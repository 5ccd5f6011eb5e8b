//! Browser host (WASM only)
//!
//! [`DomHost`] applies host primitives to the live DOM through `web-sys`.
//! Properties are written as JavaScript properties of the node (`Reflect::set`),
//! so `value`, `checked` and `className` behave as they do in script. Listener
//! closures stay owned by the host until the listener is removed.
//!
//! [`IdleCallbackDriver`] feeds the scheduler from `requestIdleCallback`.

use core::time::Duration;

use js_sys::Reflect;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Node};

use super::HostTree;
use crate::error::HostError;
use crate::scheduler::{Deadline, IdleCallback, IdleDriver};
use crate::vnode::{Event, EventHandler, PropValue};

struct Listener {
	node: Node,
	event: String,
	handler: EventHandler,
	closure: Closure<dyn FnMut(web_sys::Event)>,
}

/// Host tree backed by a DOM document
pub struct DomHost {
	document: Document,
	listeners: Vec<Listener>,
}

impl DomHost {
	/// Host for the window's document
	pub fn new() -> Result<Self, HostError> {
		let document = web_sys::window()
			.and_then(|window| window.document())
			.ok_or_else(|| HostError::Operation("no document available".to_string()))?;
		Ok(Self::from_document(document))
	}

	pub fn from_document(document: Document) -> Self {
		Self {
			document,
			listeners: Vec::new(),
		}
	}

	pub fn document(&self) -> &Document {
		&self.document
	}

	/// Element with `id`, to be used as a render container
	pub fn container(&self, id: &str) -> Result<Node, HostError> {
		self.document
			.get_element_by_id(id)
			.map(Node::from)
			.ok_or_else(|| HostError::UnknownNode(format!("#{id}")))
	}
}

fn js_error(value: JsValue) -> HostError {
	HostError::Operation(value.as_string().unwrap_or_else(|| format!("{value:?}")))
}

fn to_js(name: &str, value: &PropValue) -> Result<JsValue, HostError> {
	match value {
		PropValue::Str(s) => Ok(JsValue::from_str(s)),
		PropValue::Bool(b) => Ok(JsValue::from_bool(*b)),
		PropValue::Number(n) => Ok(JsValue::from_f64(*n)),
		PropValue::Handler(_) => Err(HostError::Property {
			name: name.to_string(),
			reason: "handlers are registered as listeners".to_string(),
		}),
	}
}

fn from_js(value: JsValue) -> Option<PropValue> {
	if let Some(s) = value.as_string() {
		return Some(PropValue::Str(s));
	}
	if let Some(b) = value.as_bool() {
		return Some(PropValue::Bool(b));
	}
	value.as_f64().map(PropValue::Number)
}

impl HostTree for DomHost {
	type Node = Node;

	fn create_element(&mut self, tag: &str) -> Result<Node, HostError> {
		self.document
			.create_element(tag)
			.map(Node::from)
			.map_err(js_error)
	}

	fn create_text(&mut self, value: &str) -> Result<Node, HostError> {
		Ok(self.document.create_text_node(value).into())
	}

	fn append_child(&mut self, parent: &Node, child: &Node) -> Result<(), HostError> {
		parent.append_child(child).map(|_| ()).map_err(js_error)
	}

	fn remove_child(&mut self, parent: &Node, child: &Node) -> Result<(), HostError> {
		parent
			.remove_child(child)
			.map(|_| ())
			.map_err(|_| HostError::NotAChild {
				parent: parent.node_name(),
				child: child.node_name(),
			})
	}

	fn get_property(&self, node: &Node, name: &str) -> Result<Option<PropValue>, HostError> {
		Reflect::get(node, &JsValue::from_str(name))
			.map(from_js)
			.map_err(js_error)
	}

	fn set_property(&mut self, node: &Node, name: &str, value: &PropValue) -> Result<(), HostError> {
		let js = to_js(name, value)?;
		match Reflect::set(node, &JsValue::from_str(name), &js) {
			Ok(true) => Ok(()),
			Ok(false) => Err(HostError::Property {
				name: name.to_string(),
				reason: "property is read-only".to_string(),
			}),
			Err(err) => Err(js_error(err)),
		}
	}

	fn remove_property(&mut self, node: &Node, name: &str) -> Result<(), HostError> {
		Reflect::set(node, &JsValue::from_str(name), &JsValue::from_str("")).map_err(js_error)?;
		if let Some(element) = node.dyn_ref::<web_sys::Element>() {
			element.remove_attribute(name).map_err(js_error)?;
		}
		Ok(())
	}

	fn add_event_listener(&mut self, node: &Node, event: &str, handler: &EventHandler) -> Result<(), HostError> {
		let callback = handler.clone();
		let closure = Closure::wrap(Box::new(move |event: web_sys::Event| {
			let value = event
				.target()
				.and_then(|target| Reflect::get(&target, &JsValue::from_str("value")).ok())
				.and_then(|value| value.as_string());
			callback.call(&Event {
				kind: event.type_(),
				value,
			});
		}) as Box<dyn FnMut(web_sys::Event)>);

		node.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
			.map_err(js_error)?;
		self.listeners.push(Listener {
			node: node.clone(),
			event: event.to_string(),
			handler: handler.clone(),
			closure,
		});
		Ok(())
	}

	fn remove_event_listener(&mut self, node: &Node, event: &str, handler: &EventHandler) -> Result<(), HostError> {
		let Some(index) = self
			.listeners
			.iter()
			.position(|l| &l.node == node && l.event == event && &l.handler == handler)
		else {
			return Ok(());
		};
		let listener = self.listeners.swap_remove(index);
		node.remove_event_listener_with_callback(event, listener.closure.as_ref().unchecked_ref())
			.map_err(js_error)
	}
}

struct BrowserDeadline(web_sys::IdleDeadline);

impl Deadline for BrowserDeadline {
	fn time_remaining(&self) -> Duration {
		Duration::from_secs_f64(self.0.time_remaining().max(0.0) / 1000.0)
	}
}

/// Idle slots from `window.requestIdleCallback`
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleCallbackDriver;

impl IdleDriver for IdleCallbackDriver {
	fn request_idle_callback(&self, callback: IdleCallback) {
		let Some(window) = web_sys::window() else {
			tracing::error!("requestIdleCallback unavailable: no window");
			return;
		};
		let js = Closure::once_into_js(move |deadline: web_sys::IdleDeadline| {
			callback(&BrowserDeadline(deadline));
		});
		if let Err(err) = window.request_idle_callback(js.unchecked_ref()) {
			tracing::error!(error = ?err, "requestIdleCallback failed");
		}
	}
}
