//! Client-side router
//!
//! [`Router`] maps exact paths to views. A [`Navigator`] holds the current path
//! in a [`ReactiveObject`]; the component returned by [`Router::outlet`] reads it
//! while rendering, so every navigation re-renders the outlet.
//!
//! ## Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use tessera_pages::router::{Navigator, Router};
//! use tessera_pages::vnode::{Props, element};
//!
//! let router = Rc::new(
//!     Router::new()
//!         .named_route("home", "/", || element("h1", Props::new(), ["Home"]))
//!         .route("/about", || element("h1", Props::new(), ["About"])),
//! );
//! let navigator = Navigator::new("/");
//! let app = Router::outlet(&router, &navigator);
//!
//! navigator.navigate("/about");
//! ```

use core::fmt;
use std::collections::HashMap;
use std::rc::Rc;

use tessera_reactive::ReactiveObject;

use crate::error::RouterError;
use crate::vnode::{Props, VNode, component, element};

type ViewFn = Rc<dyn Fn() -> VNode>;

/// A single route definition.
#[derive(Clone)]
pub struct Route {
	path: String,
	name: Option<String>,
	view: ViewFn,
}

impl fmt::Debug for Route {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Route")
			.field("path", &self.path)
			.field("name", &self.name)
			.finish()
	}
}

impl Route {
	/// Creates a new route.
	pub fn new<F>(path: impl Into<String>, view: F) -> Self
	where
		F: Fn() -> VNode + 'static,
	{
		Self {
			path: path.into(),
			name: None,
			view: Rc::new(view),
		}
	}

	/// Creates a named route.
	pub fn named<F>(name: impl Into<String>, path: impl Into<String>, view: F) -> Self
	where
		F: Fn() -> VNode + 'static,
	{
		Self {
			name: Some(name.into()),
			..Self::new(path, view)
		}
	}

	pub fn path(&self) -> &str {
		&self.path
	}

	/// Returns the route name.
	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	/// Renders the route's view.
	pub fn render(&self) -> VNode {
		(self.view)()
	}
}

/// The main router.
#[derive(Default)]
pub struct Router {
	routes: Vec<Route>,
	named_routes: HashMap<String, usize>,
	not_found: Option<ViewFn>,
}

impl fmt::Debug for Router {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Router")
			.field("routes_count", &self.routes.len())
			.field("named_routes", &self.named_routes.keys().collect::<Vec<_>>())
			.finish()
	}
}

impl Router {
	/// Creates a new router.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a route to the router.
	pub fn route<F>(mut self, path: &str, view: F) -> Self
	where
		F: Fn() -> VNode + 'static,
	{
		self.routes.push(Route::new(path, view));
		self
	}

	/// Adds a named route to the router.
	pub fn named_route<F>(mut self, name: &str, path: &str, view: F) -> Self
	where
		F: Fn() -> VNode + 'static,
	{
		let index = self.routes.len();
		self.routes.push(Route::named(name, path, view));
		self.named_routes.insert(name.to_string(), index);
		self
	}

	/// Sets the not found view.
	pub fn not_found<F>(mut self, view: F) -> Self
	where
		F: Fn() -> VNode + 'static,
	{
		self.not_found = Some(Rc::new(view));
		self
	}

	/// Finds the route registered for `path`
	///
	/// Matching is exact; a query string or fragment is ignored. The first route
	/// registered for a path wins.
	pub fn match_path(&self, path: &str) -> Result<&Route, RouterError> {
		let path = strip_query(path);
		self.routes
			.iter()
			.find(|route| route.path == path)
			.ok_or_else(|| RouterError::NotFound(path.to_string()))
	}

	/// View for `path`, falling back to the not-found view
	pub fn resolve(&self, path: &str) -> VNode {
		match self.match_path(path) {
			Ok(route) => route.render(),
			Err(err) => {
				tracing::debug!(%err, "no route matched");
				match &self.not_found {
					Some(view) => view(),
					None => not_found_view(),
				}
			}
		}
	}

	/// Path of the route registered under `name`.
	pub fn reverse(&self, name: &str) -> Result<&str, RouterError> {
		self.named_routes
			.get(name)
			.and_then(|index| self.routes.get(*index))
			.map(Route::path)
			.ok_or_else(|| RouterError::InvalidRouteName(name.to_string()))
	}

	/// Returns the number of registered routes.
	pub fn route_count(&self) -> usize {
		self.routes.len()
	}

	/// Checks if a route name exists.
	pub fn has_route(&self, name: &str) -> bool {
		self.named_routes.contains_key(name)
	}

	/// Component rendering the view for the navigator's current path
	pub fn outlet(router: &Rc<Router>, navigator: &Navigator) -> VNode {
		let router = Rc::clone(router);
		let navigator = navigator.clone();
		component(move |_: &Props| router.resolve(&navigator.path()), Props::new())
	}
}

/// Fixed page shown when no route and no custom not-found view match
pub fn not_found_view() -> VNode {
	element("h1", Props::new(), ["404 Not Found"])
}

fn strip_query(path: &str) -> &str {
	path.split(['?', '#']).next().unwrap_or(path)
}

const PATH_KEY: &str = "path";

/// Reactive holder of the current path
#[derive(Debug, Clone)]
pub struct Navigator {
	state: ReactiveObject<String>,
}

impl Navigator {
	pub fn new(initial: impl Into<String>) -> Self {
		let state = ReactiveObject::new();
		state.set_untracked(PATH_KEY, initial.into());
		Self { state }
	}

	/// Current path; subscribes the running observer.
	pub fn path(&self) -> String {
		self.state.get(PATH_KEY).unwrap_or_default()
	}

	pub fn path_untracked(&self) -> String {
		self.state.get_untracked(PATH_KEY).unwrap_or_default()
	}

	/// Change the current path, notifying readers when it differs
	pub fn navigate(&self, path: impl Into<String>) {
		let path = path.into();
		if self.path_untracked() == path {
			return;
		}
		tracing::debug!(%path, "navigate");
		self.state.set(PATH_KEY, path);
	}
}
