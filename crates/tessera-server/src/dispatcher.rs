//! Request dispatch
//!
//! ```text
//! Request ─┬─ path starts with static prefix ─→ StaticFiles
//!          ├─ exact path registered ──────────→ Handler
//!          └─ otherwise ──────────────────────→ 404 Not Found
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::handler::Handler;
use crate::request::Request;
use crate::response::Response;
use crate::static_files::StaticFiles;

/// Dispatches requests to static files or to handlers registered by exact path
#[derive(Default)]
pub struct Dispatcher {
	static_files: Option<StaticFiles>,
	routes: HashMap<String, Arc<dyn Handler>>,
}

impl Dispatcher {
	pub fn new() -> Self {
		Self::default()
	}

	/// Dispatcher serving the configured static directory
	pub fn from_config(config: &ServerConfig) -> Self {
		Self::new().static_files(config.static_prefix.clone(), config.static_root.clone())
	}

	/// Serve files under `root` for paths starting with `prefix`.
	pub fn static_files(mut self, prefix: impl Into<String>, root: impl Into<PathBuf>) -> Self {
		self.static_files = Some(StaticFiles::new(prefix, root));
		self
	}

	/// Register `handler` for exactly `path`; a later registration replaces it.
	pub fn route<H>(mut self, path: impl Into<String>, handler: H) -> Self
	where
		H: Handler + 'static,
	{
		self.routes.insert(path.into(), Arc::new(handler));
		self
	}

	pub fn route_count(&self) -> usize {
		self.routes.len()
	}

	pub async fn dispatch(&self, request: Request) -> Result<Response> {
		if let Some(files) = &self.static_files {
			if files.matches(request.path()) {
				return files.handle(request).await;
			}
		}

		match self.routes.get(request.path()) {
			Some(handler) => handler.handle(request).await,
			None => {
				tracing::debug!(path = %request.path(), "no handler matched");
				Ok(Response::not_found())
			}
		}
	}
}

impl std::fmt::Debug for Dispatcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Dispatcher")
			.field("static_files", &self.static_files)
			.field("routes", &self.routes.keys().collect::<Vec<_>>())
			.finish()
	}
}

#[async_trait]
impl Handler for Dispatcher {
	async fn handle(&self, request: Request) -> Result<Response> {
		self.dispatch(request).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::handler::handler_fn;
	use crate::response::NOT_FOUND_BODY;
	use http::StatusCode;
	use rstest::rstest;

	fn api() -> Dispatcher {
		Dispatcher::new()
			.route(
				"/api/health",
				handler_fn(|_| async { Ok(Response::ok().with_body("ok")) }),
			)
			.route(
				"/api/echo",
				handler_fn(|request: Request| async move {
					Ok(Response::ok().with_body(request.query().unwrap_or_default().to_string()))
				}),
			)
	}

	#[rstest]
	#[case("/api/health", StatusCode::OK, "ok")]
	#[case("/api/echo?name=tessera", StatusCode::OK, "name=tessera")]
	#[case("/api/health/", StatusCode::NOT_FOUND, NOT_FOUND_BODY)]
	#[case("/api", StatusCode::NOT_FOUND, NOT_FOUND_BODY)]
	#[tokio::test]
	async fn test_exact_path_dispatch(
		#[case] uri: &str,
		#[case] status: StatusCode,
		#[case] body: &str,
	) {
		let response = api().dispatch(Request::get(uri)).await.unwrap();
		assert_eq!(response.status, status);
		assert_eq!(response.body, body);
	}

	#[tokio::test]
	async fn test_later_route_replaces_earlier() {
		let dispatcher = Dispatcher::new()
			.route("/", handler_fn(|_| async { Ok(Response::ok().with_body("first")) }))
			.route("/", handler_fn(|_| async { Ok(Response::ok().with_body("second")) }));

		assert_eq!(dispatcher.route_count(), 1);
		let response = dispatcher.dispatch(Request::get("/")).await.unwrap();
		assert_eq!(response.body, "second");
	}

	#[tokio::test]
	async fn test_static_prefix_takes_precedence() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("app.css"), "body {}").unwrap();

		let dispatcher = Dispatcher::new().static_files("/static/", dir.path()).route(
			"/static/app.css",
			handler_fn(|_| async { Ok(Response::ok().with_body("shadowed")) }),
		);

		let response = dispatcher.dispatch(Request::get("/static/app.css")).await.unwrap();
		assert_eq!(response.status, StatusCode::OK);
		assert_eq!(response.body, "body {}");
		assert_eq!(response.content_type(), Some("text/css; charset=utf-8"));
	}
}
