//! Server-rendered pages
//!
//! A [`PageHandler`] builds a fresh [`VNode`](tessera_pages::VNode) tree for
//! every request and answers with the document produced by
//! [`SsrRenderer::render_page`]. Node trees are not `Send`, so the tree is built
//! and serialised before the handler returns to the executor.

use std::sync::Arc;

use async_trait::async_trait;
use tessera_pages::ssr::{SsrOptions, SsrRenderer};
use tessera_pages::vnode::VNode;

use crate::error::Result;
use crate::handler::Handler;
use crate::request::Request;
use crate::response::Response;

type PageFn = Arc<dyn Fn() -> VNode + Send + Sync>;

/// Handler rendering a page from a view function
#[derive(Clone)]
pub struct PageHandler {
	view: PageFn,
	options: SsrOptions,
}

impl PageHandler {
	pub fn new<F>(view: F) -> Self
	where
		F: Fn() -> VNode + Send + Sync + 'static,
	{
		Self {
			view: Arc::new(view),
			options: SsrOptions::default(),
		}
	}

	/// Sets the document options.
	pub fn with_options(mut self, options: SsrOptions) -> Self {
		self.options = options;
		self
	}

	/// Render the page to a complete HTML document
	pub fn render(&self) -> String {
		let renderer = SsrRenderer::with_options(self.options.clone());
		renderer.render_page(&(self.view)())
	}
}

impl std::fmt::Debug for PageHandler {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PageHandler")
			.field("options", &self.options)
			.finish()
	}
}

#[async_trait]
impl Handler for PageHandler {
	async fn handle(&self, request: Request) -> Result<Response> {
		let html = self.render();
		tracing::debug!(path = %request.path(), bytes = html.len(), "page rendered");
		Ok(Response::html(html))
	}
}
