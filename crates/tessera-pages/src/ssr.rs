//! Server-side string rendering
//!
//! [`SsrRenderer`] walks a [`VNode`] tree depth first and writes HTML, without
//! fibers or a host tree. Components are called directly; their hooks start from
//! their initial values and their reactive reads subscribe nothing.
//!
//! ## Example
//!
//! ```ignore
//! use tessera_pages::ssr::{SsrOptions, SsrRenderer};
//! use tessera_pages::vnode::{Props, element};
//!
//! let renderer = SsrRenderer::with_options(SsrOptions::new().title("Home"));
//! let html = renderer.render_page(&element("h1", Props::new(), ["Welcome"]));
//! ```

use serde::Deserialize;
use tessera_reactive::untrack;

use crate::hooks::render_detached;
use crate::html::{escape, is_void_element, write_open_tag};
use crate::vnode::{NodeType, VNode};

/// Options for SSR rendering.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SsrOptions {
	/// Language attribute for HTML element.
	pub lang: String,
	/// Document title, omitted when `None`.
	pub title: Option<String>,
	/// Id of the element the rendered content is placed in.
	pub root_id: String,
	/// Whether to emit `<!DOCTYPE html>`.
	pub doctype: bool,
}

impl Default for SsrOptions {
	fn default() -> Self {
		Self {
			lang: "en".to_string(),
			title: None,
			root_id: "app".to_string(),
			doctype: true,
		}
	}
}

impl SsrOptions {
	/// Creates new default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the language.
	pub fn lang(mut self, lang: impl Into<String>) -> Self {
		self.lang = lang.into();
		self
	}

	/// Sets the document title.
	pub fn title(mut self, title: impl Into<String>) -> Self {
		self.title = Some(title.into());
		self
	}

	/// Sets the id of the content root element.
	pub fn root_id(mut self, id: impl Into<String>) -> Self {
		self.root_id = id.into();
		self
	}

	/// Enables or disables the doctype line.
	pub fn doctype(mut self, enable: bool) -> Self {
		self.doctype = enable;
		self
	}
}

/// The string renderer.
#[derive(Debug, Clone, Default)]
pub struct SsrRenderer {
	options: SsrOptions,
}

impl SsrRenderer {
	/// Creates a new renderer with default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a renderer with custom options.
	pub fn with_options(options: SsrOptions) -> Self {
		Self { options }
	}

	pub fn options(&self) -> &SsrOptions {
		&self.options
	}

	/// Renders a node tree to an HTML fragment.
	pub fn render_to_string(&self, node: &VNode) -> String {
		let mut out = String::new();
		write_node(node, &mut out);
		out
	}

	/// Renders a node tree to a full HTML page.
	pub fn render_page(&self, node: &VNode) -> String {
		let content = self.render_to_string(node);
		self.wrap_in_html(&content)
	}

	/// Wraps content in a full HTML document.
	pub fn wrap_in_html(&self, content: &str) -> String {
		let mut html = String::with_capacity(content.len() + 256);

		if self.options.doctype {
			html.push_str("<!DOCTYPE html>\n");
		}
		html.push_str(&format!("<html lang=\"{}\">\n", escape(&self.options.lang)));

		html.push_str("<head>\n");
		html.push_str("<meta charset=\"UTF-8\">\n");
		html.push_str(
			"<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
		);
		if let Some(ref title) = self.options.title {
			html.push_str(&format!("<title>{}</title>\n", escape(title)));
		}
		html.push_str("</head>\n");

		html.push_str("<body>\n");
		html.push_str(&format!("<div id=\"{}\">", escape(&self.options.root_id)));
		html.push_str(content);
		html.push_str("</div>\n");
		html.push_str("</body>\n");
		html.push_str("</html>");
		html
	}
}

fn write_node(node: &VNode, out: &mut String) {
	match node.node_type() {
		NodeType::Text(value) => out.push_str(&escape(value)),
		NodeType::Host(tag) => {
			write_open_tag(out, tag, node.props().properties());
			if is_void_element(tag) {
				return;
			}
			for child in node.children() {
				write_node(child, out);
			}
			out.push_str(&format!("</{}>", tag));
		}
		NodeType::Component(component) => {
			let rendered = untrack(|| render_detached(|| component.call(node.props())));
			write_node(&rendered, out);
		}
	}
}
