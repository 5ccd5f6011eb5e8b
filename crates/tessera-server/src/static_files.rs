//! Static file responder
//!
//! Serves files below a root directory for request paths under a URL prefix.
//! Paths that try to leave the root are answered with `403 Forbidden`; missing
//! files and directories with the fixed not-found response.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;
use crate::handler::Handler;
use crate::request::Request;
use crate::response::Response;

/// Content types by file extension
const CONTENT_TYPES: &[(&str, &str)] = &[
	("html", "text/html; charset=utf-8"),
	("htm", "text/html; charset=utf-8"),
	("css", "text/css; charset=utf-8"),
	("js", "text/javascript; charset=utf-8"),
	("mjs", "text/javascript; charset=utf-8"),
	("json", "application/json"),
	("map", "application/json"),
	("wasm", "application/wasm"),
	("txt", "text/plain; charset=utf-8"),
	("svg", "image/svg+xml"),
	("png", "image/png"),
	("jpg", "image/jpeg"),
	("jpeg", "image/jpeg"),
	("gif", "image/gif"),
	("webp", "image/webp"),
	("ico", "image/x-icon"),
	("woff", "font/woff"),
	("woff2", "font/woff2"),
];

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type for `path` based on its extension.
pub fn content_type_for(path: &Path) -> &'static str {
	let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
		return DEFAULT_CONTENT_TYPE;
	};
	let extension = extension.to_ascii_lowercase();
	CONTENT_TYPES
		.iter()
		.find(|(ext, _)| *ext == extension)
		.map(|(_, content_type)| *content_type)
		.unwrap_or(DEFAULT_CONTENT_TYPE)
}

#[derive(Debug, Clone)]
pub struct StaticFiles {
	prefix: String,
	root: PathBuf,
}

impl StaticFiles {
	/// # Arguments
	///
	/// * `prefix` - URL prefix, e.g. `/static/`
	/// * `root` - Directory the prefix maps to
	pub fn new(prefix: impl Into<String>, root: impl Into<PathBuf>) -> Self {
		Self {
			prefix: prefix.into(),
			root: root.into(),
		}
	}

	pub fn prefix(&self) -> &str {
		&self.prefix
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Whether `path` falls under the prefix.
	pub fn matches(&self, path: &str) -> bool {
		path.starts_with(&self.prefix)
	}

	/// File path for a request path, or `None` when it would escape the root
	pub fn resolve(&self, path: &str) -> Option<PathBuf> {
		let relative = path.strip_prefix(&self.prefix)?.trim_start_matches('/');
		if relative.contains('\\') {
			return None;
		}
		let relative = Path::new(relative);
		let escapes = relative.components().any(|component| {
			matches!(
				component,
				Component::ParentDir | Component::RootDir | Component::Prefix(_)
			)
		});
		if escapes {
			return None;
		}
		Some(self.root.join(relative))
	}

	/// Serve the file for `path`
	pub async fn serve(&self, path: &str) -> Result<Response> {
		let Some(file) = self.resolve(path) else {
			tracing::warn!(%path, "static path rejected");
			return Ok(Response::forbidden());
		};

		// symlinks must not lead outside the root either
		if let (Ok(canonical), Ok(root)) = (
			tokio::fs::canonicalize(&file).await,
			tokio::fs::canonicalize(&self.root).await,
		) {
			if !canonical.starts_with(&root) {
				tracing::warn!(%path, "static path escapes root");
				return Ok(Response::forbidden());
			}
		}

		match tokio::fs::read(&file).await {
			Ok(contents) => {
				tracing::debug!(%path, bytes = contents.len(), "static file served");
				Ok(Response::ok()
					.with_content_type(content_type_for(&file))
					.with_body(contents))
			}
			Err(err) if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::IsADirectory) => {
				Ok(Response::not_found())
			}
			Err(err) => {
				// reading a directory fails with a platform specific error on some systems
				if tokio::fs::metadata(&file).await.is_ok_and(|meta| meta.is_dir()) {
					return Ok(Response::not_found());
				}
				Err(err.into())
			}
		}
	}
}

#[async_trait]
impl Handler for StaticFiles {
	async fn handle(&self, request: Request) -> Result<Response> {
		self.serve(request.path()).await
	}
}
