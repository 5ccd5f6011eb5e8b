use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use serde::Serialize;

use crate::error::Result;

/// Body of the fixed not-found response
pub const NOT_FOUND_BODY: &str = "404 Not Found";

/// HTTP Response representation
#[derive(Debug, Clone)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Response {
	/// Create a new Response with the given status code
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	/// Create a Response with HTTP 200 OK status
	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	/// The fixed `404 Not Found` response
	///
	/// # Examples
	///
	/// ```
	/// use http::StatusCode;
	/// use tessera_server::Response;
	///
	/// let response = Response::not_found();
	/// assert_eq!(response.status, StatusCode::NOT_FOUND);
	/// assert_eq!(response.body, "404 Not Found");
	/// ```
	pub fn not_found() -> Self {
		Self::new(StatusCode::NOT_FOUND)
			.with_content_type("text/plain; charset=utf-8")
			.with_body(NOT_FOUND_BODY)
	}

	pub fn forbidden() -> Self {
		Self::new(StatusCode::FORBIDDEN)
	}

	/// Create a Response with HTTP 500 Internal Server Error status
	pub fn internal_server_error() -> Self {
		Self::new(StatusCode::INTERNAL_SERVER_ERROR)
	}

	/// `200 OK` with an HTML body
	pub fn html(body: impl Into<Bytes>) -> Self {
		Self::ok()
			.with_content_type("text/html; charset=utf-8")
			.with_body(body)
	}

	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Set the `content-type` header; invalid values are ignored.
	pub fn with_content_type(self, content_type: &str) -> Self {
		self.with_header(CONTENT_TYPE, content_type)
	}

	/// Add a header; invalid values are ignored.
	pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
		if let Ok(value) = HeaderValue::from_str(value) {
			self.headers.insert(name, value);
		}
		self
	}

	/// Serialize `data` as the JSON body
	pub fn with_json<T: Serialize>(mut self, data: &T) -> Result<Self> {
		self.body = Bytes::from(serde_json::to_vec(data)?);
		self.headers
			.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		Ok(self)
	}

	pub fn content_type(&self) -> Option<&str> {
		self.headers
			.get(CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
	}

	/// Convert into a `http::Response`
	pub fn into_http(self) -> http::Response<Bytes> {
		let mut response = http::Response::new(self.body);
		*response.status_mut() = self.status;
		*response.headers_mut() = self.headers;
		response
	}
}
