use bytes::Bytes;
use http::{HeaderMap, Method, Uri, Version};

/// HTTP Request representation
#[derive(Debug, Clone)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub version: Version,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Request {
	pub fn new(method: Method, uri: Uri, version: Version, headers: HeaderMap, body: Bytes) -> Self {
		Self {
			method,
			uri,
			version,
			headers,
			body,
		}
	}

	/// `GET` request for `uri` with no headers and an empty body
	///
	/// # Examples
	///
	/// ```
	/// use tessera_server::Request;
	///
	/// let request = Request::get("/static/app.css?v=2");
	/// assert_eq!(request.path(), "/static/app.css");
	/// ```
	pub fn get(uri: &str) -> Self {
		Self::new(
			Method::GET,
			uri.parse().unwrap_or_else(|_| Uri::from_static("/")),
			Version::HTTP_11,
			HeaderMap::new(),
			Bytes::new(),
		)
	}

	/// Path component of the request URI, without the query string
	pub fn path(&self) -> &str {
		self.uri.path()
	}

	pub fn query(&self) -> Option<&str> {
		self.uri.query()
	}
}
