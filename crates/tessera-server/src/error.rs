//! Error types for the HTTP layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Hyper error: {0}")]
	Hyper(#[from] hyper::Error),

	#[error("HTTP error: {0}")]
	Http(#[from] http::Error),

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("Invalid configuration: {0}")]
	Config(#[from] toml::de::Error),

	/// A handler failed; answered with `500 Internal Server Error`
	#[error("Handler error: {0}")]
	Handler(String),
}

pub type Result<T> = std::result::Result<T, ServerError>;
