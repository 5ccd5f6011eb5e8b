//! Server configuration.
//!
//! ```toml
//! addr = "0.0.0.0:8080"
//! static_prefix = "/assets/"
//! static_root = "public"
//! ```

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
	/// Address the server binds to.
	pub addr: SocketAddr,
	/// URL prefix answered from `static_root`.
	pub static_prefix: String,
	/// Directory holding static files.
	pub static_root: PathBuf,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8000)),
			static_prefix: "/static/".to_string(),
			static_root: PathBuf::from("static"),
		}
	}
}

impl ServerConfig {
	pub fn new() -> Self {
		Self::default()
	}

	/// Parse a TOML document; missing keys keep their defaults.
	pub fn from_toml_str(source: &str) -> Result<Self> {
		Ok(toml::from_str(source)?)
	}

	/// Sets the bind address.
	pub fn addr(mut self, addr: SocketAddr) -> Self {
		self.addr = addr;
		self
	}

	/// Sets the static file prefix and directory.
	pub fn static_files(mut self, prefix: impl Into<String>, root: impl Into<PathBuf>) -> Self {
		self.static_prefix = prefix.into();
		self.static_root = root.into();
		self
	}
}
