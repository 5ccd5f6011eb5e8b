//! Error types for host mutations and rendering.

use thiserror::Error;

/// Failure reported by a [`HostTree`](crate::host::HostTree) primitive
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
	/// The node handle does not belong to this host
	#[error("Unknown host node: {0}")]
	UnknownNode(String),

	/// `remove_child` was called with a node that is not a child of `parent`
	#[error("Node {child} is not a child of {parent}")]
	NotAChild { parent: String, child: String },

	/// The host rejected a property write
	#[error("Property {name} rejected: {reason}")]
	Property { name: String, reason: String },

	/// Any other host failure
	#[error("Host operation failed: {0}")]
	Operation(String),
}

/// Failure that halts the current scheduler turn
///
/// No rollback is attempted: host mutations applied before the failure stay applied.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
	#[error(transparent)]
	Host(#[from] HostError),

	/// `work_loop` was driven before `render` was called
	#[error("No root has been rendered")]
	NoRoot,
}

/// Failure to load configuration
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("Invalid configuration: {0}")]
	Parse(#[from] toml::de::Error),
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Error type for router operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
	/// Route not found.
	#[error("Route not found: {0}")]
	NotFound(String),

	/// Invalid route name.
	#[error("Invalid route name: {0}")]
	InvalidRouteName(String),
}
