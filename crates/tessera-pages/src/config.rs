//! Renderer configuration.
//!
//! ```toml
//! yield_threshold_ms = 1.0
//! slice_budget_ms = 5
//! ```

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunables for the cooperative scheduler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
	/// The work loop yields once the deadline reports less than this many milliseconds left.
	pub yield_threshold_ms: f64,
	/// Slice length granted by [`SliceDriver`](crate::scheduler::SliceDriver).
	pub slice_budget_ms: u64,
}

impl Default for RendererConfig {
	fn default() -> Self {
		Self {
			yield_threshold_ms: 1.0,
			slice_budget_ms: 5,
		}
	}
}

impl RendererConfig {
	pub fn new() -> Self {
		Self::default()
	}

	/// Parse a TOML document; missing keys keep their defaults.
	pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(source)?)
	}

	/// Sets the yield threshold.
	pub fn yield_threshold(mut self, threshold: Duration) -> Self {
		self.yield_threshold_ms = threshold.as_micros() as f64 / 1000.0;
		self
	}

	/// Sets the slice budget.
	pub fn slice_budget(mut self, budget: Duration) -> Self {
		self.slice_budget_ms = budget.as_millis() as u64;
		self
	}

	pub fn yield_threshold_duration(&self) -> Duration {
		Duration::from_nanos((self.yield_threshold_ms.max(0.0) * 1_000_000.0).round() as u64)
	}

	pub fn slice_budget_duration(&self) -> Duration {
		Duration::from_millis(self.slice_budget_ms)
	}
}
