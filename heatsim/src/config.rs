//! Configuration

// Imports
use {
	crate::{
		classifiers::heatmap::SelectorKind,
		geometry::{TierGeometry, TierSpec},
	},
	anyhow::Context,
	std::time::Duration,
};

/// Configuration
#[derive(PartialEq, Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Config {
	/// Tiers, from coarsest to finest
	pub tiers: Vec<TierSpec>,

	/// Interval between cascades (in seconds)
	pub interval_secs: f64,

	/// Iteration to stop at, if any
	pub stop_after: Option<u64>,

	/// Hot region selector
	pub selector: SelectorKind,

	/// Debug output period (in seconds)
	pub debug_output_period_secs: f64,
}

impl Config {
	/// Validates this configuration and derives the geometry of all tiers.
	///
	/// # Errors
	/// Returns an error if the interval or debug output period aren't valid,
	/// if `stop_after` is zero, or if any tier has an invalid geometry.
	pub fn validate(&self) -> Result<Vec<TierGeometry>, anyhow::Error> {
		anyhow::ensure!(
			self.interval_secs.is_finite() && self.interval_secs > 0.0,
			"Interval must be finite and positive, found {}",
			self.interval_secs
		);
		self.debug_output_period()?;
		anyhow::ensure!(self.stop_after != Some(0), "Cannot stop before the first iteration");

		TierGeometry::derive_all(&self.tiers).context("Invalid tier geometry")
	}

	/// Returns the debug output period.
	///
	/// # Errors
	/// Returns an error if the period is negative, not finite, or too large for a [`Duration`].
	pub fn debug_output_period(&self) -> Result<Duration, anyhow::Error> {
		Duration::try_from_secs_f64(self.debug_output_period_secs).with_context(|| {
			format!(
				"Invalid debug output period, found {}",
				self.debug_output_period_secs
			)
		})
	}
}
