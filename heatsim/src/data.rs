//! Output data

// Imports
use crate::{
	classifiers::heatmap::{HeatMap, TierStatistics},
	config::Config,
	geometry::TierGeometry,
	sim::{IntervalSpan, RunOutput},
};

/// Output data
#[derive(Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct RunData {
	pub config:        Config,
	pub geometry:      Vec<TierGeometry>,
	pub time_span:     Option<(f64, f64)>,
	pub accesses:      u64,
	pub skipped_rows:  u64,
	pub stopped_early: bool,
	pub intervals:     Vec<IntervalData>,
	pub totals:        Vec<TierData>,
	pub summary:       Vec<Option<HitRateSummary>>,
}

impl RunData {
	/// Collects the output data of a run
	#[must_use]
	pub fn new(config: Config, heatmap: &HeatMap, output: &RunOutput, skipped_rows: u64) -> Self {
		let tiers = heatmap.cache().tiers();
		Self {
			config,
			geometry: heatmap.cache().geometry().to_vec(),
			time_span: output.time_span,
			accesses: output.accesses,
			skipped_rows,
			stopped_early: output.stopped_early,
			intervals: heatmap
				.intervals()
				.iter()
				.map(|interval| IntervalData {
					span:  interval.span,
					tiers: interval.tiers.iter().copied().map(TierData::from).collect(),
				})
				.collect(),
			totals: heatmap.statistics().total().iter().copied().map(TierData::from).collect(),
			summary: (0..tiers)
				.map(|tier| {
					heatmap.hit_rate_summary(tier).map(|hit_rates| HitRateSummary {
						intervals: hit_rates.len(),
						mean:      hit_rates.mean(),
						error:     hit_rates.error(),
					})
				})
				.collect(),
		}
	}
}

/// Interval output data
#[derive(Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct IntervalData {
	pub span:  IntervalSpan,
	pub tiers: Vec<TierData>,
}

/// Tier output data
#[derive(PartialEq, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct TierData {
	pub hits:            u64,
	pub misses:          u64,
	pub incremented:     u64,
	pub saturated:       u64,
	pub hit_rate:        Option<f64>,
	pub increment_rate:  Option<f64>,
	pub saturation_rate: Option<f64>,
}

impl From<TierStatistics> for TierData {
	fn from(stats: TierStatistics) -> Self {
		Self {
			hits:            stats.hits,
			misses:          stats.misses,
			incremented:     stats.incremented,
			saturated:       stats.saturated,
			hit_rate:        stats.hit_rate(),
			increment_rate:  stats.increment_rate(),
			saturation_rate: stats.saturation_rate(),
		}
	}
}

/// Per-interval hit rate summary
#[derive(Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct HitRateSummary {
	pub intervals: u64,
	pub mean:      f64,
	pub error:     f64,
}
