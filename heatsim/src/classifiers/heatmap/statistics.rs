//! Statistics

// Imports
use {super::counters::Increment, heatsim_util::RatioOfSum};

/// Accuracy tracker.
///
/// Counts lookup outcomes per tier, both for the current interval
/// and for the whole run.
#[derive(Clone, Debug)]
pub struct AccuracyTracker {
	/// Statistics for the current interval, by tier
	interval: Vec<TierStatistics>,

	/// Statistics for the whole run, by tier
	total: Vec<TierStatistics>,
}

impl AccuracyTracker {
	/// Creates an empty tracker for `tiers` tiers
	#[must_use]
	pub fn new(tiers: usize) -> Self {
		Self {
			interval: vec![TierStatistics::default(); tiers],
			total:    vec![TierStatistics::default(); tiers],
		}
	}

	/// Registers the outcome of a lookup on `tier`.
	///
	/// # Panics
	/// Panics if `tier` is out of bounds.
	pub fn register(&mut self, tier: usize, outcome: Outcome) {
		self.interval[tier].register(outcome);
		self.total[tier].register(outcome);
	}

	/// Returns the statistics of the current interval, by tier
	#[must_use]
	pub fn interval(&self) -> &[TierStatistics] {
		&self.interval
	}

	/// Returns the statistics of the whole run, by tier
	#[must_use]
	pub fn total(&self) -> &[TierStatistics] {
		&self.total
	}

	/// Resets the statistics of the current interval
	pub fn reset_interval(&mut self) {
		self.interval.fill(TierStatistics::default());
	}
}

/// Outcome of a lookup
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Outcome {
	/// Region was tracked, and its counter was incremented (or not, if saturated)
	Hit(Increment),

	/// Region wasn't tracked
	Miss,
}

/// Statistics of a single tier
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
pub struct TierStatistics {
	pub hits:        u64,
	pub misses:      u64,
	pub incremented: u64,
	pub saturated:   u64,
}

impl TierStatistics {
	/// Registers the outcome of a lookup
	pub fn register(&mut self, outcome: Outcome) {
		match outcome {
			Outcome::Hit(increment) => {
				self.hits += 1;
				match increment {
					Increment::Incremented => self.incremented += 1,
					Increment::Saturated => self.saturated += 1,
				}
			},
			Outcome::Miss => self.misses += 1,
		}
	}

	/// Returns the total number of lookups
	#[must_use]
	pub fn lookups(&self) -> u64 {
		self.hits + self.misses
	}

	/// Returns the ratio of hits to lookups, if any lookups happened
	#[must_use]
	pub fn hit_rate(&self) -> Option<f64> {
		self.hits.ratio_of_sum(self.misses)
	}

	/// Returns the ratio of misses to lookups, if any lookups happened
	#[must_use]
	pub fn miss_rate(&self) -> Option<f64> {
		self.misses.ratio_of_sum(self.hits)
	}

	/// Returns the ratio of increments to hits, if any hits happened
	#[must_use]
	pub fn increment_rate(&self) -> Option<f64> {
		self.incremented.ratio_of_sum(self.saturated)
	}

	/// Returns the ratio of saturations to hits, if any hits happened
	#[must_use]
	pub fn saturation_rate(&self) -> Option<f64> {
		self.saturated.ratio_of_sum(self.incremented)
	}
}

impl std::ops::AddAssign for TierStatistics {
	fn add_assign(&mut self, rhs: Self) {
		self.hits += rhs.hits;
		self.misses += rhs.misses;
		self.incremented += rhs.incremented;
		self.saturated += rhs.saturated;
	}
}
