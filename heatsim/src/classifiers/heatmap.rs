//! Heat map classifier

// Modules
pub mod cache;
pub mod counters;
pub mod promotion;
pub mod region_map;
pub mod statistics;

// Exports
pub use self::{
	cache::TieredCache,
	counters::{CounterBank, Increment},
	promotion::{Candidate, ExactTopK, FirstSmaller, Promotion, PromotionEngine, Selector, SelectorKind},
	region_map::{RegionId, RegionMap},
	statistics::{AccuracyTracker, Outcome, TierStatistics},
};

// Imports
use {
	crate::{geometry::TierGeometry, sim, trace::AccessEvent},
	anyhow::Context,
	heatsim_util::fmt_percentage,
	itertools::Itertools,
	std::fmt,
};

/// Heat map classifier.
///
/// Tracks access heat in a hierarchy of tiers, each finer than the last.
/// Every tier past the first only tracks the hottest regions of the tier
/// before it, as of the last interval.
///
/// Tier `i` only becomes active at iteration `i`, since before then it
/// has nothing promoted into it.
#[derive(Debug)]
pub struct HeatMap {
	/// Cache
	cache: TieredCache,

	/// Promotion engine
	promotion: PromotionEngine,

	/// Accuracy tracker
	tracker: AccuracyTracker,

	/// Finished intervals
	intervals: Vec<IntervalStatistics>,
}

impl HeatMap {
	/// Creates a heat map classifier
	///
	/// # Panics
	/// Panics if `geometry` is empty.
	#[must_use]
	pub fn new(geometry: Vec<TierGeometry>, selector: Box<dyn Selector>) -> Self {
		let tracker = AccuracyTracker::new(geometry.len());
		Self {
			cache: TieredCache::new(geometry),
			promotion: PromotionEngine::new(selector),
			tracker,
			intervals: vec![],
		}
	}

	/// Returns the number of tiers active during `iteration`
	#[must_use]
	pub fn active_tiers(&self, iteration: u64) -> usize {
		let tiers = self.cache.tiers();
		usize::try_from(iteration).map_or(tiers, |iteration| iteration.saturating_add(1).min(tiers))
	}

	/// Returns the cache
	#[must_use]
	pub fn cache(&self) -> &TieredCache {
		&self.cache
	}

	/// Returns the statistics
	#[must_use]
	pub fn statistics(&self) -> &AccuracyTracker {
		&self.tracker
	}

	/// Returns all finished intervals
	#[must_use]
	pub fn intervals(&self) -> &[IntervalStatistics] {
		&self.intervals
	}

	/// Returns the per-interval hit rate of `tier`, over all intervals where it was active.
	///
	/// Returns `None` if `tier` was never active, or had no lookups.
	#[must_use]
	pub fn hit_rate_summary(&self, tier: usize) -> Option<average::Variance> {
		let hit_rates = self
			.intervals
			.iter()
			.filter_map(|interval| interval.tiers.get(tier)?.hit_rate())
			.collect::<average::Variance>();

		match hit_rates.is_empty() {
			true => None,
			false => Some(hit_rates),
		}
	}
}

impl sim::Classifier for HeatMap {
	fn handle_access(&mut self, access: AccessEvent, iteration: u64) -> Result<(), anyhow::Error> {
		tracing::trace!(?access, iteration, "Received access");

		for tier in 0..self.active_tiers(iteration) {
			self.cache.record(tier, access.addr, &mut self.tracker);
		}

		Ok(())
	}

	fn finish_interval(&mut self, span: sim::IntervalSpan) -> Result<(), anyhow::Error> {
		let active_tiers = self.active_tiers(span.iteration);
		let tiers = self.tracker.interval()[..active_tiers].to_vec();
		for (tier, stats) in tiers.iter().enumerate() {
			tracing::debug!(
				iteration = span.iteration,
				tier,
				hits = stats.hits,
				misses = stats.misses,
				incremented = stats.incremented,
				saturated = stats.saturated,
				hit_rate = %fmt_percentage(stats.hit_rate()),
				"Interval statistics"
			);
		}

		self.intervals.push(IntervalStatistics { span, tiers });
		self.tracker.reset_interval();

		Ok(())
	}

	fn start_iteration(&mut self, iteration: u64) -> Result<(), anyhow::Error> {
		let promotions = self
			.promotion
			.cascade(&mut self.cache, iteration)
			.with_context(|| format!("Unable to cascade tiers for iteration {iteration}"))?;
		tracing::debug!(iteration, promoted_tiers = promotions.len(), "Cascaded tiers");

		Ok(())
	}

	fn fmt_debug(&mut self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
		// Note: Start with a newline, since we're a multi-line output
		f.pad("\n")?;

		for tier in 0..self.cache.tiers() {
			let bank = self.cache.bank(tier);
			let capacity = bank.capacity();
			let hot = bank.iter().filter(|&counter| counter > 0).count();
			let (min_counter, max_counter) = bank.iter().minmax().into_option().unwrap_or((0, 0));
			let regions = self.cache.region_map(tier).map_or(capacity, |map| map.len());
			let stats = self.tracker.total()[tier];

			writeln!(
				f,
				"Tier {tier}: {regions} regions, {hot} / {capacity} counters hot ({min_counter}..{max_counter}), hit rate \
				 {} over {} lookups",
				fmt_percentage(stats.hit_rate()),
				stats.lookups()
			)?;
		}

		writeln!(f, "Finished intervals: {}", self.intervals.len())?;

		Ok(())
	}
}

/// Statistics of a finished interval
#[derive(Clone, Debug)]
pub struct IntervalStatistics {
	/// Span
	pub span: sim::IntervalSpan,

	/// Statistics of each tier active during the interval
	pub tiers: Vec<TierStatistics>,
}
