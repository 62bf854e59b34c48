//! Promotion
//!
//! At the end of each interval, finer tiers are rebuilt over the hottest
//! regions of the tier before them.

// Imports
use {
	super::{
		cache::TieredCache,
		region_map::{RegionId, RegionMap},
	},
	anyhow::Context,
	itertools::Either,
	std::{cmp::Reverse, collections::BinaryHeap},
};

/// Candidate region for promotion
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Candidate {
	/// Counter value
	pub counter: u64,

	/// First address of the region
	pub region_start: u64,
}

/// Hot region selector
pub trait Selector: std::fmt::Debug + Send {
	/// Selects (at most) `count` of the hottest `candidates`.
	///
	/// `counter_max` is the maximum value any candidate's counter may have.
	/// The order of the returned candidates determines the slots they're assigned.
	fn select(&self, candidates: &mut dyn Iterator<Item = Candidate>, count: usize, counter_max: u64) -> Vec<Candidate>;
}

/// Selects by replacing the first selected candidate that's colder than each new one.
///
/// Isn't guaranteed to select the hottest candidates, since a candidate may replace one
/// that's hotter than another selected one.
/// On ties, the candidate selected first is kept. Replacements take the position of the
/// candidate they replace.
#[derive(Clone, Copy, Default, Debug)]
pub struct FirstSmaller;

impl Selector for FirstSmaller {
	fn select(&self, candidates: &mut dyn Iterator<Item = Candidate>, count: usize, counter_max: u64) -> Vec<Candidate> {
		let mut selected = Vec::<Candidate>::with_capacity(count);
		if count == 0 {
			return selected;
		}

		for candidate in candidates {
			match selected.len() < count {
				true => selected.push(candidate),
				false =>
					if let Some(entry) = selected.iter_mut().find(|entry| entry.counter < candidate.counter) {
						tracing::trace!(old = ?entry, new = ?candidate, "Replacing selected region");
						*entry = candidate;
					},
			}

			// If all selected are saturated, nothing else can replace them
			if selected.len() == count && selected.iter().all(|entry| entry.counter == counter_max) {
				tracing::trace!("All selected regions are saturated, stopping early");
				break;
			}
		}

		selected
	}
}

/// Selects exactly the hottest candidates.
///
/// On ties, the candidates found first are kept. Returns them in the order they were found.
#[derive(Clone, Copy, Default, Debug)]
pub struct ExactTopK;

impl Selector for ExactTopK {
	fn select(&self, candidates: &mut dyn Iterator<Item = Candidate>, count: usize, counter_max: u64) -> Vec<Candidate> {
		if count == 0 {
			return vec![];
		}

		// Note: The heap's top is the coldest selected candidate, and, among those,
		//       the one found last, so it's the first to be replaced.
		let mut heap = BinaryHeap::<Reverse<(u64, Reverse<usize>, u64)>>::with_capacity(count);
		for (idx, candidate) in candidates.enumerate() {
			let entry = Reverse((candidate.counter, Reverse(idx), candidate.region_start));
			match heap.len() < count {
				true => heap.push(entry),
				false =>
					if let Some(mut coldest) = heap.peek_mut() {
						if coldest.0 .0 < candidate.counter {
							*coldest = entry;
						}
					},
			}

			if heap.len() == count && heap.peek().is_some_and(|coldest| coldest.0 .0 == counter_max) {
				break;
			}
		}

		let mut selected = heap.into_vec();
		selected.sort_unstable_by_key(|Reverse((_, Reverse(idx), _))| *idx);
		selected
			.into_iter()
			.map(|Reverse((counter, _, region_start))| Candidate { counter, region_start })
			.collect()
	}
}

/// Selector kind
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SelectorKind {
	/// Replaces the first colder selected region with each new one
	#[default]
	FirstSmaller,

	/// Selects exactly the hottest regions
	Exact,
}

impl SelectorKind {
	/// Creates the selector of this kind
	#[must_use]
	pub fn selector(self) -> Box<dyn Selector> {
		match self {
			Self::FirstSmaller => Box::new(FirstSmaller),
			Self::Exact => Box::new(ExactTopK),
		}
	}
}

/// Promotion engine
#[derive(Debug)]
pub struct PromotionEngine {
	/// Selector
	selector: Box<dyn Selector>,
}

impl PromotionEngine {
	/// Creates a new promotion engine
	#[must_use]
	pub fn new(selector: Box<dyn Selector>) -> Self {
		Self { selector }
	}

	/// Rebuilds tier `dst` over the hottest regions of tier `dst - 1`.
	///
	/// The hottest `fan_in` regions are selected, and each is split into regions of `dst`,
	/// which are assigned consecutive slots, starting at 0. The counters of `dst` are zeroed.
	///
	/// # Panics
	/// Panics if `dst` is the first tier or out of bounds.
	pub fn promote(&self, cache: &mut TieredCache, dst: usize) -> Result<Promotion, anyhow::Error> {
		assert!(dst >= 1 && dst < cache.tiers(), "Invalid destination tier: {dst}");
		let src = dst - 1;
		let src_geometry = cache.geometry()[src];
		let dst_geometry = cache.geometry()[dst];
		let fan_in = dst_geometry.fan_in(&src_geometry);

		// Select the hottest regions of the source tier
		let selected = {
			let bank = cache.bank(src);
			let mut candidates = match cache.region_map(src) {
				// Note: The first tier is scanned by slot, every slot corresponding to a region
				None => Either::Left(bank.iter().enumerate().map(|(slot, counter)| Candidate {
					counter,
					region_start: slot as u64 * src_geometry.region_size(),
				})),
				Some(map) => Either::Right(map.iter().map(|(region, slot)| Candidate {
					counter:      bank.read(slot),
					region_start: region.start_addr(src_geometry.region_bits),
				})),
			};

			self.selector.select(&mut candidates, fan_in, bank.max())
		};

		// Then map each of their sub-regions to a fresh slot
		let sub_regions = dst_geometry.sub_regions(&src_geometry);
		let mut map = RegionMap::new(dst_geometry.region_bits);
		let mut slot = 0;
		for candidate in &selected {
			let first_region = RegionId::containing(candidate.region_start, dst_geometry.region_bits);
			for offset in 0..sub_regions {
				let region = RegionId::new(first_region.to_u64() + offset);
				map.insert(region, slot)
					.with_context(|| format!("Unable to map sub-region of {candidate:?}"))?;
				tracing::trace!(tier = dst, ?region, slot, "Mapped region");
				slot += 1;
			}
		}

		let promotion = Promotion {
			tier: dst,
			fan_in,
			selected,
			regions: map.len(),
		};
		cache.replace_region_map(dst, map);

		Ok(promotion)
	}

	/// Cascades all tiers active at `iteration`.
	///
	/// Tier `i` is active once `iteration >= i`. Tiers are rebuilt from the finest to
	/// the coarsest, so each tier is built from the previous tier's state during the
	/// last interval. Afterwards, the counters of all tiers are zeroed.
	pub fn cascade(&self, cache: &mut TieredCache, iteration: u64) -> Result<Vec<Promotion>, anyhow::Error> {
		let finest = usize::try_from(iteration)
			.unwrap_or(usize::MAX)
			.min(cache.tiers() - 1);

		let promotions = (1..=finest)
			.rev()
			.map(|dst| {
				let promotion = self
					.promote(cache, dst)
					.with_context(|| format!("Unable to promote tier {dst}"))?;
				tracing::debug!(
					iteration,
					tier = dst,
					fan_in = promotion.fan_in,
					selected = promotion.selected.len(),
					regions = promotion.regions,
					"Promoted tier"
				);
				Ok(promotion)
			})
			.collect::<Result<Vec<_>, anyhow::Error>>()?;

		cache.clear_counters();
		Ok(promotions)
	}
}

impl Default for PromotionEngine {
	fn default() -> Self {
		Self::new(SelectorKind::default().selector())
	}
}

/// Result of [`PromotionEngine::promote`]
#[derive(Clone, Debug)]
pub struct Promotion {
	/// Tier rebuilt
	pub tier: usize,

	/// Maximum number of regions selected
	pub fan_in: usize,

	/// Regions selected from the previous tier
	pub selected: Vec<Candidate>,

	/// Number of regions now mapped in the tier
	pub regions: usize,
}
