//! Tiered cache

// Imports
use {
	super::{
		counters::CounterBank,
		region_map::RegionMap,
		statistics::{AccuracyTracker, Outcome},
	},
	crate::geometry::TierGeometry,
};

/// Tiered cache.
///
/// Each tier has a bank of counters. The first tier covers the whole address space
/// directly, while every other tier only covers the regions in its region map.
#[derive(Clone, Debug)]
pub struct TieredCache {
	/// Geometry, by tier
	geometry: Vec<TierGeometry>,

	/// Counter banks, by tier
	banks: Vec<CounterBank>,

	/// Region maps, for every tier but the first
	maps: Vec<RegionMap>,
}

impl TieredCache {
	/// Creates an empty cache.
	///
	/// # Panics
	/// Panics if `geometry` is empty.
	#[must_use]
	pub fn new(geometry: Vec<TierGeometry>) -> Self {
		assert!(!geometry.is_empty(), "Tiered cache must have at least 1 tier");

		let banks = geometry
			.iter()
			.map(|tier| CounterBank::new(tier.capacity(), tier.counter_bits))
			.collect();
		let maps = geometry[1..]
			.iter()
			.map(|tier| RegionMap::new(tier.region_bits))
			.collect();

		Self { geometry, banks, maps }
	}

	/// Returns the number of tiers
	#[must_use]
	pub fn tiers(&self) -> usize {
		self.geometry.len()
	}

	/// Returns the geometry of all tiers
	#[must_use]
	pub fn geometry(&self) -> &[TierGeometry] {
		&self.geometry
	}

	/// Returns the counter bank of `tier`
	#[must_use]
	pub fn bank(&self, tier: usize) -> &CounterBank {
		&self.banks[tier]
	}

	/// Returns the region map of `tier`.
	///
	/// Returns `None` for the first tier, which has no region map.
	#[must_use]
	pub fn region_map(&self, tier: usize) -> Option<&RegionMap> {
		tier.checked_sub(1).map(|idx| &self.maps[idx])
	}

	/// Finds the counter slot of `addr` in `tier`.
	///
	/// For the first tier, the slot is `addr / region_size`, rounded up. Any
	/// slot past the end of the bank is treated as a miss.
	/// For other tiers, it's whichever slot the region containing `addr` is mapped to.
	#[must_use]
	pub fn find_slot(&self, tier: usize, addr: u64) -> Option<usize> {
		match self.region_map(tier) {
			Some(map) => map.find(addr),
			None => {
				let slot = addr.div_ceil(self.geometry[0].region_size());
				usize::try_from(slot)
					.ok()
					.filter(|&slot| slot < self.banks[0].capacity())
			},
		}
	}

	/// Records an access to `addr` in `tier`, incrementing its counter if tracked.
	///
	/// The outcome is also registered in `tracker`.
	pub fn record(&mut self, tier: usize, addr: u64, tracker: &mut AccuracyTracker) -> Outcome {
		let outcome = match self.find_slot(tier, addr) {
			Some(slot) => {
				let increment = self.banks[tier].increment(slot);
				tracing::trace!(
					tier,
					addr = format_args!("{addr:#x}"),
					slot,
					counter = self.banks[tier].read(slot),
					?increment,
					"Hit"
				);
				Outcome::Hit(increment)
			},
			None => {
				tracing::trace!(tier, addr = format_args!("{addr:#x}"), "Miss");
				Outcome::Miss
			},
		};

		tracker.register(tier, outcome);
		outcome
	}

	/// Replaces the region map of `tier` and zeroes its counters.
	///
	/// # Panics
	/// Panics if `tier` is the first tier, if `map` has a different region width than
	/// the tier, or if `map` maps any region to a slot outside of the tier's counter bank.
	pub fn replace_region_map(&mut self, tier: usize, map: RegionMap) {
		assert_ne!(tier, 0, "First tier has no region map");
		assert_eq!(
			map.region_bits(),
			self.geometry[tier].region_bits,
			"Region map width doesn't match tier"
		);
		let capacity = self.banks[tier].capacity();
		assert!(
			map.iter().all(|(_, slot)| slot < capacity),
			"Region map has slots outside of the counter bank"
		);

		self.maps[tier - 1] = map;
		self.banks[tier].clear();
	}

	/// Zeroes the counters of all tiers
	pub fn clear_counters(&mut self) {
		for bank in &mut self.banks {
			bank.clear();
		}
	}
}
