//! Region map

// Imports
use std::collections::{btree_map, BTreeMap};

/// Region map.
///
/// Maps regions of the address space to the slot of the counter tracking them.
/// Regions are identified by their address shifted right by the region width.
#[derive(Clone, Debug)]
pub struct RegionMap {
	/// Slots, by region id
	// Note: Ordered, since promotion scans regions in this order
	slots: BTreeMap<RegionId, usize>,

	/// Region width
	region_bits: u32,
}

impl RegionMap {
	/// Creates an empty region map for regions `region_bits` wide
	#[must_use]
	pub fn new(region_bits: u32) -> Self {
		Self {
			slots: BTreeMap::new(),
			region_bits,
		}
	}

	/// Returns the region width
	#[must_use]
	pub fn region_bits(&self) -> u32 {
		self.region_bits
	}

	/// Returns the region id containing `addr`
	#[must_use]
	pub fn region_of(&self, addr: u64) -> RegionId {
		RegionId::containing(addr, self.region_bits)
	}

	/// Returns the slot of the region containing `addr`, if mapped
	#[must_use]
	pub fn find(&self, addr: u64) -> Option<usize> {
		self.get(self.region_of(addr))
	}

	/// Returns the slot of a region, if mapped
	#[must_use]
	pub fn get(&self, region: RegionId) -> Option<usize> {
		self.slots.get(&region).copied()
	}

	/// Maps a region to a slot.
	///
	/// # Errors
	/// Returns an error if the region was already mapped.
	pub fn insert(&mut self, region: RegionId, slot: usize) -> Result<(), anyhow::Error> {
		match self.slots.entry(region) {
			btree_map::Entry::Vacant(entry) => {
				entry.insert(slot);
				Ok(())
			},
			btree_map::Entry::Occupied(entry) => {
				anyhow::bail!("Region {region:?} was already mapped to slot {}", entry.get())
			},
		}
	}

	/// Returns all mappings, ordered by region
	pub fn iter(&self) -> impl ExactSizeIterator<Item = (RegionId, usize)> + '_ {
		self.slots.iter().map(|(&region, &slot)| (region, slot))
	}

	/// Returns the number of mapped regions
	#[must_use]
	pub fn len(&self) -> usize {
		self.slots.len()
	}

	/// Returns if no regions are mapped
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}

	/// Removes all mappings
	pub fn clear(&mut self) {
		self.slots.clear();
	}
}

/// Region id.
///
/// An address with the region offset shifted out.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct RegionId(u64);

impl std::fmt::Debug for RegionId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("RegionId")
			.field(&format_args!("{:#x}", self.0))
			.finish()
	}
}

impl RegionId {
	/// Creates a region id from its raw value
	#[must_use]
	pub fn new(id: u64) -> Self {
		Self(id)
	}

	/// Returns the id of the `region_bits`-wide region containing `addr`
	#[must_use]
	pub fn containing(addr: u64, region_bits: u32) -> Self {
		Self(addr >> region_bits)
	}

	/// Returns the first address of this region, if it's `region_bits` wide
	#[must_use]
	pub fn start_addr(self, region_bits: u32) -> u64 {
		self.0 << region_bits
	}

	/// Returns the region id as a `u64`
	#[must_use]
	pub fn to_u64(self) -> u64 {
		self.0
	}
}

#[cfg(test)]
mod tests {
	use super::{RegionId, RegionMap};

	#[test]
	fn missing_region_is_none() {
		let map = RegionMap::new(2);
		assert!(map.is_empty());
		assert_eq!(map.find(0x40), None);
	}

	#[test]
	fn find_shifts_address() {
		let mut map = RegionMap::new(4);
		map.insert(RegionId::new(0x3), 7).unwrap();

		assert_eq!(map.find(0x30), Some(7));
		assert_eq!(map.find(0x3f), Some(7));
		assert_eq!(map.find(0x40), None);
		assert_eq!(map.find(0x2f), None);
	}

	#[test]
	fn duplicate_insert_fails() {
		let mut map = RegionMap::new(0);
		map.insert(RegionId::new(1), 0).unwrap();
		assert!(map.insert(RegionId::new(1), 1).is_err());
		assert_eq!(map.get(RegionId::new(1)), Some(0));
	}

	#[test]
	fn iterates_by_region() {
		let mut map = RegionMap::new(1);
		map.insert(RegionId::new(9), 0).unwrap();
		map.insert(RegionId::new(2), 1).unwrap();
		map.insert(RegionId::new(5), 2).unwrap();

		let regions = map.iter().map(|(region, _)| region.to_u64()).collect::<Vec<_>>();
		assert_eq!(regions, [2, 5, 9]);

		map.clear();
		assert_eq!(map.len(), 0);
	}

	#[test]
	fn region_start_round_trips() {
		let region = RegionId::containing(0x1234, 8);
		assert_eq!(region.to_u64(), 0x12);
		assert_eq!(region.start_addr(8), 0x1200);
	}
}
