//! Tier geometry
//!
//! Each tier is configured by a string `"data_bits,region_bits,counter_bits"`.
//! For the first tier, `data_bits` is the width of the whole address space, and
//! is shared by all tiers. For the others, it's the amount of address space the tier
//! covers once promoted, which determines how many coarser regions it's built from.

// Imports
use std::num::ParseIntError;

/// Maximum counter width, in bits.
///
/// Counters are stored as `u64`s, and the maximum value must be representable.
pub const MAX_COUNTER_BITS: u32 = 63;

/// Maximum address space width, in bits
pub const MAX_ADDRESS_BITS: u32 = 63;

/// Maximum number of bits to index a tier's counters.
///
/// Limits each counter bank to `2^32` counters.
pub const MAX_SLOT_BITS: u32 = 32;

/// Geometry error
#[derive(PartialEq, Eq, Clone, Debug, thiserror::Error)]
pub enum GeometryError {
	#[error("No tiers were configured")]
	NoTiers,

	#[error("Tier {tier}: Expected 3 comma-separated fields (address_bits,region_bits,counter_bits), found {found}")]
	FieldCount { tier: usize, found: usize },

	#[error("Tier {tier}: Unable to parse {field} {value:?}")]
	InvalidField {
		tier:   usize,
		field:  &'static str,
		value:  String,
		#[source]
		source: ParseIntError,
	},

	#[error("Tier {tier}: Counter width must be within 1..={max} bits, found {counter_bits}", max = MAX_COUNTER_BITS)]
	CounterBits { tier: usize, counter_bits: u32 },

	#[error("Address space width must be at most {max} bits, found {address_bits}", max = MAX_ADDRESS_BITS)]
	AddressBits { address_bits: u32 },

	#[error("Tier {tier}: Region ({region_bits} bits) is larger than the tier's data ({data_bits} bits)")]
	RegionLargerThanData {
		tier:        usize,
		region_bits: u32,
		data_bits:   u32,
	},

	#[error("Tier {tier}: Data ({data_bits} bits) is larger than the address space ({address_bits} bits)")]
	DataLargerThanAddressSpace {
		tier:         usize,
		data_bits:    u32,
		address_bits: u32,
	},

	#[error("Tier {tier}: Region ({region_bits} bits) must not be larger than the previous tier's ({prev_region_bits} bits)")]
	RegionNotFiner {
		tier:             usize,
		region_bits:      u32,
		prev_region_bits: u32,
	},

	#[error("Tier {tier}: Data ({data_bits} bits) is smaller than a single region of the previous tier ({prev_region_bits} bits)")]
	DataSmallerThanPrevRegion {
		tier:             usize,
		data_bits:        u32,
		prev_region_bits: u32,
	},

	#[error("Tier {tier}: Too many counters (2^{slot_bits}), at most 2^{max} are supported", max = MAX_SLOT_BITS)]
	TooManySlots { tier: usize, slot_bits: u32 },
}

/// Tier specification, as configured
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct TierSpec {
	pub data_bits:    u32,
	pub region_bits:  u32,
	pub counter_bits: u32,
}

impl TierSpec {
	/// Parses a tier specification `"data_bits,region_bits,counter_bits"` for tier `tier`.
	pub fn parse(tier: usize, s: &str) -> Result<Self, GeometryError> {
		let fields = s.split(',').map(str::trim).collect::<Vec<_>>();
		let &[data_bits, region_bits, counter_bits] = fields.as_slice() else {
			return Err(GeometryError::FieldCount {
				tier,
				found: fields.len(),
			});
		};

		let parse_field = |field: &'static str, value: &str| {
			value.parse::<u32>().map_err(|source| GeometryError::InvalidField {
				tier,
				field,
				value: value.to_owned(),
				source,
			})
		};

		Ok(Self {
			data_bits:    parse_field("address_bits", data_bits)?,
			region_bits:  parse_field("region_bits", region_bits)?,
			counter_bits: parse_field("counter_bits", counter_bits)?,
		})
	}
}

/// Geometry of a single tier.
///
/// Derived once from all [`TierSpec`]s by [`TierGeometry::derive_all`], which
/// guarantees `region_bits <= data_bits <= address_bits` and a valid counter width.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct TierGeometry {
	/// Address space width, shared by all tiers
	pub address_bits: u32,

	/// Width of the data this tier covers
	pub data_bits: u32,

	/// Width of each region
	pub region_bits: u32,

	/// Width of each counter
	pub counter_bits: u32,
}

impl TierGeometry {
	/// Derives and validates the geometry of all tiers, from coarsest to finest.
	pub fn derive_all(specs: &[TierSpec]) -> Result<Vec<Self>, GeometryError> {
		let first = specs.first().ok_or(GeometryError::NoTiers)?;
		let address_bits = first.data_bits;
		if address_bits > MAX_ADDRESS_BITS {
			return Err(GeometryError::AddressBits { address_bits });
		}

		let mut tiers = Vec::<Self>::with_capacity(specs.len());
		for (tier, spec) in specs.iter().enumerate() {
			if !(1..=MAX_COUNTER_BITS).contains(&spec.counter_bits) {
				return Err(GeometryError::CounterBits {
					tier,
					counter_bits: spec.counter_bits,
				});
			}
			if spec.data_bits > address_bits {
				return Err(GeometryError::DataLargerThanAddressSpace {
					tier,
					data_bits: spec.data_bits,
					address_bits,
				});
			}
			if spec.region_bits > spec.data_bits {
				return Err(GeometryError::RegionLargerThanData {
					tier,
					region_bits: spec.region_bits,
					data_bits: spec.data_bits,
				});
			}
			if let Some(prev) = tiers.last() {
				if spec.region_bits > prev.region_bits {
					return Err(GeometryError::RegionNotFiner {
						tier,
						region_bits: spec.region_bits,
						prev_region_bits: prev.region_bits,
					});
				}
				if spec.data_bits < prev.region_bits {
					return Err(GeometryError::DataSmallerThanPrevRegion {
						tier,
						data_bits: spec.data_bits,
						prev_region_bits: prev.region_bits,
					});
				}
			}

			let slot_bits = spec.data_bits - spec.region_bits;
			if slot_bits > MAX_SLOT_BITS || slot_bits >= usize::BITS {
				return Err(GeometryError::TooManySlots { tier, slot_bits });
			}

			tiers.push(Self {
				address_bits,
				data_bits: spec.data_bits,
				region_bits: spec.region_bits,
				counter_bits: spec.counter_bits,
			});
		}

		Ok(tiers)
	}

	/// Returns the size of the data this tier covers
	#[must_use]
	pub fn total_data_size(&self) -> u64 {
		1 << self.data_bits
	}

	/// Returns the size of each region
	#[must_use]
	pub fn region_size(&self) -> u64 {
		1 << self.region_bits
	}

	/// Returns the number of bits needed to index a counter
	#[must_use]
	pub fn slot_bits(&self) -> u32 {
		self.data_bits - self.region_bits
	}

	/// Returns the number of counters in this tier
	#[must_use]
	pub fn capacity(&self) -> usize {
		1 << self.slot_bits()
	}

	/// Returns the number of bits of a region id, after shifting out the region offset
	#[must_use]
	pub fn region_id_bits(&self) -> u32 {
		self.address_bits - self.region_bits
	}

	/// Returns the maximum value of a counter
	#[must_use]
	pub fn counter_max(&self) -> u64 {
		(1 << self.counter_bits) - 1
	}

	/// Returns the size of all counters of this tier, in bytes
	#[must_use]
	pub fn cache_size_bytes(&self) -> u64 {
		self.capacity() as u64 * u64::from(self.counter_bits) / 8
	}

	/// Returns the number of regions of `source` this tier is built from.
	///
	/// `source` must be the previous (coarser) tier.
	#[must_use]
	pub fn fan_in(&self, source: &Self) -> usize {
		1 << (self.data_bits - source.region_bits)
	}

	/// Returns how many of this tier's regions fit in a region of `source`.
	///
	/// `source` must be the previous (coarser) tier.
	#[must_use]
	pub fn sub_regions(&self, source: &Self) -> u64 {
		1 << (source.region_bits - self.region_bits)
	}
}
