//! Byte sizes

// Imports
use std::fmt;

/// Size in bytes, displayed in the largest fitting decimal unit
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug)]
pub struct ByteSize(pub u64);

impl ByteSize {
	/// Units, with the power of two a size must exceed to be displayed in them
	const UNITS: [(u32, u64, &'static str); 4] = [
		(39, 1_000_000_000_000, "TB"),
		(29, 1_000_000_000, "GB"),
		(19, 1_000_000, "MB"),
		(9, 1_000, "KB"),
	];
}

impl fmt::Display for ByteSize {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let bytes = self.0;
		match Self::UNITS.iter().find(|&&(pow, ..)| bytes > 1 << pow) {
			// Note: Truncates, since this is only meant for a quick glance.
			Some(&(_, div, unit)) => write!(f, "{} {unit}", bytes / div),
			None => write!(f, "{bytes} B"),
		}
	}
}
