//! Utilities

// Modules
pub mod logger;
pub mod size;

// Exports
pub use size::ByteSize;

// Imports
use std::{cell::RefCell, fmt};

/// Extension trait for `u64` counters to compute their share of a pair
#[extend::ext(name = RatioOfSum)]
pub impl u64 {
	/// Returns `self / (self + other)`.
	///
	/// Returns `None` if both are zero, since the ratio is undefined.
	fn ratio_of_sum(self, other: u64) -> Option<f64> {
		let total = self as f64 + other as f64;
		match total == 0.0 {
			true => None,
			false => Some(self as f64 / total),
		}
	}
}

/// [`fmt::Display`] helper to display using a `FnMut(&mut fmt::Formatter)`
pub struct DisplayWrapper<F: FnMut(&mut fmt::Formatter) -> fmt::Result>(RefCell<F>);

impl<F: FnMut(&mut fmt::Formatter) -> fmt::Result> DisplayWrapper<F> {
	/// Creates a new display wrapper
	#[must_use]
	pub const fn new(func: F) -> Self {
		Self(RefCell::new(func))
	}
}

impl<F: FnMut(&mut fmt::Formatter) -> fmt::Result> fmt::Display for DisplayWrapper<F> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		// Note: `f` cannot be re-entrant, so this cannot fail
		self.0.borrow_mut()(f)
	}
}

/// Formats an optional ratio as a percentage, or `n/a` if undefined
pub fn fmt_percentage(ratio: Option<f64>) -> impl fmt::Display {
	DisplayWrapper::new(move |f| match ratio {
		Some(ratio) => write!(f, "{:.2}%", 100.0 * ratio),
		None => f.pad("n/a"),
	})
}
