//! Saturating counters

/// Bank of saturating counters.
///
/// All counters share the same width, and stay within `0..=max`.
#[derive(Clone, Debug)]
pub struct CounterBank {
	/// Counters
	counters: Vec<u64>,

	/// Maximum value of each counter
	max: u64,
}

impl CounterBank {
	/// Creates a bank of `capacity` zeroed counters, each `counter_bits` wide.
	///
	/// # Panics
	/// Panics if `counter_bits` isn't within `1..=63`.
	#[must_use]
	pub fn new(capacity: usize, counter_bits: u32) -> Self {
		assert!(
			(1..u64::BITS).contains(&counter_bits),
			"Counter width must be within 1..=63 bits, found {counter_bits}"
		);

		Self {
			counters: vec![0; capacity],
			max:      (1 << counter_bits) - 1,
		}
	}

	/// Increments a counter, unless it's already at its maximum value.
	///
	/// # Panics
	/// Panics if `slot` is out of bounds.
	pub fn increment(&mut self, slot: usize) -> Increment {
		let counter = &mut self.counters[slot];
		match *counter < self.max {
			true => {
				*counter += 1;
				Increment::Incremented
			},
			false => Increment::Saturated,
		}
	}

	/// Returns the value of a counter
	///
	/// # Panics
	/// Panics if `slot` is out of bounds.
	#[must_use]
	pub fn read(&self, slot: usize) -> u64 {
		self.counters[slot]
	}

	/// Returns the maximum value of each counter
	#[must_use]
	pub fn max(&self) -> u64 {
		self.max
	}

	/// Returns the number of counters
	#[must_use]
	pub fn capacity(&self) -> usize {
		self.counters.len()
	}

	/// Returns all counters, by slot
	pub fn iter(&self) -> impl ExactSizeIterator<Item = u64> + '_ {
		self.counters.iter().copied()
	}

	/// Zeroes all counters
	pub fn clear(&mut self) {
		self.counters.fill(0);
	}
}

/// Result of [`CounterBank::increment`]
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Increment {
	/// Counter was incremented
	Incremented,

	/// Counter was already at its maximum value
	Saturated,
}

#[cfg(test)]
mod tests {
	use super::{CounterBank, Increment};

	#[test]
	fn saturates_at_max() {
		let mut bank = CounterBank::new(4, 2);
		assert_eq!(bank.max(), 3);

		for _ in 0..3 {
			assert_eq!(bank.increment(0), Increment::Incremented);
		}
		assert_eq!(bank.increment(0), Increment::Saturated);
		assert_eq!(bank.read(0), 3);
		assert_eq!(bank.increment(0), Increment::Saturated);
		assert_eq!(bank.read(0), 3);
	}

	#[test]
	fn counters_are_independent() {
		let mut bank = CounterBank::new(4, 3);
		bank.increment(1);
		bank.increment(1);
		bank.increment(3);

		assert_eq!(bank.iter().collect::<Vec<_>>(), [0, 2, 0, 1]);
	}

	#[test]
	fn never_exceeds_max_and_never_decreases() {
		let mut bank = CounterBank::new(3, 1);
		let mut prev = [0; 3];
		for step in 0..20 {
			let slot = step % 3;
			bank.increment(slot);

			let value = bank.read(slot);
			assert!(value <= bank.max());
			assert!(value >= prev[slot]);
			prev[slot] = value;
		}
	}

	#[test]
	fn widest_counter() {
		let mut bank = CounterBank::new(1, 63);
		assert_eq!(bank.max(), u64::MAX >> 1);
		assert_eq!(bank.increment(0), Increment::Incremented);
	}

	#[test]
	fn clear_zeroes() {
		let mut bank = CounterBank::new(2, 4);
		bank.increment(0);
		bank.increment(1);
		bank.clear();

		assert_eq!(bank.iter().collect::<Vec<_>>(), [0, 0]);
		assert_eq!(bank.capacity(), 2);
	}
}
