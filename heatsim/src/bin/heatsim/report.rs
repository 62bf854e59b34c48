//! Reporting

// Imports
use {
	heatsim::{
		classifiers::heatmap::{HeatMap, IntervalStatistics, TierStatistics},
		sim::RunOutput,
		TierGeometry,
	},
	heatsim_util::{fmt_percentage, ByteSize},
	std::io,
};

/// Writes the geometry of every tier
pub fn write_geometry(w: &mut impl io::Write, geometry: &[TierGeometry]) -> Result<(), io::Error> {
	for (tier, tier_geometry) in geometry.iter().enumerate() {
		writeln!(
			w,
			"L{}: {} of data in {} regions of {}, {}-bit counters ({})",
			tier + 1,
			ByteSize(tier_geometry.total_data_size()),
			tier_geometry.capacity(),
			ByteSize(tier_geometry.region_size()),
			tier_geometry.counter_bits,
			ByteSize(tier_geometry.cache_size_bytes()),
		)?;
		if tier != 0 {
			writeln!(
				w,
				"    Region map: {}-bit region ids, {}-bit slots",
				tier_geometry.region_id_bits(),
				tier_geometry.slot_bits(),
			)?;
		}
	}

	Ok(())
}

/// Writes the statistics of an interval
pub fn write_interval(w: &mut impl io::Write, interval: &IntervalStatistics) -> Result<(), io::Error> {
	let span = &interval.span;
	writeln!(
		w,
		"Iteration {} ({:.6}s..{:.6}s, {} accesses)",
		span.iteration, span.start_time, span.end_time, span.accesses
	)?;
	write_tiers(w, &interval.tiers)
}

/// Writes the cumulative statistics of a run
pub fn write_totals(
	w: &mut impl io::Write,
	heatmap: &HeatMap,
	output: &RunOutput,
	skipped_rows: u64,
) -> Result<(), io::Error> {
	writeln!(
		w,
		"Total ({} accesses over {} intervals, {skipped_rows} rows skipped{})",
		output.accesses,
		heatmap.intervals().len(),
		match output.stopped_early {
			true => ", stopped early",
			false => "",
		}
	)?;
	write_tiers(w, heatmap.statistics().total())?;

	for tier in 0..heatmap.cache().tiers() {
		match heatmap.hit_rate_summary(tier) {
			Some(hit_rates) => writeln!(
				w,
				"L{} interval hit rate: {:.2}% ± {:.2}% over {} intervals",
				tier + 1,
				100.0 * hit_rates.mean(),
				100.0 * hit_rates.error(),
				hit_rates.len()
			)?,
			None => writeln!(w, "L{} interval hit rate: n/a", tier + 1)?,
		}
	}

	Ok(())
}

/// Writes a table with the statistics of each tier
fn write_tiers(w: &mut impl io::Write, tiers: &[TierStatistics]) -> Result<(), io::Error> {
	writeln!(
		w,
		"{:>6} {:>12} {:>9} {:>12} {:>9} {:>12} {:>9} {:>12} {:>9}",
		"Tier", "Hits", "Hit%", "Misses", "Miss%", "Incremented", "Inc%", "Saturated", "Sat%"
	)?;
	for (tier, stats) in tiers.iter().enumerate() {
		writeln!(
			w,
			"{:>6} {:>12} {:>9} {:>12} {:>9} {:>12} {:>9} {:>12} {:>9}",
			format!("L{}", tier + 1),
			stats.hits,
			fmt_percentage(stats.hit_rate()).to_string(),
			stats.misses,
			fmt_percentage(stats.miss_rate()).to_string(),
			stats.incremented,
			fmt_percentage(stats.increment_rate()).to_string(),
			stats.saturated,
			fmt_percentage(stats.saturation_rate()).to_string(),
		)?;
	}

	Ok(())
}
