//! Full replays over in-memory traces

// Imports
use {
	heatsim::{
		classifiers::heatmap::{SelectorKind, TierStatistics},
		data::RunData,
		sim::RunOutput,
		Config,
		HeatMap,
		Simulator,
		TierSpec,
		TraceReader,
	},
};

/// Result of a replay
struct Replay {
	heatmap:      HeatMap,
	output:       RunOutput,
	skipped_rows: u64,
}

fn config(tiers: &[&str], interval_secs: f64, stop_after: Option<u64>) -> Config {
	Config {
		tiers: tiers
			.iter()
			.enumerate()
			.map(|(tier, s)| TierSpec::parse(tier, s).expect("Invalid tier"))
			.collect(),
		interval_secs,
		stop_after,
		selector: SelectorKind::FirstSmaller,
		debug_output_period_secs: 3600.0,
	}
}

fn replay(config: &Config, trace: &str) -> Replay {
	let geometry = config.validate().expect("Invalid config");
	let debug_output_period = config.debug_output_period().expect("Invalid debug output period");
	let mut sim = Simulator::new(config.interval_secs, config.stop_after, debug_output_period);
	let mut heatmap = HeatMap::new(geometry, config.selector.selector());
	let mut reader = TraceReader::new(trace.as_bytes());
	let output = sim
		.run(std::iter::from_fn(|| reader.read_next().transpose()), &mut heatmap)
		.expect("Unable to run simulator");

	Replay {
		heatmap,
		output,
		skipped_rows: reader.skipped_rows(),
	}
}

/// Builds a trace with a header, from `(time, address)` pairs
fn trace(accesses: &[(f64, u64)]) -> String {
	let mut trace = "time,address\n".to_owned();
	for (time, addr) in accesses {
		trace += &format!("{time},{addr:x}\n");
	}
	trace
}

#[test]
fn counter_saturates() {
	let config = config(&["8,2,2", "8,1,2", "8,0,2"], 1.0, None);
	let replay = replay(&config, &trace(&[(0.0, 0x00), (0.1, 0x00), (0.2, 0x00), (0.3, 0x00)]));

	assert_eq!(replay.heatmap.cache().bank(0).read(0), 3);
	assert_eq!(replay.heatmap.statistics().total()[0], TierStatistics {
		hits:        4,
		misses:      0,
		incremented: 3,
		saturated:   1,
	});
}

#[test]
fn distinct_regions_get_distinct_counters() {
	let config = config(&["8,2,2", "8,1,2", "8,0,2"], 1.0, None);
	let replay = replay(&config, &trace(&[(0.0, 0x00), (0.1, 0x04)]));

	let bank = replay.heatmap.cache().bank(0);
	assert_eq!((bank.read(0), bank.read(1)), (1, 1));
	assert_eq!(bank.iter().sum::<u64>(), 2);
	assert_eq!(replay.heatmap.statistics().total()[0].saturated, 0);
}

#[test]
fn first_cascade_splits_hottest_regions() {
	// Tier 1 covers 64 tier-0 regions, each split in 2
	let config = config(&["8,2,2", "8,1,2", "8,0,2"], 1.0, None);
	let replay = replay(&config, &trace(&[(0.0, 0x10), (0.5, 0x20), (1.0, 0x10)]));

	assert_eq!(replay.output.iterations, 1);
	let map = replay.heatmap.cache().region_map(1).expect("Tier 1 has no region map");
	assert_eq!(map.len(), 64 * 2);
	assert_eq!(replay.heatmap.statistics().total()[1].hits, 1);
}

#[test]
fn promoted_regions_hit_and_others_miss() {
	// Tier 1 covers 4 tier-0 regions, each split in 2
	let config = config(&["8,2,2", "4,1,2", "2,0,2"], 1.0, None);
	let accesses = [
		(0.0, 0x40),
		(0.1, 0x40),
		(0.2, 0x80),
		(0.3, 0x80),
		(0.4, 0xc0),
		(0.5, 0xc0),
		(0.6, 0x20),
		(0.7, 0x20),
		(1.0, 0x40),
		(1.1, 0x41),
		(1.2, 0x3f),
		(1.3, 0x30),
	];
	let replay = replay(&config, &trace(&accesses));

	let interval = &replay.heatmap.intervals()[1];
	assert_eq!(interval.tiers.len(), 2);
	assert_eq!(interval.tiers[1], TierStatistics {
		hits:        2,
		misses:      2,
		incremented: 2,
		saturated:   0,
	});
}

#[test]
fn malformed_row_does_not_abort() {
	let config = config(&["8,2,2", "8,1,2", "8,0,2"], 1.0, None);
	let replay = replay(&config, "time,address\n0.0,10\nbad,row\n0.1,20\n");

	assert_eq!(replay.skipped_rows, 1);
	assert_eq!(replay.output.accesses, 2);
	assert_eq!(replay.heatmap.statistics().total()[0].hits, 2);
}

#[test]
fn quoted_trace_is_read() {
	let config = config(&["8,2,2", "8,1,2", "8,0,2"], 1.0, None);
	let replay = replay(&config, "\"time\",\"address\"\n\"0.1\",\"10\"\n0.2,\"20\"\n");

	assert_eq!(replay.skipped_rows, 0);
	assert_eq!(replay.output.accesses, 2);
	assert_eq!(replay.output.time_span, Some((0.1, 0.2)));
	assert_eq!(replay.heatmap.statistics().total()[0].hits, 2);
}

#[test]
fn tiers_activate_one_interval_at_a_time() {
	let config = config(&["8,2,2", "8,1,2", "8,0,2"], 1.0, None);
	let accesses = [(0.0, 0x10), (0.5, 0x10), (1.0, 0x10), (1.5, 0x10), (2.0, 0x10), (2.5, 0x10)];
	let replay = replay(&config, &trace(&accesses));

	let lookups = replay
		.heatmap
		.intervals()
		.iter()
		.map(|interval| interval.tiers.iter().map(TierStatistics::lookups).collect::<Vec<_>>())
		.collect::<Vec<_>>();
	assert_eq!(lookups, [vec![2], vec![2, 2], vec![2, 2, 2]]);
}

#[test]
fn finest_tier_unused_before_second_cascade() {
	let config = config(&["8,2,2", "8,1,2", "8,0,2"], 1.0, None);
	let replay = replay(&config, &trace(&[(0.0, 0x10), (1.0, 0x10), (1.5, 0x11)]));

	let total = replay.heatmap.statistics().total();
	assert_eq!(total[2].lookups(), 0);
	assert_eq!(total[1].lookups(), 2);
	assert!(replay.heatmap.cache().region_map(2).expect("Tier 2 has no region map").is_empty());
}

#[test]
fn intervals_sum_to_totals() {
	let config = config(&["8,2,2", "6,1,2", "4,0,3"], 0.25, None);
	let accesses = (0..200_u64)
		.map(|idx| (idx as f64 * 0.01, (idx * 37 % 11) * 8 + idx % 3))
		.collect::<Vec<_>>();
	let replay = replay(&config, &trace(&accesses));
	assert!(replay.heatmap.intervals().len() > 3);

	let mut sums = vec![TierStatistics::default(); 3];
	for interval in replay.heatmap.intervals() {
		for (sum, &stats) in sums.iter_mut().zip(&interval.tiers) {
			*sum += stats;
		}
	}
	assert_eq!(sums, replay.heatmap.statistics().total());

	let accesses = replay.heatmap.intervals().iter().map(|interval| interval.span.accesses).sum::<u64>();
	assert_eq!(accesses, 200);
}

#[test]
fn stop_after_ends_run_on_boundary() {
	let config = config(&["8,2,2", "8,1,2", "8,0,2"], 1.0, Some(2));
	let accesses = [(0.0, 0x10), (1.0, 0x10), (2.0, 0x10), (3.0, 0x10)];
	let replay = replay(&config, &trace(&accesses));

	assert!(replay.output.stopped_early);
	assert_eq!(replay.output.accesses, 2);
	assert_eq!(replay.heatmap.intervals().len(), 2);
	assert_eq!(replay.heatmap.statistics().total()[2].lookups(), 0);
}

#[test]
fn selectors_agree_without_contention() {
	// With fewer hot regions than the fan-in, both selectors pick all of them
	let accesses = [(0.0, 0x10), (0.1, 0x10), (0.2, 0x80), (1.0, 0x10), (1.1, 0x80), (1.2, 0x81)];
	let hits = [SelectorKind::FirstSmaller, SelectorKind::Exact].map(|selector| {
		let config = Config {
			selector,
			..config(&["8,2,2", "4,1,2", "2,0,2"], 1.0, None)
		};
		replay(&config, &trace(&accesses)).heatmap.statistics().total()[1].hits
	});
	assert_eq!(hits, [3, 3]);
}

#[test]
fn independent_runs_are_isolated() {
	let config = config(&["8,2,2", "6,1,2", "4,0,3"], 0.5, None);
	let accesses = (0..100_u64)
		.map(|idx| (idx as f64 * 0.02, (idx * 13) % 256))
		.collect::<Vec<_>>();
	let trace = trace(&accesses);

	let totals = std::thread::scope(|s| {
		let handles = [s.spawn(|| replay(&config, &trace)), s.spawn(|| replay(&config, &trace))];
		handles.map(|handle| handle.join().expect("Replay panicked").heatmap.statistics().total().to_vec())
	});
	assert_eq!(totals[0], totals[1]);
}

#[test]
fn run_data_serializes() {
	let config = config(&["8,2,2", "8,1,2", "8,0,2"], 1.0, None);
	let replay = replay(&config, &trace(&[(0.0, 0x10), (1.0, 0x10)]));
	let data = RunData::new(config, &replay.heatmap, &replay.output, replay.skipped_rows);

	assert_eq!(data.intervals.len(), 2);
	assert_eq!(data.totals.len(), 3);
	assert_eq!(data.totals[0].increment_rate, Some(1.0));
	assert_eq!(data.totals[2].hit_rate, None);
	assert_eq!(data.totals[2].increment_rate, None);
	assert_eq!(data.summary[0].as_ref().map(|summary| summary.intervals), Some(2));

	let json = serde_json::to_value(&data).expect("Unable to serialize run data");
	assert_eq!(json["accesses"], 2);
	assert_eq!(json["intervals"][1]["span"]["iteration"], 1);
	assert!(json["totals"][2]["hit_rate"].is_null());
	assert_eq!(json["totals"][0]["increment_rate"], 1.0);
}
