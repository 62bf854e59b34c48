//! Hierarchical heat map simulator (`heatsim`)

// Modules
mod args;
mod report;

// Imports
use {
	self::args::Args,
	anyhow::Context,
	clap::Parser,
	heatsim::{data, Config, HeatMap, Simulator, TierSpec, TraceReader},
	heatsim_util::logger,
	std::{
		fs,
		io::{self, Write},
	},
	tracing::metadata::LevelFilter,
};

fn main() -> Result<(), anyhow::Error> {
	// Get arguments
	let args = Args::parse();
	logger::pre_init::debug(format!("Args: {args:?}"));

	// Initialize logging
	let stderr_level = match args.debug {
		true => LevelFilter::TRACE,
		false => LevelFilter::INFO,
	};
	logger::init(args.log_file.as_deref(), args.log_file_append, stderr_level);

	// Build and validate the config
	let tiers = [&args.l1, &args.l2, &args.l3]
		.into_iter()
		.enumerate()
		.map(|(tier, spec)| TierSpec::parse(tier, spec))
		.collect::<Result<Vec<_>, _>>()
		.context("Unable to parse tier geometry")?;
	let config = Config {
		tiers,
		interval_secs: args.interval,
		stop_after: args.stop_after,
		selector: args.selection,
		debug_output_period_secs: args.debug_output_period_secs,
	};
	let geometry = config.validate().context("Invalid configuration")?;
	tracing::debug!(?config, ?geometry, "Validated configuration");

	let stdout = io::stdout();
	let mut stdout = stdout.lock();
	if args.verbose {
		report::write_geometry(&mut stdout, &geometry).context("Unable to write geometry")?;
	}

	// Open the trace file
	let trace_file = fs::File::open(&args.dataset)
		.with_context(|| format!("Unable to open trace file {:?}", args.dataset))?;
	let mut trace_reader = TraceReader::new(trace_file);

	// Run the simulator
	let debug_output_period = config.debug_output_period()?;
	let mut sim = Simulator::new(config.interval_secs, config.stop_after, debug_output_period);
	let mut heatmap = HeatMap::new(geometry, config.selector.selector());
	let output = sim
		.run(
			std::iter::from_fn(|| trace_reader.read_next().transpose()),
			&mut heatmap,
		)
		.context("Unable to run simulator")?;
	let skipped_rows = trace_reader.skipped_rows();
	if skipped_rows != 0 {
		tracing::warn!(skipped_rows, "Skipped malformed trace rows");
	}

	// Report
	for interval in heatmap.intervals() {
		report::write_interval(&mut stdout, interval).context("Unable to write interval")?;
	}
	report::write_totals(&mut stdout, &heatmap, &output, skipped_rows).context("Unable to write totals")?;
	stdout.flush().context("Unable to flush stdout")?;

	if let Some(output_path) = &args.output_file {
		let data = data::RunData::new(config, &heatmap, &output, skipped_rows);
		let output_file = fs::File::create(output_path).context("Unable to create output file")?;
		let mut output_file = io::BufWriter::new(output_file);
		serde_json::to_writer(&mut output_file, &data).context("Unable to write to output file")?;
		output_file.flush().context("Unable to flush output file")?;
	}

	Ok(())
}
