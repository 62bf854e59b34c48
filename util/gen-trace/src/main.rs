//! Generates a synthetic CSV trace with a hot set of regions.
//!
//! Each access either targets one of the hot regions, with probability
//! `--hot-probability`, or any address in the address space.

// Imports
use {
	anyhow::Context,
	clap::Parser,
	rand::{rngs::StdRng, Rng, SeedableRng},
	std::{
		fs,
		io::{self, Write},
		path::PathBuf,
	},
};

/// Arguments
#[derive(Debug)]
#[derive(clap::Parser)]
struct Args {
	/// Output file
	///
	/// If not specified, writes to stdout
	#[clap(long = "output")]
	output_file: Option<PathBuf>,

	/// Number of accesses
	#[clap(long = "accesses", default_value_t = 100_000)]
	accesses: u64,

	/// Address space width (in bits)
	#[clap(long = "address-bits", default_value_t = 32)]
	address_bits: u32,

	/// Hot region width (in bits)
	#[clap(long = "hot-region-bits", default_value_t = 12)]
	hot_region_bits: u32,

	/// Number of hot regions
	#[clap(long = "hot-regions", default_value_t = 16)]
	hot_regions: usize,

	/// Probability of each access targeting a hot region
	#[clap(long = "hot-probability", default_value_t = 0.9)]
	hot_probability: f64,

	/// Average time between accesses (in seconds)
	#[clap(long = "mean-gap", default_value_t = 1e-4)]
	mean_gap_secs: f64,

	/// Random seed
	#[clap(long = "seed")]
	seed: Option<u64>,
}

fn main() -> Result<(), anyhow::Error> {
	let args = Args::parse();
	anyhow::ensure!(
		(1..=63).contains(&args.address_bits),
		"Address space width must be within 1..=63 bits"
	);
	anyhow::ensure!(
		args.hot_region_bits <= args.address_bits,
		"Hot regions must fit in the address space"
	);
	anyhow::ensure!(
		(0.0..=1.0).contains(&args.hot_probability),
		"Hot probability must be within 0..=1"
	);
	anyhow::ensure!(
		args.mean_gap_secs.is_finite() && args.mean_gap_secs >= 0.0,
		"Mean gap must be finite and non-negative"
	);

	let mut rng = match args.seed {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_entropy(),
	};

	// Pick the hot regions
	let region_count = 1_u64 << (args.address_bits - args.hot_region_bits);
	let hot_regions = (0..args.hot_regions)
		.map(|_| rng.gen_range(0..region_count))
		.collect::<Vec<_>>();

	let output: Box<dyn Write> = match &args.output_file {
		Some(path) => Box::new(fs::File::create(path).context("Unable to create output file")?),
		None => Box::new(io::stdout().lock()),
	};
	let mut output = csv::Writer::from_writer(output);
	output
		.write_record(["time", "address"])
		.context("Unable to write header")?;

	let mut time = 0.0;
	for _ in 0..args.accesses {
		let addr = match hot_regions.is_empty() || !rng.gen_bool(args.hot_probability) {
			true => rng.gen_range(0..1_u64 << args.address_bits),
			false => {
				let region = hot_regions[rng.gen_range(0..hot_regions.len())];
				(region << args.hot_region_bits) | rng.gen_range(0..1_u64 << args.hot_region_bits)
			},
		};
		output
			.write_record([format!("{time:.9}"), format!("{addr:x}")])
			.context("Unable to write access")?;

		time += rng.gen_range(0.0..=2.0 * args.mean_gap_secs);
	}
	output.flush().context("Unable to flush output")?;

	Ok(())
}
