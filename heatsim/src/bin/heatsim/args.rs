//! Arguments

// Imports
use {heatsim::classifiers::heatmap::SelectorKind, std::path::PathBuf};

/// Arguments
#[derive(Debug)]
#[derive(clap::Parser)]
#[clap(about = "Simulates tracking access heat in a hierarchy of saturating counters")]
pub struct Args {
	/// Log file
	///
	/// Specifies a file to perform verbose logging to.
	/// You can use `RUST_LOG_FILE` to set filtering options
	#[clap(long = "log-file")]
	pub log_file: Option<PathBuf>,

	/// Whether to append to the log file
	#[clap(long = "log-file-append")]
	pub log_file_append: bool,

	/// First tier geometry, `address_bits,region_bits,counter_bits`
	#[clap(long = "L1")]
	pub l1: String,

	/// Second tier geometry, `data_bits,region_bits,counter_bits`
	#[clap(long = "L2")]
	pub l2: String,

	/// Third tier geometry, `data_bits,region_bits,counter_bits`
	#[clap(long = "L3")]
	pub l3: String,

	/// Trace file
	///
	/// CSV with a header, followed by `time,address` rows, with
	/// `time` in seconds and `address` in hexadecimal
	#[clap(long = "dataset")]
	pub dataset: PathBuf,

	/// Interval between cascades (in seconds)
	#[clap(long = "interval")]
	pub interval: f64,

	/// Prints the geometry of each tier before running
	#[clap(long = "verbose")]
	pub verbose: bool,

	/// Logs every access and promotion to stderr
	///
	/// Overridden by `RUST_LOG`
	#[clap(long = "debug")]
	pub debug: bool,

	/// Stops once this iteration is reached
	#[clap(long = "stop-after")]
	pub stop_after: Option<u64>,

	/// Hot region selector
	#[clap(long = "selection", value_enum, default_value_t)]
	pub selection: SelectorKind,

	/// Output file
	///
	/// Writes the run data as JSON
	#[clap(long = "output")]
	pub output_file: Option<PathBuf>,

	/// Debug output period (in seconds)
	#[clap(long = "debug-output-period", default_value_t = 1.0)]
	pub debug_output_period_secs: f64,
}
