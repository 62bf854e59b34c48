//! Trace parsing.
//!
//! Traces are CSV files with a header, followed by one access per row:
//! `time,address[,...]`, where `time` is in seconds and `address` is in hexadecimal.

// Imports
use {
	anyhow::Context,
	std::{
		fmt,
		io,
		num::{ParseFloatError, ParseIntError},
		str::Utf8Error,
	},
};

/// Trace reader.
///
/// Malformed rows are skipped, rather than failing the whole trace.
#[derive(Debug)]
pub struct TraceReader<R> {
	/// Reader
	reader: csv::Reader<R>,

	/// Current row
	record: csv::ByteRecord,

	/// Rows skipped
	skipped_rows: u64,
}

impl<R: io::Read> TraceReader<R> {
	/// Creates a trace reader
	pub fn new(reader: R) -> Self {
		let reader = csv::ReaderBuilder::new()
			.has_headers(true)
			.flexible(true)
			.trim(csv::Trim::All)
			.from_reader(reader);

		Self {
			reader,
			record: csv::ByteRecord::new(),
			skipped_rows: 0,
		}
	}

	/// Reads the next access.
	///
	/// Returns `Ok(None)` once the trace is over.
	///
	/// # Errors
	/// Returns an error if unable to read from the underlying reader.
	pub fn read_next(&mut self) -> Result<Option<AccessEvent>, anyhow::Error> {
		loop {
			match self.reader.read_byte_record(&mut self.record) {
				Ok(true) => (),
				Ok(false) => return Ok(None),
				Err(err) => match err.is_io_error() {
					true => return Err(err).context("Unable to read trace row"),
					false => {
						self.skip_row(err.position().map(csv::Position::line), &err);
						continue;
					},
				},
			}

			match AccessEvent::from_record(&self.record) {
				Ok(access) => return Ok(Some(access)),
				Err(err) => {
					let line = self.record.position().map(csv::Position::line);
					self.skip_row(line, &err);
				},
			}
		}
	}

	/// Returns the number of malformed rows skipped so far
	pub fn skipped_rows(&self) -> u64 {
		self.skipped_rows
	}

	fn skip_row(&mut self, line: Option<u64>, err: &dyn fmt::Display) {
		tracing::warn!(?line, %err, "Skipping malformed trace row");
		self.skipped_rows += 1;
	}
}

/// Access event
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct AccessEvent {
	/// Timestamp, in seconds
	pub time: f64,

	/// Address
	pub addr: u64,
}

impl AccessEvent {
	/// Parses an access from a trace row.
	///
	/// Only the first two fields are used, any others are ignored.
	pub fn from_record(record: &csv::ByteRecord) -> Result<Self, RowError> {
		let time = record.get(0).unwrap_or_default();
		let addr = record.get(1).ok_or(RowError::MissingAddress)?;

		let time = std::str::from_utf8(time).map_err(RowError::Utf8)?.trim();
		let time = time.parse::<f64>().map_err(|source| RowError::Time {
			value: time.to_owned(),
			source,
		})?;
		if !time.is_finite() {
			return Err(RowError::NonFiniteTime { time });
		}

		let addr = std::str::from_utf8(addr).map_err(RowError::Utf8)?.trim();
		let addr_digits = addr
			.strip_prefix("0x")
			.or_else(|| addr.strip_prefix("0X"))
			.unwrap_or(addr);
		let addr = u64::from_str_radix(addr_digits, 16).map_err(|source| RowError::Address {
			value: addr.to_owned(),
			source,
		})?;

		Ok(Self { time, addr })
	}
}

/// Row error
#[derive(PartialEq, Clone, Debug, thiserror::Error)]
pub enum RowError {
	#[error("Field isn't valid UTF-8")]
	Utf8(#[source] Utf8Error),

	#[error("Missing address field")]
	MissingAddress,

	#[error("Unable to parse time {value:?}")]
	Time {
		value:  String,
		#[source]
		source: ParseFloatError,
	},

	#[error("Time must be finite, found {time}")]
	NonFiniteTime { time: f64 },

	#[error("Unable to parse hexadecimal address {value:?}")]
	Address {
		value:  String,
		#[source]
		source: ParseIntError,
	},
}
