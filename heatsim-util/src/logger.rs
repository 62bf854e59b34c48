//! Logger
//!
//! Logs to stderr, filtered by `RUST_LOG`, and optionally to a file,
//! filtered by `RUST_LOG_FILE`.

// Imports
use {
	std::{fs, path::Path, sync::Mutex},
	tracing::metadata::LevelFilter,
	tracing_subscriber::{prelude::*, EnvFilter},
};

/// Logging before the logger is initialized.
///
/// Messages are buffered and emitted once [`init`] is called.
pub mod pre_init {
	// Imports
	use std::sync::Mutex;

	/// Buffered messages
	static MESSAGES: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());

	/// Message level
	#[derive(Clone, Copy, Debug)]
	pub(super) enum Level {
		Debug,
		Warn,
	}

	/// Buffers a debug message
	pub fn debug(msg: impl Into<String>) {
		self::push(Level::Debug, msg.into());
	}

	/// Buffers a warning message
	pub fn warn(msg: impl Into<String>) {
		self::push(Level::Warn, msg.into());
	}

	fn push(level: Level, msg: String) {
		// Note: If poisoned, there's nothing useful to do but keep the messages.
		let mut messages = MESSAGES.lock().unwrap_or_else(|err| err.into_inner());
		messages.push((level, msg));
	}

	/// Takes all buffered messages
	pub(super) fn take() -> Vec<(Level, String)> {
		let mut messages = MESSAGES.lock().unwrap_or_else(|err| err.into_inner());
		std::mem::take(&mut *messages)
	}
}

/// Initializes the logger.
///
/// `stderr_default` is the level used for stderr when `RUST_LOG` isn't set.
/// If `log_file` is passed, also logs to it, by default at the debug level.
///
/// Failing to open the log file or install the logger isn't fatal, it's reported to stderr instead.
pub fn init(log_file: Option<&Path>, log_file_append: bool, stderr_default: LevelFilter) {
	let stderr_filter = EnvFilter::builder()
		.with_default_directive(stderr_default.into())
		.from_env_lossy();
	let stderr_layer = tracing_subscriber::fmt::layer()
		.with_writer(std::io::stderr)
		.with_filter(stderr_filter);

	let file_layer = log_file.and_then(|path| {
		let file = fs::OpenOptions::new()
			.create(true)
			.write(true)
			.append(log_file_append)
			.truncate(!log_file_append)
			.open(path);

		match file {
			Ok(file) => {
				let file_filter = EnvFilter::builder()
					.with_env_var("RUST_LOG_FILE")
					.with_default_directive(LevelFilter::DEBUG.into())
					.from_env_lossy();
				let layer = tracing_subscriber::fmt::layer()
					.with_ansi(false)
					.with_writer(Mutex::new(file))
					.with_filter(file_filter);
				Some(layer)
			},
			Err(err) => {
				eprintln!("Unable to open log file {path:?}: {err}");
				None
			},
		}
	});

	if let Err(err) = tracing_subscriber::registry()
		.with(stderr_layer)
		.with(file_layer)
		.try_init()
	{
		eprintln!("Unable to initialize logger: {err}");
	}

	// Finally emit everything logged before we were initialized
	for (level, msg) in pre_init::take() {
		match level {
			pre_init::Level::Debug => tracing::debug!("{msg}"),
			pre_init::Level::Warn => tracing::warn!("{msg}"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::pre_init;

	#[test]
	fn pre_init_messages_are_taken_once() {
		pre_init::debug("first");
		pre_init::warn(String::from("second"));

		let messages = pre_init::take();
		assert!(messages.iter().any(|(_, msg)| msg == "first"));
		assert!(messages.iter().any(|(_, msg)| msg == "second"));
		assert!(pre_init::take().iter().all(|(_, msg)| msg != "first"));
	}
}
