//! Simulator

// Imports
use {
	crate::trace::AccessEvent,
	anyhow::Context,
	std::{
		fmt,
		time::{Duration, Instant},
	},
};

/// Simulator
#[derive(Debug)]
pub struct Simulator {
	/// Interval length, in seconds
	interval: f64,

	/// Iteration to stop at
	///
	/// Once an interval boundary brings the iteration up to this value,
	/// the run stops, without handling any more accesses.
	stop_after: Option<u64>,

	/// Debug output period
	///
	/// Interval in which to output debug output for the classifier
	debug_output_period: Duration,
}

impl Simulator {
	/// Creates a new simulator
	///
	/// # Panics
	/// Panics if `interval` isn't finite and positive.
	#[must_use]
	pub fn new(interval: f64, stop_after: Option<u64>, debug_output_period: Duration) -> Self {
		assert!(
			interval.is_finite() && interval > 0.0,
			"Interval must be finite and positive: {interval}"
		);

		Self {
			interval,
			stop_after,
			debug_output_period,
		}
	}

	/// Runs the simulator on all `accesses` with classifier `classifier`.
	///
	/// The first access starts the first interval, which lasts until an access at
	/// least `interval` seconds after its start. That access closes the interval,
	/// starts the next iteration, and is then handled as its first access.
	/// The last interval is finished once `accesses` is over, unless the run stopped early.
	pub fn run<C: Classifier>(
		&mut self,
		accesses: impl IntoIterator<Item = Result<AccessEvent, anyhow::Error>>,
		classifier: &mut C,
	) -> Result<RunOutput, anyhow::Error> {
		let mut last_debug_time = None::<Instant>;

		let mut iteration = 0;
		let mut cur_interval = None::<IntervalState>;
		let mut total_accesses = 0;
		let mut stopped_early = false;
		let mut time_span = None::<(f64, f64)>;
		for access_res in accesses {
			let access = access_res.context("Unable to read next access")?;

			// Check if we reached the end of the interval
			let interval = cur_interval.get_or_insert_with(|| IntervalState::new(access.time, self.interval));
			if access.time >= interval.pause_time {
				tracing::info!(iteration, time = access.time, "Reached end of interval");
				classifier
					.finish_interval(interval.span(iteration))
					.with_context(|| format!("Unable to finish interval of iteration {iteration}"))?;
				iteration += 1;

				if self.stop_after == Some(iteration) {
					tracing::info!(iteration, "Stopping early");
					stopped_early = true;
					break;
				}

				classifier
					.start_iteration(iteration)
					.with_context(|| format!("Unable to start iteration {iteration}"))?;
				*interval = IntervalState::new(access.time, self.interval);
			}
			interval.accesses += 1;
			interval.last_time = access.time;

			// TODO: We're assuming all accesses are ordered by time, warn when they aren't
			let first_time = time_span.map_or(access.time, |(first_time, _)| first_time);
			time_span = Some((first_time, access.time));
			total_accesses += 1;

			classifier
				.handle_access(access, iteration)
				.context("Unable to handle access with classifier")?;

			// Then show debug output, if it's been long enough
			let cur_time = Instant::now();
			if last_debug_time.map_or(true, |last| cur_time.duration_since(last) >= self.debug_output_period) {
				tracing::info!(
					"[{total_accesses} accesses, iteration {iteration}] Debug: {}",
					heatsim_util::DisplayWrapper::new(|f| classifier.fmt_debug(f))
				);
				last_debug_time = Some(cur_time);
			}
		}

		// Finish the last interval, if we didn't stop on a boundary
		if let Some(interval) = cur_interval.filter(|_| !stopped_early) {
			classifier
				.finish_interval(interval.span(iteration))
				.with_context(|| format!("Unable to finish last interval of iteration {iteration}"))?;
		}

		Ok(RunOutput {
			time_span,
			accesses: total_accesses,
			iterations: iteration,
			stopped_early,
		})
	}
}

/// Interval state
#[derive(Clone, Copy, Debug)]
struct IntervalState {
	/// Time the interval started
	start_time: f64,

	/// Time the interval ends
	pause_time: f64,

	/// Time of the last access
	last_time: f64,

	/// Accesses handled
	accesses: u64,
}

impl IntervalState {
	fn new(start_time: f64, interval: f64) -> Self {
		Self {
			start_time,
			pause_time: start_time + interval,
			last_time: start_time,
			accesses: 0,
		}
	}

	fn span(&self, iteration: u64) -> IntervalSpan {
		IntervalSpan {
			iteration,
			start_time: self.start_time,
			end_time: self.last_time,
			accesses: self.accesses,
		}
	}
}

/// Span of a finished interval
#[derive(PartialEq, Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct IntervalSpan {
	/// Iteration of the interval
	pub iteration: u64,

	/// Time of the first access
	pub start_time: f64,

	/// Time of the last access
	pub end_time: f64,

	/// Accesses handled
	pub accesses: u64,
}

/// Output for [`Simulator::run`]
#[derive(Clone, Debug)]
pub struct RunOutput {
	/// Time of the first and last accesses handled
	pub time_span: Option<(f64, f64)>,

	/// Accesses handled
	pub accesses: u64,

	/// Iteration the run ended on
	pub iterations: u64,

	/// Whether the run stopped early
	pub stopped_early: bool,
}

/// Classifier
pub trait Classifier {
	/// Handles an access, during iteration `iteration`
	fn handle_access(&mut self, access: AccessEvent, iteration: u64) -> Result<(), anyhow::Error>;

	/// Finishes an interval.
	///
	/// Called with every interval, including the last one, unless the run stopped early.
	fn finish_interval(&mut self, span: IntervalSpan) -> Result<(), anyhow::Error>;

	/// Starts a new iteration, after an interval is finished
	fn start_iteration(&mut self, iteration: u64) -> Result<(), anyhow::Error>;

	/// Formats debug output to `f`.
	fn fmt_debug(&mut self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error>;
}

#[cfg(test)]
mod tests {
	use super::*;

	/// Classifier that records every call
	#[derive(Default, Debug)]
	struct Recorder {
		calls: Vec<Call>,
	}

	#[derive(PartialEq, Debug)]
	enum Call {
		Access { addr: u64, iteration: u64 },
		Finish(IntervalSpan),
		Start(u64),
	}

	impl Classifier for Recorder {
		fn handle_access(&mut self, access: AccessEvent, iteration: u64) -> Result<(), anyhow::Error> {
			self.calls.push(Call::Access {
				addr: access.addr,
				iteration,
			});
			Ok(())
		}

		fn finish_interval(&mut self, span: IntervalSpan) -> Result<(), anyhow::Error> {
			self.calls.push(Call::Finish(span));
			Ok(())
		}

		fn start_iteration(&mut self, iteration: u64) -> Result<(), anyhow::Error> {
			self.calls.push(Call::Start(iteration));
			Ok(())
		}

		fn fmt_debug(&mut self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
			write!(f, "{} calls", self.calls.len())
		}
	}

	fn run(interval: f64, stop_after: Option<u64>, accesses: &[(f64, u64)]) -> (RunOutput, Vec<Call>) {
		let mut sim = Simulator::new(interval, stop_after, Duration::from_secs(3600));
		let mut recorder = Recorder::default();
		let output = sim
			.run(
				accesses.iter().map(|&(time, addr)| Ok(AccessEvent { time, addr })),
				&mut recorder,
			)
			.unwrap();
		(output, recorder.calls)
	}

	fn span(iteration: u64, start_time: f64, end_time: f64, accesses: u64) -> Call {
		Call::Finish(IntervalSpan {
			iteration,
			start_time,
			end_time,
			accesses,
		})
	}

	#[test]
	fn boundary_is_half_open() {
		let (output, calls) = run(1.0, None, &[(0.0, 1), (0.5, 2), (1.0, 3)]);
		assert_eq!(calls, [
			Call::Access { addr: 1, iteration: 0 },
			Call::Access { addr: 2, iteration: 0 },
			span(0, 0.0, 0.5, 2),
			Call::Start(1),
			Call::Access { addr: 3, iteration: 1 },
			span(1, 1.0, 1.0, 1),
		]);
		assert_eq!(output.iterations, 1);
		assert_eq!(output.accesses, 3);
		assert_eq!(output.time_span, Some((0.0, 1.0)));
		assert!(!output.stopped_early);
	}

	#[test]
	fn interval_is_reanchored_on_boundary_access() {
		// The boundary at `1.5` moves the next one to `2.5`, not `2.0`
		let (output, calls) = run(1.0, None, &[(0.0, 1), (1.5, 2), (2.2, 3), (2.5, 4)]);
		assert_eq!(output.iterations, 2);
		assert_eq!(calls[2..], [
			Call::Start(1),
			Call::Access { addr: 2, iteration: 1 },
			Call::Access { addr: 3, iteration: 1 },
			span(1, 1.5, 2.2, 2),
			Call::Start(2),
			Call::Access { addr: 4, iteration: 2 },
			span(2, 2.5, 2.5, 1),
		]);
	}

	#[test]
	fn gap_produces_single_boundary() {
		let (output, calls) = run(1.0, None, &[(0.0, 1), (10.0, 2)]);
		assert_eq!(output.iterations, 1);
		assert_eq!(calls.iter().filter(|call| matches!(call, Call::Start(_))).count(), 1);
	}

	#[test]
	fn first_access_starts_interval() {
		let (output, calls) = run(1.0, None, &[(100.0, 1), (100.9, 2)]);
		assert_eq!(output.iterations, 0);
		assert_eq!(calls.last(), Some(&span(0, 100.0, 100.9, 2)));
	}

	#[test]
	fn stop_after_skips_boundary_access() {
		let (output, calls) = run(1.0, Some(1), &[(0.0, 1), (1.0, 2), (1.5, 3)]);
		assert!(output.stopped_early);
		assert_eq!(output.accesses, 1);
		assert_eq!(calls, [Call::Access { addr: 1, iteration: 0 }, span(0, 0.0, 0.0, 1)]);
	}

	#[test]
	fn empty_run() {
		let (output, calls) = run(1.0, None, &[]);
		assert!(calls.is_empty());
		assert_eq!(output.time_span, None);
		assert_eq!(output.accesses, 0);
	}

	#[test]
	fn read_errors_are_fatal() {
		let mut sim = Simulator::new(1.0, None, Duration::from_secs(3600));
		let accesses = [
			Ok(AccessEvent { time: 0.0, addr: 0 }),
			Err(anyhow::anyhow!("Disk on fire")),
		];
		assert!(sim.run(accesses, &mut Recorder::default()).is_err());
	}

	#[test]
	#[should_panic = "Interval must be finite and positive"]
	fn zero_interval_panics() {
		let _ = Simulator::new(0.0, None, Duration::ZERO);
	}
}
