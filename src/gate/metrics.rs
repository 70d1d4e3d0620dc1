// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::obs::{self, GateOutcome};

/// Thread-safe counters for refresh cycles.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	attempts: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
	queued: AtomicU64,
	logouts: AtomicU64,
}
impl RefreshMetrics {
	/// Returns the number of refresh calls issued.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of cycles that rotated the credentials.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of cycles that failed or were abandoned.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	/// Returns the number of callers that waited on another caller's refresh.
	pub fn queued(&self) -> u64 {
		self.queued.load(Ordering::Relaxed)
	}

	/// Returns the number of sessions torn down by the gate.
	pub fn logouts(&self) -> u64 {
		self.logouts.load(Ordering::Relaxed)
	}

	pub(crate) fn record(&self, outcome: GateOutcome) {
		let counter = match outcome {
			GateOutcome::Attempt => &self.attempts,
			GateOutcome::Success => &self.success,
			GateOutcome::Failure => &self.failure,
			GateOutcome::Queued => &self.queued,
			GateOutcome::Logout => &self.logouts,
		};

		counter.fetch_add(1, Ordering::Relaxed);
		obs::record_gate_outcome(outcome);
	}
}
