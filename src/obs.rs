//! Optional observability helpers for the client and its refresh gate.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit spans named `session_client.http` with the `phase` (request,
//!   refresh, replay) and `method` fields, plus debug/warn events for gate decisions.
//! - Enable `metrics` to increment the `session_client_refresh_total` counter for every gate
//!   outcome, labeled by `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Client phases observed by spans.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
	/// First dispatch of a caller's request.
	Request,
	/// The leader's call to the refresh endpoint.
	Refresh,
	/// Re-dispatch after a settled refresh.
	Replay,
}
impl Phase {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Phase::Request => "request",
			Phase::Refresh => "refresh",
			Phase::Replay => "replay",
		}
	}
}
impl Display for Phase {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded by the refresh gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GateOutcome {
	/// A refresh call was started.
	Attempt,
	/// The refresh rotated the credentials.
	Success,
	/// The refresh failed or was abandoned.
	Failure,
	/// A caller joined an in-flight refresh.
	Queued,
	/// The gate tore the session down.
	Logout,
}
impl GateOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			GateOutcome::Attempt => "attempt",
			GateOutcome::Success => "success",
			GateOutcome::Failure => "failure",
			GateOutcome::Queued => "queued",
			GateOutcome::Logout => "logout",
		}
	}
}
impl Display for GateOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
