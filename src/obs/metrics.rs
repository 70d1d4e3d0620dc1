// self
use crate::obs::GateOutcome;

/// Records a gate outcome via the global metrics recorder (when enabled).
pub fn record_gate_outcome(outcome: GateOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("session_client_refresh_total", "outcome" => outcome.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}
