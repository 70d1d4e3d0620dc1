// self
use crate::{
	_prelude::*,
	obs::{GateOutcome, Phase},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// A span builder used by client calls.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the provided phase + method.
	pub fn new(phase: Phase, method: &Method) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"session_client.http",
				phase = phase.as_str(),
				method = method.as_str()
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (phase, method);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a gate decision event for `url` (when tracing is enabled).
pub fn trace_gate(outcome: GateOutcome, url: &Url) {
	#[cfg(feature = "tracing")]
	{
		match outcome {
			GateOutcome::Failure | GateOutcome::Logout =>
				tracing::warn!(outcome = outcome.as_str(), url = url.as_str(), "refresh gate"),
			_ => tracing::debug!(outcome = outcome.as_str(), url = url.as_str(), "refresh gate"),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (outcome, url);
	}
}
