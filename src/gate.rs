//! Single-flight refresh gate with a pending-request queue.
//!
//! The gate decides whether a failed response is a recoverable access-token expiry
//! ([`RefreshGate::classify`]) and coordinates the refresh itself ([`RefreshGate::begin`]).
//! The first caller that observes expiry becomes the cycle's leader and performs the one
//! refresh call; every caller that observes expiry while that call is in flight receives a
//! [`Waiter`] and suspends until the leader settles the cycle. Settling drains the queue and
//! returns the gate to idle under one lock, so no waiter can be appended to a queue that has
//! already been released. Dropping an unsettled [`RefreshCycle`] releases its waiters with
//! [`RefreshError::Abandoned`].

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::mem;
// crates.io
use futures::channel::oneshot;
// self
use crate::{_prelude::*, error::RefreshError, http::ApiFailure, obs::GateOutcome};

/// Error-body sentinel sent by the backend when the access token expired.
pub const DEFAULT_EXPIRY_SENTINEL: &str = "TokenExpiredError";

type Outcome = Result<(), RefreshError>;

/// Typed discriminator for the expired-access-token signal.
///
/// The wire contract is a 401 response whose JSON body carries
/// `{"message": "<sentinel>"}`; every other 401 cause is an ordinary failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpirySignal(String);
impl ExpirySignal {
	/// Creates a signal matching `sentinel`.
	pub fn new(sentinel: impl Into<String>) -> Self {
		Self(sentinel.into())
	}

	/// Returns the sentinel string.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Returns `true` when `failure` is a 401 carrying the sentinel.
	pub fn matches(&self, failure: &ApiFailure) -> bool {
		failure.status == StatusCode::UNAUTHORIZED
			&& failure.message.as_deref() == Some(self.as_str())
	}
}
impl Default for ExpirySignal {
	fn default() -> Self {
		Self::new(DEFAULT_EXPIRY_SENTINEL)
	}
}

/// Gate decision for a failed response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
	/// Expired access token with a refresh token at hand: refresh, then replay.
	Refresh,
	/// Expired access token and nothing to refresh with: tear the session down.
	Logout,
	/// Anything else: surface the failure unchanged.
	PassThrough,
}

/// Facts about the failed request that the gate needs besides the response itself.
#[derive(Clone, Copy, Debug)]
pub struct FailureContext {
	/// The request targeted the refresh endpoint.
	pub refresh_endpoint: bool,
	/// The request was already routed through the refresh path once.
	pub retried: bool,
	/// The session currently holds a refresh token.
	pub has_refresh_token: bool,
}

/// Ordered queue of callers suspended on the in-flight refresh.
#[derive(Debug, Default)]
pub struct PendingQueue(Vec<oneshot::Sender<Outcome>>);
impl PendingQueue {
	/// Appends a waiter to the tail of the queue.
	pub fn enqueue(&mut self) -> Waiter {
		let (tx, rx) = oneshot::channel();

		self.0.push(tx);

		Waiter(rx)
	}

	/// Number of suspended callers.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when nobody is waiting.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Releases every waiter, in insertion order, with `outcome`.
	///
	/// Waiters whose callers have gone away are skipped.
	pub fn drain(self, outcome: Outcome) {
		for tx in self.0 {
			let _ = tx.send(outcome.clone());
		}
	}
}

/// Suspended caller awaiting the outcome of the in-flight refresh.
#[derive(Debug)]
pub struct Waiter(oneshot::Receiver<Outcome>);
impl Waiter {
	/// Waits for the leader to settle the cycle.
	pub async fn wait(self) -> Outcome {
		self.0.await.unwrap_or(Err(RefreshError::Abandoned))
	}
}

#[derive(Debug, Default)]
enum GateState {
	#[default]
	Idle,
	Refreshing(PendingQueue),
}

/// Role handed out by [`RefreshGate::begin`].
#[derive(Debug)]
pub enum Ticket<'a> {
	/// The caller must perform the refresh and settle the cycle.
	Leader(RefreshCycle<'a>),
	/// A refresh is already in flight; wait for it.
	Follower(Waiter),
}

/// Leader's handle on the current refresh cycle.
///
/// Exactly one cycle exists while the gate is refreshing. Settling consumes the handle;
/// dropping it unsettled releases the queue with [`RefreshError::Abandoned`].
#[derive(Debug)]
pub struct RefreshCycle<'a> {
	gate: &'a RefreshGate,
	settled: bool,
}
impl RefreshCycle<'_> {
	/// Releases every waiter to replay its request.
	pub fn resolve(mut self) {
		self.settled = true;
		self.gate.settle(Ok(()));
	}

	/// Releases every waiter with `err`.
	pub fn reject(mut self, err: RefreshError) {
		self.settled = true;
		self.gate.settle(Err(err));
	}
}
impl Drop for RefreshCycle<'_> {
	fn drop(&mut self) {
		if !self.settled {
			self.gate.settle(Err(RefreshError::Abandoned));
		}
	}
}

/// Single-flight coordinator shared by every clone of a client.
#[derive(Debug, Default)]
pub struct RefreshGate {
	state: Mutex<GateState>,
	metrics: RefreshMetrics,
}
impl RefreshGate {
	/// Decides what to do with a failed response.
	pub fn classify(signal: &ExpirySignal, failure: &ApiFailure, cx: FailureContext) -> Verdict {
		if !signal.matches(failure) || cx.refresh_endpoint {
			return Verdict::PassThrough;
		}
		if !cx.has_refresh_token {
			return Verdict::Logout;
		}
		if cx.retried {
			return Verdict::PassThrough;
		}

		Verdict::Refresh
	}

	/// Joins the current refresh cycle, or starts one if the gate is idle.
	pub fn begin(&self) -> Ticket<'_> {
		let mut state = self.state.lock();

		match &mut *state {
			GateState::Refreshing(queue) => {
				let waiter = queue.enqueue();

				drop(state);
				self.metrics.record(GateOutcome::Queued);

				Ticket::Follower(waiter)
			},
			GateState::Idle => {
				*state = GateState::Refreshing(PendingQueue::default());

				drop(state);
				self.metrics.record(GateOutcome::Attempt);

				Ticket::Leader(RefreshCycle { gate: self, settled: false })
			},
		}
	}

	/// Returns `true` while a refresh call is in flight.
	pub fn is_refreshing(&self) -> bool {
		matches!(*self.state.lock(), GateState::Refreshing(_))
	}

	/// Number of callers currently suspended on the in-flight refresh.
	pub fn pending(&self) -> usize {
		match &*self.state.lock() {
			GateState::Refreshing(queue) => queue.len(),
			GateState::Idle => 0,
		}
	}

	/// Counters describing past refresh cycles.
	pub fn metrics(&self) -> &RefreshMetrics {
		&self.metrics
	}

	fn settle(&self, outcome: Outcome) {
		let queue = match mem::take(&mut *self.state.lock()) {
			GateState::Refreshing(queue) => queue,
			GateState::Idle => PendingQueue::default(),
		};

		self.metrics.record(match outcome {
			Ok(()) => GateOutcome::Success,
			Err(_) => GateOutcome::Failure,
		});

		queue.drain(outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::http::ApiResponse;

	fn failure(status: StatusCode, body: &str) -> ApiFailure {
		ApiFailure::from_response(
			Method::GET,
			Url::parse("https://desk.example.com/api/cases").expect("URL fixture should parse."),
			ApiResponse::new(status, HeaderMap::new(), body),
		)
	}

	fn cx(refresh_endpoint: bool, retried: bool, has_refresh_token: bool) -> FailureContext {
		FailureContext { refresh_endpoint, retried, has_refresh_token }
	}

	#[test]
	fn classify_requires_status_and_sentinel() {
		let signal = ExpirySignal::default();
		let expired = failure(StatusCode::UNAUTHORIZED, r#"{"message":"TokenExpiredError"}"#);
		let bad_signature = failure(StatusCode::UNAUTHORIZED, r#"{"message":"InvalidSignature"}"#);
		let forbidden = failure(StatusCode::FORBIDDEN, r#"{"message":"TokenExpiredError"}"#);

		assert_eq!(
			RefreshGate::classify(&signal, &expired, cx(false, false, true)),
			Verdict::Refresh
		);
		assert_eq!(
			RefreshGate::classify(&signal, &bad_signature, cx(false, false, true)),
			Verdict::PassThrough
		);
		assert_eq!(
			RefreshGate::classify(&signal, &forbidden, cx(false, false, true)),
			Verdict::PassThrough
		);
	}

	#[test]
	fn classify_guards_against_recursion_and_missing_tokens() {
		let signal = ExpirySignal::default();
		let expired = failure(StatusCode::UNAUTHORIZED, r#"{"message":"TokenExpiredError"}"#);

		assert_eq!(
			RefreshGate::classify(&signal, &expired, cx(true, false, true)),
			Verdict::PassThrough
		);
		assert_eq!(
			RefreshGate::classify(&signal, &expired, cx(false, true, true)),
			Verdict::PassThrough
		);
		assert_eq!(
			RefreshGate::classify(&signal, &expired, cx(false, false, false)),
			Verdict::Logout
		);
		assert_eq!(
			RefreshGate::classify(&signal, &expired, cx(true, false, false)),
			Verdict::PassThrough
		);
	}

	#[test]
	fn custom_sentinels_replace_the_default() {
		let signal = ExpirySignal::new("jwt_expired");
		let expired = failure(StatusCode::UNAUTHORIZED, r#"{"message":"jwt_expired"}"#);
		let legacy = failure(StatusCode::UNAUTHORIZED, r#"{"message":"TokenExpiredError"}"#);

		assert!(signal.matches(&expired));
		assert!(!signal.matches(&legacy));
	}

	#[tokio::test]
	async fn second_caller_follows_the_leader() {
		let gate = RefreshGate::default();
		let Ticket::Leader(cycle) = gate.begin() else {
			panic!("The first caller should lead the refresh.");
		};
		let waiters = (0..3)
			.map(|_| match gate.begin() {
				Ticket::Follower(waiter) => waiter,
				Ticket::Leader(_) => panic!("Only one leader may exist per cycle."),
			})
			.collect::<Vec<_>>();

		assert!(gate.is_refreshing());
		assert_eq!(gate.pending(), 3);

		cycle.resolve();

		assert!(!gate.is_refreshing());
		assert_eq!(gate.pending(), 0);

		for waiter in waiters {
			assert!(waiter.wait().await.is_ok());
		}

		assert_eq!(gate.metrics().attempts(), 1);
		assert_eq!(gate.metrics().queued(), 3);
		assert_eq!(gate.metrics().successes(), 1);
	}

	#[tokio::test]
	async fn rejection_reaches_every_waiter() {
		let gate = RefreshGate::default();
		let Ticket::Leader(cycle) = gate.begin() else {
			panic!("The first caller should lead the refresh.");
		};
		let Ticket::Follower(first) = gate.begin() else {
			panic!("The second caller should follow.");
		};
		let Ticket::Follower(second) = gate.begin() else {
			panic!("The third caller should follow.");
		};

		cycle.reject(RefreshError::Rejected { status: 403, message: None });

		for waiter in [first, second] {
			let err = waiter.wait().await.expect_err("Waiters should observe the refresh failure.");

			assert!(matches!(err, RefreshError::Rejected { status: 403, .. }));
		}

		assert_eq!(gate.metrics().failures(), 1);
	}

	#[tokio::test]
	async fn dropping_the_cycle_abandons_waiters_and_reopens_the_gate() {
		let gate = RefreshGate::default();
		let Ticket::Leader(cycle) = gate.begin() else {
			panic!("The first caller should lead the refresh.");
		};
		let Ticket::Follower(waiter) = gate.begin() else {
			panic!("The second caller should follow.");
		};

		drop(cycle);

		assert!(matches!(waiter.wait().await, Err(RefreshError::Abandoned)));
		assert!(matches!(gate.begin(), Ticket::Leader(_)));
	}

	#[tokio::test]
	async fn drain_skips_departed_waiters() {
		let mut queue = PendingQueue::default();
		let departed = queue.enqueue();
		let remaining = queue.enqueue();

		drop(departed);

		assert_eq!(queue.len(), 2);

		queue.drain(Ok(()));

		assert!(remaining.wait().await.is_ok());
	}
}
