//! Authenticated API client: bearer injection, expiry detection, refresh-then-replay.
//!
//! [`ApiClient::send`] dispatches a request with the session's access token attached. When
//! the response is a 401 carrying the expiry sentinel, the client joins the shared
//! [`RefreshGate`]: the first such caller refreshes the credentials while later callers
//! queue, and once the cycle settles every caller replays its own request with the new
//! token. A request is routed through the refresh path at most once; if the refresh fails,
//! the session is logged out and every caller of the cycle receives the refresh error.

mod refresh;

// self
use crate::{
	_prelude::*,
	config::ClientConfig,
	error::{ConfigError, RefreshError},
	gate::{FailureContext, RefreshGate, RefreshMetrics, Ticket, Verdict},
	http::{ApiFailure, ApiRequest, ApiResponse, HttpTransport, PreparedRequest},
	obs::{self, CallSpan, GateOutcome, Phase},
	session::SessionStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = ApiClient<ReqwestTransport>;

/// HTTP client that keeps a session's access token fresh.
///
/// Clones share the transport, the session store, and the refresh gate, so concurrent
/// requests issued through any clone take part in the same single-flight refresh.
pub struct ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport used for every outbound request, the refresh call included.
	pub transport: Arc<T>,
	/// Injected session store that owns the credentials.
	pub session: Arc<dyn SessionStore>,
	/// Validated client configuration.
	pub config: Arc<ClientConfig>,
	gate: Arc<RefreshGate>,
}
impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client that reuses the caller-provided transport.
	pub fn with_transport(
		config: ClientConfig,
		session: Arc<dyn SessionStore>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			transport: transport.into(),
			session,
			config: Arc::new(config),
			gate: Default::default(),
		}
	}

	/// Sends `request`, transparently refreshing an expired access token.
	pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse> {
		let mut phase = Phase::Request;

		loop {
			let span = CallSpan::new(phase, request.method());
			let failure = match span.instrument(self.dispatch(&request)).await {
				Err(Error::Status(failure)) => failure,
				other => return other,
			};

			match self.verdict(&request, &failure) {
				Verdict::PassThrough => return Err(Error::Status(failure)),
				Verdict::Logout => {
					self.force_logout(&failure.url);

					return Err(Error::Status(failure));
				},
				Verdict::Refresh => {
					request.mark_retry();
					self.await_refresh(&failure.url).await?;

					phase = Phase::Replay;
				},
			}
		}
	}

	/// Attaches the session's bearer credential unless the request opted out.
	///
	/// Overwrites any previous `Authorization` value, so applying it twice with an unchanged
	/// session yields the same header.
	pub fn authorize(
		&self,
		request: &ApiRequest,
		prepared: &mut PreparedRequest,
	) -> Result<(), ConfigError> {
		if !request.authorizes() {
			return Ok(());
		}

		if let Some(token) = self.session.access_token() {
			let value = HeaderValue::from_str(&token.bearer()).map_err(|_| {
				ConfigError::InvalidHeader { name: ::http::header::AUTHORIZATION.to_string() }
			})?;

			prepared.headers.insert(::http::header::AUTHORIZATION, value);
		}

		Ok(())
	}

	/// Returns `true` while a refresh call is in flight.
	pub fn is_refreshing(&self) -> bool {
		self.gate.is_refreshing()
	}

	/// Counters describing past refresh cycles.
	pub fn refresh_metrics(&self) -> &RefreshMetrics {
		self.gate.metrics()
	}

	async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse> {
		let mut prepared = request.prepare(&self.config)?;

		self.authorize(request, &mut prepared)?;

		let method = prepared.method.clone();
		let url = prepared.url.clone();
		let response = self.transport.execute(prepared).await?;

		if response.is_success() {
			Ok(response)
		} else {
			Err(ApiFailure::from_response(method, url, response).into())
		}
	}

	fn verdict(&self, request: &ApiRequest, failure: &ApiFailure) -> Verdict {
		let cx = FailureContext {
			refresh_endpoint: self.config.is_refresh_endpoint(&failure.url),
			retried: request.is_retry(),
			has_refresh_token: self.session.refresh_token().is_some(),
		};

		RefreshGate::classify(&self.config.expiry_signal, failure, cx)
	}

	/// Waits for the current refresh cycle, leading it if nobody else is.
	async fn await_refresh(&self, url: &Url) -> Result<(), RefreshError> {
		match self.gate.begin() {
			Ticket::Follower(waiter) => {
				obs::trace_gate(GateOutcome::Queued, url);

				waiter.wait().await
			},
			Ticket::Leader(cycle) => {
				obs::trace_gate(GateOutcome::Attempt, url);

				match self.refresh_tokens().await {
					Ok(pair) => {
						self.session.set_refreshed_tokens(pair);
						cycle.resolve();
						obs::trace_gate(GateOutcome::Success, url);

						Ok(())
					},
					Err(err) => {
						// Tear down before reopening the gate so no new cycle can start from the
						// rejected refresh token.
						self.force_logout(url);
						cycle.reject(err.clone());
						obs::trace_gate(GateOutcome::Failure, url);

						Err(err)
					},
				}
			},
		}
	}

	fn force_logout(&self, url: &Url) {
		self.gate.metrics().record(GateOutcome::Logout);
		obs::trace_gate(GateOutcome::Logout, url);
		self.session.logout();
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestTransport> {
	/// Creates a client backed by a reqwest transport that enforces `config.timeout`.
	pub fn new(config: ClientConfig, session: Arc<dyn SessionStore>) -> Result<Self> {
		let transport = ReqwestTransport::from_config(&config)?;

		Ok(Self::with_transport(config, session, transport))
	}
}
impl<T> Clone for ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: Arc::clone(&self.transport),
			session: Arc::clone(&self.session),
			config: Arc::clone(&self.config),
			gate: Arc::clone(&self.gate),
		}
	}
}
impl<T> Debug for ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("base_url", &self.config.base_url.as_str())
			.field("refresh_token_url", &self.config.refresh_token_url.as_str())
			.field("refreshing", &self.gate.is_refreshing())
			.finish()
	}
}
