//! Client-level error types shared by the interceptor, the refresh gate, and transports.

// self
use crate::{_prelude::*, http::ApiFailure};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Type-erased error that can be cloned into every waiter of a refresh cycle.
pub type SharedError = Arc<dyn StdError + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Request could not be constructed; never reaches the transport or the refresh gate.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Credential refresh failed; the session has been torn down unless the cycle was abandoned.
	#[error(transparent)]
	Refresh(#[from] RefreshError),
	/// The backend answered with a non-success status.
	#[error(transparent)]
	Status(Box<ApiFailure>),
	/// Response body could not be decoded into the requested type.
	#[error("Response body could not be decoded.")]
	Decode {
		/// Structured decoding failure, including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl Error {
	/// Returns the failed response when the error is a non-success status.
	pub fn failure(&self) -> Option<&ApiFailure> {
		match self {
			Self::Status(failure) => Some(failure.as_ref()),
			_ => None,
		}
	}

	/// Returns the HTTP status carried by the error, if any.
	pub fn status(&self) -> Option<StatusCode> {
		match self {
			Self::Status(failure) => Some(failure.status),
			Self::Refresh(RefreshError::Rejected { status, .. }) =>
				StatusCode::from_u16(*status).ok(),
			_ => None,
		}
	}
}
impl From<ApiFailure> for Error {
	fn from(failure: ApiFailure) -> Self {
		Self::Status(Box::new(failure))
	}
}

/// Construction-time failures raised before a request is dispatched.
#[derive(Clone, Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: SharedError,
	},
	/// Request target cannot be resolved into an absolute URL.
	#[error("Request target `{target}` is not a valid URL: {reason}.")]
	InvalidUrl {
		/// Target as supplied by the caller.
		target: String,
		/// Parser diagnostic.
		reason: String,
	},
	/// Header name or value is not valid HTTP.
	#[error("Header `{name}` is invalid.")]
	InvalidHeader {
		/// Offending header name (lossy when the name itself is invalid).
		name: String,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be encoded: {reason}.")]
	InvalidBody {
		/// Serializer diagnostic.
		reason: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Arc::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, timeout).
#[derive(Clone, Debug, ThisError)]
pub enum TransportError {
	/// Request exceeded the configured upper-bound timeout.
	#[error("Request timed out.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: SharedError,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while sending the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: SharedError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Arc::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Timeout { source: Arc::new(src) }
	}

	/// Returns `true` when the request hit the timeout.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Timeout { .. })
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}

/// Refresh-cycle failures. Cloned into the leader and every queued waiter of the cycle.
#[derive(Clone, Debug, ThisError)]
pub enum RefreshError {
	/// Refresh endpoint answered with a non-success status.
	#[error("Refresh endpoint rejected the request with status {status}.")]
	Rejected {
		/// HTTP status code returned by the refresh endpoint.
		status: u16,
		/// `message` field of the error body, when present.
		message: Option<String>,
	},
	/// Refresh call failed in transit (including timeouts).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Refresh endpoint responded with a body that is not a credential pair.
	#[error("Refresh endpoint returned a malformed credential pair.")]
	Malformed {
		/// Structured parsing failure.
		#[source]
		source: Arc<serde_path_to_error::Error<serde_json::Error>>,
	},
	/// Refresh endpoint returned an empty token.
	#[error("Refresh endpoint returned an empty {field}.")]
	EmptyToken {
		/// Wire name of the empty field.
		field: &'static str,
	},
	/// Session store no longer holds a refresh token.
	#[error("No refresh token is available.")]
	MissingRefreshToken,
	/// Refresh request could not be constructed.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The refreshing caller went away before the cycle settled.
	#[error("Token refresh was abandoned before it settled.")]
	Abandoned,
}
