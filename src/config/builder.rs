// self
use crate::{_prelude::*, config::ClientConfig, gate::ExpirySignal};

/// Errors raised while constructing or validating client configurations.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ClientConfigError {
	/// The refresh endpoint is mandatory.
	#[error("Missing refresh token URL.")]
	MissingRefreshTokenUrl,
	/// Endpoints must use HTTP or HTTPS.
	#[error("The {endpoint} URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// Which URL failed validation.
		endpoint: &'static str,
		/// URL that failed validation.
		url: String,
	},
	/// The base URL cannot have paths appended to it.
	#[error("The base URL cannot be used as a base: {url}.")]
	CannotBeABase {
		/// URL that failed validation.
		url: String,
	},
	/// Requests need a finite, non-zero upper bound.
	#[error("Timeout must be greater than zero.")]
	ZeroTimeout,
	/// The expiry sentinel must be non-empty.
	#[error("Expiry signal must not be empty.")]
	EmptyExpirySignal,
	/// A default header name or value is not valid HTTP.
	#[error("Default header `{name}` is invalid.")]
	InvalidDefaultHeader {
		/// Offending header name.
		name: String,
	},
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// Base URL for relative targets.
	pub base_url: Url,
	/// Refresh endpoint (required).
	pub refresh_token_url: Option<Url>,
	/// Raw default headers, validated on build.
	pub default_headers: Vec<(String, String)>,
	/// Request timeout.
	pub timeout: Duration,
	/// Expiry sentinel.
	pub expiry_signal: ExpirySignal,
}
impl ClientConfigBuilder {
	/// Creates a new builder seeded with the provided base URL.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			refresh_token_url: None,
			default_headers: Vec::new(),
			timeout: ClientConfig::DEFAULT_TIMEOUT,
			expiry_signal: ExpirySignal::default(),
		}
	}

	/// Sets the refresh endpoint.
	pub fn refresh_token_url(mut self, url: Url) -> Self {
		self.refresh_token_url = Some(url);

		self
	}

	/// Adds a header sent with every request.
	pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.default_headers.push((name.into(), value.into()));

		self
	}

	/// Overrides the request timeout (defaults to 30 seconds).
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Overrides the expiry sentinel (defaults to `TokenExpiredError`).
	pub fn expiry_signal(mut self, signal: impl Into<String>) -> Self {
		self.expiry_signal = ExpirySignal::new(signal);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ClientConfigError> {
		let refresh_token_url =
			self.refresh_token_url.ok_or(ClientConfigError::MissingRefreshTokenUrl)?;

		validate_scheme("base", &self.base_url)?;
		validate_scheme("refresh token", &refresh_token_url)?;

		if self.base_url.cannot_be_a_base() {
			return Err(ClientConfigError::CannotBeABase { url: self.base_url.to_string() });
		}
		if self.timeout.is_zero() {
			return Err(ClientConfigError::ZeroTimeout);
		}
		if self.expiry_signal.as_str().is_empty() {
			return Err(ClientConfigError::EmptyExpirySignal);
		}

		let mut default_headers = HeaderMap::new();

		for (name, value) in self.default_headers {
			let invalid = || ClientConfigError::InvalidDefaultHeader { name: name.clone() };
			let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
			let header_value = HeaderValue::from_str(&value).map_err(|_| invalid())?;

			default_headers.append(header_name, header_value);
		}

		Ok(ClientConfig {
			base_url: self.base_url,
			refresh_token_url,
			default_headers,
			timeout: self.timeout,
			expiry_signal: self.expiry_signal,
		})
	}
}

fn validate_scheme(endpoint: &'static str, url: &Url) -> Result<(), ClientConfigError> {
	if matches!(url.scheme(), "http" | "https") {
		Ok(())
	} else {
		Err(ClientConfigError::UnsupportedScheme { endpoint, url: url.to_string() })
	}
}
