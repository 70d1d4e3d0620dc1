//! Client configuration: base transport options plus the refresh-gate wiring.

/// Builder API for assembling client configurations.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, error::ConfigError, gate::ExpirySignal};

/// Immutable configuration consumed by [`ApiClient`](crate::client::ApiClient).
#[derive(Clone, Debug)]
pub struct ClientConfig {
	/// Base URL that relative request targets are appended to.
	pub base_url: Url,
	/// Absolute URL of the refresh endpoint.
	pub refresh_token_url: Url,
	/// Headers sent with every request (request headers win on conflict).
	pub default_headers: HeaderMap,
	/// Upper bound applied by the transport to every request, the refresh call included.
	pub timeout: Duration,
	/// Error-body sentinel identifying an expired access token.
	pub expiry_signal: ExpirySignal,
}
impl ClientConfig {
	/// Timeout applied when the builder does not override it.
	pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

	/// Creates a new builder for the provided base URL.
	pub fn builder(base_url: Url) -> ClientConfigBuilder {
		ClientConfigBuilder::new(base_url)
	}

	/// Resolves a request target into an absolute URL.
	///
	/// Absolute targets are used verbatim. Relative targets are appended to the base URL
	/// path, so `cases/7` against `https://desk.example.com/api` becomes
	/// `https://desk.example.com/api/cases/7`.
	pub fn resolve(&self, target: &str) -> Result<Url, ConfigError> {
		let invalid = |e: url::ParseError| ConfigError::InvalidUrl {
			target: target.to_owned(),
			reason: e.to_string(),
		};

		match Url::parse(target) {
			Ok(url) => return Ok(url),
			Err(url::ParseError::RelativeUrlWithoutBase) => {},
			Err(e) => return Err(invalid(e)),
		}

		let base = self.base_url.as_str().trim_end_matches('/');
		let path = target.trim_start_matches('/');

		if path.is_empty() {
			return Ok(self.base_url.clone());
		}

		Url::parse(&format!("{base}/{path}")).map_err(invalid)
	}

	/// Returns `true` when `url` addresses the refresh endpoint (query and fragment ignored).
	pub fn is_refresh_endpoint(&self, url: &Url) -> bool {
		same_endpoint(url, &self.refresh_token_url)
	}
}

fn same_endpoint(a: &Url, b: &Url) -> bool {
	a.scheme() == b.scheme()
		&& a.host_str() == b.host_str()
		&& a.port_or_known_default() == b.port_or_known_default()
		&& a.path().trim_end_matches('/') == b.path().trim_end_matches('/')
}
