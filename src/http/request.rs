//! Outgoing request descriptor and its resolved, wire-ready form.

// self
use crate::{_prelude::*, config::ClientConfig, error::ConfigError};

/// Outgoing request descriptor.
///
/// Builder methods never fail; the first construction problem (bad header, unserializable
/// body) is recorded and surfaces as [`ConfigError`] when the request is prepared, before it
/// reaches the transport or the refresh gate.
#[derive(Clone)]
pub struct ApiRequest {
	method: Method,
	target: String,
	query: Vec<(String, String)>,
	headers: HeaderMap,
	body: Option<Vec<u8>>,
	authorization: bool,
	retry: bool,
	error: Option<ConfigError>,
}
impl ApiRequest {
	/// Creates a request for `target`, either an absolute URL or a path relative to the
	/// client's base URL.
	pub fn new(method: Method, target: impl Into<String>) -> Self {
		Self {
			method,
			target: target.into(),
			query: Vec::new(),
			headers: HeaderMap::new(),
			body: None,
			authorization: true,
			retry: false,
			error: None,
		}
	}

	/// Shorthand for a `GET` request.
	pub fn get(target: impl Into<String>) -> Self {
		Self::new(Method::GET, target)
	}

	/// Shorthand for a `POST` request.
	pub fn post(target: impl Into<String>) -> Self {
		Self::new(Method::POST, target)
	}

	/// Shorthand for a `PUT` request.
	pub fn put(target: impl Into<String>) -> Self {
		Self::new(Method::PUT, target)
	}

	/// Shorthand for a `PATCH` request.
	pub fn patch(target: impl Into<String>) -> Self {
		Self::new(Method::PATCH, target)
	}

	/// Shorthand for a `DELETE` request.
	pub fn delete(target: impl Into<String>) -> Self {
		Self::new(Method::DELETE, target)
	}

	/// Sets a header, replacing earlier values with the same name.
	pub fn header(mut self, name: &str, value: &str) -> Self {
		match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
			(Ok(name), Ok(value)) => {
				self.headers.insert(name, value);
			},
			_ => self.record_error(ConfigError::InvalidHeader { name: name.to_owned() }),
		}

		self
	}

	/// Appends query parameters.
	pub fn query<I, K, V>(mut self, pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.query.extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));

		self
	}

	/// Serializes `body` as JSON and sets the matching content type.
	pub fn json<T>(mut self, body: &T) -> Self
	where
		T: ?Sized + Serialize,
	{
		match serde_json::to_vec(body) {
			Ok(bytes) => {
				self.headers.insert(
					::http::header::CONTENT_TYPE,
					HeaderValue::from_static("application/json"),
				);
				self.body = Some(bytes);
			},
			Err(e) => self.record_error(ConfigError::InvalidBody { reason: e.to_string() }),
		}

		self
	}

	/// Uses raw bytes as the request body.
	pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Opts in to (default) or out of bearer credential injection.
	pub fn authorization(mut self, enabled: bool) -> Self {
		self.authorization = enabled;

		self
	}

	/// Overrides the retry marker. A request marked as retried never triggers a refresh.
	pub fn with_retry(mut self, retry: bool) -> Self {
		self.retry = retry;

		self
	}

	/// Returns the HTTP method.
	pub fn method(&self) -> &Method {
		&self.method
	}

	/// Returns the target as supplied by the caller.
	pub fn target(&self) -> &str {
		&self.target
	}

	/// Returns the caller-supplied headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Returns `false` when the request opted out of bearer credential injection.
	pub fn authorizes(&self) -> bool {
		self.authorization
	}

	/// Returns `true` once the request has been routed through the refresh path.
	pub fn is_retry(&self) -> bool {
		self.retry
	}

	pub(crate) fn mark_retry(&mut self) {
		self.retry = true;
	}

	/// Resolves the target against `config` and merges the default headers.
	pub fn prepare(&self, config: &ClientConfig) -> Result<PreparedRequest, ConfigError> {
		if let Some(err) = &self.error {
			return Err(err.clone());
		}

		let mut url = config.resolve(&self.target)?;

		if !self.query.is_empty() {
			url.query_pairs_mut().extend_pairs(&self.query);
		}

		let mut headers = config.default_headers.clone();

		for name in self.headers.keys() {
			headers.remove(name);
		}
		for (name, value) in &self.headers {
			headers.append(name.clone(), value.clone());
		}

		Ok(PreparedRequest { method: self.method.clone(), url, headers, body: self.body.clone() })
	}

	fn record_error(&mut self, err: ConfigError) {
		if self.error.is_none() {
			self.error = Some(err);
		}
	}
}
impl Debug for ApiRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiRequest")
			.field("method", &self.method)
			.field("target", &self.target)
			.field("headers", &RedactedHeaders(&self.headers))
			.field("body_len", &self.body.as_ref().map(Vec::len))
			.field("authorization", &self.authorization)
			.field("retry", &self.retry)
			.finish()
	}
}

/// Wire-ready request handed to an [`HttpTransport`](crate::http::HttpTransport).
#[derive(Clone)]
pub struct PreparedRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute request URL, query included.
	pub url: Url,
	/// Final header set, bearer credential included.
	pub headers: HeaderMap,
	/// Optional request body.
	pub body: Option<Vec<u8>>,
}
impl Debug for PreparedRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PreparedRequest")
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("headers", &RedactedHeaders(&self.headers))
			.field("body_len", &self.body.as_ref().map(Vec::len))
			.finish()
	}
}

struct RedactedHeaders<'a>(&'a HeaderMap);
impl Debug for RedactedHeaders<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_map()
			.entries(self.0.iter().map(|(name, value)| {
				let shown = if name == ::http::header::AUTHORIZATION {
					"<redacted>"
				} else {
					value.to_str().unwrap_or("<binary>")
				};

				(name.as_str(), shown)
			}))
			.finish()
	}
}
