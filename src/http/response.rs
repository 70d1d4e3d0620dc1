//! Buffered responses and the failure type raised for non-success statuses.

// std
use std::borrow::Cow;
// crates.io
use serde::de::DeserializeOwned;
// self
use crate::_prelude::*;

/// Fully buffered HTTP response.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	status: StatusCode,
	headers: HeaderMap,
	body: Vec<u8>,
}
impl ApiResponse {
	/// Assembles a response from its parts.
	pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers, body: body.into() }
	}

	/// Returns the response status.
	pub fn status(&self) -> StatusCode {
		self.status
	}

	/// Returns the response headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Returns the raw response body.
	pub fn body(&self) -> &[u8] {
		&self.body
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}

	/// Returns the body as text, replacing invalid UTF-8 sequences.
	pub fn text(&self) -> Cow<'_, str> {
		String::from_utf8_lossy(&self.body)
	}

	/// Decodes the body as JSON, reporting the failing path on mismatch.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		decode_json(&self.body)
	}

	/// Splits the response into its parts.
	pub fn into_parts(self) -> (StatusCode, HeaderMap, Vec<u8>) {
		(self.status, self.headers, self.body)
	}
}

/// Non-success response, surfaced verbatim to the caller.
#[derive(Clone, Debug, ThisError)]
#[error("{method} {url} failed with status {status}.")]
pub struct ApiFailure {
	/// Method of the failed request.
	pub method: Method,
	/// Absolute URL of the failed request.
	pub url: Url,
	/// Response status.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw response body.
	pub body: Vec<u8>,
	/// `message` field of a JSON error body, when present.
	pub message: Option<String>,
}
impl ApiFailure {
	/// Wraps a non-success response for the request identified by `method` and `url`.
	pub fn from_response(method: Method, url: Url, response: ApiResponse) -> Self {
		let (status, headers, body) = response.into_parts();
		let message = error_message(&body);

		Self { method, url, status, headers, body, message }
	}

	/// Decodes the error body as JSON.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		decode_json(&self.body)
	}
}

/// Extracts the string `message` field from a JSON error body.
pub(crate) fn error_message(body: &[u8]) -> Option<String> {
	let value: serde_json::Value = serde_json::from_slice(body).ok()?;

	value.get("message")?.as_str().map(ToOwned::to_owned)
}

fn decode_json<T>(body: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer).map_err(|source| Error::Decode { source })
}
