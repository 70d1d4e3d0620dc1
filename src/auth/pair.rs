//! Access/refresh credential pair as exchanged with the refresh endpoint.

// self
use crate::{_prelude::*, auth::TokenSecret, error::RefreshError};

/// Credential pair issued at login and rotated by every successful refresh.
///
/// The wire shape is `{ "accessToken": "..", "refreshToken": ".." }`; unknown fields are
/// ignored so the backend may attach metadata (expiry hints, user ids) without breaking the
/// client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPair {
	/// Short-lived bearer token attached to API calls.
	pub access_token: TokenSecret,
	/// Longer-lived token used solely to obtain a new access token.
	pub refresh_token: TokenSecret,
}
impl CredentialPair {
	/// Creates a pair from raw token strings.
	pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: TokenSecret::new(refresh_token),
		}
	}

	pub(crate) fn ensure_complete(self) -> Result<Self, RefreshError> {
		if self.access_token.is_empty() {
			return Err(RefreshError::EmptyToken { field: "accessToken" });
		}
		if self.refresh_token.is_empty() {
			return Err(RefreshError::EmptyToken { field: "refreshToken" });
		}

		Ok(self)
	}
}

/// Body of the refresh call: `{ "refreshToken": ".." }`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshRequestBody<'a> {
	pub(crate) refresh_token: &'a str,
}
