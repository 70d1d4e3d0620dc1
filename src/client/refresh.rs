//! The leader's call to the refresh endpoint.

// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, pair::RefreshRequestBody},
	client::ApiClient,
	error::RefreshError,
	http::{ApiRequest, HttpTransport, response::error_message},
	obs::{CallSpan, Phase},
};

impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Exchanges the session's refresh token for a new credential pair.
	///
	/// The call goes straight to the transport: it carries no bearer credential and never
	/// re-enters the refresh gate.
	pub(super) async fn refresh_tokens(&self) -> Result<CredentialPair, RefreshError> {
		let refresh_token = self.session.refresh_token().ok_or(RefreshError::MissingRefreshToken)?;
		let prepared = ApiRequest::post(self.config.refresh_token_url.as_str())
			.json(&RefreshRequestBody { refresh_token: refresh_token.expose() })
			.authorization(false)
			.prepare(&self.config)?;
		let span = CallSpan::new(Phase::Refresh, &prepared.method);
		let response = span.instrument(self.transport.execute(prepared)).await?;

		if !response.is_success() {
			return Err(RefreshError::Rejected {
				status: response.status().as_u16(),
				message: error_message(response.body()),
			});
		}

		let mut deserializer = serde_json::Deserializer::from_slice(response.body());
		let pair: CredentialPair = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| RefreshError::Malformed { source: Arc::new(source) })?;

		pair.ensure_complete()
	}
}
