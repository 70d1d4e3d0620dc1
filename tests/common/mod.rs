//! Fixtures shared by the integration tests.

#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
// self
use session_client::{
	ClientConfig, ReqwestApiClient,
	auth::CredentialPair,
	config::ClientConfigBuilder,
	session::{MemorySession, SessionStore},
	url::Url,
};

pub const REFRESH_PATH: &str = "/api/auth/refresh-token";
pub const EXPIRED_BODY: &str = r#"{"message":"TokenExpiredError"}"#;
pub const ROTATED_BODY: &str = r#"{"accessToken":"A2","refreshToken":"R2"}"#;

/// Session holding the `A1/R1` pair used throughout the scenarios.
pub fn seeded_session() -> MemorySession {
	MemorySession::signed_in(CredentialPair::new("A1", "R1"))
}

/// Config builder pointed at the mock server's `/api` prefix and refresh endpoint.
pub fn config_builder(server: &MockServer) -> ClientConfigBuilder {
	ClientConfig::builder(
		Url::parse(&server.url("/api")).expect("Mock base URL should parse successfully."),
	)
	.refresh_token_url(
		Url::parse(&server.url(REFRESH_PATH))
			.expect("Mock refresh endpoint should parse successfully."),
	)
}

pub fn build_test_client(server: &MockServer, session: &MemorySession) -> ReqwestApiClient {
	let config = config_builder(server).build().expect("Client config fixture should build.");

	build_client_with(config, Arc::new(session.clone()))
}

pub fn build_client_with(config: ClientConfig, session: Arc<dyn SessionStore>) -> ReqwestApiClient {
	ReqwestApiClient::new(config, session).expect("Reqwest-backed client should build.")
}
