#![cfg(feature = "reqwest")]

mod common;

// std
use std::{sync::Arc, time::Duration};
// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use common::*;
use session_client::{
	ApiRequest, Error,
	auth::{CredentialPair, TokenSecret},
	error::{RefreshError, TransportError},
	http_types::StatusCode,
	session::MemorySession,
};

#[tokio::test]
async fn concurrent_expiries_refresh_once_and_replay_with_new_token() {
	let server = MockServer::start_async().await;
	let session = seeded_session();
	let client = build_test_client(&server, &session);
	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/cases").header("authorization", "Bearer A1");
			then.status(401).header("content-type", "application/json").body(EXPIRED_BODY);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH).json_body(json!({ "refreshToken": "R1" }));
			then.status(200)
				.header("content-type", "application/json")
				.body(ROTATED_BODY)
				.delay(Duration::from_millis(300));
		})
		.await;
	let replayed = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/cases").header("authorization", "Bearer A2");
			then.status(200).header("content-type", "application/json").body(r#"{"ok":true}"#);
		})
		.await;
	let (first, second, third) = tokio::join!(
		client.send(ApiRequest::get("cases").query([("page", "1")])),
		client.send(ApiRequest::get("cases").query([("page", "2")])),
		client.send(ApiRequest::get("cases").query([("page", "3")])),
	);

	for result in [first, second, third] {
		let response = result.expect("Every caller should succeed after the shared refresh.");

		assert_eq!(response.status(), StatusCode::OK);
	}

	expired.assert_calls_async(3).await;
	refresh.assert_calls_async(1).await;
	replayed.assert_calls_async(3).await;

	assert_eq!(session.current(), Some(CredentialPair::new("A2", "R2")));
	assert_eq!(session.logout_count(), 0);
	assert_eq!(client.refresh_metrics().attempts(), 1);
	assert_eq!(client.refresh_metrics().successes(), 1);
	assert!(!client.is_refreshing());
}

#[tokio::test]
async fn rejected_refresh_logs_out_once_and_fails_every_caller() {
	let server = MockServer::start_async().await;
	let session = seeded_session();
	let client = build_test_client(&server, &session);
	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/cases");
			then.status(401).header("content-type", "application/json").body(EXPIRED_BODY);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(401)
				.header("content-type", "application/json")
				.body(r#"{"message":"InvalidRefreshToken"}"#)
				.delay(Duration::from_millis(300));
		})
		.await;
	let (first, second, third) = tokio::join!(
		client.send(ApiRequest::get("cases").query([("page", "1")])),
		client.send(ApiRequest::get("cases").query([("page", "2")])),
		client.send(ApiRequest::get("cases").query([("page", "3")])),
	);

	for result in [first, second, third] {
		let err = result.expect_err("Every caller should receive the refresh failure.");

		match err {
			Error::Refresh(RefreshError::Rejected { status, message }) => {
				assert_eq!(status, 401);
				assert_eq!(message.as_deref(), Some("InvalidRefreshToken"));
			},
			other => panic!("Unexpected error: {other:?}"),
		}
	}

	expired.assert_calls_async(3).await;
	refresh.assert_calls_async(1).await;

	assert_eq!(session.logout_count(), 1);
	assert!(!session.is_signed_in());
	assert_eq!(client.refresh_metrics().failures(), 1);
	assert_eq!(client.refresh_metrics().logouts(), 1);
}

#[tokio::test]
async fn other_unauthorized_causes_pass_through_untouched() {
	let server = MockServer::start_async().await;
	let session = seeded_session();
	let client = build_test_client(&server, &session);
	let invalid = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/cases");
			then.status(401)
				.header("content-type", "application/json")
				.body(r#"{"message":"InvalidSignature"}"#);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(200).header("content-type", "application/json").body(ROTATED_BODY);
		})
		.await;
	let err = client
		.send(ApiRequest::get("cases"))
		.await
		.expect_err("A non-expiry 401 should propagate to the caller.");
	let failure = err.failure().expect("The error should carry the failed response.");

	assert_eq!(failure.status, StatusCode::UNAUTHORIZED);
	assert_eq!(failure.message.as_deref(), Some("InvalidSignature"));
	assert_eq!(failure.body, br#"{"message":"InvalidSignature"}"#.to_vec());

	invalid.assert_calls_async(1).await;
	refresh.assert_calls_async(0).await;

	assert_eq!(session.logout_count(), 0);
	assert_eq!(session.current(), Some(CredentialPair::new("A1", "R1")));
}

#[tokio::test]
async fn expiry_without_refresh_token_logs_out_immediately() {
	let server = MockServer::start_async().await;
	let session = MemorySession::from_parts(Some(TokenSecret::new("A1")), None);
	let client = build_test_client(&server, &session);
	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/cases");
			then.status(401).header("content-type", "application/json").body(EXPIRED_BODY);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(200).header("content-type", "application/json").body(ROTATED_BODY);
		})
		.await;
	let err = client
		.send(ApiRequest::get("cases"))
		.await
		.expect_err("Expiry without a refresh token should fail the request.");

	assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));

	expired.assert_calls_async(1).await;
	refresh.assert_calls_async(0).await;

	assert_eq!(session.logout_count(), 1);
	assert!(!session.is_signed_in());
	assert_eq!(client.refresh_metrics().attempts(), 0);
}

#[tokio::test]
async fn requests_marked_as_retried_never_refresh() {
	let server = MockServer::start_async().await;
	let session = seeded_session();
	let client = build_test_client(&server, &session);
	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/cases");
			then.status(401).header("content-type", "application/json").body(EXPIRED_BODY);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(200).header("content-type", "application/json").body(ROTATED_BODY);
		})
		.await;
	let err = client
		.send(ApiRequest::get("cases").with_retry(true))
		.await
		.expect_err("A retried request should not be refreshed again.");

	assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));

	expired.assert_calls_async(1).await;
	refresh.assert_calls_async(0).await;

	assert_eq!(session.logout_count(), 0);
}

#[tokio::test]
async fn replay_that_expires_again_surfaces_the_second_failure() {
	let server = MockServer::start_async().await;
	let session = seeded_session();
	let client = build_test_client(&server, &session);
	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/cases");
			then.status(401).header("content-type", "application/json").body(EXPIRED_BODY);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(200).header("content-type", "application/json").body(ROTATED_BODY);
		})
		.await;
	let err = client
		.send(ApiRequest::get("cases"))
		.await
		.expect_err("The replay's failure should reach the caller.");

	assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));

	expired.assert_calls_async(2).await;
	refresh.assert_calls_async(1).await;

	assert_eq!(session.current(), Some(CredentialPair::new("A2", "R2")));
	assert_eq!(session.logout_count(), 0);
}

#[tokio::test]
async fn expiry_reported_by_the_refresh_endpoint_is_not_recursed() {
	let server = MockServer::start_async().await;
	let session = seeded_session();
	let client = build_test_client(&server, &session);
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(401).header("content-type", "application/json").body(EXPIRED_BODY);
		})
		.await;
	let err = client
		.send(
			ApiRequest::post(server.url(REFRESH_PATH))
				.json(&json!({ "refreshToken": "R1" }))
				.authorization(false),
		)
		.await
		.expect_err("A direct refresh call that fails should propagate unchanged.");

	assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
	assert!(err.failure().is_some());

	refresh.assert_calls_async(1).await;

	assert_eq!(session.logout_count(), 0);
	assert_eq!(client.refresh_metrics().attempts(), 0);
}

#[tokio::test]
async fn refresh_timeout_ends_the_session() {
	let server = MockServer::start_async().await;
	let session = seeded_session();
	let config = config_builder(&server)
		.timeout(Duration::from_millis(200))
		.build()
		.expect("Client config with a short timeout should build.");
	let client = build_client_with(config, Arc::new(session.clone()));
	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/cases");
			then.status(401).header("content-type", "application/json").body(EXPIRED_BODY);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(ROTATED_BODY)
				.delay(Duration::from_secs(2));
		})
		.await;
	let err = client
		.send(ApiRequest::get("cases"))
		.await
		.expect_err("A hung refresh should fail once the timeout elapses.");

	assert!(
		matches!(err, Error::Refresh(RefreshError::Transport(TransportError::Timeout { .. }))),
		"Unexpected error: {err:?}",
	);

	expired.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;

	assert_eq!(session.logout_count(), 1);
	assert!(!client.is_refreshing());
}
