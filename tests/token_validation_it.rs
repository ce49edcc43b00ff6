#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use oauth2_token_cache::{
	_preludet::*,
	config::OAuthConfig,
	error::{ConfigError, ProtocolError},
	flows::{AuthorizationRequest, TokenClient},
	store::TokenStore,
};

fn generic_config(server: &MockServer) -> OAuthConfig {
	OAuthConfig::builder()
		.base_url(server.base_url())
		.generic_param("grant_type", "client_credentials")
		.build()
		.expect("Generic config should build for the mock server.")
}

#[tokio::test]
async fn missing_token_field_is_a_protocol_error_and_is_not_cached() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(generic_config(&server));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body("{\"foo\":\"bar\"}");
		})
		.await;

	for _ in 0..2 {
		let err = client
			.get_authorization(AuthorizationRequest::new())
			.await
			.expect_err("A response without access_token must fail.");

		assert!(matches!(
			&err,
			Error::Protocol(ProtocolError::MissingTokenField { field }) if field == "access_token"
		));
		assert_eq!(err.to_string(), "API error: no such field in answer: access_token.");
	}

	mock.assert_calls_async(2).await;

	assert!(
		store.get(&client.cache_key()).await.expect("Store lookup should succeed.").is_none()
	);
}

#[tokio::test]
async fn custom_token_field_is_honored() {
	let server = MockServer::start_async().await;
	let config = OAuthConfig::builder()
		.base_url(server.base_url())
		.generic_param("grant_type", "client_credentials")
		.token_field("token")
		.build()
		.expect("Config with a custom token field should build.");
	let (client, _store) = build_reqwest_test_client(config);
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body("{\"token\":\"X\"}");
		})
		.await;
	let bearer = client.bearer().await.expect("Custom token field should be read.");

	assert_eq!(bearer.expose(), "Bearer X");
}

#[tokio::test]
async fn non_success_creation_is_an_auth_failure() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(generic_config(&server));
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(401)
				.header("content-type", "application/json")
				.header("retry-after", "30")
				.body("{\"error\":\"invalid_client\"}");
		})
		.await;
	let err = client.bearer().await.expect_err("A 401 must surface as an auth failure.");

	match err {
		Error::AuthFailure { grant, status, body, retry_after } => {
			assert_eq!(grant, "generic");
			assert_eq!(status, 401);
			assert!(body.contains("invalid_client"));
			assert_eq!(retry_after, Some(Duration::seconds(30)));
		},
		other => panic!("Unexpected error: {other:?}"),
	}

	assert!(store.is_empty());
	assert_eq!(client.metrics().failures(), 1);
}

#[tokio::test]
async fn malformed_json_is_a_protocol_error() {
	let server = MockServer::start_async().await;
	let (client, _store) = build_reqwest_test_client(generic_config(&server));
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body("{\"access_token\":");
		})
		.await;
	let err = client.bearer().await.expect_err("Malformed JSON must fail.");

	assert!(matches!(
		err,
		Error::Protocol(ProtocolError::MalformedResponse { status: Some(200), .. })
	));
}

#[test]
fn unregistered_custom_grant_is_a_config_error() {
	let config = OAuthConfig::builder()
		.base_url("https://api.example.com")
		.custom("boot")
		.build()
		.expect("Custom grant config should build.");
	let err = TokenClient::builder(config)
		.http_client(test_reqwest_http_client())
		.build()
		.expect_err("An unregistered custom grant must be rejected.");

	assert!(matches!(err, Error::Config(ConfigError::UnknownGrant { tag }) if tag == "boot"));
}
