#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
use serde_json::json;
use time::format_description::well_known::Rfc3339;
// self
use oauth2_token_cache::{
	_preludet::*,
	config::OAuthConfig,
	flows::{AuthorizationRequest, TokenClient},
	store::{MemoryStore, TokenStore},
};

fn generic_config(server: &MockServer) -> OAuthConfig {
	OAuthConfig::builder()
		.base_url(server.base_url())
		.generic_param("grant_type", "client_credentials")
		.generic_param("apikey", "k1")
		.build()
		.expect("Generic config should build for the mock server.")
}

fn access_token_expiring_in(secs: i64) -> String {
	let exp = (OffsetDateTime::now_utc() + Duration::seconds(secs)).unix_timestamp();

	unsigned_jwt(&json!({ "sub": "alice", "exp": exp }))
}

fn access_token_with_expires_at_in(secs: i64) -> String {
	let expires_at = (OffsetDateTime::now_utc() + Duration::seconds(secs))
		.format(&Rfc3339)
		.expect("Timestamp should format as RFC 3339.");

	unsigned_jwt(&json!({ "sub": "alice", "expires_at": expires_at }))
}

async fn seed(client: &TokenClient, store: &MemoryStore, body: JsonValue) {
	store
		.put(&client.cache_key(), body.to_string().into_bytes())
		.await
		.expect("Seeding the memory store should succeed.");
}

async fn cached_body(client: &TokenClient, store: &MemoryStore) -> Option<JsonValue> {
	store
		.get(&client.cache_key())
		.await
		.expect("Store lookup should succeed.")
		.map(|raw| serde_json::from_slice(&raw).expect("Cached entry should be JSON."))
}

#[tokio::test]
async fn near_expiry_token_is_refreshed() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(generic_config(&server));

	seed(
		&client,
		&store,
		json!({ "access_token": access_token_expiring_in(30), "refresh_token": "R1" }),
	)
	.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.form_urlencoded_tuple("grant_type", "refresh_token")
				.form_urlencoded_tuple("refresh_token", "R1");
			then.status(200).header("content-type", "application/json").body("{\"access_token\":\"T2\"}");
		})
		.await;
	let create = server
		.mock_async(|when, then| {
			when.method(POST).path("/token").form_urlencoded_tuple("grant_type", "client_credentials");
			then.status(200).header("content-type", "application/json").body("{\"access_token\":\"unused\"}");
		})
		.await;
	let bearer = client
		.get_authorization(AuthorizationRequest::new())
		.await
		.expect("Refresh should produce a token.");

	assert_eq!(bearer.expose(), "Bearer T2");
	assert_eq!(cached_body(&client, &store).await, Some(json!({ "access_token": "T2" })));

	refresh.assert_calls_async(1).await;
	create.assert_calls_async(0).await;

	assert_eq!(client.metrics().refreshes(), 1);
}

#[tokio::test]
async fn rejected_refresh_falls_back_to_the_grant() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(generic_config(&server));

	seed(
		&client,
		&store,
		json!({ "access_token": access_token_expiring_in(30), "refresh_token": "R1" }),
	)
	.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/token").form_urlencoded_tuple("grant_type", "refresh_token");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\"}");
		})
		.await;
	let create = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.form_urlencoded_tuple("grant_type", "client_credentials")
				.form_urlencoded_tuple("apikey", "k1");
			then.status(200).header("content-type", "application/json").body("{\"access_token\":\"T3\"}");
		})
		.await;
	let bearer = client
		.get_authorization(AuthorizationRequest::new())
		.await
		.expect("Recreation should succeed after a rejected refresh.");

	assert_eq!(bearer.expose(), "Bearer T3");
	assert_eq!(cached_body(&client, &store).await, Some(json!({ "access_token": "T3" })));

	refresh.assert_calls_async(1).await;
	create.assert_calls_async(1).await;

	assert_eq!(client.metrics().refresh_failures(), 1);
}

#[tokio::test]
async fn token_outside_the_guard_window_is_used_unchanged() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(generic_config(&server));
	let token = access_token_expiring_in(600);

	seed(&client, &store, json!({ "access_token": token, "refresh_token": "R1" })).await;

	let any = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(500);
		})
		.await;
	let bearer = client.bearer().await.expect("Cached token should be returned.");

	assert_eq!(bearer.expose(), format!("Bearer {token}"));

	any.assert_calls_async(0).await;
}

#[tokio::test]
async fn token_inside_the_guard_window_is_renewed() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(generic_config(&server));

	seed(
		&client,
		&store,
		json!({ "access_token": access_token_expiring_in(60), "refresh_token": "R1" }),
	)
	.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/token").form_urlencoded_tuple("grant_type", "refresh_token");
			then.status(200).header("content-type", "application/json").body("{\"access_token\":\"T2\"}");
		})
		.await;
	let bearer = client.bearer().await.expect("Refresh should succeed.");

	assert_eq!(bearer.expose(), "Bearer T2");

	refresh.assert_calls_async(1).await;
}

#[tokio::test]
async fn near_expiry_without_refresh_token_is_recreated() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(generic_config(&server));

	seed(&client, &store, json!({ "access_token": access_token_expiring_in(10) })).await;

	let create = server
		.mock_async(|when, then| {
			when.method(POST).path("/token").form_urlencoded_tuple("grant_type", "client_credentials");
			then.status(200).header("content-type", "application/json").body("{\"access_token\":\"T4\"}");
		})
		.await;
	let bearer = client.bearer().await.expect("Recreation should succeed.");

	assert_eq!(bearer.expose(), "Bearer T4");

	create.assert_calls_async(1).await;

	assert_eq!(client.metrics().refreshes(), 0);
	assert_eq!(client.metrics().refresh_failures(), 0);
}

#[tokio::test]
async fn forced_refresh_bypasses_an_opaque_cached_token() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(generic_config(&server));

	seed(&client, &store, json!({ "access_token": "opaque", "refresh_token": "R9" })).await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.form_urlencoded_tuple("grant_type", "refresh_token")
				.form_urlencoded_tuple("refresh_token", "R9");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"fresh\",\"refresh_token\":\"R10\"}");
		})
		.await;
	let cached = client.bearer().await.expect("Opaque cached token should be reused.");
	let forced = client
		.get_authorization(AuthorizationRequest::new().force_refresh())
		.await
		.expect("Forced refresh should succeed.");

	assert_eq!(cached.expose(), "Bearer opaque");
	assert_eq!(forced.expose(), "Bearer fresh");
	assert_eq!(
		cached_body(&client, &store).await,
		Some(json!({ "access_token": "fresh", "refresh_token": "R10" }))
	);

	refresh.assert_calls_async(1).await;
}

#[tokio::test]
async fn expires_at_timestamp_drives_the_guard_window() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(generic_config(&server));
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.form_urlencoded_tuple("grant_type", "refresh_token")
				.form_urlencoded_tuple("refresh_token", "R5");
			then.status(200).header("content-type", "application/json").body("{\"access_token\":\"T5\"}");
		})
		.await;
	let distant = access_token_with_expires_at_in(600);

	seed(&client, &store, json!({ "access_token": distant, "refresh_token": "R5" })).await;

	let reused = client.bearer().await.expect("Distant expiry should reuse the cache.");

	assert_eq!(reused.expose(), format!("Bearer {distant}"));

	refresh.assert_calls_async(0).await;

	seed(
		&client,
		&store,
		json!({ "access_token": access_token_with_expires_at_in(45), "refresh_token": "R5" }),
	)
	.await;

	let renewed = client.bearer().await.expect("Near expiry should trigger a refresh.");

	assert_eq!(renewed.expose(), "Bearer T5");

	refresh.assert_calls_async(1).await;

	assert_eq!(client.metrics().refreshes(), 1);
}
