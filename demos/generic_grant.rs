//! Demonstrates the generic grant against a mock token endpoint, with an in-memory cache that
//! serves the second authorization without another network round trip.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use oauth2_token_cache::{
	config::OAuthConfig,
	flows::{AuthorizationRequest, TokenClient},
	store::{MemoryStore, TokenCache},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/v1/oauth2/token")
				.form_urlencoded_tuple("grant_type", "password")
				.form_urlencoded_tuple("username", "alice");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"refresh_token\":\"demo-refresh\",\"token_type\":\"bearer\"}",
			);
		})
		.await;
	let config = OAuthConfig::builder()
		.base_url(server.url("/api/v1/oauth2"))
		.path_token("/token")
		.generic_param("grant_type", "password")
		.generic_param("username", "alice")
		.generic_param("password", "correct horse battery staple")
		.build()?;

	println!("Cache key: {}.", TokenClient::new(config.clone())?.cache_key());

	let cache = TokenCache::open(Arc::new(MemoryStore::default())).await?;
	let client = TokenClient::builder(config).cache(cache).build()?;
	let first = client.get_authorization(AuthorizationRequest::new()).await?;
	let second = client.get_authorization(AuthorizationRequest::new()).await?;

	println!("First header matches second: {}.", first == second);
	println!("Cache hits: {}, creations: {}.", client.metrics().cache_hits(), client.metrics().creations());

	token_mock.assert_async().await;

	Ok(())
}
