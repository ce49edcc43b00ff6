//! Demonstrates the JWT bearer grant: the client signs an RS256 assertion from the configured
//! claims and exchanges it at a mock token endpoint.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use oauth2_token_cache::{
	config::{JwtGrant, JwtSigningKey, OAuthConfig},
	flows::{JWT_BEARER_GRANT, TokenClient},
};

const SIGNING_KEY: &str = include_str!("../tests/fixtures/jwt_signing_key.pem");

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.form_urlencoded_tuple("grant_type", JWT_BEARER_GRANT)
				.form_urlencoded_tuple("scope", "user:all");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"jwt-access\",\"expires_in\":3600}");
		})
		.await;
	let grant = JwtGrant::new(JwtSigningKey::from_rsa_pem(SIGNING_KEY)?)
		.claim("iss", "demo-client")
		.claim("sub", "service-account@example.com")
		.claim("aud", server.url("/token"))
		.header("kid", "demo-key");
	let config = OAuthConfig::builder()
		.base_url(server.base_url())
		.jwt(grant)
		.scope("user:all")
		.client_id("demo-client")
		.build()?;
	let client = TokenClient::new(config)?;
	let header = client.bearer().await?;

	println!("Authorization header obtained ({} characters).", header.expose().len());

	token_mock.assert_async().await;

	Ok(())
}
