#![cfg(feature = "reqwest")]

// std
use std::sync::Mutex;
// crates.io
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
// self
use oauth2_token_cache::{
	_preludet::*,
	config::{JwtGrant, JwtSigningKey, OAuthConfig},
	error::ConfigError,
	flows::{JWT_BEARER_GRANT, TokenClient},
	http::{HttpFuture, TokenForm, TokenHttpClient, TokenHttpResponse},
};

const SIGNING_KEY: &str = include_str!("fixtures/jwt_signing_key.pem");
const VERIFYING_KEY: &str = include_str!("fixtures/jwt_signing_key.pub.pem");
const AUDIENCE: &str = "https://api.example.com/api/v1/oauth2/token";

#[derive(Default)]
struct RecordingHttpClient {
	forms: Mutex<Vec<TokenForm>>,
}
impl TokenHttpClient for RecordingHttpClient {
	fn post_form<'a>(
		&'a self,
		_: &'a Url,
		form: &'a TokenForm,
	) -> HttpFuture<'a, TokenHttpResponse> {
		self.forms.lock().expect("Recorder lock should not be poisoned.").push(form.clone());

		Box::pin(async { Ok(TokenHttpResponse::new(200, "{\"access_token\":\"J1\"}")) })
	}
}

fn jwt_grant() -> JwtGrant {
	let key = JwtSigningKey::from_rsa_pem(SIGNING_KEY).expect("Fixture key should load.");

	JwtGrant::new(key)
		.claim("iss", "client-1")
		.claim("sub", "alice@example.com")
		.claim("aud", AUDIENCE)
		.header("kid", "key-1")
		.header("tenant", "acme")
}

#[tokio::test]
async fn jwt_assertion_is_signed_with_rs256_and_verifiable() {
	let config = OAuthConfig::builder()
		.base_url("https://api.example.com/api/v1/oauth2")
		.jwt(jwt_grant())
		.scope("user:all")
		.client_id("client-1")
		.client_secret("never-sent")
		.build()
		.expect("JWT config should build.");
	let recorder = Arc::new(RecordingHttpClient::default());
	let client = TokenClient::builder(config)
		.shared_http_client(recorder.clone())
		.build()
		.expect("Client with a recording transport should build.");
	let bearer = client.bearer().await.expect("JWT grant should produce a token.");

	assert_eq!(bearer.expose(), "Bearer J1");

	let form = recorder
		.forms
		.lock()
		.expect("Recorder lock should not be poisoned.")
		.pop()
		.expect("One form should have been submitted.");

	assert_eq!(form.get("grant_type").map(String::as_str), Some(JWT_BEARER_GRANT));
	assert_eq!(form.get("scope").map(String::as_str), Some("user:all"));
	assert_eq!(form.get("client_id").map(String::as_str), Some("client-1"));
	assert!(!form.contains_key("client_secret"));

	let assertion = form.get("assertion").expect("The assertion should be submitted.");
	let header = jsonwebtoken::decode_header(assertion).expect("Assertion header should decode.");

	assert_eq!(header.alg, Algorithm::RS256);
	assert_eq!(header.typ.as_deref(), Some("JWT"));
	assert_eq!(header.kid.as_deref(), Some("key-1"));
	assert_eq!(header.extras.get("tenant").map(String::as_str), Some("acme"));

	let mut validation = Validation::new(Algorithm::RS256);

	validation.set_audience(&[AUDIENCE]);

	let key = DecodingKey::from_rsa_pem(VERIFYING_KEY.as_bytes()).expect("Public key should load.");
	let claims = jsonwebtoken::decode::<JsonValue>(assertion, &key, &validation)
		.expect("Assertion should verify with the public key.")
		.claims;
	let now = OffsetDateTime::now_utc().unix_timestamp();
	let exp = claims["exp"].as_i64().expect("exp should be an integer.");
	let nbf = claims["nbf"].as_i64().expect("nbf should be an integer.");
	let iat = claims["iat"].as_i64().expect("iat should be an integer.");

	assert_eq!(claims["sub"], "alice@example.com");
	assert_eq!(claims["iss"], "client-1");
	assert_eq!(exp - iat, 3600);
	assert_eq!(iat - nbf, 300);
	assert!((iat - now).abs() <= 5);
	assert!(claims["jti"].as_str().is_some_and(|jti| !jti.is_empty()));
}

#[tokio::test]
async fn every_creation_uses_a_fresh_jti() {
	let config = OAuthConfig::builder()
		.base_url("https://api.example.com")
		.jwt(jwt_grant())
		.build()
		.expect("JWT config should build.");
	let recorder = Arc::new(RecordingHttpClient::default());
	let client = TokenClient::builder(config)
		.shared_http_client(recorder.clone())
		.build()
		.expect("Client with a recording transport should build.");

	client.bearer().await.expect("First creation should succeed.");
	client.bearer().await.expect("Second creation should succeed.");

	let forms = recorder.forms.lock().expect("Recorder lock should not be poisoned.");
	let jtis = forms
		.iter()
		.map(|form| {
			let assertion = form.get("assertion").expect("The assertion should be submitted.");
			let claims = assertion.split('.').nth(1).expect("Assertion should have a payload.");

			claims.to_owned()
		})
		.collect::<Vec<_>>();

	// No cache is configured, so both calls create a token.
	assert_eq!(jtis.len(), 2);
	assert_ne!(jtis[0], jtis[1]);
}

#[test]
fn jwt_grant_requires_a_payload() {
	let key = JwtSigningKey::from_rsa_pem(SIGNING_KEY).expect("Fixture key should load.");
	let err = OAuthConfig::builder()
		.base_url("https://api.example.com")
		.jwt(JwtGrant::new(key))
		.build()
		.expect_err("An empty payload must be rejected.");

	assert!(matches!(err, ConfigError::MissingJwtPayload));
}
