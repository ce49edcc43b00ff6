//! JWT bearer assertion grant (RFC 7523).
//!
//! The assertion carries generated `exp`, `nbf`, `iat`, and `jti` claims merged with the
//! configured payload, where configured claims take precedence. It is always signed with RS256.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::Algorithm;
use uuid::Uuid;
// self
use crate::{
	_prelude::*,
	config::JwtGrant,
	error::ConfigError,
	flows::{GrantFuture, GrantStrategy, TokenClient, optional_scope_client_id},
	http::TokenForm,
};

/// `grant_type` of the JWT bearer grant.
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Lifetime of a signed assertion.
pub const JWT_EXPIRY_OFFSET: Duration = Duration::seconds(3600);
/// Backdating of `nbf` to tolerate clock skew.
pub const JWT_NOT_BEFORE_OFFSET: Duration = Duration::seconds(300);
/// `alg` header value of every assertion.
pub const JWT_SIGNING_ALGORITHM: &str = "RS256";

/// Strategy signing an assertion from a [`JwtGrant`].
#[derive(Clone, Copy, Debug)]
pub struct JwtStrategy<'g> {
	grant: &'g JwtGrant,
}
impl<'g> JwtStrategy<'g> {
	/// Wraps the configured grant.
	pub fn new(grant: &'g JwtGrant) -> Self {
		Self { grant }
	}

	/// Claims of the assertion issued at `now`.
	pub fn claims_at(&self, now: OffsetDateTime) -> JsonMap {
		let issued_at = now.unix_timestamp();
		let mut claims = JsonMap::new();

		claims.insert("exp".into(), (now + JWT_EXPIRY_OFFSET).unix_timestamp().into());
		claims.insert("nbf".into(), (now - JWT_NOT_BEFORE_OFFSET).unix_timestamp().into());
		claims.insert("iat".into(), issued_at.into());
		claims.insert("jti".into(), Uuid::new_v4().to_string().into());
		claims.extend(self.grant.payload.iter().map(|(k, v)| (k.clone(), v.clone())));

		claims
	}

	/// Assertion header: `{"typ":"JWT"}` with the configured overrides merged in and `alg`
	/// pinned to `RS256`.
	pub fn header(&self) -> JsonMap {
		let mut header = JsonMap::new();

		header.insert("typ".into(), "JWT".into());

		for (name, value) in &self.grant.headers {
			if name == "alg" {
				tracing::debug!("Ignoring JWT algorithm override; assertions use RS256.");

				continue;
			}

			header.insert(name.clone(), value.clone());
		}

		header.insert("alg".into(), JWT_SIGNING_ALGORITHM.into());

		header
	}

	/// Signs the assertion issued at `now`.
	pub fn assertion_at(&self, now: OffsetDateTime) -> Result<String, ConfigError> {
		let header = JsonValue::Object(self.header()).to_string();
		let claims = JsonValue::Object(self.claims_at(now)).to_string();
		let message =
			format!("{}.{}", URL_SAFE_NO_PAD.encode(header), URL_SAFE_NO_PAD.encode(claims));
		let signature = jsonwebtoken::crypto::sign(
			message.as_bytes(),
			self.grant.signing_key.encoding_key(),
			Algorithm::RS256,
		)
		.map_err(|source| ConfigError::JwtSign { source })?;

		Ok(format!("{message}.{signature}"))
	}
}
impl GrantStrategy for JwtStrategy<'_> {
	fn token_params<'a>(&'a self, client: &'a TokenClient) -> GrantFuture<'a, TokenForm> {
		Box::pin(async move {
			let assertion = self.assertion_at(OffsetDateTime::now_utc())?;
			let mut form = TokenForm::new();

			form.insert("grant_type".into(), JWT_BEARER_GRANT.into());
			form.insert("assertion".into(), assertion);
			optional_scope_client_id(client.config(), &mut form, false);

			Ok(form)
		})
	}
}
