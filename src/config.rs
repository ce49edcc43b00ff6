//! Immutable per-credential configuration consumed by the token client.
//!
//! An [`OAuthConfig`] describes one logical credential: where the token endpoint lives, which
//! grant creates new tokens, and the optional client and identity parameters. It is produced once
//! by [`OAuthConfigBuilder`] and never mutated afterwards; [`OAuthConfig::with_scope`] and
//! [`OAuthConfig::with_client_id`] return adjusted copies instead.

pub mod builder;
pub mod grant;

pub use builder::*;
pub use grant::*;

// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};

/// Default token endpoint path, relative to the base URL.
pub const DEFAULT_PATH_TOKEN: &str = "token";
/// Default name of the response field holding the access token.
pub const DEFAULT_TOKEN_FIELD: &str = "access_token";

/// Validated configuration of one credential.
#[derive(Clone, Debug)]
pub struct OAuthConfig {
	pub(crate) base_url: Url,
	pub(crate) token_endpoint: Url,
	pub(crate) grant: GrantConfig,
	pub(crate) client_id: Option<String>,
	pub(crate) client_secret: Option<TokenSecret>,
	pub(crate) scope: Option<String>,
	pub(crate) username: Option<String>,
	pub(crate) public_link_token: Option<String>,
	pub(crate) path_token: String,
	pub(crate) token_field: String,
}
impl OAuthConfig {
	/// Returns a builder with default paths and field names.
	pub fn builder() -> OAuthConfigBuilder {
		OAuthConfigBuilder::default()
	}

	/// Copy of the configuration requesting `scope`.
	pub fn with_scope(&self, scope: impl Into<String>) -> Self {
		Self { scope: Some(scope.into()), ..self.clone() }
	}

	/// Copy of the configuration identifying as `client_id`.
	pub fn with_client_id(&self, client_id: impl Into<String>) -> Self {
		Self { client_id: Some(client_id.into()), ..self.clone() }
	}

	/// Resolves `path` against the base URL (`<base_url>/<path>`).
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		join_endpoint(&self.base_url, path)
	}

	/// Base URL of the authorization server.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Token endpoint (`<base_url>/<path_token>`).
	pub fn token_endpoint(&self) -> &Url {
		&self.token_endpoint
	}

	/// Grant creating new tokens.
	pub fn grant(&self) -> &GrantConfig {
		&self.grant
	}

	/// OAuth client identifier.
	pub fn client_id(&self) -> Option<&str> {
		self.client_id.as_deref()
	}

	/// OAuth client secret.
	pub fn client_secret(&self) -> Option<&TokenSecret> {
		self.client_secret.as_ref()
	}

	/// Requested scope.
	pub fn scope(&self) -> Option<&str> {
		self.scope.as_deref()
	}

	/// Username the credential acts for.
	pub fn username(&self) -> Option<&str> {
		self.username.as_deref()
	}

	/// URL token of the public link the credential was derived from.
	pub fn public_link_token(&self) -> Option<&str> {
		self.public_link_token.as_deref()
	}

	/// Token endpoint path relative to the base URL.
	pub fn path_token(&self) -> &str {
		&self.path_token
	}

	/// Response field holding the access token.
	pub fn token_field(&self) -> &str {
		&self.token_field
	}
}

pub(crate) fn join_endpoint(base_url: &Url, path: &str) -> Result<Url, ConfigError> {
	let joined =
		format!("{}/{}", base_url.as_str().trim_end_matches('/'), path.trim_start_matches('/'));

	Url::parse(&joined).map_err(|source| ConfigError::InvalidUrl { field: "endpoint", source })
}
