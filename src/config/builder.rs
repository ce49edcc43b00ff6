//! Builder validating [`OAuthConfig`](crate::config::OAuthConfig) values.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	config::{
		DEFAULT_PATH_TOKEN, DEFAULT_TOKEN_FIELD, GrantConfig, JwtGrant, OAuthConfig,
		RESERVED_GRANT_TAGS, WebGrant, join_endpoint,
	},
	error::ConfigError,
};

/// Builder for [`OAuthConfig`] values.
#[derive(Debug)]
pub struct OAuthConfigBuilder {
	/// Base URL of the authorization server (mandatory).
	pub base_url: Option<String>,
	/// Grant creating new tokens (mandatory).
	pub grant: Option<GrantConfig>,
	/// OAuth client identifier.
	pub client_id: Option<String>,
	/// OAuth client secret.
	pub client_secret: Option<TokenSecret>,
	/// Requested scope.
	pub scope: Option<String>,
	/// Username the credential acts for.
	pub username: Option<String>,
	/// URL token of a public link.
	pub public_link_token: Option<String>,
	/// Token endpoint path relative to the base URL.
	pub path_token: String,
	/// Response field holding the access token.
	pub token_field: String,
}
impl OAuthConfigBuilder {
	/// Sets the base URL.
	pub fn base_url(mut self, url: impl Into<String>) -> Self {
		self.base_url = Some(url.into());

		self
	}

	/// Selects the grant.
	pub fn grant(mut self, grant: GrantConfig) -> Self {
		self.grant = Some(grant);

		self
	}

	/// Selects the generic grant (if needed) and adds one of its form parameters.
	pub fn generic_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		match &mut self.grant {
			Some(GrantConfig::Generic(params)) => {
				params.insert(name.into(), value.into());
			},
			grant => {
				*grant = Some(GrantConfig::Generic(BTreeMap::from([(name.into(), value.into())])));
			},
		}

		self
	}

	/// Selects the JWT bearer grant.
	pub fn jwt(self, grant: JwtGrant) -> Self {
		self.grant(GrantConfig::Jwt(grant))
	}

	/// Selects the web grant.
	pub fn web(self, grant: WebGrant) -> Self {
		self.grant(GrantConfig::Web(grant))
	}

	/// Selects a custom grant registered under `tag`.
	pub fn custom(self, tag: impl Into<String>) -> Self {
		self.grant(GrantConfig::Custom(tag.into()))
	}

	/// Sets the client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = Some(client_id.into());

		self
	}

	/// Sets the client secret.
	pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(TokenSecret::new(secret));

		self
	}

	/// Sets the requested scope.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Sets the username the credential acts for.
	pub fn username(mut self, username: impl Into<String>) -> Self {
		self.username = Some(username.into());

		self
	}

	/// Sets the public link URL token.
	pub fn public_link_token(mut self, token: impl Into<String>) -> Self {
		self.public_link_token = Some(token.into());

		self
	}

	/// Overrides the token endpoint path.
	pub fn path_token(mut self, path: impl Into<String>) -> Self {
		self.path_token = path.into();

		self
	}

	/// Overrides the response field holding the access token.
	pub fn token_field(mut self, field: impl Into<String>) -> Self {
		self.token_field = field.into();

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<OAuthConfig, ConfigError> {
		let raw_base = self.base_url.as_deref().map(str::trim).unwrap_or_default();

		if raw_base.is_empty() {
			return Err(ConfigError::MissingBaseUrl);
		}

		let base_url =
			Url::parse(raw_base).map_err(|source| ConfigError::InvalidUrl { field: "base", source })?;

		if !matches!(base_url.scheme(), "http" | "https") {
			return Err(ConfigError::UnsupportedScheme { field: "base", url: base_url.to_string() });
		}

		let grant = self.grant.ok_or(ConfigError::MissingGrant)?;

		validate_grant(&base_url, &grant)?;

		let token_endpoint = join_endpoint(&base_url, &self.path_token)?;

		Ok(OAuthConfig {
			base_url,
			token_endpoint,
			grant,
			client_id: self.client_id,
			client_secret: self.client_secret,
			scope: self.scope,
			username: self.username,
			public_link_token: self.public_link_token,
			path_token: self.path_token,
			token_field: self.token_field,
		})
	}
}
impl Default for OAuthConfigBuilder {
	fn default() -> Self {
		Self {
			base_url: None,
			grant: None,
			client_id: None,
			client_secret: None,
			scope: None,
			username: None,
			public_link_token: None,
			path_token: DEFAULT_PATH_TOKEN.into(),
			token_field: DEFAULT_TOKEN_FIELD.into(),
		}
	}
}

fn validate_grant(base_url: &Url, grant: &GrantConfig) -> Result<(), ConfigError> {
	match grant {
		GrantConfig::Generic(_) => Ok(()),
		GrantConfig::Jwt(jwt) if jwt.payload.is_empty() => Err(ConfigError::MissingJwtPayload),
		GrantConfig::Jwt(_) => Ok(()),
		GrantConfig::Web(web) => join_endpoint(base_url, web.path_authorize()).map(|_| ()),
		GrantConfig::Custom(tag) if tag.is_empty() => Err(ConfigError::MissingGrant),
		GrantConfig::Custom(tag) if RESERVED_GRANT_TAGS.contains(&tag.as_str()) =>
			Err(ConfigError::ReservedGrantTag { tag: tag.clone() }),
		GrantConfig::Custom(_) => Ok(()),
	}
}
