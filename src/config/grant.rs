//! Grant selection and the per-grant settings carried by [`OAuthConfig`](super::OAuthConfig).

// crates.io
use jsonwebtoken::EncodingKey;
// self
use crate::{_prelude::*, error::ConfigError};

/// Tag of the generic grant.
pub const GENERIC_GRANT_TAG: &str = "generic";
/// Tag of the browser-based authorization code grant.
pub const WEB_GRANT_TAG: &str = "web";
/// Tag of the JWT bearer assertion grant.
pub const JWT_GRANT_TAG: &str = "jwt";
/// Tag used for refresh attempts; never user-selectable.
pub const REFRESH_GRANT_TAG: &str = "refresh";
/// Tags owned by built-in grants; custom grants may not reuse them.
pub const RESERVED_GRANT_TAGS: [&str; 4] =
	[GENERIC_GRANT_TAG, WEB_GRANT_TAG, JWT_GRANT_TAG, REFRESH_GRANT_TAG];

/// Default authorize endpoint path, relative to the base URL.
pub const DEFAULT_PATH_AUTHORIZE: &str = "authorize";
/// Default time the web grant waits for the browser callback.
pub const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::seconds(120);

/// Grant used to create new tokens.
#[derive(Clone, Debug)]
pub enum GrantConfig {
	/// Arbitrary form parameters submitted verbatim.
	Generic(BTreeMap<String, String>),
	/// Authorization code obtained through the user's browser.
	Web(WebGrant),
	/// RFC 7523 bearer assertion signed with RS256.
	Jwt(JwtGrant),
	/// Caller-registered grant resolved by name at client construction.
	Custom(String),
}
impl GrantConfig {
	/// Grant tag (`crtype`) used for dispatch and as a cache identity element.
	pub fn tag(&self) -> &str {
		match self {
			Self::Generic(_) => GENERIC_GRANT_TAG,
			Self::Web(_) => WEB_GRANT_TAG,
			Self::Jwt(_) => JWT_GRANT_TAG,
			Self::Custom(tag) => tag,
		}
	}
}

/// RSA private key used to sign JWT assertions.
#[derive(Clone)]
pub struct JwtSigningKey(EncodingKey);
impl JwtSigningKey {
	/// Loads a PEM-encoded RSA private key (PKCS#1 or PKCS#8).
	pub fn from_rsa_pem(pem: impl AsRef<[u8]>) -> Result<Self, ConfigError> {
		EncodingKey::from_rsa_pem(pem.as_ref())
			.map(Self)
			.map_err(|source| ConfigError::InvalidSigningKey { source })
	}

	/// Underlying `jsonwebtoken` key.
	pub fn encoding_key(&self) -> &EncodingKey {
		&self.0
	}
}
impl From<EncodingKey> for JwtSigningKey {
	fn from(key: EncodingKey) -> Self {
		Self(key)
	}
}
impl Debug for JwtSigningKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("JwtSigningKey").field(&"<redacted>").finish()
	}
}

/// Settings of the JWT bearer grant.
#[derive(Clone, Debug)]
pub struct JwtGrant {
	/// Key signing the assertion.
	pub signing_key: JwtSigningKey,
	/// Caller claims; they override the generated `exp`, `nbf`, `iat`, and `jti`.
	pub payload: JsonMap,
	/// Header overrides merged over `{"typ":"JWT"}`; `alg` always stays `RS256`.
	pub headers: JsonMap,
}
impl JwtGrant {
	/// Creates a grant without claims or header overrides.
	pub fn new(signing_key: JwtSigningKey) -> Self {
		Self { signing_key, payload: JsonMap::new(), headers: JsonMap::new() }
	}

	/// Adds a payload claim.
	pub fn claim(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
		self.payload.insert(name.into(), value.into());

		self
	}

	/// Adds a header override such as `kid` or `x5c`.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}
}

/// Settings of the browser-based authorization code grant.
#[derive(Clone, Debug)]
pub struct WebGrant {
	redirect_uri: Url,
	path_authorize: String,
	callback_timeout: Duration,
}
impl WebGrant {
	/// Validates `redirect_uri` and creates a grant with default settings.
	///
	/// The URI must use `http` or `https` and carry an explicit port since the callback listener
	/// binds to it.
	pub fn new(redirect_uri: impl AsRef<str>) -> Result<Self, ConfigError> {
		let raw = redirect_uri.as_ref().trim();

		if raw.is_empty() {
			return Err(ConfigError::MissingRedirectUri);
		}

		let redirect_uri = Url::parse(raw)
			.map_err(|source| ConfigError::InvalidUrl { field: "redirect", source })?;

		if !matches!(redirect_uri.scheme(), "http" | "https") {
			return Err(ConfigError::UnsupportedScheme {
				field: "redirect",
				url: redirect_uri.to_string(),
			});
		}
		if redirect_uri.port().is_none() {
			return Err(ConfigError::MissingRedirectPort { url: redirect_uri.to_string() });
		}

		Ok(Self {
			redirect_uri,
			path_authorize: DEFAULT_PATH_AUTHORIZE.into(),
			callback_timeout: DEFAULT_CALLBACK_TIMEOUT,
		})
	}

	/// Overrides the authorize endpoint path.
	pub fn with_path_authorize(mut self, path: impl Into<String>) -> Self {
		self.path_authorize = path.into();

		self
	}

	/// Overrides how long to wait for the callback; negative values clamp to zero.
	pub fn with_callback_timeout(mut self, timeout: Duration) -> Self {
		self.callback_timeout = timeout.max(Duration::ZERO);

		self
	}

	/// Redirect URI registered with the authorization server.
	pub fn redirect_uri(&self) -> &Url {
		&self.redirect_uri
	}

	/// Authorize endpoint path relative to the base URL.
	pub fn path_authorize(&self) -> &str {
		&self.path_authorize
	}

	/// Maximum wait for the browser callback.
	pub fn callback_timeout(&self) -> Duration {
		self.callback_timeout
	}
}
