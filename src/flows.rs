//! Token client and the grant flows it orchestrates.
//!
//! [`TokenClient`] owns everything one credential needs: its configuration, the HTTP transport,
//! the token cache, the decoder and custom-grant registries, and the browser launcher used by the
//! web grant. Collaborators are injected through [`TokenClientBuilder`] so tests can swap any of
//! them without touching process-wide state.

pub mod common;
pub mod generic;
pub mod jwt;
pub mod metrics;
pub mod refresh;
pub mod strategy;
pub mod web;

mod authorization;

pub use common::*;
pub use generic::*;
pub use jwt::*;
pub use metrics::*;
pub use refresh::*;
pub use strategy::*;
pub use web::*;

// self
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;
use crate::{
	_prelude::*,
	auth::CacheKey,
	config::{GrantConfig, OAuthConfig},
	decode::DecoderRegistry,
	error::ConfigError,
	http::TokenHttpClient,
	obs::FlowKind,
	store::TokenCache,
};

/// Acquires, caches, and renews the access token of one credential.
///
/// Calls are strictly sequential within one [`get_authorization`](Self::get_authorization)
/// invocation. Nothing serializes concurrent invocations: two callers missing the cache at the
/// same time both create a token and the last write wins.
#[derive(Clone)]
pub struct TokenClient {
	config: OAuthConfig,
	http_client: Arc<dyn TokenHttpClient>,
	cache: TokenCache,
	decoders: Arc<DecoderRegistry>,
	grants: Arc<GrantRegistry>,
	browser: Arc<dyn BrowserLauncher>,
	metrics: Arc<FlowMetrics>,
}
impl TokenClient {
	/// Creates a builder for `config` with default collaborators.
	pub fn builder(config: OAuthConfig) -> TokenClientBuilder {
		TokenClientBuilder::new(config)
	}

	/// Creates a client with the default transport, a disabled cache, and default registries.
	pub fn new(config: OAuthConfig) -> Result<Self> {
		Self::builder(config).build()
	}

	/// Configuration of the credential.
	pub fn config(&self) -> &OAuthConfig {
		&self.config
	}

	/// Token cache.
	pub fn cache(&self) -> &TokenCache {
		&self.cache
	}

	/// Decoders consulted to estimate cached token expiry.
	pub fn decoders(&self) -> &DecoderRegistry {
		&self.decoders
	}

	/// Registered custom grants.
	pub fn grants(&self) -> &GrantRegistry {
		&self.grants
	}

	/// Browser launcher used by the web grant.
	pub fn browser(&self) -> &dyn BrowserLauncher {
		self.browser.as_ref()
	}

	/// HTTP transport used for token endpoint calls.
	pub fn http_client(&self) -> &Arc<dyn TokenHttpClient> {
		&self.http_client
	}

	/// Counters describing how authorizations were served.
	pub fn metrics(&self) -> &FlowMetrics {
		&self.metrics
	}

	/// Cache key of the credential.
	pub fn cache_key(&self) -> CacheKey {
		CacheKey::for_config(&self.config)
	}

	/// Deletes the cached token of this credential; returns `true` if one existed.
	pub async fn invalidate(&self) -> Result<bool> {
		self.cache.remove(&self.cache_key()).await
	}

	/// Deletes every cached token in the shared cache.
	pub async fn flush_tokens(&self) -> Result<usize> {
		self.cache.flush_tokens().await
	}

	fn flow_kind(&self) -> FlowKind {
		match self.config.grant() {
			GrantConfig::Generic(_) => FlowKind::Generic,
			GrantConfig::Web(_) => FlowKind::Web,
			GrantConfig::Jwt(_) => FlowKind::Jwt,
			GrantConfig::Custom(_) => FlowKind::Custom,
		}
	}
}
impl Debug for TokenClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenClient")
			.field("token_endpoint", &self.config.token_endpoint().as_str())
			.field("grant", &self.config.grant().tag())
			.field("decoders", &self.decoders)
			.field("grants", &self.grants)
			.finish()
	}
}

/// Builder for [`TokenClient`] values.
pub struct TokenClientBuilder {
	config: OAuthConfig,
	http_client: Option<Arc<dyn TokenHttpClient>>,
	cache: TokenCache,
	decoders: DecoderRegistry,
	grants: GrantRegistry,
	browser: Arc<dyn BrowserLauncher>,
}
impl TokenClientBuilder {
	fn new(config: OAuthConfig) -> Self {
		Self {
			config,
			http_client: None,
			cache: TokenCache::default(),
			decoders: DecoderRegistry::default(),
			grants: GrantRegistry::default(),
			browser: Arc::new(SystemBrowser),
		}
	}

	/// Uses `client` for token endpoint calls.
	pub fn http_client<C>(self, client: C) -> Self
	where
		C: TokenHttpClient,
	{
		self.shared_http_client(Arc::new(client))
	}

	/// Uses an already shared transport for token endpoint calls.
	pub fn shared_http_client(mut self, client: Arc<dyn TokenHttpClient>) -> Self {
		self.http_client = Some(client);

		self
	}

	/// Persists tokens through `cache` (disabled by default).
	pub fn cache(mut self, cache: TokenCache) -> Self {
		self.cache = cache;

		self
	}

	/// Replaces the decoder registry.
	pub fn decoders(mut self, decoders: DecoderRegistry) -> Self {
		self.decoders = decoders;

		self
	}

	/// Replaces the custom grant registry.
	pub fn grants(mut self, grants: GrantRegistry) -> Self {
		self.grants = grants;

		self
	}

	/// Replaces the browser launcher used by the web grant.
	pub fn browser<B>(mut self, browser: B) -> Self
	where
		B: 'static + BrowserLauncher,
	{
		self.browser = Arc::new(browser);

		self
	}

	/// Validates the collaborators and produces the client.
	pub fn build(self) -> Result<TokenClient> {
		if let GrantConfig::Custom(tag) = self.config.grant() {
			self.grants.resolve(tag)?;
		}

		let http_client = match self.http_client {
			Some(client) => client,
			None => default_http_client()?,
		};

		Ok(TokenClient {
			config: self.config,
			http_client,
			cache: self.cache,
			decoders: Arc::new(self.decoders),
			grants: Arc::new(self.grants),
			browser: self.browser,
			metrics: Default::default(),
		})
	}
}
impl Debug for TokenClientBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenClientBuilder")
			.field("grant", &self.config.grant().tag())
			.field("http_client_set", &self.http_client.is_some())
			.field("decoders", &self.decoders)
			.field("grants", &self.grants)
			.finish()
	}
}

#[cfg(feature = "reqwest")]
fn default_http_client() -> Result<Arc<dyn TokenHttpClient>, ConfigError> {
	let client = ReqwestClient::builder().redirect(reqwest::redirect::Policy::none()).build()?;

	Ok(Arc::new(ReqwestHttpClient::with_client(client)))
}

#[cfg(not(feature = "reqwest"))]
fn default_http_client() -> Result<Arc<dyn TokenHttpClient>, ConfigError> {
	Err(ConfigError::MissingHttpClient)
}
