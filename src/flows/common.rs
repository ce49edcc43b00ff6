//! Shared helpers for flow implementations (request options, optional form parameters, token
//! endpoint submission).

// self
use crate::{
	_prelude::*,
	auth::DecodedClaims,
	config::OAuthConfig,
	flows::TokenClient,
	http::{TokenForm, TokenHttpResponse},
};

/// Remaining lifetime below which a cached token is renewed instead of reused.
pub const DEFAULT_GUARD_WINDOW: Duration = Duration::seconds(120);

/// Options of a [`TokenClient::get_authorization`] call.
#[derive(Clone, Debug)]
pub struct AuthorizationRequest {
	/// Skips the cached token and refreshes (or recreates) it when true.
	pub force: bool,
	/// Guard window used when evaluating the cached token's expiry.
	pub guard_window: Duration,
}
impl AuthorizationRequest {
	/// Creates a request that reuses cached tokens when they are not about to expire.
	pub fn new() -> Self {
		Self { force: false, guard_window: DEFAULT_GUARD_WINDOW }
	}

	/// Forces a refresh, typically after an API rejected the current token.
	pub fn force_refresh(mut self) -> Self {
		self.force = true;

		self
	}

	/// Overrides the force flag.
	pub fn with_force(mut self, force: bool) -> Self {
		self.force = force;

		self
	}

	/// Overrides the guard window (defaults to 120 seconds).
	pub fn with_guard_window(mut self, window: Duration) -> Self {
		self.guard_window = if window.is_negative() { Duration::ZERO } else { window };

		self
	}

	/// Determines whether a cached token with the provided claims must be renewed.
	///
	/// Tokens without decodable expiry information are only renewed when forced.
	pub fn should_refresh(&self, claims: Option<&DecodedClaims>, now: OffsetDateTime) -> bool {
		if self.force {
			return true;
		}

		claims
			.and_then(|claims| claims.remaining_at(now))
			.is_some_and(|remaining| remaining < self.guard_window)
	}
}
impl Default for AuthorizationRequest {
	fn default() -> Self {
		Self::new()
	}
}

/// Adds the configured `scope` and `client_id` to `form`, plus `client_secret` when
/// `add_secret` is set and both client credentials are configured.
pub fn optional_scope_client_id(config: &OAuthConfig, form: &mut TokenForm, add_secret: bool) {
	if let Some(scope) = config.scope() {
		form.insert("scope".into(), scope.into());
	}
	if let Some(client_id) = config.client_id() {
		form.insert("client_id".into(), client_id.into());

		if let Some(secret) = config.client_secret().filter(|_| add_secret) {
			form.insert("client_secret".into(), secret.expose().into());
		}
	}
}

impl TokenClient {
	/// POSTs `form` to the token endpoint.
	pub(crate) async fn submit(&self, form: &TokenForm) -> Result<TokenHttpResponse> {
		let url = self.config.token_endpoint();

		tracing::debug!(%url, params = ?form.keys().collect::<Vec<_>>(), "Calling token endpoint.");

		Ok(self.http_client.post_form(url, form).await?)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn claims_expiring_in(now: OffsetDateTime, secs: i64) -> DecodedClaims {
		let mut map = JsonMap::new();

		map.insert("exp".into(), json!((now + Duration::seconds(secs)).unix_timestamp()));

		DecodedClaims::new(map)
	}

	#[test]
	fn guard_window_decides_refresh() {
		let now = OffsetDateTime::now_utc();
		let request = AuthorizationRequest::new();

		assert!(request.should_refresh(Some(&claims_expiring_in(now, 60)), now));
		assert!(request.should_refresh(Some(&claims_expiring_in(now, -10)), now));
		assert!(!request.should_refresh(Some(&claims_expiring_in(now, 600)), now));
		assert!(!request.should_refresh(None, now));
		assert!(!request.should_refresh(Some(&DecodedClaims::default()), now));
		assert!(request.clone().force_refresh().should_refresh(None, now));
	}

	#[test]
	fn negative_guard_window_clamps_to_zero() {
		let request = AuthorizationRequest::new().with_guard_window(Duration::seconds(-30));

		assert_eq!(request.guard_window, Duration::ZERO);
	}

	#[test]
	fn client_secret_requires_client_id_and_opt_in() {
		let base = OAuthConfig::builder()
			.base_url("https://api.example.com")
			.generic_param("grant_type", "client_credentials")
			.client_secret("s3cr3t")
			.scope("user:all")
			.build()
			.expect("Config fixture should build.");
		let mut without_id = TokenForm::new();

		optional_scope_client_id(&base, &mut without_id, true);

		assert_eq!(without_id.get("scope").map(String::as_str), Some("user:all"));
		assert!(!without_id.contains_key("client_secret"));

		let with_id = base.with_client_id("cli");
		let mut no_secret = TokenForm::new();
		let mut secret = TokenForm::new();

		optional_scope_client_id(&with_id, &mut no_secret, false);
		optional_scope_client_id(&with_id, &mut secret, true);

		assert_eq!(no_secret.get("client_id").map(String::as_str), Some("cli"));
		assert!(!no_secret.contains_key("client_secret"));
		assert_eq!(secret.get("client_secret").map(String::as_str), Some("s3cr3t"));
	}
}
