//! Browser-based authorization code grant (RFC 6749 section 4.1).
//!
//! The strategy binds a loopback listener on the redirect URI first, then opens the authorize
//! URL through the client's [`BrowserLauncher`] and waits for exactly one callback request,
//! bounded by the grant's callback timeout. The returned `state` must match the generated one
//! before the code is exchanged.

pub mod browser;
pub mod callback;

pub use browser::*;
pub use callback::*;

// crates.io
use uuid::Uuid;
// self
use crate::{
	_prelude::*,
	config::WebGrant,
	flows::{GrantFuture, GrantStrategy, TokenClient, optional_scope_client_id},
	http::TokenForm,
};

/// Strategy collecting an authorization code through the user's browser.
#[derive(Clone, Copy, Debug)]
pub struct WebStrategy<'g> {
	grant: &'g WebGrant,
}
impl<'g> WebStrategy<'g> {
	/// Wraps the configured grant.
	pub fn new(grant: &'g WebGrant) -> Self {
		Self { grant }
	}

	/// Authorize URL presented to the user for `state`.
	pub fn authorize_url(&self, client: &TokenClient, state: &str) -> Result<Url> {
		let config = client.config();
		let mut url = config.endpoint(self.grant.path_authorize())?;
		let mut params = TokenForm::new();

		params.insert("response_type".into(), "code".into());
		params.insert("redirect_uri".into(), self.grant.redirect_uri().as_str().into());
		params.insert("state".into(), state.into());
		optional_scope_client_id(config, &mut params, false);
		url.query_pairs_mut().extend_pairs(&params);

		Ok(url)
	}
}
impl GrantStrategy for WebStrategy<'_> {
	fn token_params<'a>(&'a self, client: &'a TokenClient) -> GrantFuture<'a, TokenForm> {
		Box::pin(async move {
			let state = Uuid::new_v4().to_string();
			let authorize_url = self.authorize_url(client, &state)?;
			let listener = CallbackListener::bind(self.grant.redirect_uri()).await?;

			client.browser().open(&authorize_url)?;

			let code =
				listener.accept_one(self.grant.callback_timeout()).await?.into_code(&state)?;
			let mut form = TokenForm::new();

			form.insert("grant_type".into(), "authorization_code".into());
			form.insert("code".into(), code);
			form.insert("redirect_uri".into(), self.grant.redirect_uri().as_str().into());
			optional_scope_client_id(client.config(), &mut form, true);

			Ok(form)
		})
	}
}
