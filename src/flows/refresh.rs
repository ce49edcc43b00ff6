//! Refresh token exchange with silent fallback.
//!
//! A refresh that fails for any reason other than local storage (transport failure, non-2xx
//! status, unusable body) is logged and reported as `None`, letting the caller recreate the token
//! with the configured grant instead of surfacing the error.

// self
use crate::{
	_prelude::*,
	auth::{TokenRecord, TokenSecret},
	flows::{GrantFuture, GrantStrategy, TokenClient, optional_scope_client_id},
	http::TokenForm,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Strategy exchanging a refresh token for a new token response.
#[derive(Clone, Copy, Debug)]
pub struct RefreshStrategy<'t> {
	refresh_token: &'t TokenSecret,
}
impl<'t> RefreshStrategy<'t> {
	/// Wraps the refresh token captured from the cached record.
	pub fn new(refresh_token: &'t TokenSecret) -> Self {
		Self { refresh_token }
	}
}
impl GrantStrategy for RefreshStrategy<'_> {
	fn token_params<'a>(&'a self, client: &'a TokenClient) -> GrantFuture<'a, TokenForm> {
		Box::pin(async move {
			let mut form = TokenForm::new();

			form.insert("grant_type".into(), "refresh_token".into());
			form.insert("refresh_token".into(), self.refresh_token.expose().into());
			optional_scope_client_id(client.config(), &mut form, false);

			Ok(form)
		})
	}
}

impl TokenClient {
	/// Exchanges `refresh_token`; `None` means the refresh failed and the token must be recreated.
	pub(crate) async fn refresh_record(
		&self,
		refresh_token: &TokenSecret,
	) -> Result<Option<TokenRecord>> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh_record");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let record = span
			.instrument(async move {
				let form = RefreshStrategy::new(refresh_token).token_params(self).await?;
				let response = match self.submit(&form).await {
					Ok(response) => response,
					Err(e) => {
						tracing::warn!(error = %e, "Refresh request failed; recreating the token.");

						return Ok(None);
					},
				};

				if !response.is_success() {
					tracing::info!(
						status = response.status,
						body = %response.body_preview(),
						"Refresh rejected; recreating the token."
					);

					return Ok(None);
				}

				let record = match TokenRecord::from_response(&response) {
					Ok(record) => record,
					Err(e) => {
						tracing::warn!(error = %e, "Refresh response unusable; recreating the token.");

						return Ok(None);
					},
				};

				if record.access_token(self.config.token_field()).is_none() {
					tracing::warn!(
						field = self.config.token_field(),
						"Refresh response lacks the token field; recreating the token."
					);

					return Ok(None);
				}

				Ok::<_, Error>(Some(record))
			})
			.await?;

		match &record {
			Some(_) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
				self.metrics.record_refresh();
			},
			None => {
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				self.metrics.record_refresh_failure();
			},
		}

		Ok(record)
	}
}
