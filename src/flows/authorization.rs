//! Orchestration of [`TokenClient::get_authorization`].
//!
//! 1. Load the cached record for the credential's key.
//! 2. Unless forced, decode the cached access token and force a renewal when it expires within
//!    the guard window.
//! 3. When renewing, capture the refresh token, drop the cached record, and try the refresh.
//! 4. Without a usable record, create one with the configured grant.
//! 5. Validate the token field, persist new records, and return the bearer value.

// self
use crate::{
	_prelude::*,
	auth::{CacheKey, TokenRecord, TokenSecret},
	config::GrantConfig,
	error::ProtocolError,
	flows::{
		AuthorizationRequest, GenericStrategy, GrantStrategy, JwtStrategy, TokenClient,
		WebStrategy,
	},
	http::TokenForm,
	obs::{self, FlowOutcome, FlowSpan},
};

impl TokenClient {
	/// Returns the `Authorization` header value (`Bearer <token>`) for the credential.
	pub async fn get_authorization(&self, request: AuthorizationRequest) -> Result<TokenSecret> {
		let kind = self.flow_kind();
		let span = FlowSpan::new(kind, "get_authorization");

		obs::record_flow_outcome(kind, FlowOutcome::Attempt);
		self.metrics.record_attempt();

		let result = span.instrument(self.authorize(request)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(kind, FlowOutcome::Success),
			Err(e) => {
				tracing::warn!(error = %e, "Token acquisition failed.");
				obs::record_flow_outcome(kind, FlowOutcome::Failure);
				self.metrics.record_failure();
			},
		}

		result
	}

	/// Shorthand for [`get_authorization`](Self::get_authorization) with default options.
	pub async fn bearer(&self) -> Result<TokenSecret> {
		self.get_authorization(AuthorizationRequest::new()).await
	}

	async fn authorize(&self, request: AuthorizationRequest) -> Result<TokenSecret> {
		let key = self.cache_key();
		let field = self.config.token_field();
		let cached = self.load_usable(&key).await?;
		let renew = match &cached {
			Some(record) if !request.force => {
				let claims = record
					.access_token(field)
					.and_then(|token| self.decoders.decode(token.expose()));

				if claims.is_none() {
					tracing::debug!("Cached token carries no decodable expiry.");
				}

				request.should_refresh(claims.as_ref(), OffsetDateTime::now_utc())
			},
			_ => request.force,
		};
		let mut record = if renew { None } else { cached.clone() };

		if renew {
			let refresh_token = cached.as_ref().and_then(TokenRecord::refresh_token);

			self.cache.remove(&key).await?;

			if let Some(refresh_token) = refresh_token {
				record = self.refresh_record(&refresh_token).await?;

				if let Some(refreshed) = &record {
					self.cache.save(&key, refreshed).await?;
				}
			}
		} else if record.is_some() {
			obs::record_flow_outcome(self.flow_kind(), FlowOutcome::CacheHit);
			self.metrics.record_cache_hit();
		}

		let record = match record {
			Some(record) => record,
			None => self.create_record(&key).await?,
		};
		let token = record
			.access_token(field)
			.ok_or_else(|| ProtocolError::MissingTokenField { field: field.to_owned() })?;

		Ok(TokenSecret::bearer(&token))
	}

	async fn load_usable(&self, key: &CacheKey) -> Result<Option<TokenRecord>> {
		let field = self.config.token_field();

		match self.cache.load(key).await? {
			Some(record) if record.access_token(field).is_none() => {
				tracing::warn!(field, "Discarding cached token without the token field.");

				self.cache.remove(key).await?;

				Ok(None)
			},
			cached => Ok(cached),
		}
	}

	async fn create_record(&self, key: &CacheKey) -> Result<TokenRecord> {
		let form = self.grant_params().await?;
		let response = self.submit(&form).await?;

		if !response.is_success() {
			return Err(Error::AuthFailure {
				grant: self.config.grant().tag().to_owned(),
				status: response.status,
				body: response.body_preview(),
				retry_after: response.retry_after,
			});
		}

		let record = TokenRecord::from_response(&response)?;
		let field = self.config.token_field();

		if record.access_token(field).is_none() {
			return Err(ProtocolError::MissingTokenField { field: field.to_owned() }.into());
		}

		self.cache.save(key, &record).await?;
		self.metrics.record_creation();

		Ok(record)
	}

	async fn grant_params(&self) -> Result<TokenForm> {
		match self.config.grant() {
			GrantConfig::Generic(params) => GenericStrategy::new(params).token_params(self).await,
			GrantConfig::Jwt(grant) => JwtStrategy::new(grant).token_params(self).await,
			GrantConfig::Web(grant) => WebStrategy::new(grant).token_params(self).await,
			GrantConfig::Custom(tag) => self.grants.resolve(tag)?.token_params(self).await,
		}
	}
}
