//! Grant strategy contract and the registry of caller-supplied grants.
//!
//! A strategy turns the client's configuration into the form parameters submitted to the token
//! endpoint, performing any pre-work its grant needs (signing an assertion, collecting an
//! authorization code). Built-in grants are dispatched directly by the client; custom grants are
//! looked up by tag in a [`GrantRegistry`] handed to the client at construction.

// std
use std::future;
// self
use crate::{_prelude::*, error::ConfigError, flows::TokenClient, http::TokenForm};

/// Boxed future returned by [`GrantStrategy::token_params`].
pub type GrantFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Produces token endpoint form parameters for one grant.
///
/// Synchronous closures `Fn(&TokenClient) -> Result<TokenForm>` implement the trait, which is
/// the usual way to register a custom grant.
pub trait GrantStrategy
where
	Self: Send + Sync,
{
	/// Builds the form parameters, running the grant's pre-work first.
	fn token_params<'a>(&'a self, client: &'a TokenClient) -> GrantFuture<'a, TokenForm>;
}
impl<F> GrantStrategy for F
where
	F: Send + Sync + Fn(&TokenClient) -> Result<TokenForm>,
{
	fn token_params<'a>(&'a self, client: &'a TokenClient) -> GrantFuture<'a, TokenForm> {
		Box::pin(future::ready(self(client)))
	}
}

/// Custom grants keyed by their tag.
#[derive(Clone, Default)]
pub struct GrantRegistry {
	grants: HashMap<String, Arc<dyn GrantStrategy>>,
}
impl GrantRegistry {
	/// Registers `strategy` under `tag`, replacing any previous registration.
	pub fn register<S>(&mut self, tag: impl Into<String>, strategy: S) -> &mut Self
	where
		S: 'static + GrantStrategy,
	{
		self.grants.insert(tag.into(), Arc::new(strategy));

		self
	}

	/// Builder-style variant of [`register`](Self::register).
	pub fn with_grant<S>(mut self, tag: impl Into<String>, strategy: S) -> Self
	where
		S: 'static + GrantStrategy,
	{
		self.register(tag, strategy);

		self
	}

	/// Returns `true` if a grant is registered under `tag`.
	pub fn contains(&self, tag: &str) -> bool {
		self.grants.contains_key(tag)
	}

	/// Looks up the grant registered under `tag`.
	pub fn resolve(&self, tag: &str) -> Result<&Arc<dyn GrantStrategy>, ConfigError> {
		self.grants.get(tag).ok_or_else(|| ConfigError::UnknownGrant { tag: tag.to_owned() })
	}
}
impl Debug for GrantRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let mut tags = self.grants.keys().collect::<Vec<_>>();

		tags.sort();

		f.debug_struct("GrantRegistry").field("grants", &tags).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn unknown_tags_are_config_errors() {
		let registry = GrantRegistry::default()
			.with_grant("boot", |_: &TokenClient| -> Result<TokenForm> { Ok(TokenForm::new()) });

		assert!(registry.contains("boot"));
		assert!(registry.resolve("boot").is_ok());
		assert!(matches!(
			registry.resolve("missing"),
			Err(ConfigError::UnknownGrant { tag }) if tag == "missing"
		));
		assert_eq!(format!("{registry:?}"), "GrantRegistry { grants: [\"boot\"] }");
	}
}
