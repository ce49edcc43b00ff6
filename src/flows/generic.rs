//! Generic grant: configured form parameters submitted verbatim.

// self
use crate::{
	_prelude::*,
	flows::{GrantFuture, GrantStrategy, TokenClient},
	http::TokenForm,
};

/// Strategy submitting the configured generic parameters unchanged.
#[derive(Clone, Copy, Debug)]
pub struct GenericStrategy<'g> {
	params: &'g BTreeMap<String, String>,
}
impl<'g> GenericStrategy<'g> {
	/// Wraps the configured parameters.
	pub fn new(params: &'g BTreeMap<String, String>) -> Self {
		Self { params }
	}
}
impl GrantStrategy for GenericStrategy<'_> {
	fn token_params<'a>(&'a self, _: &'a TokenClient) -> GrantFuture<'a, TokenForm> {
		let form = self.params.clone();

		Box::pin(async move { Ok(form) })
	}
}
