//! Null-object [`TokenStore`] used when caching is disabled.

// self
use crate::{
	_prelude::*,
	auth::CacheKey,
	store::{StoreFuture, TokenStore},
};

/// Store that keeps nothing: reads always miss and writes are discarded.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopStore;
impl TokenStore for NoopStore {
	fn get<'a>(&'a self, _: &'a CacheKey) -> StoreFuture<'a, Option<Vec<u8>>> {
		Box::pin(async { Ok(None) })
	}

	fn put<'a>(&'a self, _: &'a CacheKey, _: Vec<u8>) -> StoreFuture<'a, ()> {
		Box::pin(async { Ok(()) })
	}

	fn delete<'a>(&'a self, _: &'a CacheKey) -> StoreFuture<'a, bool> {
		Box::pin(async { Ok(false) })
	}

	fn garbage_collect<'a>(&'a self, _: &'a str, _: Option<Duration>) -> StoreFuture<'a, usize> {
		Box::pin(async { Ok(0) })
	}
}
