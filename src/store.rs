//! Token persistence: the [`TokenStore`] backend contract, the built-in backends, and the
//! [`TokenCache`] wrapper the client talks to.
//!
//! Entries are the raw token endpoint responses, stored byte-for-byte under a [`CacheKey`].
//! Stores record when each entry was written so stale entries can be garbage collected by
//! category, independently of the token's own expiry.

pub mod file;
pub mod memory;
pub mod noop;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use noop::NoopStore;

// self
use crate::{
	_prelude::*,
	auth::{CacheKey, TOKEN_CATEGORY, TokenRecord},
};

/// Age after which cached tokens are discarded by the start-up sweep.
pub const TOKEN_CACHE_TTL: Duration = Duration::seconds(1800);

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Key-value backend persisting raw token responses.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Returns the bytes stored under `key`, if any.
	fn get<'a>(&'a self, key: &'a CacheKey) -> StoreFuture<'a, Option<Vec<u8>>>;

	/// Stores `value` under `key`, replacing any previous entry and resetting its age.
	fn put<'a>(&'a self, key: &'a CacheKey, value: Vec<u8>) -> StoreFuture<'a, ()>;

	/// Removes the entry under `key`; returns `true` if one existed.
	fn delete<'a>(&'a self, key: &'a CacheKey) -> StoreFuture<'a, bool>;

	/// Removes entries of `category` older than `max_age`, or all of them when `max_age` is
	/// `None`. Returns the number of removed entries.
	fn garbage_collect<'a>(
		&'a self,
		category: &'a str,
		max_age: Option<Duration>,
	) -> StoreFuture<'a, usize>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Token-level view over a [`TokenStore`].
///
/// Parses entries into [`TokenRecord`]s on the way out and persists raw response bytes on the
/// way in.
#[derive(Clone)]
pub struct TokenCache {
	store: Arc<dyn TokenStore>,
}
impl TokenCache {
	/// Wraps `store` without sweeping it.
	pub fn new(store: Arc<dyn TokenStore>) -> Self {
		Self { store }
	}

	/// Wraps `store` and discards token entries older than [`TOKEN_CACHE_TTL`].
	pub async fn open(store: Arc<dyn TokenStore>) -> Result<Self> {
		let cache = Self::new(store);
		let removed = cache.store.garbage_collect(TOKEN_CATEGORY, Some(TOKEN_CACHE_TTL)).await?;

		if removed > 0 {
			tracing::debug!(removed, "Discarded stale cached tokens.");
		}

		Ok(cache)
	}

	/// Cache backed by [`NoopStore`]; every lookup misses.
	pub fn disabled() -> Self {
		Self::new(Arc::new(NoopStore))
	}

	/// Underlying backend.
	pub fn store(&self) -> &Arc<dyn TokenStore> {
		&self.store
	}

	/// Loads the record under `key`.
	///
	/// Entries that no longer parse as a JSON object are deleted and reported as absent.
	pub async fn load(&self, key: &CacheKey) -> Result<Option<TokenRecord>> {
		let Some(raw) = self.store.get(key).await? else {
			return Ok(None);
		};

		match TokenRecord::from_slice(raw) {
			Ok(record) => Ok(Some(record)),
			Err(e) => {
				tracing::warn!(key = %key, error = %e, "Discarding unreadable cached token.");

				self.store.delete(key).await?;

				Ok(None)
			},
		}
	}

	/// Persists `record` under `key`.
	pub async fn save(&self, key: &CacheKey, record: &TokenRecord) -> Result<()> {
		self.store.put(key, record.as_bytes().to_vec()).await?;

		Ok(())
	}

	/// Removes the record under `key`; returns `true` if one existed.
	pub async fn remove(&self, key: &CacheKey) -> Result<bool> {
		Ok(self.store.delete(key).await?)
	}

	/// Removes every cached token regardless of age.
	pub async fn flush_tokens(&self) -> Result<usize> {
		Ok(self.store.garbage_collect(TOKEN_CATEGORY, None).await?)
	}
}
impl Default for TokenCache {
	fn default() -> Self {
		Self::disabled()
	}
}
impl Debug for TokenCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TokenCache(..)")
	}
}

/// Returns `true` if an entry written at `stored_at` should be collected at `now`.
pub(crate) fn is_collectable(
	stored_at: OffsetDateTime,
	now: OffsetDateTime,
	max_age: Option<Duration>,
) -> bool {
	max_age.is_none_or(|max_age| now - stored_at > max_age)
}
