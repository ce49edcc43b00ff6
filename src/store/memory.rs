//! Thread-safe in-memory [`TokenStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::CacheKey,
	store::{StoreFuture, TokenStore, is_collectable},
};

#[derive(Clone, Debug)]
struct Entry {
	value: Vec<u8>,
	stored_at: OffsetDateTime,
}

type StoreMap = Arc<RwLock<HashMap<CacheKey, Entry>>>;

/// Thread-safe storage backend that keeps entries in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Inserts an entry with an explicit write instant.
	pub fn insert_at(&self, key: CacheKey, value: Vec<u8>, stored_at: OffsetDateTime) {
		self.0.write().insert(key, Entry { value, stored_at });
	}

	/// Number of stored entries.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when the store holds no entry.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn collect_now(map: &StoreMap, category: &str, max_age: Option<Duration>) -> usize {
		let now = OffsetDateTime::now_utc();
		let mut guard = map.write();
		let before = guard.len();

		guard.retain(|key, entry| {
			!(key.is_in_category(category) && is_collectable(entry.stored_at, now, max_age))
		});

		before - guard.len()
	}
}
impl TokenStore for MemoryStore {
	fn get<'a>(&'a self, key: &'a CacheKey) -> StoreFuture<'a, Option<Vec<u8>>> {
		Box::pin(async move { Ok(self.0.read().get(key).map(|entry| entry.value.clone())) })
	}

	fn put<'a>(&'a self, key: &'a CacheKey, value: Vec<u8>) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			self.insert_at(key.clone(), value, OffsetDateTime::now_utc());

			Ok(())
		})
	}

	fn delete<'a>(&'a self, key: &'a CacheKey) -> StoreFuture<'a, bool> {
		Box::pin(async move { Ok(self.0.write().remove(key).is_some()) })
	}

	fn garbage_collect<'a>(
		&'a self,
		category: &'a str,
		max_age: Option<Duration>,
	) -> StoreFuture<'a, usize> {
		Box::pin(async move { Ok(Self::collect_now(&self.0, category, max_age)) })
	}
}
