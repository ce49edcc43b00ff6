//! Simple file-backed [`TokenStore`] persisting tokens across process invocations.

// std
use std::{
	fs::{self, File},
	io::{ErrorKind, Write},
	path::{Path, PathBuf},
};
// crates.io
use uuid::Uuid;
// self
use crate::{
	_prelude::*,
	auth::{CacheKey, category_of},
	store::{StoreError, StoreFuture, TokenStore, is_collectable},
};

/// Keeps one file per key inside a directory, named after the key.
///
/// Every write replaces a single file through a temporary sibling and a rename, so processes
/// sharing the directory never overwrite each other's keys. The file's modification time is
/// the entry's age for garbage collection.
#[derive(Clone, Debug)]
pub struct FileStore {
	dir: PathBuf,
}
impl FileStore {
	/// Opens (or creates) a store rooted at the provided directory.
	pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let dir = dir.into();

		fs::create_dir_all(&dir).map_err(|e| StoreError::Backend {
			message: format!("Failed to create store directory {}: {e}", dir.display()),
		})?;

		Ok(Self { dir })
	}

	/// Directory holding the entry files.
	pub fn path(&self) -> &Path {
		&self.dir
	}

	fn entry_path(&self, key: &CacheKey) -> Result<PathBuf, StoreError> {
		let name = key.as_str();
		let portable = !name.is_empty()
			&& !name.starts_with('.')
			&& name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));

		if !portable {
			return Err(StoreError::Backend {
				message: format!("Cache key {name} cannot be used as a file name."),
			});
		}

		Ok(self.dir.join(name))
	}

	fn write_atomically(&self, path: &Path, value: &[u8]) -> Result<(), StoreError> {
		let tmp_path = self.dir.join(format!(".{}.tmp", Uuid::new_v4()));
		let written = File::create(&tmp_path)
			.and_then(|mut file| {
				file.write_all(value)?;
				file.sync_all()
			})
			.and_then(|()| fs::rename(&tmp_path, path));

		written.map_err(|e| {
			let _ = fs::remove_file(&tmp_path);

			StoreError::Backend { message: format!("Failed to write {}: {e}", path.display()) }
		})
	}

	fn collect_stale(&self, category: &str, max_age: Option<Duration>) -> Result<usize, StoreError> {
		let now = OffsetDateTime::now_utc();
		let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::Backend {
			message: format!("Failed to list {}: {e}", self.dir.display()),
		})?;
		let mut removed = 0;

		for entry in entries {
			let entry = entry.map_err(|e| StoreError::Backend {
				message: format!("Failed to list {}: {e}", self.dir.display()),
			})?;
			let name = entry.file_name();
			let Some(name) = name.to_str() else { continue };

			if name.starts_with('.') || category_of(name) != category {
				continue;
			}

			let stored_at = match entry.metadata().and_then(|metadata| metadata.modified()) {
				Ok(modified) => OffsetDateTime::from(modified),
				Err(e) if e.kind() == ErrorKind::NotFound => continue,
				Err(e) =>
					return Err(StoreError::Backend {
						message: format!("Failed to inspect {name}: {e}"),
					}),
			};

			if !is_collectable(stored_at, now, max_age) {
				continue;
			}

			match fs::remove_file(entry.path()) {
				Ok(()) => removed += 1,
				// Another process collected it first.
				Err(e) if e.kind() == ErrorKind::NotFound => {},
				Err(e) =>
					return Err(StoreError::Backend {
						message: format!("Failed to remove {name}: {e}"),
					}),
			}
		}

		Ok(removed)
	}
}
impl TokenStore for FileStore {
	fn get<'a>(&'a self, key: &'a CacheKey) -> StoreFuture<'a, Option<Vec<u8>>> {
		Box::pin(async move {
			let path = self.entry_path(key)?;

			match fs::read(&path) {
				Ok(value) => Ok(Some(value)),
				Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
				Err(e) => Err(StoreError::Backend {
					message: format!("Failed to read {}: {e}", path.display()),
				}),
			}
		})
	}

	fn put<'a>(&'a self, key: &'a CacheKey, value: Vec<u8>) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let path = self.entry_path(key)?;

			self.write_atomically(&path, &value)
		})
	}

	fn delete<'a>(&'a self, key: &'a CacheKey) -> StoreFuture<'a, bool> {
		Box::pin(async move {
			let path = self.entry_path(key)?;

			match fs::remove_file(&path) {
				Ok(()) => Ok(true),
				Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
				Err(e) => Err(StoreError::Backend {
					message: format!("Failed to remove {}: {e}", path.display()),
				}),
			}
		})
	}

	fn garbage_collect<'a>(
		&'a self,
		category: &'a str,
		max_age: Option<Duration>,
	) -> StoreFuture<'a, usize> {
		Box::pin(async move { self.collect_stale(category, max_age) })
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, time::SystemTime};
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;
	use crate::auth::TOKEN_CATEGORY;

	fn temp_dir() -> PathBuf {
		env::temp_dir().join(format!("oauth2_token_cache_file_store_{}", Uuid::new_v4()))
	}

	fn key(path: &str) -> CacheKey {
		CacheKey::from_components(TOKEN_CATEGORY, "api.example.com", path, [])
	}

	#[test]
	fn save_and_reload_round_trip() {
		let dir = temp_dir();
		let store = FileStore::open(&dir).expect("Failed to open file store.");
		let key = key("/token");
		let raw = br#"{"access_token":"T1", "expires_in": 3600}"#.to_vec();
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.put(&key, raw.clone())).expect("Failed to save fixture to file store.");
		drop(store);

		let reopened = FileStore::open(&dir).expect("Failed to reopen file store.");
		let fetched = rt
			.block_on(reopened.get(&key))
			.expect("Failed to fetch fixture from file store.")
			.expect("File store lost the entry after reopen.");

		assert_eq!(fetched, raw);

		let flushed = rt
			.block_on(reopened.garbage_collect(TOKEN_CATEGORY, None))
			.expect("Failed to flush the file store.");

		assert_eq!(flushed, 1);
		assert!(rt.block_on(reopened.get(&key)).expect("Get should succeed.").is_none());
		assert!(!rt.block_on(reopened.delete(&key)).expect("Delete should succeed."));

		fs::remove_dir_all(&dir).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store {}: {e}", dir.display())
		});
	}

	#[test]
	fn instances_sharing_a_directory_keep_each_others_writes() {
		let dir = temp_dir();
		let first = FileStore::open(&dir).expect("Failed to open the first file store.");
		let second = FileStore::open(&dir).expect("Failed to open the second file store.");
		let (key_a, key_b) = (key("/a"), key("/b"));
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(second.put(&key_b, b"B".to_vec())).expect("Second store should write.");
		rt.block_on(first.put(&key_a, b"A".to_vec())).expect("First store should write.");

		let reopened = FileStore::open(&dir).expect("Failed to reopen file store.");

		for store in [&first, &second, &reopened] {
			assert_eq!(
				rt.block_on(store.get(&key_a)).expect("Get should succeed."),
				Some(b"A".to_vec())
			);
			assert_eq!(
				rt.block_on(store.get(&key_b)).expect("Get should succeed."),
				Some(b"B".to_vec())
			);
		}

		fs::remove_dir_all(&dir).expect("Temporary directory should be removable.");
	}

	#[test]
	fn garbage_collection_uses_file_age_and_category() {
		let dir = temp_dir();
		let store = FileStore::open(&dir).expect("Failed to open file store.");
		let (stale, fresh) = (key("/stale"), key("/fresh"));
		let other = CacheKey::from_components("web_session", "api.example.com", "/stale", []);
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		for key in [&stale, &fresh, &other] {
			rt.block_on(store.put(key, b"{}".to_vec())).expect("Put should succeed.");
		}

		let an_hour_ago = SystemTime::now() - std::time::Duration::from_secs(3600);

		for key in [&stale, &other] {
			File::options()
				.write(true)
				.open(dir.join(key.as_str()))
				.and_then(|file| file.set_modified(an_hour_ago))
				.expect("Modification time should be settable.");
		}

		let removed = rt
			.block_on(store.garbage_collect(TOKEN_CATEGORY, Some(Duration::minutes(30))))
			.expect("Garbage collection should succeed.");

		assert_eq!(removed, 1);
		assert!(rt.block_on(store.get(&stale)).expect("Get should succeed.").is_none());
		assert!(rt.block_on(store.get(&fresh)).expect("Get should succeed.").is_some());
		assert!(rt.block_on(store.get(&other)).expect("Get should succeed.").is_some());

		fs::remove_dir_all(&dir).expect("Temporary directory should be removable.");
	}
}
