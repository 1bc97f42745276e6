//! Thread-safe in-memory [`CredentialStore`] implementation for local development and tests.

// std
use std::collections::HashMap;
// self
use crate::{
	_prelude::*,
	store::{CredentialStore, StoreError, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<String, String>>>;

/// Thread-safe storage backend that keeps values in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Returns a copy of the value under `key` without going through the async contract.
	pub fn get(&self, key: &str) -> Option<String> {
		self.0.read().get(key).cloned()
	}

	/// Seeds a value synchronously; handy for fixtures.
	pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
		self.0.write().insert(key.into(), value.into());
	}

	fn remove_now(map: StoreMap, keys: &[&str]) -> Result<(), StoreError> {
		let mut guard = map.write();

		for key in keys {
			guard.remove(*key);
		}

		Ok(())
	}
}
impl CredentialStore for MemoryStore {
	fn load<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(key).cloned()) })
	}

	fn save<'a>(&'a self, key: &'a str, value: String) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().insert(key.to_owned(), value);

			Ok(())
		})
	}

	fn remove<'a>(&'a self, keys: &'a [&'a str]) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::remove_now(map, keys) })
	}
}
