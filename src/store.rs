//! Storage contracts and built-in store implementations for client-side session state.
//!
//! Stores behave like browser local storage: string values under well-known keys
//! (`accessToken`, `user` by default). Each write replaces a value whole, so readers never
//! observe a partially written credential.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::_prelude::*;

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract implemented by credential stores.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Reads the value stored under `key`, if present.
	fn load<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;

	/// Persists or replaces the value stored under `key`.
	fn save<'a>(&'a self, key: &'a str, value: String) -> StoreFuture<'a, ()>;

	/// Removes every listed key in one step.
	fn remove<'a>(&'a self, keys: &'a [&'a str]) -> StoreFuture<'a, ()>;
}

/// Error type produced by [`CredentialStore`] implementations.
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
