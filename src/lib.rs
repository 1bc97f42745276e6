//! Authenticated admin API client: bearer credentials, single-flight refresh on 401, pluggable
//! credential stores, and typed dashboard endpoints in one crate.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod obs;
pub mod policy;
pub mod session;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		client::ApiClient,
		config::ClientConfig,
		http::ReqwestTransport,
		store::{CredentialStore, MemoryStore},
	};

	/// Client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = ApiClient<ReqwestTransport>;

	/// Builds a reqwest transport that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_transport() -> ReqwestTransport {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.cookie_store(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestTransport::with_client(client)
	}

	/// Constructs an [`ApiClient`] pointed at `base_url`, backed by an in-memory store and the
	/// reqwest transport used across integration tests.
	pub fn build_reqwest_test_client(base_url: &str) -> (ReqwestTestClient, Arc<MemoryStore>) {
		let config = ClientConfig::builder(
			Url::parse(base_url).expect("Mock server base URL should parse successfully."),
		)
		.build()
		.expect("Default client configuration should build successfully.");
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn CredentialStore> = store_backend.clone();
		let client = ApiClient::with_transport(config, store, test_reqwest_transport());

		(client, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
