//! Client configuration: backend location, endpoint paths, storage keys, and the 401 exemption
//! list.
//!
//! Configurations are assembled through [`ClientConfigBuilder`], which validates every field
//! before handing out an immutable [`ClientConfig`]. The struct also deserializes from JSON so a
//! host application can keep it in its own settings file; call [`ClientConfig::validate`] after
//! loading.

// std
use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, policy::VerificationExemption};

/// Errors raised while constructing or validating a [`ClientConfig`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ClientConfigError {
	/// Base URL must use HTTP or HTTPS.
	#[error("Base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// URL that failed validation.
		url: String,
	},
	/// Base URL cannot carry a query or fragment.
	#[error("Base URL must not contain a query or fragment: {url}.")]
	BaseUrlHasQuery {
		/// URL that failed validation.
		url: String,
	},
	/// Endpoint paths are joined onto the base URL and must be absolute.
	#[error("The {endpoint} path must start with `/`: {path}.")]
	RelativePath {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Path that failed validation.
		path: String,
	},
	/// Storage keys cannot be empty.
	#[error("The {which} storage key cannot be empty.")]
	EmptyStorageKey {
		/// Which key failed validation.
		which: &'static str,
	},
	/// Both storage keys point at the same slot.
	#[error("Credential and user storage keys must differ.")]
	DuplicateStorageKey,
	/// Timeout must be positive.
	#[error("Request timeout must be positive.")]
	NonPositiveTimeout,
}

/// Endpoint paths used by the session layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthEndpoints {
	/// Exchanges an expired credential for a new one.
	pub refresh: String,
	/// Confirms the stored credential and returns the user's role.
	pub validate: String,
	/// Invalidates the server-side session.
	pub logout: String,
	/// Username + password login.
	pub login: String,
}
impl Default for AuthEndpoints {
	fn default() -> Self {
		Self {
			refresh: "/auth/refresh".into(),
			validate: "/auth/validate".into(),
			logout: "/auth/logout".into(),
			login: "/admin/login".into(),
		}
	}
}

/// Storage keys for persisted session values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
	/// Key holding the bearer credential.
	pub credential: String,
	/// Key holding the cached user profile JSON.
	pub user: String,
}
impl Default for StorageKeys {
	fn default() -> Self {
		Self { credential: "accessToken".into(), user: "user".into() }
	}
}

/// Immutable client configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// Backend root; request paths are appended to its path.
	pub base_url: Url,
	/// Session endpoint paths.
	#[serde(default)]
	pub endpoints: AuthEndpoints,
	/// Persisted state keys.
	#[serde(default)]
	pub storage_keys: StorageKeys,
	/// Requests whose 401 means "wrong credential" rather than "expired credential".
	#[serde(default = "default_exemptions")]
	pub exemptions: Vec<VerificationExemption>,
	/// Per-request timeout applied by the reqwest transport.
	#[serde(default = "default_timeout", with = "timeout_secs")]
	pub timeout: StdDuration,
}
impl ClientConfig {
	const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);

	/// Creates a new builder for the provided backend root.
	pub fn builder(base_url: Url) -> ClientConfigBuilder {
		ClientConfigBuilder::new(base_url)
	}

	/// Re-runs builder validation; use after deserializing a configuration.
	pub fn validate(&self) -> Result<(), ClientConfigError> {
		validate_base_url(&self.base_url)?;

		for (endpoint, path) in [
			("refresh", &self.endpoints.refresh),
			("validate", &self.endpoints.validate),
			("logout", &self.endpoints.logout),
			("login", &self.endpoints.login),
		] {
			if !path.starts_with('/') {
				return Err(ClientConfigError::RelativePath { endpoint, path: path.clone() });
			}
		}

		if self.storage_keys.credential.trim().is_empty() {
			return Err(ClientConfigError::EmptyStorageKey { which: "credential" });
		}
		if self.storage_keys.user.trim().is_empty() {
			return Err(ClientConfigError::EmptyStorageKey { which: "user" });
		}
		if self.storage_keys.credential == self.storage_keys.user {
			return Err(ClientConfigError::DuplicateStorageKey);
		}
		if self.timeout.is_zero() {
			return Err(ClientConfigError::NonPositiveTimeout);
		}

		Ok(())
	}

	/// Resolves an absolute request path (`/admin/stats`) against the base URL.
	///
	/// The base URL's own path is kept as a prefix, so `https://host/api` + `/admin/stats`
	/// yields `https://host/api/admin/stats`.
	pub fn endpoint_url(&self, path: &str) -> Result<Url, url::ParseError> {
		let prefix = self.base_url.path().trim_end_matches('/');
		let mut url = self.base_url.clone();
		let (path_part, query) = match path.split_once('?') {
			Some((p, q)) => (p, Some(q)),
			None => (path, None),
		};

		if !path_part.starts_with('/') {
			return Err(url::ParseError::RelativeUrlWithoutBase);
		}

		url.set_path(&format!("{prefix}{path_part}"));
		url.set_query(query);

		Ok(url)
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	config: ClientConfig,
}
impl ClientConfigBuilder {
	/// Creates a new builder with default paths, keys, exemptions, and timeout.
	pub fn new(base_url: Url) -> Self {
		Self {
			config: ClientConfig {
				base_url,
				endpoints: AuthEndpoints::default(),
				storage_keys: StorageKeys::default(),
				exemptions: default_exemptions(),
				timeout: ClientConfig::DEFAULT_TIMEOUT,
			},
		}
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.config.endpoints.refresh = path.into();

		self
	}

	/// Overrides the validate endpoint path.
	pub fn validate_path(mut self, path: impl Into<String>) -> Self {
		self.config.endpoints.validate = path.into();

		self
	}

	/// Overrides the logout endpoint path.
	pub fn logout_path(mut self, path: impl Into<String>) -> Self {
		self.config.endpoints.logout = path.into();

		self
	}

	/// Overrides the login endpoint path.
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.config.endpoints.login = path.into();

		self
	}

	/// Overrides both storage keys.
	pub fn storage_keys(mut self, credential: impl Into<String>, user: impl Into<String>) -> Self {
		self.config.storage_keys = StorageKeys { credential: credential.into(), user: user.into() };

		self
	}

	/// Adds a verification exemption.
	pub fn exemption(mut self, exemption: VerificationExemption) -> Self {
		self.config.exemptions.push(exemption);

		self
	}

	/// Replaces the exemption list.
	pub fn exemptions<I>(mut self, exemptions: I) -> Self
	where
		I: IntoIterator<Item = VerificationExemption>,
	{
		self.config.exemptions = exemptions.into_iter().collect();

		self
	}

	/// Overrides the per-request timeout.
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.config.timeout = timeout;

		self
	}

	/// Validates and returns the configuration.
	pub fn build(self) -> Result<ClientConfig, ClientConfigError> {
		self.config.validate()?;

		Ok(self.config)
	}
}

fn validate_base_url(url: &Url) -> Result<(), ClientConfigError> {
	if !matches!(url.scheme(), "http" | "https") {
		return Err(ClientConfigError::UnsupportedScheme { url: url.to_string() });
	}
	if url.query().is_some() || url.fragment().is_some() {
		return Err(ClientConfigError::BaseUrlHasQuery { url: url.to_string() });
	}

	Ok(())
}

fn default_exemptions() -> Vec<VerificationExemption> {
	vec![VerificationExemption::master_password()]
}

fn default_timeout() -> StdDuration {
	ClientConfig::DEFAULT_TIMEOUT
}

mod timeout_secs {
	// std
	use std::time::Duration;
	// crates.io
	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_u64(value.as_secs())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		u64::deserialize(deserializer).map(Duration::from_secs)
	}
}
