//! Client-level error types shared across the request layer, session helpers, and stores.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Credential store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body could not be decoded.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// The session could not be recovered; the caller must log in again.
	#[error(transparent)]
	SessionExpired(#[from] SessionExpired),

	/// Backend answered with a non-success status that was not recovered locally.
	#[error("Backend returned HTTP {status}: {}.", .payload.summary())]
	Api {
		/// HTTP status code.
		status: u16,
		/// Decoded error payload (or raw body preview).
		payload: ApiErrorPayload,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Login succeeded at the HTTP level but the backend issued no credential.
	#[error("Login rejected: {reason}.")]
	LoginRejected {
		/// Backend message or local reason.
		reason: String,
	},
	/// Caller-supplied input failed client-side validation.
	#[error("Invalid {field}: {reason}.")]
	Validation {
		/// Offending field name.
		field: &'static str,
		/// Human-readable reason.
		reason: String,
	},
}
impl Error {
	/// Returns the HTTP status carried by [`Error::Api`], if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Api { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Returns the backend-supplied message carried by [`Error::Api`], if any.
	pub fn backend_message(&self) -> Option<&str> {
		match self {
			Self::Api { payload, .. } => payload.message.as_deref(),
			_ => None,
		}
	}

	/// True when the error means the caller has to log in again.
	pub fn is_session_expired(&self) -> bool {
		matches!(self, Self::SessionExpired(_))
	}
}

/// Error body returned by the admin backend.
///
/// The backend answers failures with `{ "success": false, "message": "...", "code": "..." }`;
/// bodies that are not JSON keep a short preview in `raw`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorPayload {
	/// Backend success flag, normally `false` here.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub success: Option<bool>,
	/// Human-readable message.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	/// Machine-readable error code, when the backend supplies one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub code: Option<String>,
	/// Preview of a non-JSON body.
	#[serde(skip)]
	pub raw: Option<String>,
}
impl ApiErrorPayload {
	const RAW_PREVIEW_LIMIT: usize = 256;

	/// Parses an error body, keeping a preview when it is not the expected JSON shape.
	pub fn from_body(body: &[u8]) -> Self {
		if body.is_empty() {
			return Self::default();
		}

		match serde_json::from_slice::<Self>(body) {
			Ok(payload) => payload,
			Err(_) => {
				let text = String::from_utf8_lossy(body);
				let preview = match text.char_indices().nth(Self::RAW_PREVIEW_LIMIT) {
					Some((idx, _)) => text[..idx].to_owned(),
					None => text.into_owned(),
				};

				Self { raw: Some(preview), ..Default::default() }
			},
		}
	}

	/// Returns the message, raw preview, or a placeholder.
	pub fn summary(&self) -> &str {
		self.message.as_deref().or(self.raw.as_deref()).unwrap_or("no error details")
	}
}

/// Terminal authentication failure shared by every caller waiting on a refresh.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Session expired: {reason}.")]
pub struct SessionExpired {
	/// Why the refresh failed.
	pub reason: String,
	/// HTTP status of the refresh response, when one was received.
	pub status: Option<u16>,
}
impl SessionExpired {
	/// Creates a new failure without an HTTP status.
	pub fn new(reason: impl Into<String>) -> Self {
		Self { reason: reason.into(), status: None }
	}

	/// Attaches the refresh response status.
	pub fn with_status(mut self, status: u16) -> Self {
		self.status = Some(status);

		self
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Client configuration failed validation.
	#[error(transparent)]
	Client(#[from] crate::config::ClientConfigError),
	/// Request path could not be joined onto the base URL.
	#[error("Request path `{path}` is invalid.")]
	InvalidPath {
		/// Offending path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	Body(#[source] serde_json::Error),
	/// Header value contains characters that cannot be sent.
	#[error("Header `{name}` has an invalid value.")]
	InvalidHeader {
		/// Header name.
		name: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Response bodies that did not match the expected shape.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// JSON parsing failed at the reported path.
	#[error("Response from {endpoint} is malformed JSON.")]
	Json {
		/// Endpoint path that produced the body.
		endpoint: String,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Envelope carried no `data` field.
	#[error("Response from {endpoint} is missing the `data` field.")]
	MissingData {
		/// Endpoint path that produced the body.
		endpoint: String,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {endpoint}.")]
	Network {
		/// Endpoint path being called.
		endpoint: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request exceeded the configured timeout.
	#[error("Request to {endpoint} timed out.")]
	Timeout {
		/// Endpoint path being called.
		endpoint: String,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		endpoint: impl Into<String>,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { endpoint: endpoint.into(), source: Box::new(src) }
	}
}
