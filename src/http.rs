//! Transport primitives for admin API calls.
//!
//! The module exposes [`ApiRequest`] (what callers build), [`PreparedRequest`] (what the
//! client hands to a transport once the URL and bearer header are resolved),
//! [`ApiResponse`], and the [`ApiTransport`] trait so downstream crates can plug in their own
//! HTTP stack. The crate ships [`ReqwestTransport`] behind the default `reqwest` feature.

// std
use std::time::Duration as StdDuration;
// crates.io
use serde::de::DeserializeOwned;
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	error::{ApiErrorPayload, ConfigError, DecodeError, TransportError},
};

/// HTTP methods used by the admin API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
}
impl Method {
	/// Returns the method token as sent on the wire.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Caller-facing request description: method, path, query, headers, and JSON body.
///
/// The per-request retry marker is set by the client once the request has been replayed after a
/// refresh; a second 401 on a marked request is never recovered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute path below the configured base URL (for example `/admin/codes`).
	pub path: String,
	/// Query parameters in insertion order.
	pub query: Vec<(String, String)>,
	/// Extra headers; `authorization` is overwritten by the client when a credential exists.
	pub headers: BTreeMap<String, String>,
	/// Serialized JSON body.
	pub body: Option<Vec<u8>>,
	retried: bool,
}
impl ApiRequest {
	/// Creates a request with the provided method and path.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			query: Vec::new(),
			headers: BTreeMap::new(),
			body: None,
			retried: false,
		}
	}

	/// Shorthand for a `GET` request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::Get, path)
	}

	/// Shorthand for a `POST` request.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::Post, path)
	}

	/// Shorthand for a `PUT` request.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::Put, path)
	}

	/// Shorthand for a `PATCH` request.
	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::Patch, path)
	}

	/// Shorthand for a `DELETE` request.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::Delete, path)
	}

	/// Appends a query parameter.
	pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
		self.query.push((key.into(), value.to_string()));

		self
	}

	/// Sets a header; names are stored lowercase.
	pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());

		self
	}

	/// Serializes `body` as the JSON payload.
	pub fn json<T>(mut self, body: &T) -> Result<Self>
	where
		T: ?Sized + Serialize,
	{
		let bytes = serde_json::to_vec(body).map_err(ConfigError::Body)?;

		self.body = Some(bytes);

		Ok(self.header("content-type", "application/json"))
	}

	/// Marks the request as already replayed once.
	pub fn mark_retried(mut self) -> Self {
		self.retried = true;

		self
	}

	/// True when the request has already been replayed after a refresh.
	pub fn is_retried(&self) -> bool {
		self.retried
	}

	/// Path without any inline query string.
	pub fn route(&self) -> &str {
		self.path.split_once('?').map_or(self.path.as_str(), |(route, _)| route)
	}
}

/// Fully resolved request handed to an [`ApiTransport`].
#[derive(Clone, Debug)]
pub struct PreparedRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute URL including query.
	pub url: Url,
	/// Headers with lowercase names.
	pub headers: BTreeMap<String, String>,
	/// Serialized body.
	pub body: Option<Vec<u8>>,
	/// Route used in errors and spans.
	pub route: String,
	/// Transport-level timeout.
	pub timeout: Option<StdDuration>,
}
impl PreparedRequest {
	/// Returns the `authorization` header, if one was attached.
	pub fn authorization(&self) -> Option<&str> {
		self.headers.get("authorization").map(String::as_str)
	}
}

/// Response returned by an [`ApiTransport`].
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers with lowercase names.
	pub headers: BTreeMap<String, String>,
	/// Raw body.
	pub body: Vec<u8>,
	/// Route that produced the response.
	pub route: String,
}
impl ApiResponse {
	/// Creates a response; used by transports and test doubles.
	pub fn new(status: u16, route: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: BTreeMap::new(), body: body.into(), route: route.into() }
	}

	/// Adds a header (name lowercased).
	pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());

		self
	}

	/// True for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Decodes the whole body as `T`, reporting the failing JSON path on error.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let de = &mut serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(de).map_err(|source| {
			DecodeError::Json { endpoint: self.route.clone(), source }.into()
		})
	}

	/// Decodes the backend envelope and returns its `data` field.
	pub fn data<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.json::<Envelope<T>>()?
			.data
			.ok_or_else(|| DecodeError::MissingData { endpoint: self.route.clone() }.into())
	}

	/// Decodes the body as a backend error payload.
	pub fn error_payload(&self) -> ApiErrorPayload {
		ApiErrorPayload::from_body(&self.body)
	}

	/// Parses the `retry-after` header (delta seconds or an HTTP date).
	pub fn retry_after(&self) -> Option<Duration> {
		parse_retry_after(&self.headers)
	}

	pub(crate) fn into_error(self) -> Error {
		Error::Api {
			status: self.status,
			retry_after: self.retry_after(),
			payload: self.error_payload(),
		}
	}
}

/// Standard `{ success, message, data }` wrapper used by the admin backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
	/// Backend success flag.
	#[serde(default)]
	pub success: Option<bool>,
	/// Optional message.
	#[serde(default)]
	pub message: Option<String>,
	/// Payload.
	#[serde(default = "Option::default")]
	pub data: Option<T>,
}

/// Boxed future returned by [`ApiTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks able to execute admin API calls.
///
/// The trait is the client's only dependency on an HTTP library. Implementations return every
/// HTTP response, including 4xx/5xx, as `Ok`; only failures that produced no response
/// (DNS, TCP, TLS, timeout) are `Err`. Status handling and recovery belong to the client.
pub trait ApiTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes the request.
	fn execute(&self, request: PreparedRequest) -> TransportFuture<'_>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// The default client keeps a cookie store, because the refresh endpoint authenticates the
/// refresh call with an HttpOnly cookie set at login.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a transport with a cookie-enabled reqwest client.
	pub fn new() -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().cookie_store(true).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	fn method(method: Method) -> reqwest::Method {
		match method {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
			Method::Put => reqwest::Method::PUT,
			Method::Patch => reqwest::Method::PATCH,
			Method::Delete => reqwest::Method::DELETE,
		}
	}

	fn map_error(route: &str, err: ReqwestError) -> TransportError {
		if err.is_timeout() {
			TransportError::Timeout { endpoint: route.to_owned() }
		} else {
			TransportError::network(route, err)
		}
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiTransport for ReqwestTransport {
	fn execute(&self, request: PreparedRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let PreparedRequest { method, url, headers, body, route, timeout } = request;
			let mut builder = self.0.request(Self::method(method), url);

			for (name, value) in &headers {
				builder = builder.header(name.as_str(), value.as_str());
			}
			if let Some(body) = body {
				builder = builder.body(body);
			}
			if let Some(timeout) = timeout {
				builder = builder.timeout(timeout);
			}

			let response = builder.send().await.map_err(|e| Self::map_error(&route, e))?;
			let status = response.status().as_u16();
			let headers = response
				.headers()
				.iter()
				.filter_map(|(name, value)| {
					value.to_str().ok().map(|v| (name.as_str().to_owned(), v.to_owned()))
				})
				.collect();
			let body = response.bytes().await.map_err(|e| Self::map_error(&route, e))?.to_vec();

			Ok(ApiResponse { status, headers, body, route })
		})
	}
}

fn parse_retry_after(headers: &BTreeMap<String, String>) -> Option<Duration> {
	let raw = headers.get("retry-after")?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
