//! Authenticated request issuing with transparent 401 recovery.
//!
//! [`ApiClient::send`] reads the current credential from the [`CredentialStore`], attaches it
//! as a bearer header, and issues the call. When the backend answers 401, the request has not
//! been replayed yet, and the [`RecoveryPolicy`] classifies the 401 as an expired credential,
//! the client recovers:
//!
//! - the first caller becomes the refresh leader and calls the refresh endpoint once;
//! - callers that fail while that refresh is in flight park in a FIFO queue;
//! - when the refresh settles, the gate returns to idle and every parked caller receives the
//!   same outcome; each caller replays its own request once with the new credential.
//!
//! A failed refresh purges the stored credential and user, rejects every caller with the same
//! [`SessionExpired`], and notifies the [`SessionListener`] so the UI can route to the login
//! screen. Non-401 failures and transport errors pass through untouched.

mod gate;
mod metrics;

pub use metrics::{RefreshMetrics, RefreshSnapshot};

// self
use crate::{
	_prelude::*,
	auth::Credential,
	config::ClientConfig,
	error::{ConfigError, SessionExpired},
	http::{ApiRequest, ApiResponse, ApiTransport, PreparedRequest},
	obs::{self, CallKind},
	policy::{DefaultRecoveryPolicy, RecoveryPolicy, UnauthorizedContext, UnauthorizedKind},
	store::CredentialStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;
use gate::{Admission, RefreshGate, RefreshOutcome};
use metrics::RefreshEvent;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = ApiClient<ReqwestTransport>;

/// Receives terminal session failures.
///
/// The client calls [`SessionListener::on_session_expired`] exactly once per failed refresh,
/// after the stored credential has been purged. UI layers typically redirect to the login
/// screen from here.
pub trait SessionListener: Send + Sync {
	/// Called when the session could not be recovered.
	fn on_session_expired(&self, failure: &SessionExpired);
}

/// Listener that ignores session expiry.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSessionListener;
impl SessionListener for NoopSessionListener {
	fn on_session_expired(&self, _failure: &SessionExpired) {}
}

#[derive(Deserialize)]
struct RefreshBody {
	#[serde(default, rename = "accessToken")]
	access_token: Option<String>,
	#[serde(default)]
	data: Option<RefreshData>,
}
#[derive(Deserialize)]
struct RefreshData {
	#[serde(default, rename = "accessToken")]
	access_token: Option<String>,
}

/// Authenticated client for the admin backend.
///
/// One instance owns the refresh state for one credential scope; clone it (cheap, `Arc`-backed)
/// to share it across tasks. Every clone shares the same refresh gate, so concurrent 401s from
/// any clone still collapse into one refresh call.
pub struct ApiClient<T>
where
	T: ?Sized + ApiTransport,
{
	transport: Arc<T>,
	store: Arc<dyn CredentialStore>,
	config: Arc<ClientConfig>,
	policy: Arc<dyn RecoveryPolicy>,
	listener: Arc<dyn SessionListener>,
	refresh_metrics: Arc<RefreshMetrics>,
	gate: Arc<RefreshGate>,
}
impl<T> ApiClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates a client that reuses the caller-provided transport.
	///
	/// The recovery policy is derived from `config.exemptions`; override it with
	/// [`ApiClient::with_policy`].
	pub fn with_transport(
		config: ClientConfig,
		store: Arc<dyn CredentialStore>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		let policy = Arc::new(DefaultRecoveryPolicy::new(config.exemptions.clone()));

		Self {
			transport: transport.into(),
			store,
			config: Arc::new(config),
			policy,
			listener: Arc::new(NoopSessionListener),
			refresh_metrics: Default::default(),
			gate: Arc::new(RefreshGate::new()),
		}
	}

	/// Replaces the 401 classification policy.
	pub fn with_policy(mut self, policy: Arc<dyn RecoveryPolicy>) -> Self {
		self.policy = policy;

		self
	}

	/// Registers the listener notified when a refresh fails.
	pub fn with_session_listener(mut self, listener: Arc<dyn SessionListener>) -> Self {
		self.listener = listener;

		self
	}

	/// Active configuration.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Credential store backing this client.
	pub fn store(&self) -> &Arc<dyn CredentialStore> {
		&self.store
	}

	/// Refresh counters shared by every clone of this client.
	pub fn refresh_metrics(&self) -> &RefreshMetrics {
		&self.refresh_metrics
	}

	/// True while a refresh call is outstanding.
	pub fn is_refreshing(&self) -> bool {
		self.gate.is_refreshing()
	}

	/// Number of callers currently parked behind the in-flight refresh.
	pub fn queued_requests(&self) -> usize {
		self.gate.queued()
	}

	/// Reads the current credential from the store.
	pub async fn credential(&self) -> Result<Option<Credential>> {
		let raw = self.store.load(&self.config.storage_keys.credential).await?;

		Ok(raw.and_then(Credential::parse))
	}

	/// Issues `request`, recovering transparently from an expired credential.
	///
	/// The calling contract is identical whether or not a refresh happened underneath: the
	/// result is the final 2xx response or the terminal error.
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		obs::observe(CallKind::Request, "send", self.send_with_recovery(request)).await
	}

	async fn send_with_recovery(&self, request: ApiRequest) -> Result<ApiResponse> {
		let seen_epoch = self.gate.epoch();
		let credential = self.credential().await?;
		let response = self.dispatch(&request, credential.as_ref()).await?;

		if response.is_success() {
			return Ok(response);
		}
		if !self.is_recoverable(&request, &response) {
			return Err(response.into_error());
		}

		let credential = self.recover(seen_epoch).await?;
		let replay = request.mark_retried();
		let response = self.dispatch(&replay, Some(&credential)).await?;

		if response.is_success() { Ok(response) } else { Err(response.into_error()) }
	}

	fn is_recoverable(&self, request: &ApiRequest, response: &ApiResponse) -> bool {
		if response.status != 401 || request.is_retried() {
			return false;
		}

		let payload = response.error_payload();
		let ctx = UnauthorizedContext { path: request.route(), payload: &payload };

		self.policy.classify_unauthorized(&ctx) == UnauthorizedKind::Expired
	}

	async fn recover(&self, seen_epoch: u64) -> Result<Credential> {
		match self.gate.admit(seen_epoch) {
			Admission::Settled(outcome) => outcome.map_err(Error::from),
			Admission::Wait(rx) => {
				self.refresh_metrics.record(RefreshEvent::Queued);

				match rx.await {
					Ok(outcome) => outcome.map_err(Error::from),
					Err(_) => Err(SessionExpired::new("refresh was abandoned").into()),
				}
			},
			Admission::Lead(lease) => {
				let outcome = self.refresh_credential().await;

				lease.settle(outcome.clone());

				if let Err(failure) = &outcome {
					self.listener.on_session_expired(failure);
				}

				outcome.map_err(Error::from)
			},
		}
	}

	/// Calls the refresh endpoint and persists (or purges) the credential before the gate
	/// settles, so waiters never observe a credential that is not yet stored.
	async fn refresh_credential(&self) -> RefreshOutcome {
		self.refresh_metrics.record(RefreshEvent::Attempt);

		let started_with = self.credential().await.ok().flatten();
		let outcome = obs::observe(
			CallKind::Refresh,
			"refresh_credential",
			self.request_refresh(started_with.as_ref()),
		)
		.await;

		if outcome.is_ok() {
			self.refresh_metrics.record(RefreshEvent::Success);
		} else {
			if let Err(e) = self.purge_expired_session(started_with.as_ref()).await {
				obs::record_purge_failure(&e);
			}

			self.refresh_metrics.record(RefreshEvent::Failure);
		}

		outcome
	}

	/// Purges local state unless a different credential was stored while the refresh ran.
	async fn purge_expired_session(&self, started_with: Option<&Credential>) -> Result<()> {
		let stored = self.credential().await?;

		if stored.is_some() && stored.as_ref() != started_with {
			return Ok(());
		}

		self.purge_local_session().await
	}

	async fn request_refresh(&self, current: Option<&Credential>) -> RefreshOutcome {
		let request = ApiRequest::post(self.config.endpoints.refresh.as_str()).mark_retried();
		let response = self
			.dispatch(&request, current)
			.await
			.map_err(|e| SessionExpired::new(format!("refresh call failed: {e}")))?;

		if !response.is_success() {
			return Err(
				SessionExpired::new(response.error_payload().summary()).with_status(response.status)
			);
		}

		let token = response
			.json::<RefreshBody>()
			.ok()
			.and_then(|body| body.access_token.or_else(|| body.data.and_then(|data| data.access_token)))
			.and_then(Credential::parse)
			.ok_or_else(|| {
				SessionExpired::new("refresh response carried no access token")
					.with_status(response.status)
			})?;

		self.store
			.save(&self.config.storage_keys.credential, token.expose().to_owned())
			.await
			.map_err(|e| SessionExpired::new(format!("refreshed credential could not be stored: {e}")))?;

		Ok(token)
	}

	/// Resolves `request` against the base URL, attaches the bearer header, and executes it
	/// without any recovery.
	pub(crate) async fn dispatch(
		&self,
		request: &ApiRequest,
		credential: Option<&Credential>,
	) -> Result<ApiResponse> {
		let prepared = self.prepare(request, credential)?;
		let response = self.transport.execute(prepared).await?;

		obs::record_response(&response.route, response.status, credential.is_some());

		Ok(response)
	}

	fn prepare(
		&self,
		request: &ApiRequest,
		credential: Option<&Credential>,
	) -> Result<PreparedRequest> {
		let mut url = self.config.endpoint_url(&request.path).map_err(|source| {
			ConfigError::InvalidPath { path: request.path.clone(), source }
		})?;

		if !request.query.is_empty() {
			url.query_pairs_mut().extend_pairs(request.query.iter());
		}

		let mut headers = request.headers.clone();

		headers.entry("accept".into()).or_insert_with(|| "application/json".into());

		match credential {
			Some(credential) => {
				headers.insert("authorization".into(), credential.bearer_header());
			},
			None => {
				headers.remove("authorization");
			},
		}

		if let Some((name, _)) =
			headers.iter().find(|(_, value)| value.chars().any(|c| c == '\r' || c == '\n'))
		{
			return Err(ConfigError::InvalidHeader { name: name.clone() }.into());
		}

		Ok(PreparedRequest {
			method: request.method,
			url,
			headers,
			body: request.body.clone(),
			route: request.route().to_owned(),
			timeout: Some(self.config.timeout),
		})
	}

	/// Stores a credential obtained outside the refresh path (login).
	pub(crate) async fn install_credential(&self, credential: &Credential) -> Result<()> {
		self.store
			.save(&self.config.storage_keys.credential, credential.expose().to_owned())
			.await?;
		self.gate.install(Some(Ok(credential.clone())));

		Ok(())
	}

	/// Removes the credential and cached user from the store.
	pub(crate) async fn purge_local_session(&self) -> Result<()> {
		let keys = [
			self.config.storage_keys.credential.as_str(),
			self.config.storage_keys.user.as_str(),
		];

		self.store.remove(&keys).await?;

		Ok(())
	}

	/// Purges local state and forgets any settled refresh outcome (logout, failed validation).
	pub(crate) async fn end_local_session(&self) -> Result<()> {
		let result = self.purge_local_session().await;

		self.gate.install(None);

		result
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestTransport> {
	/// Creates a client with its own cookie-enabled reqwest transport.
	pub fn new(config: ClientConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
		let transport = ReqwestTransport::new()?;

		Ok(Self::with_transport(config, store, transport))
	}
}
impl<T> Clone for ApiClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: Arc::clone(&self.transport),
			store: Arc::clone(&self.store),
			config: Arc::clone(&self.config),
			policy: Arc::clone(&self.policy),
			listener: Arc::clone(&self.listener),
			refresh_metrics: Arc::clone(&self.refresh_metrics),
			gate: Arc::clone(&self.gate),
		}
	}
}
impl<T> Debug for ApiClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("base_url", &self.config.base_url.as_str())
			.field("refreshing", &self.gate.is_refreshing())
			.finish()
	}
}
