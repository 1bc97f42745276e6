//! Session lifecycle on top of [`ApiClient`]: login, startup validation, logout, and the cached
//! user profile.
//!
//! Login and logout requests are marked as already retried so a 401 from them (wrong password,
//! session already gone) is reported directly instead of starting a refresh cycle.

// self
use crate::{
	_prelude::*,
	auth::{AdminUser, Credential},
	client::ApiClient,
	error::SessionExpired,
	http::{ApiRequest, ApiTransport},
	obs::{self, CallKind},
	store::StoreError,
};

/// Username + password pair submitted to the login endpoint.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
	/// Admin username.
	pub username: String,
	/// Admin password; never printed.
	pub password: String,
}
impl LoginRequest {
	/// Creates a new login request.
	pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self { username: username.into(), password: password.into() }
	}
}
impl Debug for LoginRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginRequest")
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Login response; the user may sit under `user`, `data.user`, or be `data` itself.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginBody {
	#[serde(default)]
	access_token: Option<String>,
	#[serde(default)]
	message: Option<String>,
	#[serde(default)]
	user: Option<AdminUser>,
	#[serde(default)]
	data: Option<serde_json::Value>,
}
impl LoginBody {
	fn into_user(self) -> AdminUser {
		if let Some(user) = self.user {
			return user;
		}

		let Some(mut data) = self.data else {
			return AdminUser::default();
		};
		let nested = data.get_mut("user").map(serde_json::Value::take);

		nested
			.and_then(|value| serde_json::from_value(value).ok())
			.or_else(|| serde_json::from_value(data).ok())
			.unwrap_or_default()
	}
}

#[derive(Deserialize)]
struct ValidateBody {
	#[serde(default)]
	success: bool,
	#[serde(default)]
	data: Option<AdminUser>,
}

impl<T> ApiClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Logs in, persisting the credential and user profile on success.
	///
	/// A response without an access token is reported as [`Error::LoginRejected`].
	pub async fn login(&self, request: LoginRequest) -> Result<AdminUser> {
		obs::observe(CallKind::Login, "login", async move {
			let call = ApiRequest::post(self.config().endpoints.login.as_str())
				.json(&request)?
				.mark_retried();
			let body = self.send(call).await?.json::<LoginBody>()?;
			let Some(credential) = body.access_token.clone().and_then(Credential::parse) else {
				let reason = body.message.unwrap_or_else(|| "No access token received".into());

				return Err(Error::LoginRejected { reason });
			};
			let user = body.into_user();

			self.install_credential(&credential).await?;
			self.save_user(&user).await?;

			Ok(user)
		})
		.await
	}

	/// Confirms the stored session with the backend.
	///
	/// Returns `Ok(None)` without any network call when no credential is stored. When the
	/// backend confirms the session, the cached profile is merged with the returned role data and
	/// saved. Any failure, including `success: false`, ends the local session and yields
	/// `Ok(None)`; only store failures are returned as errors.
	pub async fn validate_session(&self) -> Result<Option<AdminUser>> {
		if self.credential().await?.is_none() {
			return Ok(None);
		}

		let confirmed = obs::observe(CallKind::Validate, "validate_session", async {
			let call = ApiRequest::post(self.config().endpoints.validate.as_str());
			let body = self.send(call).await?.json::<ValidateBody>()?;

			if body.success {
				Ok(body.data.unwrap_or_default())
			} else {
				Err(Error::from(SessionExpired::new("session was not confirmed")))
			}
		})
		.await;

		match confirmed {
			Ok(validated) => {
				let user = self.current_user().await?.unwrap_or_default().merged_with(validated);

				self.save_user(&user).await?;

				Ok(Some(user))
			},
			Err(_) => {
				self.end_local_session().await?;

				Ok(None)
			},
		}
	}

	/// Ends the session: local state is cleared first, then the backend is notified.
	///
	/// Backend failures are ignored; the local session is gone either way.
	pub async fn logout(&self) -> Result<()> {
		obs::observe(CallKind::Logout, "logout", async {
			let cleared = self.end_local_session().await;
			let call = ApiRequest::post(self.config().endpoints.logout.as_str()).mark_retried();
			let _ = self.send(call).await;

			cleared
		})
		.await
	}

	/// Returns the cached user profile, if one is stored.
	pub async fn current_user(&self) -> Result<Option<AdminUser>> {
		let key = self.config().storage_keys.user.as_str();
		let Some(raw) = self.store().load(key).await? else {
			return Ok(None);
		};

		serde_json::from_str(&raw).map(Some).map_err(|e| {
			StoreError::Serialization { message: format!("Stored user profile is invalid: {e}") }
				.into()
		})
	}

	/// True when a user is cached and holds one of `allowed`.
	pub async fn has_any_role(&self, allowed: &[&str]) -> Result<bool> {
		Ok(self.current_user().await?.is_some_and(|user| user.has_any_role(allowed)))
	}

	async fn save_user(&self, user: &AdminUser) -> Result<()> {
		let raw = serde_json::to_string(user).map_err(|e| StoreError::Serialization {
			message: format!("User profile could not be serialized: {e}"),
		})?;

		self.store().save(self.config().storage_keys.user.as_str(), raw).await?;

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn login_body_finds_user_in_any_position() {
		let top: LoginBody =
			serde_json::from_str(r#"{"accessToken":"t","user":{"username":"a"}}"#)
				.expect("Top-level user should parse.");

		assert_eq!(top.into_user().username.as_deref(), Some("a"));

		let nested: LoginBody =
			serde_json::from_str(r#"{"accessToken":"t","data":{"user":{"username":"b"}}}"#)
				.expect("Nested user should parse.");

		assert_eq!(nested.into_user().username.as_deref(), Some("b"));

		let flat: LoginBody =
			serde_json::from_str(r#"{"accessToken":"t","data":{"username":"c","role":"ADMIN"}}"#)
				.expect("Flat data user should parse.");
		let user = flat.into_user();

		assert_eq!(user.username.as_deref(), Some("c"));
		assert_eq!(user.role.as_deref(), Some("ADMIN"));
	}

	#[test]
	fn login_request_debug_redacts_password() {
		let request = LoginRequest::new("root", "hunter2");

		assert!(!format!("{request:?}").contains("hunter2"));
	}
}
