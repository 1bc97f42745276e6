//! Access-code management and master-password verification.
//!
//! Deleting or revealing a code is gated behind the master password on the backend. The
//! verification endpoint answers 401 for a wrong password; the client's recovery policy
//! exempts that case, so [`ApiClient::verify_master_password`] surfaces it as an
//! [`Error::Api`] with status 401 instead of refreshing the session.

// self
use crate::{
	_prelude::*,
	api::validate_path_id,
	client::ApiClient,
	http::{ApiRequest, ApiTransport, Envelope},
};

const CODES_PATH: &str = "/admin/codes";
const VERIFY_MASTER_PASSWORD_PATH: &str = "/admin/verify-master-password";

/// Access code as listed by the backend.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessCode {
	/// Backend identifier.
	#[serde(rename = "_id")]
	pub id: String,
	/// Secret code; hidden in listings until revealed.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub code: Option<String>,
	/// Validity in days.
	#[serde(default)]
	pub duration_days: u32,
	/// Maximum concurrent devices.
	#[serde(default)]
	pub max_devices: u32,
	/// Devices already bound.
	#[serde(default)]
	pub used_count: u32,
	/// Lifecycle status (`active`, `unused`, `expired`, ...).
	#[serde(default)]
	pub status: String,
}
impl AccessCode {
	/// True when the code can still be redeemed.
	pub fn is_available(&self) -> bool {
		matches!(self.status.as_str(), "active" | "unused")
	}

	/// Last six characters of the identifier, used where the secret itself is hidden.
	pub fn short_id(&self) -> &str {
		tail(&self.id, 6)
	}
}

/// Listing parameters for [`ApiClient::list_codes`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeQuery {
	/// 1-based page.
	pub page: u32,
	/// Page size.
	pub limit: u32,
	/// Free-text search; empty means no filter.
	pub search: String,
}
impl CodeQuery {
	/// Sets the free-text search.
	pub fn search(mut self, search: impl Into<String>) -> Self {
		self.search = search.into();

		self
	}

	/// Sets the page and page size.
	pub fn page(mut self, page: u32, limit: u32) -> Self {
		self.page = page;
		self.limit = limit;

		self
	}
}
impl Default for CodeQuery {
	fn default() -> Self {
		Self { page: 1, limit: 10, search: String::new() }
	}
}

/// Body for [`ApiClient::create_code`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccessCode {
	/// Validity in days; at least 1.
	pub duration_days: u32,
	/// Maximum concurrent devices; at least 1.
	pub max_devices: u32,
}
impl NewAccessCode {
	/// Checks the same bounds the creation form enforces.
	pub fn validate(&self) -> Result<()> {
		if self.duration_days < 1 {
			return Err(Error::Validation {
				field: "durationDays",
				reason: "Duration must be at least 1 day".into(),
			});
		}
		if self.max_devices < 1 {
			return Err(Error::Validation {
				field: "maxDevices",
				reason: "Max devices must be at least 1".into(),
			});
		}

		Ok(())
	}
}

#[derive(Serialize)]
struct PasswordBody<'a> {
	#[serde(skip_serializing_if = "Option::is_none")]
	password: Option<&'a str>,
}

#[derive(Deserialize)]
struct RevealedCode {
	code: String,
}

impl<T> ApiClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Lists access codes; a missing `data` field yields an empty page.
	pub async fn list_codes(&self, query: &CodeQuery) -> Result<Vec<AccessCode>> {
		let request = ApiRequest::get(CODES_PATH)
			.query("page", query.page)
			.query("limit", query.limit)
			.query("search", &query.search);
		let response = self.send(request).await?;

		Ok(response.json::<Envelope<Vec<AccessCode>>>()?.data.unwrap_or_default())
	}

	/// Creates an access code after validating its bounds locally.
	pub async fn create_code(&self, code: NewAccessCode) -> Result<AccessCode> {
		code.validate()?;

		let request = ApiRequest::post(CODES_PATH).json(&code)?;

		self.send(request).await?.data()
	}

	/// Deletes an access code.
	pub async fn delete_code(&self, id: &str) -> Result<()> {
		validate_path_id("id", id)?;
		self.send(ApiRequest::delete(format!("{CODES_PATH}/{id}"))).await?;

		Ok(())
	}

	/// Reveals the secret of an access code, optionally re-submitting the master password.
	pub async fn reveal_code(&self, id: &str, password: Option<&str>) -> Result<String> {
		validate_path_id("id", id)?;

		let request =
			ApiRequest::post(format!("{CODES_PATH}/{id}/reveal")).json(&PasswordBody { password })?;

		Ok(self.send(request).await?.data::<RevealedCode>()?.code)
	}

	/// Checks the master password.
	///
	/// A wrong password is returned as [`Error::Api`] with status 401 and leaves the session
	/// untouched.
	pub async fn verify_master_password(&self, password: &str) -> Result<()> {
		let request = ApiRequest::post(VERIFY_MASTER_PASSWORD_PATH)
			.json(&PasswordBody { password: Some(password) })?;

		self.send(request).await?;

		Ok(())
	}
}

pub(crate) fn tail(value: &str, chars: usize) -> &str {
	let count = value.chars().count();

	match value.char_indices().nth(count.saturating_sub(chars)) {
		Some((idx, _)) => &value[idx..],
		None => value,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn creation_bounds_match_the_form() {
		assert!(NewAccessCode { duration_days: 30, max_devices: 1 }.validate().is_ok());
		assert!(matches!(
			NewAccessCode { duration_days: 0, max_devices: 1 }.validate(),
			Err(Error::Validation { field: "durationDays", .. })
		));
		assert!(matches!(
			NewAccessCode { duration_days: 7, max_devices: 0 }.validate(),
			Err(Error::Validation { field: "maxDevices", .. })
		));
	}

	#[test]
	fn listing_defaults_and_helpers() {
		let code: AccessCode = serde_json::from_str(
			r#"{"_id":"65f1a2b3c4d5e6f7a8b9c0d1","durationDays":30,"maxDevices":2,"status":"unused"}"#,
		)
		.expect("Access code fixture should deserialize.");

		assert_eq!(code.used_count, 0);
		assert!(code.is_available());
		assert_eq!(code.short_id(), "b9c0d1");
		assert_eq!(tail("abc", 6), "abc");

		let expired = AccessCode { status: "expired".into(), ..code };

		assert!(!expired.is_available());
	}

	#[test]
	fn code_query_defaults_to_first_page() {
		let query = CodeQuery::default().search("vip");

		assert_eq!((query.page, query.limit, query.search.as_str()), (1, 10, "vip"));
	}

	#[test]
	fn reveal_body_omits_missing_password() {
		let body = serde_json::to_string(&PasswordBody { password: None })
			.expect("Password body should serialize.");

		assert_eq!(body, "{}");
	}
}
