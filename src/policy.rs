//! Recovery policy hooks that decide what a 401 means.
//!
//! Most 401 responses say "the credential expired" and are recovered with a refresh. A
//! credential-verification endpoint (the master-password check) also answers 401 when the
//! submitted password is simply wrong; refreshing in that case is pointless, so the policy
//! classifies those responses as [`UnauthorizedKind::WrongCredential`].
//!
//! The backend's explicit error `code` is matched first. The message string is kept only as a
//! fallback for backends that do not send a code yet, since wording can change.

// self
use crate::{_prelude::*, error::ApiErrorPayload};

/// Strategy hook that classifies 401 responses.
///
/// Implementors are required to be `Send + Sync` and only see crate-owned data, so they stay
/// independent of the HTTP transport.
pub trait RecoveryPolicy: Send + Sync {
	/// Classifies an unauthorized response.
	fn classify_unauthorized(&self, ctx: &UnauthorizedContext<'_>) -> UnauthorizedKind;
}

/// Meaning assigned to a 401 response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnauthorizedKind {
	/// Credential is expired or invalid; refresh and retry.
	Expired,
	/// The request deliberately checked a secret and it was wrong; surface immediately.
	WrongCredential,
}

/// Context passed to a [`RecoveryPolicy`].
#[derive(Clone, Copy, Debug)]
pub struct UnauthorizedContext<'a> {
	/// Request path (without query) that produced the 401.
	pub path: &'a str,
	/// Decoded error body.
	pub payload: &'a ApiErrorPayload,
}

/// Marks an endpoint whose 401 may mean "wrong password" rather than "expired session".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationExemption {
	/// Substring matched against the request path.
	pub path_contains: String,
	/// Error code that identifies the wrong-credential case.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub code: Option<String>,
	/// Message fallback that identifies the wrong-credential case.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
}
impl VerificationExemption {
	/// Exemption for the master-password verification endpoint.
	pub fn master_password() -> Self {
		Self {
			path_contains: "/verify-master-password".into(),
			code: Some("INCORRECT_PASSWORD".into()),
			message: Some("Incorrect password".into()),
		}
	}

	/// Returns true when `ctx` is the wrong-credential case described by this exemption.
	pub fn matches(&self, ctx: &UnauthorizedContext<'_>) -> bool {
		if !ctx.path.contains(self.path_contains.as_str()) {
			return false;
		}

		let code_matches = matches!(
			(self.code.as_deref(), ctx.payload.code.as_deref()),
			(Some(expected), Some(actual)) if expected == actual
		);
		let message_matches = matches!(
			(self.message.as_deref(), ctx.payload.message.as_deref()),
			(Some(expected), Some(actual)) if expected == actual
		);

		code_matches || message_matches
	}
}

/// Default policy backed by a list of [`VerificationExemption`]s.
#[derive(Clone, Debug, Default)]
pub struct DefaultRecoveryPolicy {
	exemptions: Vec<VerificationExemption>,
}
impl DefaultRecoveryPolicy {
	/// Creates a policy with the provided exemptions.
	pub fn new(exemptions: Vec<VerificationExemption>) -> Self {
		Self { exemptions }
	}
}
impl RecoveryPolicy for DefaultRecoveryPolicy {
	fn classify_unauthorized(&self, ctx: &UnauthorizedContext<'_>) -> UnauthorizedKind {
		if self.exemptions.iter().any(|exemption| exemption.matches(ctx)) {
			UnauthorizedKind::WrongCredential
		} else {
			UnauthorizedKind::Expired
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn payload(message: Option<&str>, code: Option<&str>) -> ApiErrorPayload {
		ApiErrorPayload {
			success: Some(false),
			message: message.map(Into::into),
			code: code.map(Into::into),
			raw: None,
		}
	}

	#[test]
	fn wrong_password_on_verification_endpoint_is_exempt() {
		let policy = DefaultRecoveryPolicy::new(vec![VerificationExemption::master_password()]);
		let by_message = payload(Some("Incorrect password"), None);
		let by_code = payload(Some("Mot de passe incorrect"), Some("INCORRECT_PASSWORD"));

		for body in [&by_message, &by_code] {
			let ctx = UnauthorizedContext { path: "/admin/verify-master-password", payload: body };

			assert_eq!(policy.classify_unauthorized(&ctx), UnauthorizedKind::WrongCredential);
		}
	}

	#[test]
	fn expiry_on_verification_endpoint_still_refreshes() {
		let policy = DefaultRecoveryPolicy::new(vec![VerificationExemption::master_password()]);
		let expired = payload(Some("Token expired"), None);
		let ctx = UnauthorizedContext { path: "/admin/verify-master-password", payload: &expired };

		assert_eq!(policy.classify_unauthorized(&ctx), UnauthorizedKind::Expired);
	}

	#[test]
	fn wrong_password_message_elsewhere_is_not_exempt() {
		let policy = DefaultRecoveryPolicy::new(vec![VerificationExemption::master_password()]);
		let body = payload(Some("Incorrect password"), None);
		let ctx = UnauthorizedContext { path: "/admin/codes", payload: &body };

		assert_eq!(policy.classify_unauthorized(&ctx), UnauthorizedKind::Expired);
	}
}
