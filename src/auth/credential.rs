//! Bearer credential wrapper that redacts sensitive material.

// self
use crate::_prelude::*;

/// Opaque bearer token proving an authenticated session.
///
/// Formatting never prints the token; use [`Credential::expose`] when the raw value is needed
/// for a header or the store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);
impl Credential {
	/// Wraps a new token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Parses a stored token, rejecting empty or whitespace-only values.
	pub fn parse(value: impl Into<String>) -> Option<Self> {
		let value = value.into();

		if value.trim().is_empty() { None } else { Some(Self(value)) }
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Renders the `Authorization` header value.
	pub fn bearer_header(&self) -> String {
		format!("Bearer {}", self.0)
	}
}
impl AsRef<str> for Credential {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Credential").field(&"<redacted>").finish()
	}
}
impl Display for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn credential_formatters_redact() {
		let credential = Credential::new("super-secret");

		assert_eq!(format!("{credential:?}"), "Credential(\"<redacted>\")");
		assert_eq!(format!("{credential}"), "<redacted>");
		assert_eq!(credential.bearer_header(), "Bearer super-secret");
	}

	#[test]
	fn parse_rejects_blank_tokens() {
		assert!(Credential::parse("").is_none());
		assert!(Credential::parse("  ").is_none());
		assert_eq!(Credential::parse("tok").map(|c| c.expose().to_owned()), Some("tok".into()));
	}
}
