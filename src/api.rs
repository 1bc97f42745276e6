//! Typed admin endpoints layered on [`ApiClient::send`](crate::client::ApiClient::send).
//!
//! Every call here goes through the recovering request path, so an expired credential is
//! refreshed transparently; callers only ever see the final data or the terminal error.

pub mod channels;
pub mod codes;
pub mod dashboard;
pub mod sessions;

pub use channels::*;
pub use codes::*;
pub use dashboard::*;
pub use sessions::*;

// self
use crate::_prelude::*;

/// Rejects identifiers that would escape their path segment.
pub(crate) fn validate_path_id(field: &'static str, id: &str) -> Result<()> {
	if id.trim().is_empty() {
		return Err(Error::Validation { field, reason: "must not be empty".into() });
	}
	if id.chars().any(|c| matches!(c, '/' | '?' | '#') || c.is_whitespace()) {
		return Err(Error::Validation {
			field,
			reason: format!("`{id}` contains characters not allowed in a path segment"),
		});
	}

	Ok(())
}
