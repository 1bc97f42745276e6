//! Logged-in admin profile and role checks.

// std
use std::ops::Deref;
// self
use crate::_prelude::*;

/// Role label assigned by the backend (`user`, `ADMIN`, `MASTER_ADMIN`, ...).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);
impl Role {
	/// Creates a role from its backend label.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Any label containing `ADMIN` grants dashboard access.
	pub fn is_admin(&self) -> bool {
		self.0.contains("ADMIN")
	}
}
impl Deref for Role {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl Debug for Role {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Role({})", self.0)
	}
}
impl Display for Role {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Admin profile cached next to the credential.
///
/// Unknown backend fields are kept in `extra` so merging a validate response never drops data
/// the dashboard may render.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
	/// Backend identifier.
	#[serde(default, rename = "_id", alias = "id", skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	/// Login name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub username: Option<String>,
	/// Assigned role.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub role: Option<Role>,
	/// Remaining backend fields.
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}
impl AdminUser {
	/// Returns true when the user's role is one of `allowed`.
	pub fn has_any_role(&self, allowed: &[&str]) -> bool {
		self.role.as_ref().is_some_and(|role| allowed.contains(&role.as_ref()))
	}

	/// Overlays `other` on top of `self`; fields present in `other` win.
	pub fn merged_with(mut self, other: AdminUser) -> Self {
		if other.id.is_some() {
			self.id = other.id;
		}
		if other.username.is_some() {
			self.username = other.username;
		}
		if other.role.is_some() {
			self.role = other.role;
		}

		self.extra.extend(other.extra);

		self
	}
}
impl AsRef<str> for Role {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
