//! Signed-in user profile cached for display.

// self
use crate::_prelude::*;

/// Role assigned to a back-office user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
	/// Role name as configured on the backend (e.g. `admin`, `cashier`).
	pub name: String,
}

/// User returned by the login endpoint.
///
/// Fields the crate does not model are kept in [`SessionUser::extra`] so the cached copy
/// round-trips without loss.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
	/// Backend identifier.
	pub id: Value,
	/// Login name.
	pub username: String,
	/// Contact address.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// Given name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub first_name: Option<String>,
	/// Family name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_name: Option<String>,
	/// Assigned role.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub role: Option<Role>,
	/// Any additional fields.
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}
impl SessionUser {
	/// Returns the role name, if a role is assigned.
	pub fn role_name(&self) -> Option<&str> {
		self.role.as_ref().map(|role| role.name.as_str())
	}

	/// Returns `"first last"` when available, falling back to the username.
	pub fn display_name(&self) -> String {
		let full = [self.first_name.as_deref(), self.last_name.as_deref()]
			.into_iter()
			.flatten()
			.filter(|part| !part.trim().is_empty())
			.collect::<Vec<_>>()
			.join(" ");

		if full.is_empty() { self.username.clone() } else { full }
	}
}
