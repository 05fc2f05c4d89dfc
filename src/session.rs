//! Session domain: credential pair, signed-in user, and UI preferences kept beside them.

pub mod secret;
pub mod user;

pub use secret::*;
pub use user::*;

// self
use crate::_prelude::*;

/// Access/refresh token pair issued at login.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
	/// Short-lived bearer credential presented on every call.
	pub access_token: TokenSecret,
	/// Longer-lived credential used only to mint a new access token.
	pub refresh_token: TokenSecret,
}
impl CredentialPair {
	/// Wraps raw token strings.
	pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: TokenSecret::new(refresh_token),
		}
	}
}

/// Display theme persisted next to the session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
	/// Light palette.
	#[default]
	Light,
	/// Dark palette.
	Dark,
}
impl Theme {
	/// Returns the other theme.
	pub const fn toggled(self) -> Self {
		match self {
			Theme::Light => Theme::Dark,
			Theme::Dark => Theme::Light,
		}
	}
}
