//! Session storage contract and built-in store implementations.
//!
//! The gateway never reaches for ambient global state: a [`SessionStore`] is injected at
//! construction. Backends only implement [`SessionStore::load`] and [`SessionStore::apply`];
//! the typed accessors the gateway uses are provided on top of those two.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	session::{CredentialPair, SessionUser, Theme, TokenSecret},
};

/// Boxed future returned by [`SessionStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Durable client-local session storage.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Returns a copy of everything currently stored.
	fn load(&self) -> StoreFuture<'_, SessionSnapshot>;

	/// Applies a single mutation atomically.
	fn apply(&self, mutation: SessionMutation) -> StoreFuture<'_, ()>;

	/// Returns the stored access token.
	fn access_token(&self) -> StoreFuture<'_, Option<TokenSecret>> {
		Box::pin(async move { Ok(self.load().await?.access_token) })
	}

	/// Replaces the stored access token.
	fn set_access_token(&self, token: TokenSecret) -> StoreFuture<'_, ()> {
		self.apply(SessionMutation::SetAccessToken(token))
	}

	/// Returns the stored refresh token.
	fn refresh_token(&self) -> StoreFuture<'_, Option<TokenSecret>> {
		Box::pin(async move { Ok(self.load().await?.refresh_token) })
	}

	/// Replaces the stored refresh token.
	fn set_refresh_token(&self, token: TokenSecret) -> StoreFuture<'_, ()> {
		self.apply(SessionMutation::SetRefreshToken(token))
	}

	/// Persists a freshly issued credential pair together with the signed-in user.
	fn sign_in(&self, credentials: CredentialPair, user: SessionUser) -> StoreFuture<'_, ()> {
		self.apply(SessionMutation::SignIn { credentials, user })
	}

	/// Returns the cached user.
	fn user(&self) -> StoreFuture<'_, Option<SessionUser>> {
		Box::pin(async move { Ok(self.load().await?.user) })
	}

	/// Returns the stored theme.
	fn theme(&self) -> StoreFuture<'_, Option<Theme>> {
		Box::pin(async move { Ok(self.load().await?.theme) })
	}

	/// Persists the theme.
	fn set_theme(&self, theme: Theme) -> StoreFuture<'_, ()> {
		self.apply(SessionMutation::SetTheme(theme))
	}

	/// Removes every stored key.
	fn clear(&self) -> StoreFuture<'_, ()> {
		self.apply(SessionMutation::Clear)
	}
}

/// Everything a store holds, keyed the way it is persisted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
	/// Current access token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub access_token: Option<TokenSecret>,
	/// Current refresh token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
	/// Cached user profile.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user: Option<SessionUser>,
	/// Display theme.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub theme: Option<Theme>,
}
impl SessionSnapshot {
	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.access_token.is_none()
			&& self.refresh_token.is_none()
			&& self.user.is_none()
			&& self.theme.is_none()
	}

	/// Applies a mutation in place.
	pub fn apply(&mut self, mutation: SessionMutation) {
		match mutation {
			SessionMutation::SignIn { credentials, user } => {
				self.access_token = Some(credentials.access_token);
				self.refresh_token = Some(credentials.refresh_token);
				self.user = Some(user);
			},
			SessionMutation::SetAccessToken(token) => self.access_token = Some(token),
			SessionMutation::SetRefreshToken(token) => self.refresh_token = Some(token),
			SessionMutation::SetTheme(theme) => self.theme = Some(theme),
			SessionMutation::Clear => *self = Self::default(),
		}
	}
}

/// Write operations supported by every store.
#[derive(Clone, Debug)]
pub enum SessionMutation {
	/// Stores a new credential pair and user.
	SignIn {
		/// Issued credentials.
		credentials: CredentialPair,
		/// Signed-in user.
		user: SessionUser,
	},
	/// Replaces the access token.
	SetAccessToken(TokenSecret),
	/// Replaces the refresh token.
	SetRefreshToken(TokenSecret),
	/// Replaces the theme.
	SetTheme(Theme),
	/// Removes everything, theme included.
	Clear,
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
