// std
use std::sync::Arc;
// crates.io
use pos_gateway::{
	session::{CredentialPair, SessionUser, Theme, TokenSecret},
	store::{MemoryStore, SessionMutation, SessionSnapshot, SessionStore, StoreFuture},
};

fn make_user() -> SessionUser {
	serde_json::from_value(serde_json::json!({
		"id": "c0ffee",
		"username": "night-shift",
		"email": "night@example.com",
		"role": { "name": "cashier" }
	}))
	.expect("Failed to build user fixture for memory store tests.")
}

#[tokio::test]
async fn sign_in_then_rotate_access_token() {
	let store = MemoryStore::default();

	store
		.sign_in(CredentialPair::new("access-1", "refresh-1"), make_user())
		.await
		.expect("Signing in through the memory store should succeed.");
	store
		.set_access_token(TokenSecret::new("access-2"))
		.await
		.expect("Rotating the access token should succeed.");

	let access = store.access_token().await.expect("Reading the access token should succeed.");
	let refresh = store.refresh_token().await.expect("Reading the refresh token should succeed.");
	let user = store.user().await.expect("Reading the user should succeed.");

	assert_eq!(access.as_ref().map(TokenSecret::expose), Some("access-2"));
	assert_eq!(refresh.as_ref().map(TokenSecret::expose), Some("refresh-1"));
	assert_eq!(user.as_ref().and_then(SessionUser::role_name), Some("cashier"));
}

#[tokio::test]
async fn clear_removes_theme_and_credentials() {
	let store = MemoryStore::default();

	store
		.sign_in(CredentialPair::new("access-1", "refresh-1"), make_user())
		.await
		.expect("Signing in through the memory store should succeed.");
	store.set_theme(Theme::Dark).await.expect("Persisting the theme should succeed.");
	store.clear().await.expect("Clearing the memory store should succeed.");

	assert!(store.snapshot().is_empty());
	assert_eq!(store.theme().await.expect("Reading the theme should succeed."), None);
	assert!(store.access_token().await.expect("Reading should succeed.").is_none());
}

#[tokio::test]
async fn clones_share_state() {
	let store = MemoryStore::default();
	let clone = store.clone();
	let shared: Arc<dyn SessionStore> = Arc::new(store.clone());

	shared
		.set_refresh_token(TokenSecret::new("refresh-9"))
		.await
		.expect("Writing through the trait object should succeed.");

	assert_eq!(
		clone.snapshot().refresh_token.as_ref().map(TokenSecret::expose),
		Some("refresh-9")
	);
}

/// Store that only implements the two required operations.
struct LoggingStore {
	inner: MemoryStore,
	log: parking_lot::Mutex<Vec<&'static str>>,
}
impl SessionStore for LoggingStore {
	fn load(&self) -> StoreFuture<'_, SessionSnapshot> {
		self.log.lock().push("load");

		self.inner.load()
	}

	fn apply(&self, mutation: SessionMutation) -> StoreFuture<'_, ()> {
		self.log.lock().push(match mutation {
			SessionMutation::SignIn { .. } => "sign_in",
			SessionMutation::SetAccessToken(_) => "set_access_token",
			SessionMutation::SetRefreshToken(_) => "set_refresh_token",
			SessionMutation::SetTheme(_) => "set_theme",
			SessionMutation::Clear => "clear",
		});

		self.inner.apply(mutation)
	}
}

#[tokio::test]
async fn provided_accessors_route_through_load_and_apply() {
	let store = LoggingStore { inner: MemoryStore::default(), log: Default::default() };

	store
		.sign_in(CredentialPair::new("a", "r"), make_user())
		.await
		.expect("Sign-in should succeed.");
	store.access_token().await.expect("Read should succeed.");
	store.set_theme(Theme::Dark).await.expect("Theme write should succeed.");
	store.clear().await.expect("Clear should succeed.");

	assert_eq!(*store.log.lock(), vec!["sign_in", "load", "set_theme", "clear"]);
	assert!(store.inner.snapshot().is_empty());
}
