//! Thread-safe in-memory [`SessionStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{SessionMutation, SessionSnapshot, SessionStore, StoreFuture},
};

/// Storage backend that keeps the session in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<SessionSnapshot>>);
impl MemoryStore {
	/// Creates a store pre-populated with `snapshot`.
	pub fn with_snapshot(snapshot: SessionSnapshot) -> Self {
		Self(Arc::new(RwLock::new(snapshot)))
	}

	/// Returns a copy of the current contents without going through the async contract.
	pub fn snapshot(&self) -> SessionSnapshot {
		self.0.read().clone()
	}
}
impl SessionStore for MemoryStore {
	fn load(&self) -> StoreFuture<'_, SessionSnapshot> {
		let snapshot = self.snapshot();

		Box::pin(async move { Ok(snapshot) })
	}

	fn apply(&self, mutation: SessionMutation) -> StoreFuture<'_, ()> {
		let state = self.0.clone();

		Box::pin(async move {
			state.write().apply(mutation);

			Ok(())
		})
	}
}
