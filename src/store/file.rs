//! JSON-file [`SessionStore`] for desktop shells and kiosks whose session must survive a restart.
//!
//! Writes go to a sibling temporary file that is then renamed over the snapshot, so a crash
//! mid-write leaves the previous session intact. Clearing the session deletes the file.

// std
use std::{
	fs::{self, OpenOptions},
	io::{self, ErrorKind, Write},
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	store::{SessionMutation, SessionSnapshot, SessionStore, StoreError, StoreFuture},
};

/// Session store persisted as a single JSON document.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	cache: Arc<RwLock<SessionSnapshot>>,
}
impl FileStore {
	/// Opens the store at `path`, reading any session a previous run left behind.
	///
	/// A missing or empty file is an empty session; unparsable contents are an error rather
	/// than a silent sign-out.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();
		let cache = read_snapshot(&path)?;

		Ok(Self { path, cache: Arc::new(RwLock::new(cache)) })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn write_snapshot(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
		if snapshot.is_empty() {
			return match fs::remove_file(&self.path) {
				Err(e) if e.kind() != ErrorKind::NotFound =>
					Err(backend("remove", &self.path, e)),
				_ => Ok(()),
			};
		}
		if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
			fs::create_dir_all(dir).map_err(|e| backend("create directory", dir, e))?;
		}

		let json = serde_json::to_vec_pretty(snapshot).map_err(|e| StoreError::Serialization {
			message: format!("Failed to encode session snapshot: {e}"),
		})?;
		let staging = self.staging_path();
		let mut file = OpenOptions::new()
			.write(true)
			.create(true)
			.truncate(true)
			.open(&staging)
			.map_err(|e| backend("open", &staging, e))?;

		file.write_all(&json)
			.and_then(|()| file.sync_all())
			.map_err(|e| backend("write", &staging, e))?;
		drop(file);

		fs::rename(&staging, &self.path).map_err(|e| backend("replace", &self.path, e))
	}

	fn staging_path(&self) -> PathBuf {
		let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();

		name.push(".partial");

		self.path.with_file_name(name)
	}
}
impl SessionStore for FileStore {
	fn load(&self) -> StoreFuture<'_, SessionSnapshot> {
		let snapshot = self.cache.read().clone();

		Box::pin(async move { Ok(snapshot) })
	}

	fn apply(&self, mutation: SessionMutation) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut cache = self.cache.write();
			let mut next = cache.clone();

			next.apply(mutation);
			// Memory only moves once the disk agrees.
			self.write_snapshot(&next)?;
			*cache = next;

			Ok(())
		})
	}
}

fn read_snapshot(path: &Path) -> Result<SessionSnapshot, StoreError> {
	let bytes = match fs::read(path) {
		Ok(bytes) => bytes,
		Err(e) if e.kind() == ErrorKind::NotFound => return Ok(SessionSnapshot::default()),
		Err(e) => return Err(backend("read", path, e)),
	};

	if bytes.iter().all(u8::is_ascii_whitespace) {
		return Ok(SessionSnapshot::default());
	}

	serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
		message: format!("Session file {} is not a valid snapshot: {e}", path.display()),
	})
}

fn backend(action: &str, path: &Path, error: io::Error) -> StoreError {
	StoreError::Backend { message: format!("Failed to {action} {}: {error}", path.display()) }
}
