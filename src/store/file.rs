//! File-backed [`CredentialStore`] for desktop shells and command-line tools.

// std
use std::{
	collections::BTreeMap,
	ffi::OsStr,
	fs::{self, File, OpenOptions},
	io::{self, Write},
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	store::{CredentialStore, StoreError, StoreFuture},
};

type Entries = BTreeMap<String, String>;

/// Keeps session values in a flat JSON object on disk, mirroring browser local storage.
///
/// Every mutation rewrites the whole object through a staging file that is synced and renamed
/// into place. The file is created owner-only on Unix since it holds a bearer credential. When
/// the last key is removed (logout, failed refresh) the file itself is deleted.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	entries: Arc<RwLock<Entries>>,
}
impl FileStore {
	/// Opens the store at `path`; a missing or blank file starts empty.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();
		let entries = match fs::read(&path) {
			Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Entries::new(),
			Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
				message: format!("{} is not a JSON object of strings: {e}", path.display()),
			})?,
			Err(e) if e.kind() == io::ErrorKind::NotFound => Entries::new(),
			Err(e) => return Err(io_failure("read", &path, e)),
		};

		Ok(Self { path, entries: Arc::new(RwLock::new(entries)) })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn staging_path(&self) -> PathBuf {
		let mut name = self.path.file_name().map(OsStr::to_os_string).unwrap_or_default();

		name.push(".staging");

		self.path.with_file_name(name)
	}

	fn flush(&self, entries: &Entries) -> Result<(), StoreError> {
		if entries.is_empty() {
			return match fs::remove_file(&self.path) {
				Err(e) if e.kind() != io::ErrorKind::NotFound =>
					Err(io_failure("delete", &self.path, e)),
				_ => Ok(()),
			};
		}
		if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
			fs::create_dir_all(dir).map_err(|e| io_failure("create directory", dir, e))?;
		}

		let bytes = serde_json::to_vec(entries).map_err(|e| StoreError::Serialization {
			message: format!("Session values could not be encoded: {e}"),
		})?;
		let staging = self.staging_path();
		let mut file = create_private(&staging).map_err(|e| io_failure("create", &staging, e))?;

		file.write_all(&bytes)
			.and_then(|_| file.sync_all())
			.map_err(|e| io_failure("write", &staging, e))?;
		fs::rename(&staging, &self.path).map_err(|e| io_failure("replace", &self.path, e))
	}
}
impl CredentialStore for FileStore {
	fn load<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		Box::pin(async move { Ok(self.entries.read().get(key).cloned()) })
	}

	fn save<'a>(&'a self, key: &'a str, value: String) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut entries = self.entries.write();

			if entries.get(key) == Some(&value) {
				return Ok(());
			}

			entries.insert(key.to_owned(), value);
			self.flush(&entries)
		})
	}

	fn remove<'a>(&'a self, keys: &'a [&'a str]) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut entries = self.entries.write();
			let before = entries.len();

			entries.retain(|key, _| !keys.contains(&key.as_str()));

			if entries.len() == before { Ok(()) } else { self.flush(&entries) }
		})
	}
}

fn create_private(path: &Path) -> io::Result<File> {
	let mut options = OpenOptions::new();

	options.write(true).create(true).truncate(true);

	#[cfg(unix)]
	{
		use std::os::unix::fs::OpenOptionsExt;

		options.mode(0o600);
	}

	options.open(path)
}

fn io_failure(action: &str, path: &Path, err: io::Error) -> StoreError {
	StoreError::Backend { message: format!("Failed to {action} {}: {err}", path.display()) }
}
