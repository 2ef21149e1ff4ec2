//! On-device key/value persistence for the addresses used by the flow.

use parking_lot::Mutex;
use std::{
    collections::BTreeMap,
    fmt, fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::error::StoreError;

/// Keys the subscription flow writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StoreKey {
    /// Last address a code was requested for
    UserEmail,
    /// Last address that was successfully verified
    VerifiedEmail,
}

impl StoreKey {
    /// The key as stored on disk
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserEmail => "userEmail",
            Self::VerifiedEmail => "verifiedEmail",
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A small persisted string map with at-rest protection.
pub trait SecureStore {
    /// Store `value` under `key`, replacing any previous value.
    fn set_item(&self, key: StoreKey, value: &str) -> Result<(), StoreError>;

    /// Read the value under `key`.
    fn get_item(&self, key: StoreKey) -> Result<Option<String>, StoreError>;
}

/// Write `value` under `key`, logging instead of failing.
///
/// Persistence is a convenience for the next launch; the flow carries on
/// without it.
pub fn set_best_effort(store: &impl SecureStore, key: StoreKey, value: &str) -> bool {
    match store.set_item(key, value) {
        Ok(()) => {
            tracing::debug!(%key, "Persisted to secure store");
            true
        }
        Err(e) => {
            tracing::warn!(%key, %e, "Secure store write failed");
            false
        }
    }
}

/// [`SecureStore`] backed by a single JSON file readable only by its owner.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash never leaves a half-written store.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// A store at `path`. Nothing is touched until the first access.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        let mut file = private_file(&tmp)?;
        file.write_all(&serde_json::to_vec_pretty(entries)?)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SecureStore for FileStore {
    fn set_item(&self, key: StoreKey, value: &str) -> Result<(), StoreError> {
        let mut entries = self.read_all()?;
        entries.insert(key.as_str().to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn get_item(&self, key: StoreKey) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key.as_str()))
    }
}

#[cfg(unix)]
fn private_file(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn private_file(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

/// In-process [`SecureStore`]. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<StoreKey, String>>>,
}

impl MemoryStore {
    /// An empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecureStore for MemoryStore {
    fn set_item(&self, key: StoreKey, value: &str) -> Result<(), StoreError> {
        self.entries.lock().insert(key, value.to_string());
        Ok(())
    }

    fn get_item(&self, key: StoreKey) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().get(&key).cloned())
    }
}
