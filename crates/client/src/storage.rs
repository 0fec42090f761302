//! Local key-value storage, the browser localStorage analog.
//!
//! The cart engine persists two string blobs: the anonymous cart (a JSON
//! array of cart lines under [`keys::CART`]) and the bearer token under
//! [`keys::AUTH_TOKEN`]. The [`LocalStore`] trait keeps the engine agnostic
//! of where those blobs live; [`FileStore`] is the production
//! implementation and [`MemoryStore`] backs tests and throwaway sessions.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Well-known storage keys.
pub mod keys {
    /// Key for the anonymous cart blob (JSON array of cart lines).
    pub const CART: &str = "shopeasy-cart";

    /// Key for the bearer token of the logged-in user.
    pub const AUTH_TOKEN: &str = "shopeasy-token";
}

/// Errors that can occur reading or writing the local store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be encoded or decoded.
    #[error("storage encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// A string key-value store with localStorage semantics.
pub trait LocalStore {
    /// Read the value for a key, `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a key. Deleting an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

impl<T: LocalStore + ?Sized> LocalStore for &mut T {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// In-memory store. Contents are lost when the value is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// File-backed store: a single JSON object file mapping keys to strings.
///
/// The whole map is read once on open and rewritten after every mutation.
/// The blobs involved are tiny (a cart and a token), so write-through keeps
/// the on-disk state consistent without a sync protocol.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open a store at the given path, creating parent directories as
    /// needed. A missing file starts the store empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed,
    /// or if parent directories cannot be created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let entries = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self { path, entries })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_store_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("shopeasy-store-{}-{name}.json", std::process::id()))
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert!(store.get("missing").unwrap().is_none());

        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));

        store.remove("k").unwrap();
        assert!(store.get("k").unwrap().is_none());
    }

    #[test]
    fn test_memory_store_remove_absent_is_ok() {
        let mut store = MemoryStore::new();
        store.remove("never-set").unwrap();
    }

    #[test]
    fn test_file_store_persists_across_opens() {
        let path = temp_store_path("persist");
        let _ = fs::remove_file(&path);

        {
            let mut store = FileStore::open(&path).unwrap();
            store.set(keys::CART, "[]").unwrap();
            store.set(keys::AUTH_TOKEN, "tok").unwrap();
        }

        let mut store = FileStore::open(&path).unwrap();
        assert_eq!(store.get(keys::CART).unwrap().as_deref(), Some("[]"));
        assert_eq!(store.get(keys::AUTH_TOKEN).unwrap().as_deref(), Some("tok"));

        store.remove(keys::AUTH_TOKEN).unwrap();
        drop(store);

        let store = FileStore::open(&path).unwrap();
        assert!(store.get(keys::AUTH_TOKEN).unwrap().is_none());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_file_store_missing_file_starts_empty() {
        let path = temp_store_path("fresh");
        let _ = fs::remove_file(&path);

        let store = FileStore::open(&path).unwrap();
        assert!(store.get(keys::CART).unwrap().is_none());
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let path = temp_store_path("corrupt");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            FileStore::open(&path),
            Err(StoreError::Encoding(_))
        ));

        let _ = fs::remove_file(&path);
    }
}
