//! JSON file storage backend
//!
//! All keys live in a single JSON object on disk. Every `set`/`remove` re-reads
//! the file, changes only its own key and rewrites it, so writers sharing the
//! file only race on the same key (last write wins).

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{KeyValueStore, StorageError};

/// Storage persisted to a JSON file
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open the store at `path`, creating an empty one if the file is missing.
    ///
    /// A file that exists but cannot be parsed is logged and treated as empty;
    /// it is replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = read_entries(&path)?;

        debug!("Opened storage {:?} ({} keys)", path, entries.len());

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the full map next to the target and rename it into place
    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        std::fs::create_dir_all(dir)?;

        let content = serde_json::to_string_pretty(entries)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        let mut next = read_entries(&self.path)?;
        next.insert(key.to_string(), value.to_string());
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        let mut next = read_entries(&self.path)?;
        if next.remove(key).is_some() {
            self.flush(&next)?;
        }
        *entries = next;
        Ok(())
    }
}

/// Current contents of the file; missing, blank or unparseable reads as empty
fn read_entries(path: &Path) -> Result<BTreeMap<String, String>, StorageError> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }

    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    match serde_json::from_str(&content) {
        Ok(entries) => Ok(entries),
        Err(e) => {
            warn!("Ignoring unreadable storage file {:?}: {}", path, e);
            Ok(BTreeMap::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");

        let store = JsonFileStore::open(&path).unwrap();
        store.set("spotify_token", "tok123").unwrap();
        store.set("verifier", "abc").unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("spotify_token").as_deref(), Some("tok123"));
        assert_eq!(reopened.get("verifier").as_deref(), Some("abc"));
    }

    #[test]
    fn test_remove_is_persisted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");

        let store = JsonFileStore::open(&path).unwrap();
        store.set("a", "1").unwrap();
        store.remove("a").unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert!(reopened.get("a").is_none());
    }

    #[test]
    fn test_missing_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path().join("nested/storage.json")).unwrap();
        assert!(store.get("anything").is_none());

        // parent directory is created on first write
        store.set("k", "v").unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_corrupt_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert!(store.get("a").is_none());

        store.set("a", "1").unwrap();
        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("a").as_deref(), Some("1"));
    }

    #[test]
    fn test_writers_keep_each_others_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");

        // e.g. `login` waiting on the browser while `custom create` runs
        let login = JsonFileStore::open(&path).unwrap();
        let custom = JsonFileStore::open(&path).unwrap();

        custom.set("customAlbums", "[]").unwrap();
        login.set("spotify_token", "tok").unwrap();
        assert_eq!(login.get("customAlbums").as_deref(), Some("[]"));

        custom.remove("verifier").unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("customAlbums").as_deref(), Some("[]"));
        assert_eq!(reopened.get("spotify_token").as_deref(), Some("tok"));
    }
}
