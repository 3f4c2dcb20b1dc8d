use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::Result;

/// Synchronous string key-value persistence for serialized records.
///
/// Values are whole serialized blobs; callers read-modify-write the full
/// collection on every mutation. Missing keys read as `Ok(None)`.
pub trait TextRecordStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value under `key` with the full new blob.
    ///
    /// Not atomic: a crash mid-write can corrupt or lose the previous
    /// value. Accepted limitation for this store's scope.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// File-per-key store under a data directory.
pub struct FileTextStore {
    dir: PathBuf,
}

impl FileTextStore {
    /// Open the store, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl TextRecordStore for FileTextStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::write(self.key_path(key), value)?;
        Ok(())
    }
}

/// In-memory store for tests and embedding.
#[derive(Default)]
pub struct InMemoryTextStore {
    records: Mutex<HashMap<String, String>>,
}

impl InMemoryTextStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TextRecordStore for InMemoryTextStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let records = self.records.lock().expect("lock poisoned");
        Ok(records.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut records = self.records.lock().expect("lock poisoned");
        records.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTextStore::open(dir.path()).unwrap();
        assert_eq!(store.get("blogPosts").unwrap(), None);
    }

    #[test]
    fn set_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTextStore::open(dir.path()).unwrap();
        store.set("blogPosts", "[]").unwrap();
        assert_eq!(store.get("blogPosts").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn set_overwrites_the_whole_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTextStore::open(dir.path()).unwrap();
        store.set("blogPosts", "first").unwrap();
        store.set("blogPosts", "second").unwrap();
        assert_eq!(store.get("blogPosts").unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileTextStore::open(dir.path()).unwrap();
            store.set("blogPosts", "persisted").unwrap();
        }
        let store = FileTextStore::open(dir.path()).unwrap();
        assert_eq!(
            store.get("blogPosts").unwrap().as_deref(),
            Some("persisted")
        );
    }

    #[test]
    fn keys_do_not_collide() {
        let store = InMemoryTextStore::new();
        store.set("blogPosts", "new").unwrap();
        store.set("blog_posts", "legacy").unwrap();
        assert_eq!(store.get("blogPosts").unwrap().as_deref(), Some("new"));
        assert_eq!(store.get("blog_posts").unwrap().as_deref(), Some("legacy"));
    }
}
