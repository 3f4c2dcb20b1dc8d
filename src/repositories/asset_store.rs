use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};

use crate::Result;

/// The single asset table: generated key to data-URI payload.
const ASSETS: TableDefinition<&str, &str> = TableDefinition::new("blogImages");

/// Asynchronous transactional store for encoded image payloads.
///
/// Absent keys read as `Ok(None)` / `false`, never as errors; only open,
/// transaction, and commit failures propagate.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Upsert `value` under `key` in a write transaction.
    async fn put(&self, key: &str, value: &str) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn contains(&self, key: &str) -> Result<bool>;

    /// Walk the whole table in one read transaction and return every
    /// entry, keyed by asset name.
    async fn iterate_all(&self) -> Result<BTreeMap<String, String>>;

    /// Number of stored assets.
    async fn len(&self) -> Result<u64>;
}

/// redb-backed asset store, one database file per blog.
pub struct RedbAssetStore {
    db: Database,
}

impl RedbAssetStore {
    /// Open the database, creating it and the asset table lazily on
    /// first use so that reads before any write see an empty store
    /// instead of a missing-table error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::create(path)?;
        let txn = db.begin_write()?;
        txn.open_table(ASSETS)?;
        txn.commit()?;
        Ok(Self { db })
    }
}

#[async_trait]
impl AssetStore for RedbAssetStore {
    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(ASSETS)?;
            table.insert(key, value)?;
        }
        txn.commit()?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(ASSETS)?;
        Ok(table.get(key)?.map(|value| value.value().to_string()))
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    async fn iterate_all(&self) -> Result<BTreeMap<String, String>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(ASSETS)?;
        let mut assets = BTreeMap::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            assets.insert(key.value().to_string(), value.value().to_string());
        }
        Ok(assets)
    }

    async fn len(&self) -> Result<u64> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(ASSETS)?;
        Ok(table.len()?)
    }
}

/// In-memory store for tests and embedding.
#[derive(Default)]
pub struct InMemoryAssetStore {
    assets: RwLock<BTreeMap<String, String>>,
}

impl InMemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssetStore for InMemoryAssetStore {
    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut assets = self.assets.write().expect("lock poisoned");
        assets.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let assets = self.assets.read().expect("lock poisoned");
        Ok(assets.get(key).cloned())
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        let assets = self.assets.read().expect("lock poisoned");
        Ok(assets.contains_key(key))
    }

    async fn iterate_all(&self) -> Result<BTreeMap<String, String>> {
        let assets = self.assets.read().expect("lock poisoned");
        Ok(assets.clone())
    }

    async fn len(&self) -> Result<u64> {
        let assets = self.assets.read().expect("lock poisoned");
        Ok(assets.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, RedbAssetStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbAssetStore::open(dir.path().join("blogDatabase.redb")).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let (_dir, store) = open_temp();
        store.put("a.png", "data:image/png;base64,AAAA").await.unwrap();
        assert_eq!(
            store.get("a.png").await.unwrap().as_deref(),
            Some("data:image/png;base64,AAAA")
        );
    }

    #[tokio::test]
    async fn missing_key_is_none_not_error() {
        let (_dir, store) = open_temp();
        assert_eq!(store.get("missing.png").await.unwrap(), None);
        assert!(!store.contains("missing.png").await.unwrap());
    }

    #[tokio::test]
    async fn fresh_database_iterates_empty() {
        let (_dir, store) = open_temp();
        assert!(store.iterate_all().await.unwrap().is_empty());
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn put_is_an_upsert() {
        let (_dir, store) = open_temp();
        store.put("a.png", "first").await.unwrap();
        store.put("a.png", "second").await.unwrap();
        assert_eq!(store.get("a.png").await.unwrap().as_deref(), Some("second"));
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn iterate_all_returns_every_entry() {
        let (_dir, store) = open_temp();
        store.put("a.png", "data-a").await.unwrap();
        store.put("b.png", "data-b").await.unwrap();
        store.put("c.png", "data-c").await.unwrap();

        let assets = store.iterate_all().await.unwrap();
        assert_eq!(assets.len(), 3);
        assert_eq!(assets["b.png"], "data-b");
    }

    #[tokio::test]
    async fn assets_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blogDatabase.redb");
        {
            let store = RedbAssetStore::open(&path).unwrap();
            store.put("a.png", "persisted").await.unwrap();
        }
        let store = RedbAssetStore::open(&path).unwrap();
        assert_eq!(
            store.get("a.png").await.unwrap().as_deref(),
            Some("persisted")
        );
    }

    #[tokio::test]
    async fn in_memory_store_matches_contract() {
        let store = InMemoryAssetStore::new();
        assert_eq!(store.get("x").await.unwrap(), None);
        store.put("x", "v").await.unwrap();
        assert!(store.contains("x").await.unwrap());
        assert_eq!(store.iterate_all().await.unwrap().len(), 1);
        assert_eq!(store.len().await.unwrap(), 1);
    }
}
