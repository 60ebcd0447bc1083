use crate::error::{Result, StorageError};
use crate::repository::{Repository, UrlRecord};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use shortkey_core::Key;

/// In-memory implementation of the Repository trait using DashMap.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    storage: DashMap<Key, UrlRecord>,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory repository with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: DashMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn insert(&self, key: &Key, record: UrlRecord) -> Result<()> {
        match self.storage.entry(key.clone()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(key.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn get(&self, key: &Key) -> Result<Option<UrlRecord>> {
        Ok(self.storage.get(key).map(|entry| entry.value().clone()))
    }

    async fn delete(&self, key: &Key) -> Result<bool> {
        Ok(self.storage.remove(key).is_some())
    }

    async fn list(&self) -> Result<Vec<(Key, UrlRecord)>> {
        let mut records: Vec<(Key, UrlRecord)> = self
            .storage
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        records.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::Timestamp;
    use std::sync::Arc;

    fn key(s: &str) -> Key {
        Key::parse(s).unwrap()
    }

    fn record(url: &str) -> UrlRecord {
        UrlRecord {
            original_url: url.to_string(),
            owner: None,
            created_at: Timestamp::now(),
        }
    }

    #[tokio::test]
    async fn save_and_get() {
        let repo = InMemoryRepository::new();

        repo.insert(&key("a1"), record("https://example.com"))
            .await
            .unwrap();

        let result = repo.get(&key("a1")).await.unwrap().unwrap();
        assert_eq!(result.original_url, "https://example.com");
    }

    #[tokio::test]
    async fn get_nonexistent() {
        let repo = InMemoryRepository::new();
        assert!(repo.get(&key("zz")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_conflict() {
        let repo = InMemoryRepository::new();

        repo.insert(&key("a1"), record("https://example.com"))
            .await
            .unwrap();

        let err = repo
            .insert(&key("a1"), record("https://other.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::Conflict(_)));
        let kept = repo.get(&key("a1")).await.unwrap().unwrap();
        assert_eq!(kept.original_url, "https://example.com");
    }

    #[tokio::test]
    async fn delete_existing_and_nonexistent() {
        let repo = InMemoryRepository::new();

        repo.insert(&key("a1"), record("https://example.com"))
            .await
            .unwrap();

        assert!(repo.delete(&key("a1")).await.unwrap());
        assert!(!repo.delete(&key("a1")).await.unwrap());
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn list_is_sorted_by_key() {
        let repo = InMemoryRepository::with_capacity(4);
        for k in ["0c", "0a", "0b"] {
            repo.insert(&key(k), record(&format!("https://{k}.com")))
                .await
                .unwrap();
        }

        let keys: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|(k, _)| k.to_string())
            .collect();
        assert_eq!(keys, vec!["0a", "0b", "0c"]);
    }

    #[tokio::test]
    async fn concurrent_inserts() {
        let repo = Arc::new(InMemoryRepository::new());
        let mut handles = vec![];

        for i in 0..10u64 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                let k = shortkey_core::encode(i, 2).unwrap();
                repo.insert(&k, record(&format!("https://example{i}.com")))
                    .await
                    .unwrap();
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(repo.len(), 10);
    }
}
