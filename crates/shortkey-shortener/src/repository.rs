pub mod memory;

use crate::error::Result;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use shortkey_core::Key;

/// A stored URL record in the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlRecord {
    /// The original URL that was shortened.
    pub original_url: String,
    /// The account that created the record, if known.
    pub owner: Option<String>,
    /// When the record was stored.
    pub created_at: Timestamp,
}

/// Durable mapping from keys to URL records.
///
/// The repository only stores what it is given; it never decides which key
/// a record gets.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    /// Inserts a new URL record. Returns `Err(Conflict)` if the key already exists.
    async fn insert(&self, key: &Key, record: UrlRecord) -> Result<()>;

    /// Retrieves the URL record for a given key.
    /// Returns `None` if the key does not exist.
    async fn get(&self, key: &Key) -> Result<Option<UrlRecord>>;

    /// Deletes the URL record for a given key.
    /// Returns `true` if the record existed and was removed.
    async fn delete(&self, key: &Key) -> Result<bool>;

    /// Returns every stored record.
    async fn list(&self) -> Result<Vec<(Key, UrlRecord)>>;
}

#[async_trait]
impl<R: Repository> Repository for std::sync::Arc<R> {
    async fn insert(&self, key: &Key, record: UrlRecord) -> Result<()> {
        (**self).insert(key, record).await
    }

    async fn get(&self, key: &Key) -> Result<Option<UrlRecord>> {
        (**self).get(key).await
    }

    async fn delete(&self, key: &Key) -> Result<bool> {
        (**self).delete(key).await
    }

    async fn list(&self) -> Result<Vec<(Key, UrlRecord)>> {
        (**self).list().await
    }
}
