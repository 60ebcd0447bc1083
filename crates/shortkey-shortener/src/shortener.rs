use crate::error::ShortenerError;
use crate::repository::UrlRecord;
use async_trait::async_trait;
use shortkey_core::Key;

type Result<T> = std::result::Result<T, ShortenerError>;

/// Parameters for creating a shortened URL.
#[derive(Debug, Clone)]
pub struct ShortenParams {
    /// The original URL to be shortened.
    pub original_url: String,
    /// The account creating the short URL.
    pub owner: Option<String>,
}

impl ShortenParams {
    pub fn new(original_url: impl Into<String>) -> Self {
        Self {
            original_url: original_url.into(),
            owner: None,
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Creates a shortened URL and returns the key it was stored under.
    async fn shorten(&self, params: ShortenParams) -> Result<Key>;

    /// Resolves a key to its stored URL record.
    async fn resolve(&self, key: &Key) -> Result<Option<UrlRecord>>;

    /// Deletes a shortened URL. Returns `true` if the record existed.
    async fn delete(&self, key: &Key) -> Result<bool>;

    /// Lists every stored short URL.
    async fn list(&self) -> Result<Vec<(Key, UrlRecord)>>;
}
