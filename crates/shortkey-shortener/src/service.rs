use crate::error::{ShortenerError, StorageError};
use crate::repository::{Repository, UrlRecord};
use crate::shortener::{ShortenParams, Shortener};
use async_trait::async_trait;
use jiff::Timestamp;
use shortkey_core::Key;
use shortkey_generator::Generator;
use std::sync::Arc;
use tracing::{debug, error};

/// A concrete implementation of the `Shortener` trait.
///
/// This service wraps a `Repository` and a `Generator`:
/// - a key is generated once per created record, before it is stored
/// - a key goes back to the generator only after its record is removed
///
/// The `Generator` is responsible for uniqueness. No collision retry is
/// performed.
#[derive(Debug)]
pub struct ShortenerService<R, G> {
    repository: Arc<R>,
    generator: Arc<G>,
}

impl<R, G> Clone for ShortenerService<R, G> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            generator: Arc::clone(&self.generator),
        }
    }
}

impl<R: Repository, G: Generator> ShortenerService<R, G> {
    pub fn new(repository: R, generator: G) -> Self {
        Self {
            repository: Arc::new(repository),
            generator: Arc::new(generator),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Validates that the URL has an http(s) scheme and a host.
    fn validate_url(url: &str) -> Result<(), ShortenerError> {
        if url.is_empty() {
            return Err(ShortenerError::InvalidUrl(
                "URL cannot be empty".to_string(),
            ));
        }

        let Some((scheme, rest)) = url.split_once("://") else {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL must have a valid scheme and host: {}",
                url
            )));
        };

        let scheme = scheme.to_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL scheme must be http or https: {}",
                scheme
            )));
        }

        let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
        if host.is_empty() || host.chars().any(char::is_whitespace) {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL must have a valid host: {}",
                url
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl<R: Repository, G: Generator> Shortener for ShortenerService<R, G> {
    async fn shorten(&self, params: ShortenParams) -> Result<Key, ShortenerError> {
        Self::validate_url(&params.original_url)?;

        let key = self.generator.generate();
        let record = UrlRecord {
            original_url: params.original_url,
            owner: params.owner,
            created_at: Timestamp::now(),
        };

        match self.repository.insert(&key, record).await {
            Ok(()) => {
                debug!(key = %key, "stored short url");
                Ok(key)
            }
            Err(StorageError::Conflict(existing)) => {
                // The key is live in storage, so it must not be recycled.
                // This means the generator lost track of what it issued.
                error!(key = %existing, "generated key already exists in storage");
                Err(StorageError::Conflict(existing).into())
            }
            Err(e) => {
                // Nothing was stored under the key; hand it back.
                self.generator.recycle(&key);
                Err(e.into())
            }
        }
    }

    async fn resolve(&self, key: &Key) -> Result<Option<UrlRecord>, ShortenerError> {
        Ok(self.repository.get(key).await?)
    }

    async fn delete(&self, key: &Key) -> Result<bool, ShortenerError> {
        let removed = self.repository.delete(key).await?;
        if removed {
            self.generator.recycle(key);
        }
        Ok(removed)
    }

    async fn list(&self) -> Result<Vec<(Key, UrlRecord)>, ShortenerError> {
        Ok(self.repository.list().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory::InMemoryRepository;
    use failing::FailingRepository;
    use shortkey_allocator::{Allocator, AllocatorSettings, ReplicaIdentity};

    fn allocator() -> Allocator {
        let settings = AllocatorSettings::builder()
            .identity(ReplicaIdentity::standalone())
            .build();
        Allocator::new(settings).unwrap()
    }

    fn test_service() -> ShortenerService<InMemoryRepository, Allocator> {
        ShortenerService::new(InMemoryRepository::new(), allocator())
    }

    mod failing {
        use super::*;
        use crate::error::Result;

        /// Repository whose inserts always fail with a transient error.
        pub(super) struct FailingRepository;

        #[async_trait]
        impl Repository for FailingRepository {
            async fn insert(&self, _key: &Key, _record: UrlRecord) -> Result<()> {
                Err(StorageError::Unavailable("database is down".to_string()))
            }

            async fn get(&self, _key: &Key) -> Result<Option<UrlRecord>> {
                Ok(None)
            }

            async fn delete(&self, _key: &Key) -> Result<bool> {
                Ok(false)
            }

            async fn list(&self) -> Result<Vec<(Key, UrlRecord)>> {
                Ok(Vec::new())
            }
        }
    }

    #[tokio::test]
    async fn shorten_assigns_sequential_keys() {
        let service = test_service();

        let first = service
            .shorten(ShortenParams::new("https://example.com"))
            .await
            .unwrap();
        let second = service
            .shorten(ShortenParams::new("https://example.org"))
            .await
            .unwrap();

        assert_eq!(first.as_str(), "00");
        assert_eq!(second.as_str(), "01");
    }

    #[tokio::test]
    async fn shorten_stores_owner() {
        let service = test_service();

        let key = service
            .shorten(ShortenParams::new("https://example.com").with_owner("alice"))
            .await
            .unwrap();

        let record = service.resolve(&key).await.unwrap().unwrap();
        assert_eq!(record.original_url, "https://example.com");
        assert_eq!(record.owner.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn shorten_with_invalid_url_fails() {
        let service = test_service();

        for url in ["", "not-a-valid-url", "ftp://example.com", "https://", "http:///path"] {
            let err = service.shorten(ShortenParams::new(url)).await.unwrap_err();
            assert!(matches!(err, ShortenerError::InvalidUrl(_)), "{url}");
        }

        // Rejected URLs never consume a key.
        assert_eq!(service.generator().cursor(), 0);
    }

    #[tokio::test]
    async fn resolve_nonexistent_url() {
        let service = test_service();
        let record = service.resolve(&Key::parse("zz").unwrap()).await.unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn deleted_key_is_reused() {
        let service = test_service();

        let first = service
            .shorten(ShortenParams::new("https://example.com"))
            .await
            .unwrap();
        service
            .shorten(ShortenParams::new("https://example.org"))
            .await
            .unwrap();

        assert!(service.delete(&first).await.unwrap());
        assert!(service.resolve(&first).await.unwrap().is_none());

        let reused = service
            .shorten(ShortenParams::new("https://example.net"))
            .await
            .unwrap();
        assert_eq!(reused, first);
        let record = service.resolve(&reused).await.unwrap().unwrap();
        assert_eq!(record.original_url, "https://example.net");
    }

    #[tokio::test]
    async fn delete_nonexistent_does_not_recycle() {
        let service = test_service();
        service
            .shorten(ShortenParams::new("https://example.com"))
            .await
            .unwrap();

        assert!(!service.delete(&Key::parse("05").unwrap()).await.unwrap());
        assert_eq!(service.generator().recycled_len(), 0);
    }

    #[tokio::test]
    async fn failed_insert_returns_key_to_generator() {
        let service = ShortenerService::new(FailingRepository, allocator());

        let err = service
            .shorten(ShortenParams::new("https://example.com"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ShortenerError::Storage(StorageError::Unavailable(_))
        ));
        assert_eq!(service.generator().recycled_len(), 1);
        assert_eq!(service.generator().allocate().as_str(), "00");
    }

    #[tokio::test]
    async fn conflicting_insert_keeps_key_out_of_the_pool() {
        let repo = InMemoryRepository::new();
        repo.insert(
            &Key::parse("00").unwrap(),
            UrlRecord {
                original_url: "https://stale.example".to_string(),
                owner: None,
                created_at: Timestamp::now(),
            },
        )
        .await
        .unwrap();
        let service = ShortenerService::new(repo, allocator());

        let err = service
            .shorten(ShortenParams::new("https://example.com"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ShortenerError::Storage(StorageError::Conflict(_))
        ));
        assert_eq!(service.generator().recycled_len(), 0);
    }

    #[tokio::test]
    async fn list_returns_all_records() {
        let service = test_service();
        for url in ["https://a.com", "https://b.com", "https://c.com"] {
            service.shorten(ShortenParams::new(url)).await.unwrap();
        }

        let urls: Vec<String> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|(_, record)| record.original_url)
            .collect();
        assert_eq!(urls, vec!["https://a.com", "https://b.com", "https://c.com"]);
    }
}
