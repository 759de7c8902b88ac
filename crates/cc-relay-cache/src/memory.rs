use std::time::Duration;

use async_trait::async_trait;
use moka::sync::Cache;

use crate::error::CacheError;
use crate::store::SignatureStore;

/// In-process, single-instance cache. Entries do not survive a restart and are not shared
/// across replicas; every entry shares the one configured TTL (the signature cache only ever
/// writes with a single 3-hour TTL, so a cache-wide expiry is sufficient).
pub struct MemoryStore {
    cache: Cache<String, Vec<u8>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            cache: Cache::builder().max_capacity(capacity).time_to_live(ttl).build(),
        }
    }
}

#[async_trait]
impl SignatureStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.cache.get(key))
    }

    async fn set(&self, key: &str, value: Vec<u8>, _ttl: Duration) -> Result<(), CacheError> {
        self.cache.insert(key.to_owned(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.cache.invalidate(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.cache.contains_key(key))
    }
}
