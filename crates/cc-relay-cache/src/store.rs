use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheError;

/// The abstract cache the signature store depends on: Get / Set-with-TTL / Delete / Exists.
/// Implementations must be safe for concurrent use; the signature cache delegates
/// thread-safety entirely to whichever backend is selected.
#[async_trait]
pub trait SignatureStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;
}
