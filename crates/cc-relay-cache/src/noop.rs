use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheError;
use crate::store::SignatureStore;

/// Always misses. Used to disable signature caching without branching dispatch logic on an
/// `Option<dyn SignatureStore>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStore;

#[async_trait]
impl SignatureStore for NoopStore {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }

    async fn exists(&self, _key: &str) -> Result<bool, CacheError> {
        Ok(false)
    }
}
