use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use crate::error::CacheError;
use crate::store::SignatureStore;

/// Distributed cache shared across replicas. `set` is fire-and-forget with local success
/// semantics: a replication failure on the Redis side does not block the response stream, and
/// a stale read immediately after a `set` against a replica is tolerated upstream as a miss.
pub struct RedisStore {
    client: redis::Client,
    key_prefix: String,
}

impl RedisStore {
    /// # Errors
    ///
    /// Returns an error if `url` cannot be parsed as a Redis connection string.
    pub fn new(url: &url::Url, key_prefix: impl Into<String>) -> Result<Self, CacheError> {
        let client = redis::Client::open(url.as_str()).map_err(|e| CacheError::Backend(e.to_string()))?;
        Ok(Self {
            client,
            key_prefix: key_prefix.into(),
        })
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}:{key}", self.key_prefix)
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, CacheError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }
}

#[async_trait]
impl SignatureStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.connection().await?;
        conn.get(self.namespaced(key)).await.map_err(|e| CacheError::Backend(e.to_string()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(self.namespaced(key), value, seconds)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(self.namespaced(key)).await.map_err(|e| CacheError::Backend(e.to_string()))
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.connection().await?;
        conn.exists(self.namespaced(key)).await.map_err(|e| CacheError::Backend(e.to_string()))
    }
}
