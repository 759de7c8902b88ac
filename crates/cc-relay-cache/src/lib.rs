//! The extended-thinking signature cache: the abstract [`SignatureStore`] interface, three
//! backends (in-process, distributed, no-op), and the model-group-aware key derivation that
//! lets a signature observed on one provider be replayed against another member of the same
//! model group.

mod error;
mod key;
mod memory;
mod noop;
mod redis_store;
mod store;

use std::sync::Arc;
use std::time::Duration;

pub use error::CacheError;
pub use key::signature_key;
pub use memory::MemoryStore;
pub use noop::NoopStore;
pub use redis_store::RedisStore;
pub use store::SignatureStore;

/// Wraps an abstract [`SignatureStore`] with model-group + text-hash key derivation:
/// `lookup`/`store` take a raw model name and thinking text, never a cache key.
pub struct SignatureCache {
    store: Arc<dyn SignatureStore>,
    ttl: Duration,
}

impl SignatureCache {
    #[must_use]
    pub fn new(store: Arc<dyn SignatureStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Looks up a previously cached signature for `thinking_text` under `model`'s group.
    /// A backend error is logged and treated as a miss; the caller re-issues the thinking
    /// block unsigned and the upstream provider will re-sign it.
    pub async fn lookup(&self, model: &str, thinking_text: &str) -> Option<Vec<u8>> {
        let group = cc_relay_core::model_group(model);
        let key = signature_key(group, thinking_text);
        match self.store.get(&key).await {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = %err, %key, "signature cache read failed, treating as miss");
                None
            }
        }
    }

    /// Stores `signature` for `thinking_text` under `model`'s group with the configured TTL.
    /// Last-writer wins; no upsert semantics are needed since the content being signed is
    /// content-addressed by its own hash.
    pub async fn store(&self, model: &str, thinking_text: &str, signature: Vec<u8>) {
        let group = cc_relay_core::model_group(model);
        let key = signature_key(group, thinking_text);
        if let Err(err) = self.store.set(&key, signature, self.ttl).await {
            tracing::warn!(error = %err, %key, "signature cache write failed");
        }
    }
}
