use serde::Deserialize;
use url::Url;

/// Backend for the extended-thinking signature cache. The core only depends on the
/// `SignatureStore` interface this selects an implementation of.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum SignatureCacheConfig {
    /// In-process, single-instance cache. Lost on restart.
    Memory {
        #[serde(default = "default_ttl_seconds")]
        ttl_seconds: u64,
        #[serde(default = "default_capacity")]
        capacity: u64,
    },
    /// Distributed cache shared across replicas.
    Redis {
        url: Url,
        #[serde(default = "default_ttl_seconds")]
        ttl_seconds: u64,
        #[serde(default = "default_key_prefix")]
        key_prefix: String,
    },
    /// Always misses; used to disable signature caching entirely.
    Noop,
}

impl Default for SignatureCacheConfig {
    fn default() -> Self {
        Self::Memory {
            ttl_seconds: default_ttl_seconds(),
            capacity: default_capacity(),
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_ttl_seconds() -> u64 {
    10_800
}

fn default_capacity() -> u64 {
    10_000
}

fn default_key_prefix() -> String {
    "cc-relay:sig".to_owned()
}
