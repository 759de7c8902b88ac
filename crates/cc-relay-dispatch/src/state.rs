//! Assembles the immutable, process-lifetime state the dispatch handler shares across every
//! request: one [`ProviderRuntime`] per configured provider, the router, the health tracker,
//! and the signature cache. A single `Arc<DispatchState>` is cloned into every request's
//! extension.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use cc_relay_cache::{MemoryStore, NoopStore, RedisStore, SignatureCache};
use cc_relay_config::{Config, ProviderConfig, RoutingConfig, SignatureCacheConfig};

use crate::health::HealthTracker;
use crate::keypool::KeyPool;
use crate::provider::Adapter;
use crate::router::Router;

/// One configured upstream, fully resolved: its adapter, its credential pool, and the
/// descriptor fields the router and model filter consult.
pub struct ProviderRuntime {
    pub name: String,
    pub adapter: Adapter,
    pub key_pool: KeyPool,
    pub base_url: url::Url,
    pub owner: Option<String>,
    pub priority: u32,
    pub weight: u32,
    pub models: Vec<String>,
    pub model_mapping: HashMap<String, String>,
}

impl ProviderRuntime {
    pub(crate) fn from_config(config: &ProviderConfig) -> anyhow::Result<Self> {
        let adapter = Adapter::from_config(&config.adapter, config.supports_transparent_auth)?;
        let key_pool = KeyPool::new(config.credentials.iter().map(|c| (c.api_key.clone(), c.rpm, c.tpm)).collect());
        Ok(Self {
            name: config.name.clone(),
            adapter,
            key_pool,
            base_url: config.base_url.clone(),
            owner: config.owner.clone(),
            priority: config.priority,
            weight: config.weight,
            models: config.models.clone(),
            model_mapping: config.model_mapping.clone(),
        })
    }
}

/// Everything the `/v1/messages` handler needs, shared read-only across every request via
/// `Arc<DispatchState>`. Replaced wholesale (not field-by-field) on hot-reload so in-flight
/// requests keep a consistent snapshot — but the health tracker and (when the strategy hasn't
/// changed) the router are the *same* instances the previous snapshot held, carried forward by
/// [`Self::reload`] rather than rebuilt, so breaker state and round-robin/weighted/shuffle
/// counters survive a reload and the background health prober never ends up watching an
/// orphaned tracker. `routing.strategy` changing, or the provider set changing (rejected before
/// this is reached — see `cc-relay-server`'s `SharedState::reload`), are the only cases that
/// still reset strategy state; breaker state always survives.
pub struct DispatchState {
    pub providers: Vec<ProviderRuntime>,
    pub health: Arc<HealthTracker>,
    pub router: Arc<Router>,
    pub cache: Arc<SignatureCache>,
    pub routing: RoutingConfig,
    pub client: reqwest::Client,
}

impl DispatchState {
    /// Builds a brand-new snapshot: a fresh health tracker (every breaker CLOSED) and fresh
    /// strategy state. Used only at process startup; reloads go through [`Self::reload`]
    /// instead so in-process state survives a config change.
    ///
    /// # Errors
    ///
    /// Returns an error if a provider's base URL or adapter-specific configuration (e.g. a
    /// Vertex service-account file) is invalid.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let providers = build_providers(config)?;
        let health = Arc::new(HealthTracker::new(config.health.clone()));
        let router = Arc::new(Router::from_config(&config.routing));
        let cache = Arc::new(build_cache(&config.cache)?);
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            providers,
            health,
            router,
            cache,
            routing: config.routing.clone(),
            client,
        })
    }

    /// Builds the next snapshot for a config hot-reload, carrying the *same* `health` and,
    /// when the strategy is unchanged, `router` instances forward from `previous` rather than
    /// constructing new ones — so the breaker state per provider, and the round-robin/weighted/
    /// shuffle counters, are untouched by a reload that only changes tunables like thresholds
    /// or weights. Only the config-derived fields (provider descriptors, routing config, the
    /// health tracker's thresholds) are actually swapped.
    ///
    /// Callers must have already confirmed `config`'s provider set matches `previous`'s (see
    /// `SharedState::reload`): this method does not re-check that, since strategy state sized
    /// against the old provider list would otherwise silently go stale.
    ///
    /// # Errors
    ///
    /// Returns an error if a provider's base URL or adapter-specific configuration is invalid.
    pub fn reload(previous: &Self, config: &Config) -> anyhow::Result<Self> {
        let providers = build_providers(config)?;

        previous.health.update_config(config.health.clone());
        let health = Arc::clone(&previous.health);

        let router = if previous.router.strategy() == config.routing.strategy {
            Arc::clone(&previous.router)
        } else {
            Arc::new(Router::from_config(&config.routing))
        };

        let cache = Arc::new(build_cache(&config.cache)?);
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            providers,
            health,
            router,
            cache,
            routing: config.routing.clone(),
            client,
        })
    }

    #[must_use]
    pub fn provider(&self, name: &str) -> Option<&ProviderRuntime> {
        self.providers.iter().find(|p| p.name == name)
    }
}

fn build_providers(config: &Config) -> anyhow::Result<Vec<ProviderRuntime>> {
    config.providers.iter().map(ProviderRuntime::from_config).collect()
}

fn build_cache(config: &SignatureCacheConfig) -> anyhow::Result<SignatureCache> {
    match config {
        SignatureCacheConfig::Memory { ttl_seconds, capacity } => {
            let ttl = Duration::from_secs(*ttl_seconds);
            Ok(SignatureCache::new(Arc::new(MemoryStore::new(*capacity, ttl)), ttl))
        }
        SignatureCacheConfig::Redis { url, ttl_seconds, key_prefix } => {
            let ttl = Duration::from_secs(*ttl_seconds);
            Ok(SignatureCache::new(Arc::new(RedisStore::new(url, key_prefix.clone())?), ttl))
        }
        SignatureCacheConfig::Noop => Ok(SignatureCache::new(Arc::new(NoopStore), Duration::from_secs(0))),
    }
}
