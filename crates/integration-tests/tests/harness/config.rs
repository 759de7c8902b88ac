//! Programmatic configuration builder for integration tests.

use std::collections::HashMap;
use std::net::SocketAddr;

use cc_relay_config::{
    AdapterConfig, ClientAuthConfig, Config, CredentialConfig, HealthConfig, ProviderConfig, RoutingConfig, RoutingStrategy, ServerConfig, SignatureCacheConfig,
};
use secrecy::SecretString;

const DEFAULT_MODELS: &[&str] = &["claude-opus-4-5", "claude-sonnet-4-5"];

pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    ..ServerConfig::default()
                },
                providers: Vec::new(),
                routing: RoutingConfig::default(),
                health: HealthConfig::default(),
                cache: SignatureCacheConfig::default(),
                auth: None,
            },
        }
    }

    /// Adds an Anthropic-adapter provider pointed at a mock upstream, with `priority` 0 and
    /// `weight` 1.
    pub fn with_provider(self, name: &str, base_url: &str) -> Self {
        self.with_provider_ranked(name, base_url, 0, 1)
    }

    /// Same as [`Self::with_provider`] but with an explicit priority (failover ordering) and
    /// weight (weighted-round-robin share).
    pub fn with_provider_ranked(mut self, name: &str, base_url: &str, priority: u32, weight: u32) -> Self {
        self.config.providers.push(ProviderConfig {
            name: name.to_owned(),
            adapter: AdapterConfig::Anthropic,
            base_url: base_url.parse().expect("valid mock upstream URL"),
            owner: None,
            priority,
            weight,
            models: DEFAULT_MODELS.iter().map(|m| (*m).to_owned()).collect(),
            model_mapping: HashMap::new(),
            credentials: vec![CredentialConfig {
                api_key: SecretString::from("sk-test"),
                rpm: None,
                tpm: None,
            }],
            supports_transparent_auth: false,
        });
        self
    }

    /// Routes requests whose model starts with `prefix` to `provider`, for `model_based`
    /// routing and the model filter.
    pub fn with_model_mapping(mut self, prefix: &str, provider: &str) -> Self {
        self.config.routing.model_mapping.insert(prefix.to_owned(), provider.to_owned());
        self
    }

    /// Sets the vendor-side model translation `provider_name` applies before forwarding
    /// (distinct from the routing-level mapping above, which only picks a provider).
    pub fn with_provider_model_mapping(mut self, provider_name: &str, mapping: &[(&str, &str)]) -> Self {
        if let Some(provider) = self.config.providers.iter_mut().find(|p| p.name == provider_name) {
            provider.model_mapping = mapping.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
        }
        self
    }

    pub fn with_strategy(mut self, strategy: RoutingStrategy) -> Self {
        self.config.routing.strategy = strategy;
        self
    }

    pub fn with_debug_headers(mut self) -> Self {
        self.config.routing.debug = true;
        self
    }

    pub fn with_failover_timeout_ms(mut self, millis: u64) -> Self {
        self.config.routing.failover_timeout_ms = millis;
        self
    }

    pub fn with_attempt_timeout_ms(mut self, millis: u64) -> Self {
        self.config.routing.attempt_timeout_ms = millis;
        self
    }

    pub fn with_health(mut self, failure_threshold: u32, open_duration_ms: u64, half_open_probes: u32) -> Self {
        self.config.health = HealthConfig {
            failure_threshold,
            open_duration_ms,
            half_open_probes,
            ..self.config.health
        };
        self
    }

    pub fn with_client_auth(mut self, api_key: Option<&str>, bearer_token: Option<&str>) -> Self {
        self.config.auth = Some(ClientAuthConfig {
            api_key: api_key.map(|s| SecretString::from(s.to_owned())),
            bearer_token: bearer_token.map(|s| SecretString::from(s.to_owned())),
            require_both: false,
        });
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
