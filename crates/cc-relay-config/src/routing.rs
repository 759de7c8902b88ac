use std::collections::HashMap;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    #[serde(default)]
    pub strategy: RoutingStrategy,

    /// Total wall-clock budget for one dispatch attempt across providers.
    #[serde(default = "default_failover_timeout_ms")]
    pub failover_timeout_ms: u64,

    /// Per-candidate deadline within a failover attempt or race.
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,

    /// When set, every response carries `X-CC-Relay-Strategy`/`X-CC-Relay-Provider`.
    #[serde(default)]
    pub debug: bool,

    /// Prefix → provider-name, consulted by the `model_based` strategy and the model filter.
    #[serde(default)]
    pub model_mapping: HashMap<String, String>,

    #[serde(default)]
    pub default_provider: Option<String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            strategy: RoutingStrategy::default(),
            failover_timeout_ms: default_failover_timeout_ms(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
            debug: false,
            model_mapping: HashMap::new(),
            default_provider: None,
        }
    }
}

const fn default_failover_timeout_ms() -> u64 {
    5_000
}

const fn default_attempt_timeout_ms() -> u64 {
    3_000
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoutingStrategy {
    #[default]
    Failover,
    RoundRobin,
    WeightedRoundRobin,
    Shuffle,
    ModelBased,
}
