use serde::Deserialize;

/// Circuit-breaker thresholds shared by every provider's health record.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthConfig {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_open_duration_ms")]
    pub open_duration_ms: u64,
    #[serde(default = "default_half_open_probes")]
    pub half_open_probes: u32,
    /// Background probe cadence for OPEN providers. `None` disables the background prober;
    /// the breaker still self-transitions to HALF-OPEN on `is_callable` once the timer elapses.
    #[serde(default = "default_health_check_interval_ms")]
    pub health_check_interval_ms: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            open_duration_ms: default_open_duration_ms(),
            half_open_probes: default_half_open_probes(),
            health_check_interval_ms: default_health_check_interval_ms(),
        }
    }
}

const fn default_failure_threshold() -> u32 {
    5
}

const fn default_open_duration_ms() -> u64 {
    30_000
}

const fn default_half_open_probes() -> u32 {
    3
}

const fn default_health_check_interval_ms() -> u64 {
    10_000
}
