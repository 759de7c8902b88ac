use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use cc_relay_config::HealthConfig;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

const CLOSED: u8 = 0;
const OPEN: u8 = 1;
const HALF_OPEN: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            OPEN => Self::Open,
            HALF_OPEN => Self::HalfOpen,
            _ => Self::Closed,
        }
    }
}

struct ProviderHealth {
    state: AtomicU8,
    consecutive_failures: AtomicU32,
    open_since_ms: AtomicU64,
    half_open_admitted: AtomicU32,
    half_open_successes: AtomicU32,
}

impl Default for ProviderHealth {
    fn default() -> Self {
        Self {
            state: AtomicU8::new(CLOSED),
            consecutive_failures: AtomicU32::new(0),
            open_since_ms: AtomicU64::new(0),
            half_open_admitted: AtomicU32::new(0),
            half_open_successes: AtomicU32::new(0),
        }
    }
}

/// Per-provider circuit breaker. HALF-OPEN admission is a CAS-guarded slot counter: at most
/// `half_open_probes` callers are admitted concurrently; the slot is released when that
/// caller's outcome (`record_success`/`record_failure`) resolves.
///
/// Outlives any single configuration snapshot: a hot-reload that only changes thresholds
/// (not the provider set) calls [`Self::update_config`] on the *same* tracker instance rather
/// than being torn down and rebuilt, so per-provider breaker state — and the background
/// prober's view of it — survive the reload.
pub struct HealthTracker {
    providers: DashMap<String, ProviderHealth>,
    config: ArcSwap<HealthConfig>,
    start: Instant,
}

impl HealthTracker {
    #[must_use]
    pub fn new(config: HealthConfig) -> Self {
        Self {
            providers: DashMap::new(),
            config: ArcSwap::from_pointee(config),
            start: Instant::now(),
        }
    }

    /// Swaps in new thresholds without touching any provider's recorded state. Used by
    /// config hot-reload; never called mid-request.
    pub fn update_config(&self, config: HealthConfig) {
        self.config.store(Arc::new(config));
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Returns true if `provider` is currently a plausible candidate, without admitting a
    /// HALF-OPEN probe slot. Safe to call on every filtered candidate when building a healthy
    /// set — unlike [`Self::is_callable`], it has no side effect beyond the timer-driven
    /// OPEN → HALF-OPEN transition shared by both methods, so calling it on a provider that is
    /// never actually dispatched cannot leak a probe admission.
    #[must_use]
    pub fn is_healthy(&self, provider: &str) -> bool {
        let health = self.providers.entry(provider.to_owned()).or_default();
        loop {
            match health.state.load(Ordering::Acquire) {
                CLOSED => return true,
                OPEN => {
                    if self.try_advance_open_to_half_open(&health) {
                        continue;
                    }
                    return false;
                }
                HALF_OPEN => return health.half_open_admitted.load(Ordering::Acquire) < self.config.load().half_open_probes,
                _ => unreachable!("circuit state is always one of CLOSED/OPEN/HALF_OPEN"),
            }
        }
    }

    /// Returns true if `provider` may receive a request right now, admitting a HALF-OPEN probe
    /// slot as a side effect when it does. Callers MUST call this only at the point a provider
    /// is actually about to be dispatched (never while merely filtering candidates — use
    /// [`Self::is_healthy`] for that), and must release the slot via `record_success`/
    /// `record_failure`/`release_admission` once the call's outcome is known, on every code
    /// path including one that never reaches a health report.
    ///
    /// For HALF-OPEN, returns true for at most `half_open_probes` concurrent callers and false
    /// thereafter until an in-flight probe resolves.
    pub fn is_callable(&self, provider: &str) -> bool {
        let health = self.providers.entry(provider.to_owned()).or_default();
        loop {
            match health.state.load(Ordering::Acquire) {
                CLOSED => return true,
                OPEN => {
                    if self.try_advance_open_to_half_open(&health) {
                        continue;
                    }
                    return false;
                }
                HALF_OPEN => {
                    let admitted = health.half_open_admitted.load(Ordering::Acquire);
                    if admitted >= self.config.load().half_open_probes {
                        return false;
                    }
                    if health
                        .half_open_admitted
                        .compare_exchange(admitted, admitted + 1, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return true;
                    }
                }
                _ => unreachable!("circuit state is always one of CLOSED/OPEN/HALF_OPEN"),
            }
        }
    }

    /// If `provider` is OPEN and `open_duration_ms` has elapsed, transitions it to HALF-OPEN
    /// (resetting the admission/success counters) and returns true so the caller re-reads the
    /// now-current state. Returns false if the provider is still within its open window, whether
    /// or not this call won the race to perform the transition.
    fn try_advance_open_to_half_open(&self, health: &ProviderHealth) -> bool {
        let opened = health.open_since_ms.load(Ordering::Acquire);
        if self.now_ms().saturating_sub(opened) < self.config.load().open_duration_ms {
            return false;
        }
        if health
            .state
            .compare_exchange(OPEN, HALF_OPEN, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            health.half_open_admitted.store(0, Ordering::Release);
            health.half_open_successes.store(0, Ordering::Release);
        }
        // Either we just transitioned, or a racing caller did; either way the state has moved
        // past OPEN and the caller should re-read it.
        true
    }

    /// Releases a HALF-OPEN admission slot taken by [`Self::is_callable`] without going through
    /// `record_success`/`record_failure` — the upstream-fatal (4xx ≠ 429) path, which per spec
    /// leaves breaker state untouched but still must not hold the slot open forever. A no-op if
    /// the provider isn't currently HALF-OPEN (the admitted counter is reset to zero on every
    /// transition into or out of that state, so calling it late on a provider that has already
    /// moved on is harmless).
    pub fn release_admission(&self, provider: &str) {
        if let Some(health) = self.providers.get(provider) {
            release_half_open_slot(&health);
        }
    }

    #[must_use]
    pub fn state(&self, provider: &str) -> CircuitState {
        self.providers.get(provider).map_or(CircuitState::Closed, |h| h.state.load(Ordering::Acquire).into())
    }

    /// Only HTTP 429/500/502/503/504 and connection errors/timeouts count as failures. Callers
    /// must not invoke this for any other status.
    pub fn record_failure(&self, provider: &str) {
        let health = self.providers.entry(provider.to_owned()).or_default();
        match health.state.load(Ordering::Acquire) {
            CLOSED => {
                let failures = health.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;
                if failures >= self.config.load().failure_threshold
                    && health
                        .state
                        .compare_exchange(CLOSED, OPEN, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                {
                    health.open_since_ms.store(self.now_ms(), Ordering::Release);
                    health.consecutive_failures.store(0, Ordering::Release);
                }
            }
            HALF_OPEN => {
                release_half_open_slot(&health);
                if health
                    .state
                    .compare_exchange(HALF_OPEN, OPEN, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    health.open_since_ms.store(self.now_ms(), Ordering::Release);
                    health.half_open_successes.store(0, Ordering::Release);
                }
            }
            _ => {}
        }
    }

    pub fn record_success(&self, provider: &str) {
        let health = self.providers.entry(provider.to_owned()).or_default();
        match health.state.load(Ordering::Acquire) {
            CLOSED => {
                health.consecutive_failures.store(0, Ordering::Release);
            }
            HALF_OPEN => {
                release_half_open_slot(&health);
                let successes = health.half_open_successes.fetch_add(1, Ordering::AcqRel) + 1;
                if successes >= self.config.load().half_open_probes
                    && health
                        .state
                        .compare_exchange(HALF_OPEN, CLOSED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                {
                    health.consecutive_failures.store(0, Ordering::Release);
                    health.half_open_admitted.store(0, Ordering::Release);
                    health.half_open_successes.store(0, Ordering::Release);
                }
            }
            OPEN => {
                // A background probe succeeded against a fully OPEN provider.
                if health
                    .state
                    .compare_exchange(OPEN, HALF_OPEN, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    health.half_open_admitted.store(0, Ordering::Release);
                    health.half_open_successes.store(1, Ordering::Release);
                }
            }
            _ => {}
        }
    }
}

fn release_half_open_slot(health: &ProviderHealth) {
    let _ = health
        .half_open_admitted
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| Some(n.saturating_sub(1)));
}

type ProbeFuture = Pin<Box<dyn Future<Output = bool> + Send>>;

/// Spawns the background health-check task: on each tick, probes every currently-OPEN provider
/// with a lightweight call and reports success back into the tracker, which transitions it to
/// HALF-OPEN. Runs until `shutdown` is cancelled.
pub fn spawn_prober<F>(tracker: Arc<HealthTracker>, interval: Duration, probe: F, shutdown: CancellationToken) -> tokio::task::JoinHandle<()>
where
    F: Fn(String) -> ProbeFuture + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let open_providers: Vec<String> = tracker
                .providers
                .iter()
                .filter(|entry| entry.value().state.load(Ordering::Acquire) == OPEN)
                .map(|entry| entry.key().clone())
                .collect();
            for provider in open_providers {
                if probe(provider.clone()).await {
                    tracker.record_success(&provider);
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> HealthConfig {
        HealthConfig {
            failure_threshold: 3,
            open_duration_ms: 30_000,
            half_open_probes: 3,
            health_check_interval_ms: 10_000,
        }
    }

    #[test]
    fn starts_closed_and_callable() {
        let tracker = HealthTracker::new(test_config());
        assert_eq!(tracker.state("anthropic"), CircuitState::Closed);
        assert!(tracker.is_callable("anthropic"));
    }

    #[test]
    fn failures_below_threshold_stay_closed() {
        let tracker = HealthTracker::new(test_config());
        tracker.record_failure("anthropic");
        tracker.record_failure("anthropic");
        assert_eq!(tracker.state("anthropic"), CircuitState::Closed);
    }

    #[test]
    fn failures_at_threshold_open_the_circuit() {
        let tracker = HealthTracker::new(test_config());
        tracker.record_failure("anthropic");
        tracker.record_failure("anthropic");
        tracker.record_failure("anthropic");
        assert_eq!(tracker.state("anthropic"), CircuitState::Open);
        assert!(!tracker.is_callable("anthropic"));
    }

    #[test]
    fn success_resets_the_failure_counter() {
        let tracker = HealthTracker::new(test_config());
        tracker.record_failure("anthropic");
        tracker.record_failure("anthropic");
        tracker.record_success("anthropic");
        tracker.record_failure("anthropic");
        tracker.record_failure("anthropic");
        assert_eq!(tracker.state("anthropic"), CircuitState::Closed);
    }

    #[test]
    fn providers_are_tracked_independently() {
        let tracker = HealthTracker::new(test_config());
        for _ in 0..3 {
            tracker.record_failure("anthropic");
        }
        assert_eq!(tracker.state("anthropic"), CircuitState::Open);
        assert_eq!(tracker.state("zai"), CircuitState::Closed);
    }

    #[test]
    fn half_open_admits_at_most_the_configured_probe_count() {
        let tracker = HealthTracker::new(HealthConfig {
            open_duration_ms: 0,
            ..test_config()
        });
        for _ in 0..3 {
            tracker.record_failure("anthropic");
        }
        assert!(tracker.is_callable("anthropic"));
        assert_eq!(tracker.state("anthropic"), CircuitState::HalfOpen);
        assert!(tracker.is_callable("anthropic"));
        assert!(tracker.is_callable("anthropic"));
        assert!(!tracker.is_callable("anthropic"));
    }

    #[test]
    fn half_open_closes_after_consecutive_successes() {
        let tracker = HealthTracker::new(HealthConfig {
            open_duration_ms: 0,
            ..test_config()
        });
        for _ in 0..3 {
            tracker.record_failure("anthropic");
        }
        assert!(tracker.is_callable("anthropic"));
        tracker.record_success("anthropic");
        assert!(tracker.is_callable("anthropic"));
        tracker.record_success("anthropic");
        assert!(tracker.is_callable("anthropic"));
        tracker.record_success("anthropic");
        assert_eq!(tracker.state("anthropic"), CircuitState::Closed);
    }

    #[test]
    fn half_open_failure_reopens_and_resets_timer() {
        let tracker = HealthTracker::new(HealthConfig {
            open_duration_ms: 0,
            ..test_config()
        });
        for _ in 0..3 {
            tracker.record_failure("anthropic");
        }
        assert!(tracker.is_callable("anthropic"));
        tracker.record_failure("anthropic");
        assert_eq!(tracker.state("anthropic"), CircuitState::Open);
        assert!(!tracker.is_callable("anthropic"));
    }

    #[test]
    fn is_healthy_never_consumes_a_half_open_admission_slot() {
        let tracker = HealthTracker::new(HealthConfig {
            open_duration_ms: 0,
            ..test_config()
        });
        for _ in 0..3 {
            tracker.record_failure("anthropic");
        }

        // Repeatedly checking candidacy while filtering must not exhaust the probe budget:
        // only `is_callable` (called at actual dispatch time) may admit a slot.
        for _ in 0..10 {
            assert!(tracker.is_healthy("anthropic"));
        }
        assert_eq!(tracker.state("anthropic"), CircuitState::HalfOpen);

        // All configured probe slots are still available for the real dispatch.
        for _ in 0..3 {
            assert!(tracker.is_callable("anthropic"));
        }
        assert!(!tracker.is_callable("anthropic"));
    }

    #[test]
    fn release_admission_frees_a_half_open_slot_taken_but_never_reported() {
        let tracker = HealthTracker::new(HealthConfig {
            open_duration_ms: 0,
            half_open_probes: 1,
            ..test_config()
        });
        for _ in 0..3 {
            tracker.record_failure("anthropic");
        }

        // Admitted but the call turned out to be upstream-fatal (4xx != 429): the handler
        // reports neither success nor failure, so it must release the slot explicitly.
        assert!(tracker.is_callable("anthropic"));
        assert!(!tracker.is_callable("anthropic"));
        tracker.release_admission("anthropic");
        assert!(tracker.is_callable("anthropic"));
    }

    #[test]
    fn release_admission_on_a_provider_not_half_open_is_a_no_op() {
        let tracker = HealthTracker::new(test_config());
        tracker.release_admission("anthropic");
        assert_eq!(tracker.state("anthropic"), CircuitState::Closed);
        assert!(tracker.is_callable("anthropic"));
    }
}
