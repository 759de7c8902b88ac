//! Wraps [`DispatchState`] in an `ArcSwap` so provider-set-preserving hot-reloads can replace
//! tunables (failure thresholds, weights, timeouts) without restarting the process, per Design
//! Note 9: "Implement as atomic pointer swap of an immutable configuration snapshot; in-flight
//! requests complete against the snapshot they captured on entry." Adding or removing
//! providers still requires a restart, since round-robin/shuffle/weighted state is sized
//! against the provider list at construction time — [`SharedState::reload`] refuses a reload
//! that would change the provider set rather than silently invalidating that state.

use std::collections::HashSet;
use std::sync::Arc;

use arc_swap::ArcSwap;
use cc_relay_config::Config;
use cc_relay_dispatch::DispatchState;

pub struct SharedState {
    inner: ArcSwap<DispatchState>,
}

impl SharedState {
    /// # Errors
    ///
    /// Returns an error if building the initial [`DispatchState`] fails (invalid provider/
    /// adapter configuration).
    pub fn new(config: &Config) -> anyhow::Result<Arc<Self>> {
        let state = DispatchState::from_config(config)?;
        Ok(Arc::new(Self {
            inner: ArcSwap::from_pointee(state),
        }))
    }

    /// The current snapshot. Cheap: an `Arc` clone under the hood.
    #[must_use]
    pub fn load(&self) -> Arc<DispatchState> {
        self.inner.load_full()
    }

    /// Rebuilds a [`DispatchState`] from `config` and swaps it in, provided the provider set
    /// (by name) is unchanged from the current snapshot. The new snapshot carries the current
    /// snapshot's health tracker (and, strategy permitting, router) forward via
    /// [`DispatchState::reload`] rather than starting over, so breaker state and routing-state
    /// counters survive the swap and the background health prober — which holds an `Arc` to
    /// the health tracker from the snapshot it was spawned against — keeps watching the live
    /// one indefinitely.
    ///
    /// # Errors
    ///
    /// Returns an error if the new configuration fails to build, or if it would add or remove
    /// a provider (restart required for that).
    pub fn reload(&self, config: &Config) -> anyhow::Result<()> {
        let current = self.load();
        let current_names: HashSet<&str> = current.providers.iter().map(|p| p.name.as_str()).collect();

        // Validate the provider set before touching anything stateful: `DispatchState::reload`
        // trusts its caller to have already made this check.
        let candidate_names: HashSet<&str> = config.providers.iter().map(|p| p.name.as_str()).collect();
        anyhow::ensure!(
            current_names == candidate_names,
            "hot-reload cannot add or remove providers (restart required); \
             current={current_names:?} new={candidate_names:?}"
        );

        let candidate = DispatchState::reload(&current, config)?;
        self.inner.store(Arc::new(candidate));
        Ok(())
    }
}
