use std::sync::atomic::{AtomicUsize, Ordering};

use super::{SelectProvider, SelectionContext};

/// Atomic counter modulo the healthy-provider count. Equivalent to counting directly over the
/// healthy list rather than the full provider list, so an unhealthy slot never needs skipping.
pub struct RoundRobinRouter {
    counter: AtomicUsize,
}

impl RoundRobinRouter {
    #[must_use]
    pub fn new() -> Self {
        Self { counter: AtomicUsize::new(0) }
    }
}

impl Default for RoundRobinRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectProvider for RoundRobinRouter {
    fn select(&self, ctx: &SelectionContext<'_>) -> Option<String> {
        if ctx.healthy.is_empty() {
            return None;
        }
        let idx = self.counter.fetch_add(1, Ordering::Relaxed) % ctx.healthy.len();
        Some(ctx.healthy[idx].name.clone())
    }
}
