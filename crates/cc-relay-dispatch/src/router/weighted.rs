use std::collections::HashMap;
use std::sync::Mutex;

use super::{SelectProvider, SelectionContext};

/// Nginx smooth weighted round-robin: each provider carries a `current_weight`, bumped by its
/// own weight every selection; the highest `current_weight` wins and has the sum of all
/// effective weights subtracted from it. Unhealthy providers contribute zero effective weight
/// for this round (their `current_weight` is left untouched, so they resume at the same phase
/// once healthy again) but still carry their entry across selections.
///
/// The critical section is the whole selection, same "lock-guarded smooth-weighted
/// accounting" shape the concurrency model calls for — brief, and never held across I/O.
pub struct WeightedRoundRobinRouter {
    current_weights: Mutex<HashMap<String, i64>>,
}

impl WeightedRoundRobinRouter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current_weights: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for WeightedRoundRobinRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectProvider for WeightedRoundRobinRouter {
    fn select(&self, ctx: &SelectionContext<'_>) -> Option<String> {
        if ctx.healthy.is_empty() {
            return None;
        }

        let mut weights = self.current_weights.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let total: i64 = ctx.healthy.iter().map(|c| i64::from(c.weight)).sum();

        let mut winner: Option<(String, i64)> = None;
        for candidate in ctx.healthy {
            let entry = weights.entry(candidate.name.clone()).or_insert(0);
            *entry += i64::from(candidate.weight);
            if winner.as_ref().is_none_or(|(_, best)| *entry > *best) {
                winner = Some((candidate.name.clone(), *entry));
            }
        }

        let (name, _) = winner?;
        if let Some(entry) = weights.get_mut(&name) {
            *entry -= total;
        }
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::super::candidate;
    use super::*;

    fn ctx<'a>(healthy: &'a [super::super::Candidate], mapping: &'a HashMap<String, String>) -> SelectionContext<'a> {
        SelectionContext {
            all: healthy,
            healthy,
            model: "claude-sonnet-4-5",
            model_mapping: mapping,
            default_provider: None,
        }
    }

    #[test]
    fn produces_evenly_spaced_selections_for_3_1() {
        let healthy = vec![candidate("a", 0, 3), candidate("b", 0, 1)];
        let mapping = HashMap::new();
        let router = WeightedRoundRobinRouter::new();
        let picks: Vec<String> = (0..8).map(|_| router.select(&ctx(&healthy, &mapping)).unwrap()).collect();

        let a_count = picks.iter().filter(|p| *p == "a").count();
        let b_count = picks.iter().filter(|p| *p == "b").count();
        assert_eq!(a_count, 6);
        assert_eq!(b_count, 2);

        // No two B's adjacent.
        for window in picks.windows(2) {
            assert!(!(window[0] == "b" && window[1] == "b"), "adjacent b's in {picks:?}");
        }
    }

    #[test]
    fn unhealthy_providers_are_skipped_without_losing_phase() {
        let mapping = HashMap::new();
        let router = WeightedRoundRobinRouter::new();
        let full = vec![candidate("a", 0, 3), candidate("b", 0, 1)];
        let _ = router.select(&ctx(&full, &mapping));

        let only_a = vec![candidate("a", 0, 3)];
        let pick = router.select(&ctx(&only_a, &mapping));
        assert_eq!(pick, Some("a".to_owned()));
    }
}
