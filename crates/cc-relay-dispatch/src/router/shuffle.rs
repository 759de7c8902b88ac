use std::sync::Mutex;

use rand::seq::SliceRandom;

use super::{SelectProvider, SelectionContext};

struct Deck {
    order: Vec<String>,
    index: usize,
}

/// "Deal from a deck": a Fisher-Yates permutation of the healthy provider list and an index
/// advancing through it. Every provider is visited exactly once before any repeats; once the
/// deck is exhausted it is reshuffled. If the healthy set changes shape between selections
/// (a provider joins or leaves health), the deck is rebuilt and reshuffled immediately rather
/// than risk an index into a stale ordering.
pub struct ShuffleRouter {
    deck: Mutex<Option<Deck>>,
}

impl ShuffleRouter {
    #[must_use]
    pub fn new() -> Self {
        Self { deck: Mutex::new(None) }
    }
}

impl Default for ShuffleRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectProvider for ShuffleRouter {
    fn select(&self, ctx: &SelectionContext<'_>) -> Option<String> {
        if ctx.healthy.is_empty() {
            return None;
        }

        let mut guard = self.deck.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut names: Vec<String> = ctx.healthy.iter().map(|c| c.name.clone()).collect();
        names.sort();

        let needs_reshuffle = match guard.as_ref() {
            Some(deck) => {
                let mut current = deck.order.clone();
                current.sort();
                current != names || deck.index >= deck.order.len()
            }
            None => true,
        };

        if needs_reshuffle {
            let mut order: Vec<String> = ctx.healthy.iter().map(|c| c.name.clone()).collect();
            order.shuffle(&mut rand::rng());
            *guard = Some(Deck { order, index: 0 });
        }

        let deck = guard.as_mut().expect("deck was just populated");
        let pick = deck.order[deck.index].clone();
        deck.index += 1;
        Some(pick)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::collections::HashSet;

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
    fn every_provider_visited_exactly_once_per_deck() {
        let healthy = vec![candidate("a", 0, 1), candidate("b", 0, 1), candidate("c", 0, 1)];
        let mapping = HashMap::new();
        let router = ShuffleRouter::new();

        let first_round: HashSet<String> = (0..3).map(|_| router.select(&ctx(&healthy, &mapping)).unwrap()).collect();
        assert_eq!(first_round.len(), 3);

        let second_round: HashSet<String> = (0..3).map(|_| router.select(&ctx(&healthy, &mapping)).unwrap()).collect();
        assert_eq!(second_round.len(), 3);
    }

    #[test]
    fn fair_over_k_rounds() {
        let healthy = vec![candidate("a", 0, 1), candidate("b", 0, 1)];
        let mapping = HashMap::new();
        let router = ShuffleRouter::new();

        let mut counts: HashMap<String, u32> = HashMap::new();
        for _ in 0..20 {
            let pick = router.select(&ctx(&healthy, &mapping)).unwrap();
            *counts.entry(pick).or_insert(0) += 1;
        }
        assert_eq!(counts.get("a").copied().unwrap_or(0), 10);
        assert_eq!(counts.get("b").copied().unwrap_or(0), 10);
    }
}
