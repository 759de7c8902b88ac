//! The five routing strategies, plus the model filter.
//!
//! Each strategy is a small struct implementing [`SelectProvider`], constructed once at
//! startup from the immutable provider list and held for the life of the process: one file per
//! strategy, a shared trait, a closed enum over the cases rather than a trait-object registry,
//! since CC-Relay's strategy set is fixed at build time like its adapter set. `failover` is the
//! one strategy that cannot be expressed as a single pick: it returns a priority-ordered
//! candidate list and leaves the attempt-then-race control flow, which involves real upstream
//! calls, to the dispatch handler.

mod failover;
mod model_based;
mod round_robin;
mod shuffle;
mod weighted;

use std::collections::HashMap;

use cc_relay_config::{RoutingConfig, RoutingStrategy as ConfiguredStrategy};

pub use failover::FailoverRouter;
pub use model_based::ModelBasedRouter;
pub use round_robin::RoundRobinRouter;
pub use shuffle::ShuffleRouter;
pub use weighted::WeightedRoundRobinRouter;

/// A provider as the router sees it: just enough to order and pick among candidates.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub priority: u32,
    pub weight: u32,
}

/// Everything a strategy needs to make one routing decision.
pub struct SelectionContext<'a> {
    /// Every model-filtered candidate, healthy or not, in configuration order.
    pub all: &'a [Candidate],
    /// The subset of `all` currently callable per the health tracker.
    pub healthy: &'a [Candidate],
    pub model: &'a str,
    pub model_mapping: &'a HashMap<String, String>,
    pub default_provider: Option<&'a str>,
}

/// Implemented by every strategy except failover, which instead produces an ordered
/// candidate list via [`Router::route`]'s `Ordered` variant.
pub trait SelectProvider: Send + Sync {
    fn select(&self, ctx: &SelectionContext<'_>) -> Option<String>;
}

/// The outcome of one routing decision.
pub enum RouteDecision {
    /// A single provider to attempt; `None` means no healthy candidate was available.
    Single(Option<String>),
    /// An ordered list to attempt in sequence, racing the remainder after the first failure
    /// (failover only). Empty means no healthy candidate was available.
    Ordered(Vec<String>),
}

/// One process-lifetime instance per configured strategy. Stateful variants (round-robin,
/// weighted, shuffle) own their routing state here; model-based and failover are stateless
/// beyond the provider list itself.
pub enum Router {
    Failover(FailoverRouter),
    RoundRobin(RoundRobinRouter),
    WeightedRoundRobin(WeightedRoundRobinRouter),
    Shuffle(ShuffleRouter),
    ModelBased(ModelBasedRouter),
}

impl Router {
    #[must_use]
    pub fn from_config(config: &RoutingConfig) -> Self {
        match config.strategy {
            ConfiguredStrategy::Failover => Self::Failover(FailoverRouter),
            ConfiguredStrategy::RoundRobin => Self::RoundRobin(RoundRobinRouter::new()),
            ConfiguredStrategy::WeightedRoundRobin => Self::WeightedRoundRobin(WeightedRoundRobinRouter::new()),
            ConfiguredStrategy::Shuffle => Self::Shuffle(ShuffleRouter::new()),
            ConfiguredStrategy::ModelBased => Self::ModelBased(ModelBasedRouter),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Failover(_) => "failover",
            Self::RoundRobin(_) => "round_robin",
            Self::WeightedRoundRobin(_) => "weighted_round_robin",
            Self::Shuffle(_) => "shuffle",
            Self::ModelBased(_) => "model_based",
        }
    }

    /// The configured strategy this instance was built for. Used by hot-reload to decide
    /// whether the existing instance (and its round-robin/weighted/shuffle state) can be
    /// carried over, or whether a strategy change requires a fresh one.
    #[must_use]
    pub const fn strategy(&self) -> ConfiguredStrategy {
        match self {
            Self::Failover(_) => ConfiguredStrategy::Failover,
            Self::RoundRobin(_) => ConfiguredStrategy::RoundRobin,
            Self::WeightedRoundRobin(_) => ConfiguredStrategy::WeightedRoundRobin,
            Self::Shuffle(_) => ConfiguredStrategy::Shuffle,
            Self::ModelBased(_) => ConfiguredStrategy::ModelBased,
        }
    }

    #[must_use]
    pub fn route(&self, ctx: &SelectionContext<'_>) -> RouteDecision {
        match self {
            Self::Failover(r) => RouteDecision::Ordered(r.ordered(ctx)),
            Self::RoundRobin(r) => RouteDecision::Single(r.select(ctx)),
            Self::WeightedRoundRobin(r) => RouteDecision::Single(r.select(ctx)),
            Self::Shuffle(r) => RouteDecision::Single(r.select(ctx)),
            Self::ModelBased(r) => RouteDecision::Single(r.select(ctx)),
        }
    }
}

#[cfg(test)]
pub(crate) fn candidate(name: &str, priority: u32, weight: u32) -> Candidate {
    Candidate {
        name: name.to_owned(),
        priority,
        weight,
    }
}
