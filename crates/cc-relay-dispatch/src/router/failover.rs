use super::SelectionContext;

/// Sorts the healthy subset by priority descending, ties broken by configuration order
/// (`healthy` is already in config order, and `sort_by` is stable). The dispatch handler
/// attempts candidates in this order: the first synchronously, then races every remaining
/// candidate concurrently after the first failure, bounded by `failover_timeout_ms`.
pub struct FailoverRouter;

impl FailoverRouter {
    pub(super) fn ordered(&self, ctx: &SelectionContext<'_>) -> Vec<String> {
        let mut candidates: Vec<&super::Candidate> = ctx.healthy.iter().collect();
        candidates.sort_by(|a, b| b.priority.cmp(&a.priority));
        candidates.into_iter().map(|c| c.name.clone()).collect()
    }
}
