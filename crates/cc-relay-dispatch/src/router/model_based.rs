use super::{SelectProvider, SelectionContext};

/// Longest-prefix match of the request model against `routing.model_mapping`, falling back to
/// `default_provider`, and finally degrading to the first candidate in the unfiltered-by-health
/// candidate list to avoid total failure when neither is configured.
///
/// Unlike the other stateful strategies this never consults `ctx.healthy`: model-based routing
/// dispatches by model identity, not availability, and dispatch does not retry a model-based
/// pick on failure.
pub struct ModelBasedRouter;

impl SelectProvider for ModelBasedRouter {
    fn select(&self, ctx: &SelectionContext<'_>) -> Option<String> {
        let keys = ctx.model_mapping.keys().map(String::as_str);
        if let Some(prefix) = cc_relay_core::longest_prefix_match(ctx.model, keys) {
            return ctx.model_mapping.get(prefix).cloned();
        }
        if let Some(default) = ctx.default_provider {
            return Some(default.to_owned());
        }
        ctx.all.first().map(|c| c.name.clone())
    }
}
