//! Restricts the candidate provider list to those that declare support for the requested model
//! before the routing strategy ever sees them.

use crate::state::ProviderRuntime;

/// Returns the subset of `providers` whose `model_mapping` keys or `models` list contain a
/// prefix of `model`, using the same longest-prefix rule as model-based routing. If the subset
/// is empty, returns the full input unchanged (graceful degradation) — callers should not
/// special-case this themselves.
#[must_use]
pub fn filter_by_model<'a>(providers: &'a [ProviderRuntime], model: &str) -> Vec<&'a ProviderRuntime> {
    let matches: Vec<&ProviderRuntime> = providers.iter().filter(|p| supports(p, model)).collect();
    if matches.is_empty() {
        providers.iter().collect()
    } else {
        matches
    }
}

fn supports(provider: &ProviderRuntime, model: &str) -> bool {
    let candidates = provider.model_mapping.keys().map(String::as_str).chain(provider.models.iter().map(String::as_str));
    cc_relay_core::longest_prefix_match(model, candidates).is_some()
}

#[cfg(test)]
mod tests {
    use cc_relay_config::ProviderConfig;
    use url::Url;

    use super::*;

    fn provider(name: &str, models: &[&str], mapping: &[(&str, &str)]) -> ProviderRuntime {
        let config = ProviderConfig {
            name: name.to_owned(),
            adapter: cc_relay_config::AdapterConfig::Anthropic,
            base_url: Url::parse("https://example.test").unwrap(),
            owner: None,
            priority: 0,
            weight: 1,
            models: models.iter().map(|m| (*m).to_owned()).collect(),
            model_mapping: mapping.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect(),
            credentials: Vec::new(),
            supports_transparent_auth: false,
        };
        ProviderRuntime::from_config(&config).unwrap()
    }

    #[test]
    fn keeps_only_providers_that_declare_the_model() {
        let providers = vec![provider("anthropic", &["claude-opus-4-5"], &[]), provider("openai", &["gpt-4o"], &[])];
        let filtered = filter_by_model(&providers, "claude-opus-4-5-20251001");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "anthropic");
    }

    #[test]
    fn matches_via_model_mapping_keys_too() {
        let providers = vec![provider("zai", &[], &[("claude", "GLM-4.7")])];
        let filtered = filter_by_model(&providers, "claude-sonnet-4-5");
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn degrades_to_the_full_list_when_nothing_matches() {
        let providers = vec![provider("anthropic", &["claude-opus-4-5"], &[]), provider("openai", &["gpt-4o"], &[])];
        let filtered = filter_by_model(&providers, "mistral-large");
        assert_eq!(filtered.len(), 2);
    }
}
