/// Known model-family prefixes, checked in order. The matched prefix (sans trailing `-`) is
/// the group name; any model that matches none of these is its own group.
const KNOWN_PREFIXES: [&str; 3] = ["claude-", "gpt-", "gemini-"];

/// Derives the model-group used to key cached extended-thinking signatures.
///
/// `claude-opus-4-5` → `claude`, `gpt-4o` → `gpt`, `gemini-2.5-pro` → `gemini`; any other
/// model name is its own group (e.g. `grok-4` → `grok-4`).
#[must_use]
pub fn model_group(model: &str) -> &str {
    for prefix in KNOWN_PREFIXES {
        if model.starts_with(prefix) {
            return &prefix[..prefix.len() - 1];
        }
    }
    model
}
