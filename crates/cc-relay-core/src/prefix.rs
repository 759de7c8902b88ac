/// Finds the longest key in `candidates` that is a prefix of `model`. Used identically by the
/// model filter and the model-based routing strategy share so that `claude-opus` wins
/// over `claude` when both are configured and the request names `claude-opus-4-5`.
#[must_use]
pub fn longest_prefix_match<'a, I>(model: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .filter(|candidate| model.starts_with(candidate))
        .max_by_key(|candidate| candidate.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_longer_matching_prefix() {
        let candidates = ["claude", "claude-opus"];
        assert_eq!(longest_prefix_match("claude-opus-4-5", candidates), Some("claude-opus"));
    }

    #[test]
    fn falls_back_to_the_only_match() {
        let candidates = ["claude"];
        assert_eq!(longest_prefix_match("claude-haiku-4-5", candidates), Some("claude"));
    }

    #[test]
    fn no_match_returns_none() {
        let candidates = ["gpt"];
        assert_eq!(longest_prefix_match("claude-haiku-4-5", candidates), None);
    }
}
