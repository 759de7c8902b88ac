use async_trait::async_trait;
use secrecy::SecretString;
use url::Url;

use super::anthropic::build_target_url;
use super::{OutgoingRequest, ProviderOps};
use crate::error::DispatchError;

/// Local/self-hosted Ollama. No authentication: Ollama's Anthropic-compatible endpoint has no
/// concept of an API key, so `apply_auth` is a no-op regardless of what the client sent.
#[derive(Clone, Default)]
pub struct OllamaAdapter;

impl OllamaAdapter {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProviderOps for OllamaAdapter {
    fn target_url(&self, base_url: &Url, path_suffix: &str, query: Option<&str>, _model: &str, _streaming: bool) -> Url {
        build_target_url(base_url, path_suffix, query)
    }

    async fn apply_auth(&self, _req: &mut OutgoingRequest, _credential: Option<&SecretString>) -> Result<(), DispatchError> {
        Ok(())
    }

    fn supports_transparent_auth(&self) -> bool {
        // Transparent passthrough is meaningless with no managed credential to withhold, so
        // client auth (if any) is simply dropped along with every other non-anthropic header.
        false
    }
}
