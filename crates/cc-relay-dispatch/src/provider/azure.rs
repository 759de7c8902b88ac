use async_trait::async_trait;
use secrecy::SecretString;
use url::Url;

use super::anthropic::{apply_x_api_key, build_target_url};
use super::{OutgoingRequest, ProviderOps};
use crate::error::DispatchError;

/// Azure-hosted Anthropic-compatible deployments. Same wire shape and managed-auth header as
/// the plain Anthropic adapter; kept distinct because an operator's Azure deployment and
/// direct-Anthropic provider entries carry independent base URLs, credentials, and
/// `supports_transparent_auth` settings.
#[derive(Clone)]
pub struct AzureAdapter {
    transparent_auth: bool,
}

impl AzureAdapter {
    #[must_use]
    pub const fn new(transparent_auth: bool) -> Self {
        Self { transparent_auth }
    }
}

#[async_trait]
impl ProviderOps for AzureAdapter {
    fn target_url(&self, base_url: &Url, path_suffix: &str, query: Option<&str>, _model: &str, _streaming: bool) -> Url {
        build_target_url(base_url, path_suffix, query)
    }

    async fn apply_auth(&self, req: &mut OutgoingRequest, credential: Option<&SecretString>) -> Result<(), DispatchError> {
        apply_x_api_key(req, credential)
    }

    fn supports_transparent_auth(&self) -> bool {
        self.transparent_auth
    }
}
