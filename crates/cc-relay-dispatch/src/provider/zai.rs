use async_trait::async_trait;
use secrecy::SecretString;
use url::Url;

use super::anthropic::{apply_x_api_key, build_target_url};
use super::{OutgoingRequest, ProviderOps};
use crate::error::DispatchError;

#[derive(Clone)]
pub struct ZAiAdapter {
    transparent_auth: bool,
}

impl ZAiAdapter {
    #[must_use]
    pub const fn new(transparent_auth: bool) -> Self {
        Self { transparent_auth }
    }
}

#[async_trait]
impl ProviderOps for ZAiAdapter {
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
