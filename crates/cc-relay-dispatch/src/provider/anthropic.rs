use async_trait::async_trait;
use http::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{OutgoingRequest, ProviderOps};
use crate::error::DispatchError;

#[derive(Clone)]
pub struct AnthropicAdapter {
    transparent_auth: bool,
}

impl AnthropicAdapter {
    #[must_use]
    pub const fn new(transparent_auth: bool) -> Self {
        Self { transparent_auth }
    }
}

#[async_trait]
impl ProviderOps for AnthropicAdapter {
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

/// Composes `base_url` with the path suffix kept after `/v1` and the client's query string,
/// shared by every adapter whose URL shape is just "provider's base URL + same path".
pub(super) fn build_target_url(base_url: &Url, path_suffix: &str, query: Option<&str>) -> Url {
    let mut url = base_url.clone();
    let base_path = url.path().trim_end_matches('/');
    url.set_path(&format!("{base_path}{path_suffix}"));
    url.set_query(query);
    url
}

pub(super) fn apply_x_api_key(req: &mut OutgoingRequest, credential: Option<&SecretString>) -> Result<(), DispatchError> {
    let credential = credential.ok_or_else(|| DispatchError::Internal(anyhow::anyhow!("managed auth requires a credential")))?;
    let value = HeaderValue::from_str(credential.expose_secret())
        .map_err(|_| DispatchError::Internal(anyhow::anyhow!("credential is not a valid header value")))?;
    req.headers.insert("x-api-key", value);
    Ok(())
}
