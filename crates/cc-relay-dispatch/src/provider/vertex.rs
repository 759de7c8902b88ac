use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cc_relay_config::VertexAdapterConfig;
use gcp_auth::TokenProvider;
use http::HeaderValue;
use moka::sync::Cache;
use secrecy::SecretString;
use url::Url;

use super::{OutgoingRequest, ProviderOps};
use crate::error::DispatchError;

const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Anthropic models hosted on Vertex AI. The upstream URL embeds the GCP project, region, and
/// mapped model id; authentication is a Google OAuth bearer drawn from the ambient credential
/// chain (or a service-account file, when configured) rather than a pooled API key.
///
/// The fetched token is cached in-process with a TTL short enough to always refresh before a
/// real Google access token (typically 1h-lived) expires — the same `moka`-backed single-slot
/// TTL cache shape used for the entitlement cache in the server crate.
#[derive(Clone)]
pub struct VertexAdapter {
    project_id: String,
    location: String,
    credentials_path: Option<std::path::PathBuf>,
    token_cache: Cache<(), Arc<str>>,
}

impl VertexAdapter {
    #[must_use]
    pub fn new(config: VertexAdapterConfig) -> Self {
        Self {
            project_id: config.project_id,
            location: config.location,
            credentials_path: config.credentials_path,
            token_cache: Cache::builder().max_capacity(1).time_to_live(Duration::from_secs(50 * 60)).build(),
        }
    }

    async fn provider(&self) -> Result<Arc<dyn TokenProvider>, DispatchError> {
        if let Some(path) = &self.credentials_path {
            let account = gcp_auth::CustomServiceAccount::from_file(path)
                .map_err(|e| DispatchError::Internal(anyhow::anyhow!("loading vertex service account: {e}")))?;
            Ok(Arc::new(account))
        } else {
            gcp_auth::provider()
                .await
                .map_err(|e| DispatchError::Internal(anyhow::anyhow!("resolving ambient gcp credentials: {e}")))
        }
    }

    async fn bearer_token(&self) -> Result<Arc<str>, DispatchError> {
        if let Some(cached) = self.token_cache.get(&()) {
            return Ok(cached);
        }
        let provider = self.provider().await?;
        let token = provider
            .token(&[CLOUD_PLATFORM_SCOPE])
            .await
            .map_err(|e| DispatchError::Internal(anyhow::anyhow!("fetching vertex oauth token: {e}")))?;
        let token: Arc<str> = Arc::from(token.as_str());
        self.token_cache.insert((), Arc::clone(&token));
        Ok(token)
    }
}

#[async_trait]
impl ProviderOps for VertexAdapter {
    fn target_url(&self, base_url: &Url, _path_suffix: &str, query: Option<&str>, model: &str, streaming: bool) -> Url {
        let method = if streaming { "streamRawPredict" } else { "rawPredict" };
        let mut url = base_url.clone();
        url.set_path(&format!(
            "/v1/projects/{}/locations/{}/publishers/anthropic/models/{model}:{method}",
            self.project_id, self.location
        ));
        url.set_query(query);
        url
    }

    async fn apply_auth(&self, req: &mut OutgoingRequest, _credential: Option<&SecretString>) -> Result<(), DispatchError> {
        let token = self.bearer_token().await?;
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| DispatchError::Internal(anyhow::anyhow!("vertex token is not a valid header value")))?;
        req.headers.insert(http::header::AUTHORIZATION, value);
        Ok(())
    }

    fn supports_transparent_auth(&self) -> bool {
        false
    }

    fn map_model<'a>(&self, requested: &'a str, model_mapping: &'a std::collections::HashMap<String, String>) -> String {
        // Vertex's Anthropic models are addressed by the same model id as direct Anthropic,
        // modulo an explicit override in `model_mapping` (e.g. pinning a specific snapshot).
        model_mapping.get(requested).cloned().unwrap_or_else(|| requested.to_owned())
    }
}
