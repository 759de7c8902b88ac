use std::time::SystemTime;

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sigv4::http_request::{SignableBody, SignableRequest, SigningSettings, sign};
use aws_sigv4::sign::v4;
use cc_relay_config::BedrockAdapterConfig;
use http::{HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{OutgoingRequest, ProviderOps};
use crate::error::DispatchError;

const SERVICE: &str = "bedrock";

/// AWS Bedrock. The upstream URL embeds the mapped model id and the adapter's configured
/// region; authentication is a SigV4 signature computed over the outgoing request rather than
/// a bearer credential, so `apply_auth` ignores the credential pool entirely and instead signs
/// with AWS credentials resolved from explicit config or the ambient AWS credential chain.
#[derive(Clone)]
pub struct BedrockAdapter {
    region: String,
    access_key_id: Option<String>,
    secret_access_key: Option<SecretString>,
}

impl BedrockAdapter {
    #[must_use]
    pub fn new(config: BedrockAdapterConfig) -> Self {
        Self {
            region: config.region,
            access_key_id: config.access_key_id,
            secret_access_key: config.secret_access_key,
        }
    }

    async fn credentials(&self) -> Result<Credentials, DispatchError> {
        if let (Some(key), Some(secret)) = (&self.access_key_id, &self.secret_access_key) {
            return Ok(Credentials::new(key, secret.expose_secret(), None, None, "cc-relay-config"));
        }
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(self.region.clone()))
            .load()
            .await;
        let provider = sdk_config
            .credentials_provider()
            .ok_or_else(|| DispatchError::Internal(anyhow::anyhow!("no ambient AWS credential provider available")))?;
        aws_credential_types::provider::ProvideCredentials::provide_credentials(&provider)
            .await
            .map_err(|e| DispatchError::Internal(anyhow::anyhow!("resolving ambient AWS credentials: {e}")))
    }
}

#[async_trait]
impl ProviderOps for BedrockAdapter {
    fn target_url(&self, base_url: &Url, _path_suffix: &str, query: Option<&str>, model: &str, streaming: bool) -> Url {
        let action = if streaming { "invoke-with-response-stream" } else { "invoke" };
        let mut url = base_url.clone();
        url.set_path(&format!("/model/{model}/{action}"));
        url.set_query(query);
        url
    }

    async fn apply_auth(&self, req: &mut OutgoingRequest, _credential: Option<&SecretString>) -> Result<(), DispatchError> {
        let credentials = self.credentials().await?;
        let identity = credentials.into();

        let mut settings = SigningSettings::default();
        settings.payload_checksum_kind = aws_sigv4::http_request::PayloadChecksumKind::XAmzSha256;

        let params = v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.region)
            .name(SERVICE)
            .time(SystemTime::now())
            .settings(settings)
            .build()
            .map_err(|e| DispatchError::Internal(anyhow::anyhow!("building sigv4 signing params: {e}")))?
            .into();

        let headers: Vec<(&str, &str)> = req
            .headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)))
            .collect();

        let signable = SignableRequest::new(req.method.as_str(), req.url.as_str(), headers.into_iter(), SignableBody::Bytes(&req.body))
            .map_err(|e| DispatchError::Internal(anyhow::anyhow!("building signable request: {e}")))?;

        let (instructions, _signature) = sign(signable, &params)
            .map_err(|e| DispatchError::Internal(anyhow::anyhow!("signing bedrock request: {e}")))?
            .into_parts();

        for (name, value) in instructions.headers() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| DispatchError::Internal(anyhow::anyhow!("sigv4 produced an invalid header name")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| DispatchError::Internal(anyhow::anyhow!("sigv4 produced an invalid header value")))?;
            req.headers.insert(name, value);
        }

        Ok(())
    }

    fn supports_transparent_auth(&self) -> bool {
        false
    }

    fn map_model<'a>(&self, requested: &'a str, model_mapping: &'a std::collections::HashMap<String, String>) -> String {
        model_mapping.get(requested).cloned().unwrap_or_else(|| requested.to_owned())
    }
}
