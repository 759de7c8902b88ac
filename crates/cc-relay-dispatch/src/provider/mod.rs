mod anthropic;
mod azure;
mod bedrock;
mod ollama;
mod vertex;
mod zai;

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method};
use secrecy::SecretString;
use url::Url;

pub use anthropic::AnthropicAdapter;
pub use azure::AzureAdapter;
pub use bedrock::BedrockAdapter;
pub use ollama::OllamaAdapter;
pub use vertex::VertexAdapter;
pub use zai::ZAiAdapter;

use crate::error::DispatchError;

/// A request about to be sent upstream. Adapters mutate this in place: rewriting the URL,
/// applying authentication, and adjusting headers.
pub struct OutgoingRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// One case per supported vendor. A closed sum type is preferred over a trait object registry
/// since the set of adapters is fixed at build time; each variant owns whatever
/// adapter-specific state it needs (e.g. the AWS credential chain for Bedrock).
#[derive(Clone)]
pub enum Adapter {
    Anthropic(AnthropicAdapter),
    ZAi(ZAiAdapter),
    Azure(AzureAdapter),
    Bedrock(BedrockAdapter),
    Vertex(VertexAdapter),
    Ollama(OllamaAdapter),
}

#[async_trait]
pub trait ProviderOps: Send + Sync {
    /// Builds the upstream URL for this call, preserving the `/v1/messages` path suffix and
    /// query string; Bedrock/Vertex additionally embed the mapped model id and region.
    fn target_url(&self, base_url: &Url, path_suffix: &str, query: Option<&str>, model: &str, streaming: bool) -> Url;

    /// Applies authentication to `req`, selecting a credential from the given pool when the
    /// adapter manages auth itself (as opposed to transparent passthrough of the client's own).
    async fn apply_auth(&self, req: &mut OutgoingRequest, credential: Option<&SecretString>) -> Result<(), DispatchError>;

    fn supports_transparent_auth(&self) -> bool;

    /// Every adapter in this closed set speaks an Anthropic-Messages-shaped streaming wire
    /// format, so this defaults to `true`; kept as a capability query rather than a constant so
    /// a future adapter that fronts a non-streaming-only vendor can report `false` without
    /// changing every call site that checks it.
    fn supports_streaming(&self) -> bool {
        true
    }

    /// Returns `model_mapping[requested]` if configured, else `requested` unchanged.
    fn map_model<'a>(&self, requested: &'a str, model_mapping: &'a std::collections::HashMap<String, String>) -> String {
        let _ = self;
        model_mapping.get(requested).cloned().unwrap_or_else(|| requested.to_owned())
    }
}

#[async_trait]
impl ProviderOps for Adapter {
    fn target_url(&self, base_url: &Url, path_suffix: &str, query: Option<&str>, model: &str, streaming: bool) -> Url {
        match self {
            Self::Anthropic(a) => a.target_url(base_url, path_suffix, query, model, streaming),
            Self::ZAi(a) => a.target_url(base_url, path_suffix, query, model, streaming),
            Self::Azure(a) => a.target_url(base_url, path_suffix, query, model, streaming),
            Self::Bedrock(a) => a.target_url(base_url, path_suffix, query, model, streaming),
            Self::Vertex(a) => a.target_url(base_url, path_suffix, query, model, streaming),
            Self::Ollama(a) => a.target_url(base_url, path_suffix, query, model, streaming),
        }
    }

    async fn apply_auth(&self, req: &mut OutgoingRequest, credential: Option<&SecretString>) -> Result<(), DispatchError> {
        match self {
            Self::Anthropic(a) => a.apply_auth(req, credential).await,
            Self::ZAi(a) => a.apply_auth(req, credential).await,
            Self::Azure(a) => a.apply_auth(req, credential).await,
            Self::Bedrock(a) => a.apply_auth(req, credential).await,
            Self::Vertex(a) => a.apply_auth(req, credential).await,
            Self::Ollama(a) => a.apply_auth(req, credential).await,
        }
    }

    fn supports_transparent_auth(&self) -> bool {
        match self {
            Self::Anthropic(a) => a.supports_transparent_auth(),
            Self::ZAi(a) => a.supports_transparent_auth(),
            Self::Azure(a) => a.supports_transparent_auth(),
            Self::Bedrock(a) => a.supports_transparent_auth(),
            Self::Vertex(a) => a.supports_transparent_auth(),
            Self::Ollama(a) => a.supports_transparent_auth(),
        }
    }
}

impl Adapter {
    /// The `type` discriminant this adapter was constructed from, surfaced on `/v1/providers`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Anthropic(_) => "anthropic",
            Self::ZAi(_) => "zai",
            Self::Azure(_) => "azure",
            Self::Bedrock(_) => "bedrock",
            Self::Vertex(_) => "vertex",
            Self::Ollama(_) => "ollama",
        }
    }

    #[must_use]
    pub fn from_config(config: &cc_relay_config::AdapterConfig, transparent_auth: bool) -> Result<Self, DispatchError> {
        match config {
            cc_relay_config::AdapterConfig::Anthropic => Ok(Self::Anthropic(AnthropicAdapter::new(transparent_auth))),
            cc_relay_config::AdapterConfig::ZAi => Ok(Self::ZAi(ZAiAdapter::new(transparent_auth))),
            cc_relay_config::AdapterConfig::Azure => Ok(Self::Azure(AzureAdapter::new(transparent_auth))),
            cc_relay_config::AdapterConfig::Bedrock(cfg) => Ok(Self::Bedrock(BedrockAdapter::new(cfg.clone()))),
            cc_relay_config::AdapterConfig::Vertex(cfg) => Ok(Self::Vertex(VertexAdapter::new(cfg.clone()))),
            cc_relay_config::AdapterConfig::Ollama => Ok(Self::Ollama(OllamaAdapter::new())),
        }
    }
}

/// Builds the outgoing headers for one upstream call: forwards every `anthropic-*` client
/// header, drops everything else (including `host` and client auth), and supplies a default
/// `anthropic-version` when the provider requires one and the client didn't send it.
#[must_use]
pub fn forward_headers(client_headers: &HeaderMap, require_default_version: bool) -> HeaderMap {
    let mut headers = cc_relay_core::forward_anthropic_headers(client_headers);
    if require_default_version {
        cc_relay_core::ensure_anthropic_version(&mut headers, "2023-06-01");
    }
    headers
}
