use std::collections::HashMap;

use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// One configured upstream, immutable for the life of the process.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Unique process-wide identifier.
    pub name: String,

    #[serde(flatten)]
    pub adapter: AdapterConfig,

    pub base_url: Url,

    /// Free-form vendor label surfaced on `/v1/providers`.
    #[serde(default)]
    pub owner: Option<String>,

    /// Higher is preferred in failover ordering.
    #[serde(default)]
    pub priority: u32,

    /// Effective weight under weighted-round-robin.
    #[serde(default = "default_weight")]
    pub weight: u32,

    /// Models this provider advertises on `/v1/models`.
    #[serde(default)]
    pub models: Vec<String>,

    /// Source-model → target-model translation applied before the upstream call.
    #[serde(default)]
    pub model_mapping: HashMap<String, String>,

    #[serde(default)]
    pub credentials: Vec<CredentialConfig>,

    /// When true and the client supplied its own `Authorization`/`x-api-key`, the proxy passes
    /// it through unchanged instead of substituting a pooled credential.
    #[serde(default)]
    pub supports_transparent_auth: bool,
}

const fn default_weight() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialConfig {
    pub api_key: SecretString,
    #[serde(default)]
    pub rpm: Option<u32>,
    #[serde(default)]
    pub tpm: Option<u32>,
}

/// Selects which adapter variant handles a provider and carries adapter-specific fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdapterConfig {
    Anthropic,
    #[serde(rename = "zai")]
    ZAi,
    Azure,
    Bedrock(BedrockAdapterConfig),
    Vertex(VertexAdapterConfig),
    Ollama,
}

impl AdapterConfig {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::ZAi => "zai",
            Self::Azure => "azure",
            Self::Bedrock(_) => "bedrock",
            Self::Vertex(_) => "vertex",
            Self::Ollama => "ollama",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BedrockAdapterConfig {
    pub region: String,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<SecretString>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VertexAdapterConfig {
    pub project_id: String,
    #[serde(default = "default_vertex_location")]
    pub location: String,
    #[serde(default)]
    pub credentials_path: Option<std::path::PathBuf>,
}

fn default_vertex_location() -> String {
    "us-central1".to_owned()
}
