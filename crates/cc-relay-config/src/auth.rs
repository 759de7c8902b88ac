use secrecy::SecretString;
use serde::Deserialize;

/// Client authentication for `POST /v1/messages`. Absent entirely, the endpoint accepts
/// anonymous requests.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientAuthConfig {
    #[serde(default)]
    pub api_key: Option<SecretString>,
    #[serde(default)]
    pub bearer_token: Option<SecretString>,
    /// When true, both `x-api-key` and a bearer token must be present and valid.
    #[serde(default)]
    pub require_both: bool,
}
