use std::net::SocketAddr;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default)]
    pub listen_address: Option<SocketAddr>,
    /// Maximum request body the dispatch handler will buffer, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: None,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

const fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

#[must_use]
pub fn default_listen_address() -> SocketAddr {
    "0.0.0.0:8080".parse().expect("valid default listen address")
}
