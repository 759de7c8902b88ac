//! Configuration loading for CC-Relay: TOML parsing, `{{ env.VAR }}` expansion, and validation.
//!
//! Hot-reload is out of the core's scope; [`Config::load`] is meant to be called once at
//! startup and again, behind an atomic pointer swap owned by the server crate, whenever an
//! operator asks for a reload. Adding or removing providers still requires a restart, since
//! in-process routing-strategy state (round-robin counters, the shuffle deck) is sized against
//! the provider list at construction time.

mod auth;
mod cache;
mod env;
mod health;
mod loader;
mod provider;
mod routing;
mod server;

pub use auth::ClientAuthConfig;
pub use cache::SignatureCacheConfig;
pub use env::expand_env;
pub use health::HealthConfig;
pub use provider::{AdapterConfig, BedrockAdapterConfig, CredentialConfig, ProviderConfig, VertexAdapterConfig};
pub use routing::{RoutingConfig, RoutingStrategy};
pub use server::{ServerConfig, default_listen_address};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub providers: Vec<ProviderConfig>,

    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub health: HealthConfig,

    #[serde(default)]
    pub cache: SignatureCacheConfig,

    #[serde(default)]
    pub auth: Option<ClientAuthConfig>,
}
