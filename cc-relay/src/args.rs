use std::path::PathBuf;

use clap::Parser;

/// CC-Relay: Anthropic Messages-compatible reverse proxy
#[derive(Debug, Parser)]
#[command(name = "cc-relay", about = "Reverse proxy fronting multiple LLM providers behind the Anthropic Messages API")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "cc-relay.toml", env = "CC_RELAY_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "CC_RELAY_LISTEN")]
    pub listen: Option<std::net::SocketAddr>,
}
