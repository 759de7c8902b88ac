//! Test server wrapper that starts CC-Relay on a random port.

use std::net::SocketAddr;
use std::path::PathBuf;

use cc_relay_config::Config;
use cc_relay_server::Server;
use tokio_util::sync::CancellationToken;

/// A running relay instance bound to an ephemeral port.
pub struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    client: reqwest::Client,
}

impl TestServer {
    /// Builds the router from `config` and serves it on a freshly bound `127.0.0.1` port.
    ///
    /// Uses `Server::into_router` rather than `Server::serve`, so the background health
    /// prober and `SIGHUP` reload task never spin up here; nothing under test depends on
    /// either, since the breaker self-transitions out of OPEN lazily on `is_callable`.
    pub async fn start(config: Config) -> anyhow::Result<Self> {
        let server = Server::new(config, PathBuf::from("cc-relay.test.toml")).await?;
        let router = server.into_router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { shutdown_clone.cancelled().await })
                .await
                .ok();
        });

        Ok(Self {
            addr,
            shutdown,
            client: reqwest::Client::new(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub const fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
