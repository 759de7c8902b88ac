//! Assembles the HTTP surface around the dispatch engine: `POST /v1/messages` (the one route
//! `cc-relay-dispatch` owns), the read-only `/v1/models` and `/v1/providers` endpoints, and
//! `/health`. Adds request-id propagation and tracing around every route, and an optional
//! client-auth layer scoped to `/v1/messages` alone, conditionally layered off `Option` config
//! fields.

mod auth;
mod health;
mod messages;
mod models;
mod probe;
mod providers;
mod reload;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderName;
use axum::routing::{get, post};
use axum::{Router, middleware};
use cc_relay_config::Config;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub use state::SharedState;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// The assembled relay: a bound listen address and an Axum [`Router`] over [`SharedState`].
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
    state: Arc<SharedState>,
    health_check_interval: Duration,
    config_path: PathBuf,
}

impl Server {
    /// Builds the dispatch state from `config` and assembles the router. `config_path` is kept
    /// only so a `SIGHUP` can re-read the file later; the already-parsed `config` is what the
    /// initial state is built from.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails to build the initial dispatch state (invalid provider
    /// or adapter configuration, e.g. a malformed Vertex service-account path).
    pub async fn new(config: Config, config_path: PathBuf) -> anyhow::Result<Self> {
        let listen_address = config.server.listen_address.unwrap_or_else(cc_relay_config::default_listen_address);
        let health_check_interval = Duration::from_millis(config.health.health_check_interval_ms);
        let state = SharedState::new(&config)?;

        let mut messages_router = Router::new().route("/v1/messages", post(messages::messages_handler));
        if let Some(auth_config) = config.auth.clone() {
            messages_router = messages_router.layer(middleware::from_fn(move |req, next| {
                let auth_config = auth_config.clone();
                async move { auth::client_auth_middleware(auth_config, req, next).await }
            }));
        }

        let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);
        let router = Router::new()
            .route("/v1/models", get(models::models_handler))
            .route("/v1/providers", get(providers::providers_handler))
            .route("/health", get(health::health_handler))
            .merge(messages_router)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(request_id_header.clone(), MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(request_id_header)),
            )
            .with_state(Arc::clone(&state));

        Ok(Self {
            router,
            listen_address,
            state,
            health_check_interval,
            config_path,
        })
    }

    /// Returns the router, for tests that want to drive requests through `tower::ServiceExt`
    /// without binding a socket.
    #[must_use]
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Binds `listen_address` and serves until `shutdown` is cancelled. Spawns the background
    /// health-check prober and the `SIGHUP` reload task alongside the accept loop; both are
    /// aborted on shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error if the listen address cannot be bound, or if the server errors while
    /// serving.
    pub async fn serve(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        tracing::info!(address = %self.listen_address, "listening");

        // `snapshot.health` is handed to the prober once here, not re-fetched per reload: a
        // reload preserves the same `Arc<HealthTracker>` across snapshots (see
        // `DispatchState::reload`) rather than building a fresh one, so this stays the live
        // tracker dispatch itself reads for the life of the process.
        let snapshot = self.state.load();
        let prober = probe::make_prober(Arc::clone(&self.state), snapshot.client.clone());
        let prober_handle =
            cc_relay_dispatch::health::spawn_prober(Arc::clone(&snapshot.health), self.health_check_interval, prober, shutdown.clone());
        let reload_handle = reload::spawn_reload_task(Arc::clone(&self.state), self.config_path.clone(), shutdown.clone());

        let shutdown_signal = shutdown.clone();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown_signal.cancelled().await })
            .await?;

        prober_handle.abort();
        reload_handle.abort();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use cc_relay_config::Config;
    use http::StatusCode;
    use tower::ServiceExt;

    use super::*;

    fn minimal_config() -> Config {
        toml::from_str(
            r#"
            [[providers]]
            name = "anthropic"
            type = "anthropic"
            base_url = "https://api.anthropic.com"

            [[providers.credentials]]
            api_key = "sk-test"
            "#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn health_endpoint_reports_ok() {
        let server = Server::new(minimal_config(), PathBuf::from("cc-relay.toml")).await.unwrap();
        let router = server.into_router();
        let req = axum::http::Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn models_endpoint_lists_configured_models() {
        let mut config = minimal_config();
        config.providers[0].models = vec!["claude-3-opus".to_owned()];
        let server = Server::new(config, PathBuf::from("cc-relay.toml")).await.unwrap();
        let router = server.into_router();
        let req = axum::http::Request::builder().uri("/v1/models").body(Body::empty()).unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn providers_endpoint_reports_configured_providers() {
        let server = Server::new(minimal_config(), PathBuf::from("cc-relay.toml")).await.unwrap();
        let router = server.into_router();
        let req = axum::http::Request::builder().uri("/v1/providers").body(Body::empty()).unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let server = Server::new(minimal_config(), PathBuf::from("cc-relay.toml")).await.unwrap();
        let router = server.into_router();
        let req = axum::http::Request::builder().uri("/nope").body(Body::empty()).unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
