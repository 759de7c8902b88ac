//! `GET /v1/providers`: a read-only snapshot of every configured provider's metadata.
//! Unauthenticated by default, same as `/v1/models` — see `DESIGN.md` for the open question
//! around gating these on a public network.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use cc_relay_dispatch::provider::ProviderOps;
use serde_json::json;

use crate::state::SharedState;

pub async fn providers_handler(State(state): State<Arc<SharedState>>) -> impl IntoResponse {
    let snapshot = state.load();

    let providers: Vec<serde_json::Value> = snapshot
        .providers
        .iter()
        .map(|p| {
            json!({
                "name": p.name,
                "type": p.adapter.kind(),
                "owner": p.owner,
                "priority": p.priority,
                "weight": p.weight,
                "models": p.models,
                "supports_streaming": p.adapter.supports_streaming(),
                "supports_transparent_auth": p.adapter.supports_transparent_auth(),
                "healthy": snapshot.health.state(&p.name) == cc_relay_dispatch::CircuitState::Closed,
            })
        })
        .collect();

    axum::Json(json!({ "object": "list", "data": providers }))
}
