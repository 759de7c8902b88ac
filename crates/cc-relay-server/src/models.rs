//! `GET /v1/models`: the union of every configured provider's advertised model list.
//! Unauthenticated by default — see `DESIGN.md` for the open question around gating this on a
//! public network.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use serde_json::json;

use crate::state::SharedState;

pub async fn models_handler(State(state): State<Arc<SharedState>>) -> impl IntoResponse {
    let snapshot = state.load();

    let mut models: Vec<serde_json::Value> = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for provider in &snapshot.providers {
        for model in &provider.models {
            if seen.insert((model.clone(), provider.name.clone())) {
                models.push(json!({
                    "id": model,
                    "owned_by": provider.owner.clone().unwrap_or_else(|| provider.name.clone()),
                    "provider": provider.name,
                }));
            }
        }
    }

    axum::Json(json!({ "object": "list", "data": models }))
}
