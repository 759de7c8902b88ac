//! `POST /v1/messages`: the one route owned by `cc-relay-dispatch`. This crate's only job here
//! is pulling the current snapshot out of the `ArcSwap` before handing off — the dispatch
//! engine never sees the hot-reload machinery.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use bytes::Bytes;

use crate::state::SharedState;

pub async fn messages_handler(State(state): State<Arc<SharedState>>, headers: HeaderMap, body: Bytes) -> Response {
    cc_relay_dispatch::handle(state.load(), headers, body).await
}
