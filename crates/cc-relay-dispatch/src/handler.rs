//! The `/v1/messages` orchestrator. One Axum handler, state-shared via `Arc<DispatchState>`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use http::{HeaderMap, HeaderValue, Method};
use serde_json::Value;

use crate::error::DispatchError;
use crate::model_filter;
use crate::proxy::{self, UpstreamResponse};
use crate::router::{Candidate, RouteDecision, SelectionContext};
use crate::sse;
use crate::state::DispatchState;
use crate::thinking::{self, SignatureTranscoder};

/// `POST /v1/messages`. Never panics: every internal error is translated into the Anthropic
/// error shape by [`DispatchError::into_response`].
pub async fn messages(State(state): State<Arc<DispatchState>>, headers: HeaderMap, body: axum::body::Bytes) -> Response {
    handle(state, headers, body).await
}

/// The same orchestration as [`messages`], but taking its state directly rather than through
/// an Axum `State` extractor. Lets a caller that holds the current snapshot out of an
/// `ArcSwap` (hot-reload) invoke dispatch without the state type being baked into the router.
pub async fn handle(state: Arc<DispatchState>, headers: HeaderMap, body: axum::body::Bytes) -> Response {
    match dispatch(&state, headers, &body).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn dispatch(state: &DispatchState, client_headers: HeaderMap, body: &[u8]) -> Result<Response, DispatchError> {
    let mut payload: Value = serde_json::from_slice(body).map_err(|e| DispatchError::InvalidRequest(format!("invalid JSON body: {e}")))?;
    let model = payload
        .get("model")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| DispatchError::InvalidRequest("request is missing a `model` field".to_owned()))?;
    let streaming = payload.get("stream").and_then(Value::as_bool).unwrap_or(false);

    thinking::resolve_request_signatures(&state.cache, &model, &mut payload).await;

    let filtered = model_filter::filter_by_model(&state.providers, &model);
    let candidates: Vec<Candidate> = filtered
        .iter()
        .map(|p| Candidate {
            name: p.name.clone(),
            priority: p.priority,
            weight: p.weight,
        })
        .collect();
    let healthy: Vec<Candidate> = candidates.iter().filter(|c| state.health.is_healthy(&c.name)).cloned().collect();

    let ctx = SelectionContext {
        all: &candidates,
        healthy: &healthy,
        model: &model,
        model_mapping: &state.routing.model_mapping,
        default_provider: state.routing.default_provider.as_deref(),
    };

    let strategy = state.router.name();
    let attempt_timeout = Duration::from_millis(state.routing.attempt_timeout_ms);

    let response = match state.router.route(&ctx) {
        RouteDecision::Single(Some(name)) => {
            match try_one(state, &name, strategy, &client_headers, payload, streaming, &model, attempt_timeout).await {
                Attempt::Success(resp) | Attempt::Fatal(resp) => resp,
                Attempt::Failed => return Err(DispatchError::UpstreamExhausted),
            }
        }
        RouteDecision::Single(None) => return Err(DispatchError::AllProvidersUnhealthy),
        RouteDecision::Ordered(order) if order.is_empty() => return Err(DispatchError::AllProvidersUnhealthy),
        RouteDecision::Ordered(order) => {
            attempt_failover(state, order, strategy, &client_headers, payload, streaming, &model, attempt_timeout).await?
        }
    };

    Ok(response)
}

enum Attempt {
    Success(Response),
    Fatal(Response),
    Failed,
}

/// Runs one candidate attempt end to end: forward, classify, report to
/// the health tracker, and (on success or a fatal 4xx) build the client-facing response.
#[allow(clippy::too_many_arguments)]
async fn try_one(
    state: &DispatchState,
    name: &str,
    strategy: &str,
    client_headers: &HeaderMap,
    payload: Value,
    streaming: bool,
    model: &str,
    attempt_timeout: Duration,
) -> Attempt {
    let Some(provider) = state.provider(name) else {
        return Attempt::Failed;
    };

    // Admits a HALF-OPEN probe slot, if `name` is currently HALF-OPEN, only now that it is
    // actually about to be dispatched — never while merely building the candidate list (see
    // `HealthTracker::is_healthy`). Every path below must release this slot exactly once.
    if !state.health.is_callable(name) {
        return Attempt::Failed;
    }

    let call = proxy::forward(&state.client, provider, Method::POST, "/v1/messages", None, client_headers, payload, streaming);

    let outcome = match tokio::time::timeout(attempt_timeout, call).await {
        Ok(Ok(upstream)) => upstream,
        Ok(Err(_)) | Err(_) => {
            state.health.record_failure(name);
            return Attempt::Failed;
        }
    };

    if outcome.status.is_success() {
        state.health.record_success(name);
        Attempt::Success(build_response(outcome, state, model, name, strategy).await)
    } else if proxy::is_retryable_status(outcome.status) {
        state.health.record_failure(name);
        Attempt::Failed
    } else {
        // Upstream-fatal (4xx != 429): breaker state is unaffected, but a HALF-OPEN admission
        // was still taken above and must still be released.
        state.health.release_admission(name);
        Attempt::Fatal(build_response(outcome, state, model, name, strategy).await)
    }
}

/// Attempts the priority-ordered list in sequence, then races every surviving candidate after
/// the first failure, bounded overall by `routing.failover_timeout_ms`.
#[allow(clippy::too_many_arguments)]
async fn attempt_failover(
    state: &DispatchState,
    mut order: Vec<String>,
    strategy: &str,
    client_headers: &HeaderMap,
    payload: Value,
    streaming: bool,
    model: &str,
    attempt_timeout: Duration,
) -> Result<Response, DispatchError> {
    let deadline = Instant::now() + Duration::from_millis(state.routing.failover_timeout_ms);
    let first = order.remove(0);

    match try_one(state, &first, strategy, client_headers, payload.clone(), streaming, model, attempt_timeout).await {
        Attempt::Success(resp) | Attempt::Fatal(resp) => return Ok(resp),
        Attempt::Failed => {}
    }

    if order.is_empty() {
        return Err(DispatchError::UpstreamExhausted);
    }

    let time_left = deadline.saturating_duration_since(Instant::now());
    if time_left.is_zero() {
        return Err(DispatchError::FailoverTimeout);
    }

    let mut race: FuturesUnordered<_> = order
        .into_iter()
        .map(|name| {
            let payload = payload.clone();
            async move { try_one(state, &name, strategy, client_headers, payload, streaming, model, attempt_timeout).await }
        })
        .collect();

    let raced = tokio::time::timeout(time_left, async {
        while let Some(attempt) = race.next().await {
            match attempt {
                Attempt::Success(resp) | Attempt::Fatal(resp) => return Some(resp),
                Attempt::Failed => {}
            }
        }
        None
    })
    .await;

    match raced {
        Ok(Some(resp)) => Ok(resp),
        Ok(None) => Err(DispatchError::UpstreamExhausted),
        Err(_) => Err(DispatchError::FailoverTimeout),
    }
}

/// Builds the client-facing response from one upstream call: SSE responses are transcoded
/// inline via [`sse::transcode`] with the required streaming headers forced on; everything
/// else is passed through verbatim. Debug headers are added here, the single place that knows
/// both the winning provider and the strategy that chose it.
async fn build_response(upstream: UpstreamResponse, state: &DispatchState, model: &str, provider: &str, strategy: &str) -> Response {
    let is_event_stream = upstream
        .headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/event-stream"));

    let mut response = if is_event_stream {
        let transcoder = SignatureTranscoder::new(Arc::clone(&state.cache), model.to_owned());
        let body = Body::from_stream(sse::transcode(upstream.response, transcoder));
        let mut response = Response::builder().status(upstream.status).body(body).unwrap_or_else(|_| Response::default());
        *response.headers_mut() = proxy::streaming_response_headers();
        response
    } else {
        let bytes = upstream.response.bytes().await.unwrap_or_default();
        let mut builder = Response::builder().status(upstream.status);
        for (name, value) in &upstream.headers {
            if matches!(name.as_str(), "content-length" | "transfer-encoding") {
                continue;
            }
            builder = builder.header(name, value);
        }
        builder.body(Body::from(bytes)).unwrap_or_else(|_| Response::default())
    };

    if state.routing.debug {
        if let Ok(value) = HeaderValue::from_str(provider) {
            response.headers_mut().insert("x-cc-relay-provider", value);
        }
        if let Ok(value) = HeaderValue::from_str(strategy) {
            response.headers_mut().insert("x-cc-relay-strategy", value);
        }
    }

    response
}
