//! One reverse-proxy instance per provider. URL parsing and base-target construction happen
//! once at startup (in [`crate::state::ProviderRuntime`]); everything here runs per request.

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, StatusCode};

use crate::error::DispatchError;
use crate::provider::{OutgoingRequest, ProviderOps};
use crate::state::ProviderRuntime;

/// Outcome of one upstream call, before the handler classifies it into success/retryable
/// failure/fatal-passthrough.
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub response: reqwest::Response,
}

/// Director: rewrites the URL, resolves authentication, forwards headers, and rewrites the
/// `model` field, then sends the request. Does not buffer or interpret the response body —
/// that is the caller's job (plain passthrough for non-streaming, SSE transcoding for
/// streaming).
///
/// # Errors
///
/// Returns a [`DispatchError`] if auth application fails or the upstream call itself errors
/// (connection refused, timeout, TLS failure, ...).
pub async fn forward(
    client: &reqwest::Client,
    provider: &ProviderRuntime,
    method: Method,
    path_suffix: &str,
    query: Option<&str>,
    client_headers: &HeaderMap,
    mut body: serde_json::Value,
    streaming: bool,
) -> Result<UpstreamResponse, DispatchError> {
    let requested_model = body.get("model").and_then(serde_json::Value::as_str).map(str::to_owned);

    let target_model = requested_model.as_deref().map(|m| provider.adapter.map_model(m, &provider.model_mapping));
    if let (Some(model), Some(obj)) = (&target_model, body.as_object_mut()) {
        obj.insert("model".to_owned(), serde_json::Value::String(model.clone()));
    }

    let url = provider.adapter.target_url(&provider.base_url, path_suffix, query, target_model.as_deref().unwrap_or_default(), streaming);
    let headers = crate::provider::forward_headers(client_headers, requires_default_version(&provider.adapter));

    let body_bytes = Bytes::from(serde_json::to_vec(&body).map_err(|e| DispatchError::Internal(e.into()))?);

    let mut outgoing = OutgoingRequest {
        method,
        url,
        headers,
        body: body_bytes,
    };

    apply_authentication(provider, client_headers, &mut outgoing).await?;

    let request = client
        .request(outgoing.method, outgoing.url)
        .headers(outgoing.headers)
        .body(outgoing.body);

    let response = request.send().await.map_err(|e| DispatchError::Internal(anyhow::anyhow!("upstream call failed: {e}")))?;

    let status = response.status();
    let headers = response.headers().clone();
    Ok(UpstreamResponse { status, headers, response })
}

/// If the client supplied its own credential and the provider allows transparent passthrough,
/// the credential is forwarded unchanged; otherwise client auth is stripped (never forwarded
/// to a provider the client didn't explicitly address) and the adapter applies managed auth
/// from the key pool.
async fn apply_authentication(provider: &ProviderRuntime, client_headers: &HeaderMap, outgoing: &mut OutgoingRequest) -> Result<(), DispatchError> {
    if provider.adapter.supports_transparent_auth()
        && let Some(credential) = cc_relay_core::client_credential(client_headers)
    {
        if let Ok(value) = HeaderValue::from_str(&credential) {
            outgoing.headers.insert("x-api-key", value);
        }
        return Ok(());
    }

    let credential = provider.key_pool.next();
    provider.adapter.apply_auth(outgoing, credential.map(|c| &c.api_key)).await
}

/// Only the Anthropic-shaped adapters require a default `anthropic-version`; Bedrock/Vertex/
/// Ollama speak their own envelope and never see this header.
fn requires_default_version(adapter: &crate::provider::Adapter) -> bool {
    matches!(adapter, crate::provider::Adapter::Anthropic(_) | crate::provider::Adapter::ZAi(_) | crate::provider::Adapter::Azure(_))
}

/// SSE headers required on every streaming downstream response, applied to the
/// client-facing response regardless of what the upstream itself sent.
#[must_use]
pub fn streaming_response_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(http::header::CACHE_CONTROL, HeaderValue::from_static("no-cache, no-transform"));
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    headers.insert(http::header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(http::header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers
}

/// Classifies an upstream outcome: only these statuses (and, by the caller, network
/// errors/timeouts) count against the circuit breaker and drive failover.
#[must_use]
pub const fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS | StatusCode::INTERNAL_SERVER_ERROR | StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    )
}
