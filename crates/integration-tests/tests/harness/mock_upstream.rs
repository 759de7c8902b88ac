//! A minimal Anthropic-Messages-compatible mock upstream. Responds to `POST /v1/messages`
//! with either a complete JSON message or an SSE stream, depending on the request's `stream`
//! field, and can be told to fail its first N requests to exercise failover and the breaker.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use http::StatusCode;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

struct Inner {
    request_count: AtomicU64,
    fail_remaining: AtomicU32,
    fail_status: AtomicU32,
    thinking: Option<(String, String)>,
    received_models: Mutex<Vec<String>>,
}

/// A running mock upstream bound to an ephemeral port.
pub struct MockUpstream {
    addr: SocketAddr,
    inner: Arc<Inner>,
    shutdown: CancellationToken,
}

impl MockUpstream {
    /// Always succeeds, echoing `model` back in a text-only response.
    pub async fn start() -> Self {
        Self::spawn(0, StatusCode::SERVICE_UNAVAILABLE, None).await
    }

    /// Fails the first `times` requests with `status`, then succeeds.
    pub async fn start_failing(times: u32, status: StatusCode) -> Self {
        Self::spawn(times, status, None).await
    }

    /// Every streaming response emits one `thinking` block carrying `thinking_text` and
    /// `signature` before the text block, for exercising the signature cache.
    pub async fn start_with_thinking(thinking_text: &str, signature: &str) -> Self {
        Self::spawn(0, StatusCode::SERVICE_UNAVAILABLE, Some((thinking_text.to_owned(), signature.to_owned()))).await
    }

    async fn spawn(fail_times: u32, fail_status: StatusCode, thinking: Option<(String, String)>) -> Self {
        let inner = Arc::new(Inner {
            request_count: AtomicU64::new(0),
            fail_remaining: AtomicU32::new(fail_times),
            fail_status: AtomicU32::new(u32::from(fail_status.as_u16())),
            thinking,
            received_models: Mutex::new(Vec::new()),
        });

        let router = Router::new().route("/v1/messages", post(handle_messages)).with_state(Arc::clone(&inner));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind mock upstream listener");
        let addr = listener.local_addr().expect("mock upstream local addr");

        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { shutdown_clone.cancelled().await })
                .await
                .ok();
        });

        Self { addr, inner, shutdown }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn request_count(&self) -> u64 {
        self.inner.request_count.load(Ordering::SeqCst)
    }

    pub async fn received_models(&self) -> Vec<String> {
        self.inner.received_models.lock().await.clone()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_messages(State(inner): State<Arc<Inner>>, body: Bytes) -> Response {
    inner.request_count.fetch_add(1, Ordering::SeqCst);

    let payload: Value = serde_json::from_slice(&body).unwrap_or_else(|_| json!({}));
    let model = payload.get("model").and_then(Value::as_str).unwrap_or("unknown").to_owned();
    inner.received_models.lock().await.push(model.clone());

    let should_fail = inner
        .fail_remaining
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| remaining.checked_sub(1))
        .is_ok();
    if should_fail {
        let status = StatusCode::from_u16(inner.fail_status.load(Ordering::SeqCst) as u16).unwrap_or(StatusCode::SERVICE_UNAVAILABLE);
        let body = json!({"type": "error", "error": {"type": "overloaded_error", "message": "mock upstream failure"}});
        return (status, axum::Json(body)).into_response();
    }

    let streaming = payload.get("stream").and_then(Value::as_bool).unwrap_or(false);
    if streaming {
        sse_response(&model, inner.thinking.as_ref())
    } else {
        json_response(&model)
    }
}

fn json_response(model: &str) -> Response {
    let body = json!({
        "id": "msg_mock",
        "type": "message",
        "role": "assistant",
        "model": model,
        "content": [{"type": "text", "text": "mock response"}],
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 10, "output_tokens": 5},
    });
    (StatusCode::OK, axum::Json(body)).into_response()
}

fn sse_response(model: &str, thinking: Option<&(String, String)>) -> Response {
    let mut frames = String::new();
    push_event(
        &mut frames,
        "message_start",
        &json!({
            "type": "message_start",
            "message": {"id": "msg_mock", "type": "message", "role": "assistant", "model": model, "content": [], "usage": {"input_tokens": 10, "output_tokens": 0}},
        }),
    );

    let mut next_index: u64 = 0;
    if let Some((text, signature)) = thinking {
        let index = next_index;
        next_index += 1;
        push_event(
            &mut frames,
            "content_block_start",
            &json!({"type": "content_block_start", "index": index, "content_block": {"type": "thinking", "thinking": ""}}),
        );
        push_event(
            &mut frames,
            "content_block_delta",
            &json!({"type": "content_block_delta", "index": index, "delta": {"type": "thinking_delta", "thinking": text}}),
        );
        push_event(
            &mut frames,
            "content_block_delta",
            &json!({"type": "content_block_delta", "index": index, "delta": {"type": "signature_delta", "signature": signature}}),
        );
        push_event(&mut frames, "content_block_stop", &json!({"type": "content_block_stop", "index": index}));
    }

    let text_index = next_index;
    push_event(
        &mut frames,
        "content_block_start",
        &json!({"type": "content_block_start", "index": text_index, "content_block": {"type": "text", "text": ""}}),
    );
    push_event(
        &mut frames,
        "content_block_delta",
        &json!({"type": "content_block_delta", "index": text_index, "delta": {"type": "text_delta", "text": "mock response"}}),
    );
    push_event(&mut frames, "content_block_stop", &json!({"type": "content_block_stop", "index": text_index}));
    push_event(
        &mut frames,
        "message_delta",
        &json!({"type": "message_delta", "delta": {"stop_reason": "end_turn"}, "usage": {"output_tokens": 5}}),
    );
    push_event(&mut frames, "message_stop", &json!({"type": "message_stop"}));

    Response::builder()
        .status(StatusCode::OK)
        .header(http::header::CONTENT_TYPE, "text/event-stream")
        .body(Body::from(frames))
        .unwrap_or_else(|_| Response::default())
}

fn push_event(out: &mut String, event: &str, data: &Value) {
    out.push_str("event: ");
    out.push_str(event);
    out.push_str("\ndata: ");
    out.push_str(&data.to_string());
    out.push_str("\n\n");
}
