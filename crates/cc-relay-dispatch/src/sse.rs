//! SSE passthrough with inline signature transcoding.
//!
//! Every byte of the upstream event stream reaches the client in the order received; only the
//! `signature` field of a `signature_delta` event is rewritten, and only after the raw
//! signature has been durably recorded in the cache first (mutate, then flush, never the
//! reverse).

use std::sync::Arc;

use bytes::Bytes;
use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::thinking::SignatureTranscoder;

/// Wraps an upstream `reqwest::Response` body as a `Stream<Item = Result<Bytes, io::Error>>`
/// suitable for `axum::body::Body::from_stream`, transcoding signatures inline. The transcoder
/// is mutex-guarded only so the closure below can hold it across `.await` points; the stream is
/// polled sequentially so there is never real contention.
pub fn transcode(response: reqwest::Response, transcoder: SignatureTranscoder) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
    let transcoder = Arc::new(Mutex::new(transcoder));
    response.bytes_stream().eventsource().filter_map(move |result| {
        let transcoder = Arc::clone(&transcoder);
        async move {
            match result {
                Ok(event) => {
                    let mut transcoder = transcoder.lock().await;
                    Some(Ok(transform_event(&mut transcoder, &event).await))
                }
                Err(err) => {
                    tracing::warn!(error = %err, "malformed SSE frame from upstream, dropping");
                    None
                }
            }
        }
    })
}

async fn transform_event(transcoder: &mut SignatureTranscoder, event: &eventsource_stream::Event) -> Bytes {
    let Ok(mut data) = serde_json::from_str::<Value>(&event.data) else {
        return encode(&event.event, &event.data);
    };

    match data.get("type").and_then(Value::as_str) {
        Some("content_block_delta") => {
            let index = data.get("index").and_then(Value::as_u64).unwrap_or_default();
            match data.get("delta").and_then(|d| d.get("type")).and_then(Value::as_str) {
                Some("thinking_delta") => {
                    if let Some(text) = data.get("delta").and_then(|d| d.get("thinking")).and_then(Value::as_str) {
                        transcoder.observe_thinking_delta(index, text);
                    }
                }
                Some("signature_delta") => {
                    if let Some(signature) = data.get("delta").and_then(|d| d.get("signature")).and_then(Value::as_str).map(str::to_owned) {
                        let transformed = transcoder.observe_signature_delta(index, &signature).await;
                        data["delta"]["signature"] = Value::String(transformed);
                    }
                }
                _ => {}
            }
        }
        Some("content_block_stop") => {
            let index = data.get("index").and_then(Value::as_u64).unwrap_or_default();
            transcoder.forget(index);
        }
        _ => {}
    }

    encode(&event.event, &data.to_string())
}

/// Rebuilds one SSE frame: `event: <type>\n` (omitted if the upstream didn't send one),
/// `data: <payload>\n\n`.
fn encode(event_type: &str, data: &str) -> Bytes {
    let mut out = String::with_capacity(event_type.len() + data.len() + 16);
    if !event_type.is_empty() && event_type != "message" {
        out.push_str("event: ");
        out.push_str(event_type);
        out.push('\n');
    }
    out.push_str("data: ");
    out.push_str(data);
    out.push_str("\n\n");
    Bytes::from(out)
}
