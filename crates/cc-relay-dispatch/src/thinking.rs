//! Extended-thinking signature handling: attaching cached signatures to unsigned thinking
//! blocks on ingress, and recording + transforming `signature_delta` events on egress.

use std::collections::HashMap;

use cc_relay_cache::SignatureCache;
use serde_json::Value;

/// Walks every message's content blocks, rewriting `thinking` blocks in place:
///
/// - a block that already carries a `signature` has the `{model-group}:` prefix this relay
///   adds on egress stripped back off, so the upstream sees the raw bytes it originally issued;
/// - an unsigned block is looked up in the signature cache by `(model, thinking text)`; a hit
///   attaches the cached signature, a miss drops the block entirely (the upstream would reject
///   an unsigned thinking block it didn't itself just emit).
///
/// Blocks that are not `thinking` blocks are left untouched.
pub async fn resolve_request_signatures(cache: &SignatureCache, model: &str, body: &mut Value) {
    let Some(messages) = body.get_mut("messages").and_then(Value::as_array_mut) else {
        return;
    };

    for message in messages {
        let Some(content) = message.get_mut("content").and_then(Value::as_array_mut) else {
            continue;
        };

        let mut index = 0;
        while index < content.len() {
            let is_thinking = content[index].get("type").and_then(Value::as_str) == Some("thinking");
            if !is_thinking {
                index += 1;
                continue;
            }

            if let Some(signature) = content[index].get("signature").and_then(Value::as_str) {
                let stripped = strip_group_prefix(signature).to_owned();
                content[index]["signature"] = Value::String(stripped);
                index += 1;
                continue;
            }

            let text = content[index].get("thinking").and_then(Value::as_str).unwrap_or_default().to_owned();
            match cache.lookup(model, &text).await {
                Some(signature) => {
                    content[index]["signature"] = Value::String(String::from_utf8_lossy(&signature).into_owned());
                    index += 1;
                }
                None => {
                    content.remove(index);
                }
            }
        }
    }
}

/// Strips a leading `group:` component added on egress. Signatures the relay never touched
/// (no colon present) pass through unchanged.
fn strip_group_prefix(signature: &str) -> &str {
    signature.split_once(':').map_or(signature, |(_, rest)| rest)
}

/// Accumulates `thinking_delta` text per content-block index for one streaming response, and
/// on each `signature_delta` stores the raw signature under `(model, accumulated text)` before
/// handing back the group-prefixed bytes that should actually reach the client.
///
/// One instance is created per upstream call and discarded once the stream ends; it holds no
/// state beyond the lifetime of a single request.
pub struct SignatureTranscoder {
    cache: std::sync::Arc<SignatureCache>,
    model: String,
    accumulated: HashMap<u64, String>,
}

impl SignatureTranscoder {
    #[must_use]
    pub fn new(cache: std::sync::Arc<SignatureCache>, model: String) -> Self {
        Self {
            cache,
            model,
            accumulated: HashMap::new(),
        }
    }

    /// Records a `thinking_delta` chunk for `index`.
    pub fn observe_thinking_delta(&mut self, index: u64, text: &str) {
        self.accumulated.entry(index).or_default().push_str(text);
    }

    /// Records a `signature_delta` for `index`: stores the raw signature against the text
    /// accumulated so far for that block, and returns the `{model-group}:{signature}` bytes
    /// that should be substituted into the event forwarded downstream.
    pub async fn observe_signature_delta(&mut self, index: u64, signature: &str) -> String {
        let text = self.accumulated.get(&index).cloned().unwrap_or_default();
        self.cache.store(&self.model, &text, signature.as_bytes().to_vec()).await;
        let group = cc_relay_core::model_group(&self.model);
        format!("{group}:{signature}")
    }

    /// Drops accumulated text for a block once its `content_block_stop` arrives, bounding
    /// memory to the blocks still open in the current stream.
    pub fn forget(&mut self, index: u64) {
        self.accumulated.remove(&index);
    }
}
