use sha2::{Digest, Sha256};

/// Builds the cache key `sig:{model-group}:{sha256(thinking-text)}` (lowercase hex digest).
#[must_use]
pub fn signature_key(model_group: &str, thinking_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(thinking_text.as_bytes());
    let digest = hasher.finalize();
    format!("sig:{model_group}:{digest:x}")
}
