use axum::response::IntoResponse;
use http::StatusCode;
use serde_json::json;

/// `GET /health`: always `{"status":"ok"}` (200). 503 is reserved for future use but nothing in
/// the current core has a reason to report unhealthy at the process level — an individual
/// provider being OPEN is a routing concern, not a liveness concern.
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, axum::Json(json!({"status": "ok"})))
}
