use axum::Json;
use axum::response::{IntoResponse, Response};
use cc_relay_core::HttpError;
use http::StatusCode;
use serde_json::json;
use thiserror::Error;

/// The dispatch handler is the sole translator of internal errors into wire errors. Adapters
/// and the router return typed errors; this enum is the complete vocabulary the handler maps
/// from. No internal error detail is leaked into `message` beyond the abstract kind.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unknown model: {0}")]
    ModelNotFound(String),

    #[error("all candidate providers are unhealthy")]
    AllProvidersUnhealthy,

    #[error("every candidate provider failed")]
    UpstreamExhausted,

    #[error("failover budget exceeded")]
    FailoverTimeout,

    #[error("rejected by rate limit")]
    RateLimited,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl HttpError for DispatchError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::ModelNotFound(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::UpstreamExhausted => StatusCode::BAD_GATEWAY,
            Self::AllProvidersUnhealthy => StatusCode::SERVICE_UNAVAILABLE,
            Self::FailoverTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) | Self::ModelNotFound(_) => "invalid_request_error",
            Self::RateLimited => "rate_limited",
            Self::UpstreamExhausted => "api_error",
            Self::AllProvidersUnhealthy => "service_unavailable",
            Self::FailoverTimeout => "request_timeout",
            Self::Internal(_) => "api_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::InvalidRequest(msg) | Self::ModelNotFound(msg) => msg.clone(),
            Self::RateLimited => "rate limited".to_owned(),
            Self::UpstreamExhausted => "all candidate providers failed".to_owned(),
            Self::AllProvidersUnhealthy => "no healthy provider available".to_owned(),
            Self::FailoverTimeout => "request timed out".to_owned(),
            Self::Internal(_) => "internal error".to_owned(),
        }
    }
}

/// The sole place a [`DispatchError`] becomes a wire response: the Anthropic-shaped
/// `{"type":"error","error":{"type":..,"message":..}}` body at the status `status_code` names.
impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "type": "error",
            "error": {
                "type": self.error_type(),
                "message": self.client_message(),
            }
        });
        (status, Json(body)).into_response()
    }
}
