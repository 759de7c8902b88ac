//! Client authentication for the relay's own `/v1/messages` endpoint: accept either
//! `x-api-key: <configured>` or `Authorization: Bearer <token>`. Anonymous when unconfigured;
//! `require_both` demands both be present and valid.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use cc_relay_config::ClientAuthConfig;
use http::StatusCode;
use secrecy::ExposeSecret;
use serde_json::json;

pub async fn client_auth_middleware(config: ClientAuthConfig, request: Request, next: Next) -> Response {
    if config.api_key.is_none() && config.bearer_token.is_none() {
        return next.run(request).await;
    }

    let api_key_header = request.headers().get("x-api-key").and_then(|v| v.to_str().ok());
    let bearer = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let api_key_matches = config.api_key.as_ref().is_some_and(|expected| Some(expected.expose_secret()) == api_key_header);
    let bearer_matches = config.bearer_token.as_ref().is_some_and(|expected| Some(expected.expose_secret()) == bearer);

    let ok = if config.require_both {
        let api_key_satisfied = config.api_key.is_none() || api_key_matches;
        let bearer_satisfied = config.bearer_token.is_none() || bearer_matches;
        api_key_satisfied && bearer_satisfied
    } else {
        api_key_matches || bearer_matches
    };

    if ok { next.run(request).await } else { unauthorized() }
}

fn unauthorized() -> Response {
    let body = json!({
        "type": "error",
        "error": {
            "type": "authentication_error",
            "message": "missing or invalid client credential",
        }
    });
    (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
}
