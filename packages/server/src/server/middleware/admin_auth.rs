use std::sync::Arc;

use axum::body::Body;
use axum::http::{header::AUTHORIZATION, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use subtle::ConstantTimeEq;
use tracing::debug;

/// Admin authentication middleware
///
/// Requires `Authorization: Bearer <token>` matching the configured admin
/// token. Rejects with 401 JSON otherwise.
pub async fn admin_auth_middleware(
    admin_token: Arc<String>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if !token_matches(provided, &admin_token) {
        debug!(path = %request.uri().path(), "Rejected admin request");
        let body = serde_json::json!({ "success": false, "error": "Unauthorized" });
        return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
    }

    next.run(request).await
}

/// Constant-time token comparison. An empty expected token never matches.
fn token_matches(provided: Option<&str>, expected: &str) -> bool {
    match provided {
        Some(token) if !expected.is_empty() => {
            token.as_bytes().ct_eq(expected.as_bytes()).into()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_matches() {
        assert!(token_matches(Some("secret"), "secret"));
        assert!(!token_matches(Some("wrong"), "secret"));
        assert!(!token_matches(None, "secret"));
    }

    #[test]
    fn test_empty_expected_token_never_matches() {
        assert!(!token_matches(Some(""), ""));
    }
}
