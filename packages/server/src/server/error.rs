use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::domains::blog::GenerationError;

/// Sentinel carrying an explicit 404 through the `anyhow::Error` chain.
#[derive(Debug)]
struct NotFoundError(String);

impl std::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for NotFoundError {}

/// Sentinel for a request the handler could not accept (400).
#[derive(Debug)]
struct BadRequestError(String);

impl std::fmt::Display for BadRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BadRequestError {}

/// Unified error type for HTTP responses.
///
/// Renders `{"success": false, "error": "..."}` with a status derived from
/// the underlying error.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(NotFoundError(msg.into()).into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(BadRequestError(msg.into()).into())
    }

    pub fn status(&self) -> StatusCode {
        if self.0.downcast_ref::<NotFoundError>().is_some() {
            return StatusCode::NOT_FOUND;
        }
        if self.0.downcast_ref::<BadRequestError>().is_some() {
            return StatusCode::BAD_REQUEST;
        }

        match self.0.downcast_ref::<GenerationError>() {
            Some(GenerationError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            Some(GenerationError::Provider {
                status: Some(402), ..
            }) => StatusCode::PAYMENT_REQUIRED,
            Some(GenerationError::Provider { .. })
            | Some(GenerationError::MalformedResponse(_))
            | Some(GenerationError::MissingField(_)) => StatusCode::BAD_GATEWAY,
            Some(GenerationError::DuplicateSlug(_)) => StatusCode::CONFLICT,
            Some(GenerationError::Storage(_)) | None => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %format!("{:#}", self.0), "request failed");
        }

        let body = serde_json::json!({ "success": false, "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
