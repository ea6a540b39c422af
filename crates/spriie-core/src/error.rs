use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Render the JSON error body shared by every Spriie service:
/// `{"kind": "MACHINE_CODE", "error": "human readable message"}`.
pub fn error_response(status: StatusCode, kind: &str, message: &str) -> Response {
    let body = serde_json::json!({
        "kind": kind,
        "error": message,
    });
    (status, axum::Json(body)).into_response()
}

/// Rejections raised by shared extractors before a handler runs.
///
/// Service-specific failures belong in each service's own error enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    /// Gateway identity headers absent or malformed.
    #[error("missing or invalid identity")]
    MissingIdentity,
    /// A job trigger without the configured bearer secret.
    #[error("invalid cron credentials")]
    InvalidCronSecret,
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        "UNAUTHORIZED"
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::debug!(reason = %self, "request rejected");
        error_response(self.status(), self.kind(), &self.to_string())
    }
}
