use axum::http::StatusCode;

/// `GET /healthz`: the process is up. Dependency checks live in each
/// service's `/readyz`.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}
