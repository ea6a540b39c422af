use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spriie_domain::email::EmailJobState;

use crate::error::ShopServiceError;
use crate::state::AppState;
use crate::usecase::email::{EnqueueEmailInput, EnqueueEmailUseCase, GetEmailJobUseCase};

// ── POST /emails ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct EnqueueEmailRequest {
    pub to: String,
    pub from: Option<String>,
    pub subject: String,
    pub html: String,
}

#[derive(Serialize)]
pub struct EnqueueEmailResponse {
    pub id: Uuid,
}

pub async fn enqueue_email(
    State(state): State<AppState>,
    body: Result<Json<EnqueueEmailRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EnqueueEmailResponse>), ShopServiceError> {
    let Json(body) = body.map_err(|rejection| {
        tracing::debug!(%rejection, "unreadable email request");
        ShopServiceError::InvalidEmailRequest
    })?;
    let usecase = EnqueueEmailUseCase {
        jobs: state.email_job_repo(),
        default_from: state.mail_from.clone(),
    };
    let job = usecase
        .execute(EnqueueEmailInput {
            to: body.to,
            from: body.from,
            subject: body.subject,
            html: body.html,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(EnqueueEmailResponse { id: job.id })))
}

// ── GET /emails/{id} ─────────────────────────────────────────────────────────

/// Delivery bookkeeping only; the body is not echoed back.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailJobResponse {
    pub id: Uuid,
    pub to: String,
    pub from: String,
    pub subject: String,
    pub state: EmailJobState,
    pub sent: bool,
    pub failed: bool,
    pub attempts: i32,
    pub last_error: Option<String>,
    #[serde(serialize_with = "spriie_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "spriie_core::serde::to_rfc3339_ms_opt")]
    pub sent_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(serialize_with = "spriie_core::serde::to_rfc3339_ms_opt")]
    pub failed_at: Option<chrono::DateTime<chrono::Utc>>,
}

pub async fn get_email_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EmailJobResponse>, ShopServiceError> {
    let usecase = GetEmailJobUseCase {
        jobs: state.email_job_repo(),
    };
    let job = usecase.execute(id).await?;
    Ok(Json(EmailJobResponse {
        id: job.id,
        to: job.to,
        from: job.from,
        subject: job.subject,
        sent: job.state.is_sent(),
        failed: job.state.is_failed(),
        state: job.state,
        attempts: job.attempts,
        last_error: job.last_error,
        created_at: job.created_at,
        sent_at: job.sent_at,
        failed_at: job.failed_at,
    }))
}
