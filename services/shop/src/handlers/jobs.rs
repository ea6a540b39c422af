use axum::{
    Json,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts},
};
use serde::Serialize;

use spriie_core::error::AppError;

use crate::domain::types::{DispatchSummary, ResurrectionSummary};
use crate::error::ShopServiceError;
use crate::state::AppState;
use crate::usecase::email::{DispatchEmailsUseCase, ResurrectEmailsUseCase};

/// Caller of a `/jobs/*` trigger. When a cron secret is configured the
/// request must carry `Authorization: Bearer <secret>`.
pub struct CronCaller;

impl FromRequestParts<AppState> for CronCaller {
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let authorized = match state.cron_secret.as_deref() {
            None => true,
            Some(secret) => parts
                .headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .is_some_and(|token| constant_time_eq(token.as_bytes(), secret.as_bytes())),
        };
        async move {
            if authorized {
                Ok(CronCaller)
            } else {
                Err(AppError::InvalidCronSecret)
            }
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

// ── POST /jobs/emails/dispatch ───────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResponse {
    pub processed: u64,
    pub sent_count: u64,
    pub failed_count: u64,
    pub remaining_in_queue: u64,
}

impl From<DispatchSummary> for DispatchResponse {
    fn from(s: DispatchSummary) -> Self {
        Self {
            processed: s.processed,
            sent_count: s.sent_count,
            failed_count: s.failed_count,
            remaining_in_queue: s.remaining_in_queue,
        }
    }
}

pub async fn dispatch_emails(
    _caller: CronCaller,
    State(state): State<AppState>,
) -> Result<Json<DispatchResponse>, ShopServiceError> {
    let usecase = DispatchEmailsUseCase {
        jobs: state.email_job_repo(),
        mailer: state.mail_transport.clone(),
    };
    let summary = usecase.execute().await?;
    Ok(Json(summary.into()))
}

// ── POST /jobs/emails/resurrect ──────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResurrectResponse {
    pub retried: u64,
    pub revived: u64,
    pub permanently_dead: u64,
    pub remaining_dead: u64,
}

impl From<ResurrectionSummary> for ResurrectResponse {
    fn from(s: ResurrectionSummary) -> Self {
        Self {
            retried: s.retried,
            revived: s.revived,
            permanently_dead: s.permanently_dead,
            remaining_dead: s.remaining_dead,
        }
    }
}

pub async fn resurrect_emails(
    _caller: CronCaller,
    State(state): State<AppState>,
) -> Result<Json<ResurrectResponse>, ShopServiceError> {
    let usecase = ResurrectEmailsUseCase {
        jobs: state.email_job_repo(),
        mailer: state.mail_transport.clone(),
    };
    let summary = usecase.execute().await?;
    Ok(Json(summary.into()))
}
