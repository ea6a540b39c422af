use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::repository::{EmailJobRepository, MailTransport};
use crate::domain::types::{
    DispatchSummary, EMAIL_BATCH_SIZE, EmailJob, OutgoingMail, ResurrectionSummary,
};
use crate::error::ShopServiceError;

// ── EnqueueEmail ─────────────────────────────────────────────────────────────

pub struct EnqueueEmailInput {
    pub to: String,
    /// Falls back to the service's default sender.
    pub from: Option<String>,
    pub subject: String,
    pub html: String,
}

pub struct EnqueueEmailUseCase<R: EmailJobRepository> {
    pub jobs: R,
    pub default_from: String,
}

impl<R: EmailJobRepository> EnqueueEmailUseCase<R> {
    pub async fn execute(&self, input: EnqueueEmailInput) -> Result<EmailJob, ShopServiceError> {
        let blank = |s: &str| s.trim().is_empty();
        if blank(&input.to) || blank(&input.subject) || blank(&input.html) {
            return Err(ShopServiceError::InvalidEmailRequest);
        }
        let from = input
            .from
            .filter(|f| !blank(f))
            .unwrap_or_else(|| self.default_from.clone());

        let job = EmailJob::new(
            OutgoingMail {
                from,
                to: input.to.trim().to_owned(),
                subject: input.subject,
                html: input.html,
            },
            Utc::now(),
        );
        self.jobs.enqueue(&job).await?;
        info!(job_id = %job.id, "email job enqueued");
        Ok(job)
    }
}

// ── GetEmailJob ──────────────────────────────────────────────────────────────

pub struct GetEmailJobUseCase<R: EmailJobRepository> {
    pub jobs: R,
}

impl<R: EmailJobRepository> GetEmailJobUseCase<R> {
    pub async fn execute(&self, id: Uuid) -> Result<EmailJob, ShopServiceError> {
        self.jobs
            .find_by_id(id)
            .await?
            .ok_or(ShopServiceError::EmailJobNotFound)
    }
}

// ── Delivery attempt (shared by dispatcher and resurrector) ──────────────────

/// What happened to one job in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Sent,
    /// Failed; still eligible for another try.
    Retrying,
    /// Failed and crossed the ceiling (dead-lettered or abandoned).
    GaveUp,
    /// Another worker saved this job first; our result was discarded.
    Conflict,
}

#[derive(Debug, Clone, Copy)]
enum Tier {
    Primary,
    Resurrection,
}

async fn attempt_delivery<R, M>(
    jobs: &R,
    mailer: &M,
    mut job: EmailJob,
    tier: Tier,
) -> Result<Attempt, ShopServiceError>
where
    R: EmailJobRepository,
    M: MailTransport,
{
    let attempt = match mailer.send(&job.mail()).await {
        Ok(()) => {
            job.mark_sent(Utc::now());
            Attempt::Sent
        }
        Err(e) => {
            let error = e.to_string();
            let now = Utc::now();
            let gave_up = match tier {
                Tier::Primary => job.record_dispatch_failure(&error, now),
                Tier::Resurrection => job.record_resurrection_failure(&error, now),
            };
            warn!(
                job_id = %job.id,
                attempts = job.attempts,
                state = %job.state,
                error = %error,
                "email send failed"
            );
            if gave_up {
                Attempt::GaveUp
            } else {
                Attempt::Retrying
            }
        }
    };

    if !jobs.save(&job).await? {
        warn!(job_id = %job.id, version = job.version, "email job changed concurrently, skipped");
        return Ok(Attempt::Conflict);
    }
    Ok(attempt)
}

// ── DispatchEmails ───────────────────────────────────────────────────────────

/// Drains the oldest queued jobs through the mail transport.
pub struct DispatchEmailsUseCase<R, M>
where
    R: EmailJobRepository,
    M: MailTransport,
{
    pub jobs: R,
    pub mailer: M,
}

impl<R, M> DispatchEmailsUseCase<R, M>
where
    R: EmailJobRepository,
    M: MailTransport,
{
    pub async fn execute(&self) -> Result<DispatchSummary, ShopServiceError> {
        // A store failure here aborts the run before any job is touched.
        let due = self.jobs.due_for_dispatch(EMAIL_BATCH_SIZE).await?;
        let mut summary = DispatchSummary {
            processed: due.len() as u64,
            ..DispatchSummary::default()
        };

        for job in due {
            let job_id = job.id;
            match attempt_delivery(&self.jobs, &self.mailer, job, Tier::Primary).await {
                Ok(Attempt::Sent) => summary.sent_count += 1,
                Ok(Attempt::GaveUp) => summary.failed_count += 1,
                Ok(Attempt::Retrying | Attempt::Conflict) => {}
                Err(e) => warn!(job_id = %job_id, error = %e, "email job not saved"),
            }
        }

        summary.remaining_in_queue = self.jobs.count_queued().await?;
        info!(
            processed = summary.processed,
            sent = summary.sent_count,
            dead_lettered = summary.failed_count,
            remaining = summary.remaining_in_queue,
            "email dispatch finished"
        );
        Ok(summary)
    }
}

// ── ResurrectEmails ──────────────────────────────────────────────────────────

/// Gives dead-lettered jobs a second, slower recovery window.
pub struct ResurrectEmailsUseCase<R, M>
where
    R: EmailJobRepository,
    M: MailTransport,
{
    pub jobs: R,
    pub mailer: M,
}

impl<R, M> ResurrectEmailsUseCase<R, M>
where
    R: EmailJobRepository,
    M: MailTransport,
{
    pub async fn execute(&self) -> Result<ResurrectionSummary, ShopServiceError> {
        let dead = self.jobs.due_for_resurrection(EMAIL_BATCH_SIZE).await?;
        let mut summary = ResurrectionSummary {
            retried: dead.len() as u64,
            ..ResurrectionSummary::default()
        };

        for job in dead {
            let job_id = job.id;
            match attempt_delivery(&self.jobs, &self.mailer, job, Tier::Resurrection).await {
                Ok(Attempt::Sent) => summary.revived += 1,
                Ok(Attempt::GaveUp) => summary.permanently_dead += 1,
                Ok(Attempt::Retrying | Attempt::Conflict) => {}
                Err(e) => warn!(job_id = %job_id, error = %e, "email job not saved"),
            }
        }

        summary.remaining_dead = self.jobs.count_dead_letter().await?;
        info!(
            retried = summary.retried,
            revived = summary.revived,
            abandoned = summary.permanently_dead,
            remaining = summary.remaining_dead,
            "email resurrection finished"
        );
        Ok(summary)
    }
}
