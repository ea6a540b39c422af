use chrono::{Duration, Utc};

use spriie_domain::email::EmailJobState;
use spriie_shop::domain::repository::EmailJobRepository;
use spriie_shop::error::ShopServiceError;
use spriie_shop::usecase::email::{DispatchEmailsUseCase, ResurrectEmailsUseCase};

use crate::helpers::{InMemoryEmailJobs, ScriptedMailer, dead_job};

#[tokio::test]
async fn should_revive_dead_job_on_success() {
    let job = dead_job("ada@example.com", Utc::now() - Duration::hours(1));
    let store = InMemoryEmailJobs::with_jobs(vec![job.clone()]);
    let uc = ResurrectEmailsUseCase {
        jobs: store.clone(),
        mailer: ScriptedMailer::succeeding(),
    };

    let summary = uc.execute().await.unwrap();

    assert_eq!(summary.retried, 1);
    assert_eq!(summary.revived, 1);
    assert_eq!(summary.permanently_dead, 0);
    assert_eq!(summary.remaining_dead, 0);

    let saved = store.get(job.id);
    assert_eq!(saved.state, EmailJobState::Sent);
    assert!(saved.sent_at.is_some());
    assert!(saved.failed_at.is_none());

    assert!(store.due_for_dispatch(20).await.unwrap().is_empty());
    assert!(store.due_for_resurrection(20).await.unwrap().is_empty());
}

#[tokio::test]
async fn should_requeue_for_dispatch_below_resurrection_ceiling() {
    let job = dead_job("ada@example.com", Utc::now() - Duration::hours(1));
    let store = InMemoryEmailJobs::with_jobs(vec![job.clone()]);
    let uc = ResurrectEmailsUseCase {
        jobs: store.clone(),
        mailer: ScriptedMailer::failing(1),
    };

    let summary = uc.execute().await.unwrap();

    assert_eq!(summary.retried, 1);
    assert_eq!(summary.revived, 0);
    assert_eq!(summary.permanently_dead, 0);
    assert_eq!(summary.remaining_dead, 0);

    let saved = store.get(job.id);
    assert_eq!(saved.state, EmailJobState::Queued);
    assert_eq!(saved.attempts, 4);

    // Back in the primary queue; the next primary failure dead-letters it again.
    let dispatch = DispatchEmailsUseCase {
        jobs: store.clone(),
        mailer: ScriptedMailer::failing(1),
    };
    let summary = dispatch.execute().await.unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.failed_count, 1);
    assert_eq!(store.get(job.id).state, EmailJobState::DeadLetter);
}

#[tokio::test]
async fn should_abandon_at_resurrection_ceiling() {
    let mut job = dead_job("ada@example.com", Utc::now() - Duration::hours(1));
    job.attempts = 4;
    let store = InMemoryEmailJobs::with_jobs(vec![job.clone()]);
    let uc = ResurrectEmailsUseCase {
        jobs: store.clone(),
        mailer: ScriptedMailer::failing(1),
    };

    let summary = uc.execute().await.unwrap();

    assert_eq!(summary.permanently_dead, 1);
    assert_eq!(summary.remaining_dead, 0);

    let saved = store.get(job.id);
    assert_eq!(saved.state, EmailJobState::Abandoned);
    assert_eq!(saved.attempts, 5);

    assert!(store.due_for_dispatch(20).await.unwrap().is_empty());
    assert!(store.due_for_resurrection(20).await.unwrap().is_empty());

    let again = uc.execute().await.unwrap();
    assert_eq!(again.retried, 0, "abandoned jobs are never selected again");
}

#[tokio::test]
async fn should_retry_longest_dead_first() {
    let now = Utc::now();
    let store = InMemoryEmailJobs::with_jobs(vec![
        dead_job("recent@example.com", now - Duration::minutes(5)),
        dead_job("oldest@example.com", now - Duration::days(2)),
        dead_job("middle@example.com", now - Duration::hours(3)),
    ]);
    let mailer = ScriptedMailer::succeeding();
    let uc = ResurrectEmailsUseCase {
        jobs: store.clone(),
        mailer: mailer.clone(),
    };

    let summary = uc.execute().await.unwrap();
    assert_eq!(summary.revived, 3);

    let order: Vec<_> = mailer
        .sent
        .lock()
        .unwrap()
        .iter()
        .map(|m| m.to.clone())
        .collect();
    assert_eq!(
        order,
        ["oldest@example.com", "middle@example.com", "recent@example.com"]
    );
}

#[tokio::test]
async fn should_leave_queued_jobs_to_dispatcher() {
    let store = InMemoryEmailJobs::with_jobs(vec![crate::helpers::queued_job("q@example.com", 5)]);
    let mailer = ScriptedMailer::succeeding();
    let uc = ResurrectEmailsUseCase {
        jobs: store.clone(),
        mailer: mailer.clone(),
    };

    let summary = uc.execute().await.unwrap();

    assert_eq!(summary.retried, 0);
    assert_eq!(mailer.send_count(), 0);
    assert_eq!(store.all()[0].state, EmailJobState::Queued);
}

#[tokio::test]
async fn should_fail_fast_when_store_unreachable() {
    let uc = ResurrectEmailsUseCase {
        jobs: InMemoryEmailJobs::unavailable(),
        mailer: ScriptedMailer::succeeding(),
    };

    let result = uc.execute().await;

    assert!(
        matches!(result, Err(ShopServiceError::Internal(_))),
        "expected Internal, got {result:?}"
    );
}
