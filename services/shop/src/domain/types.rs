use chrono::{DateTime, Utc};
use uuid::Uuid;

use spriie_domain::email::EmailJobState;
use spriie_domain::order::OrderStatus;
use spriie_domain::payment::{PaymentMethod, TransactionStatus};

use crate::error::ShopServiceError;

/// Jobs pulled per dispatch or resurrection run.
pub const EMAIL_BATCH_SIZE: u64 = 20;

/// Attempts after which the dispatcher dead-letters a job.
pub const MAX_ATTEMPTS_PRIMARY: i32 = 3;

/// Cumulative attempts after which the resurrector abandons a job.
pub const MAX_ATTEMPTS_RESURRECT: i32 = 5;

/// Longest `last_error` kept on a job.
const MAX_ERROR_LEN: usize = 500;

// ── Email ────────────────────────────────────────────────────────────────────

/// One outbound email as handed to the mail transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// A queued outbound email and its delivery bookkeeping.
#[derive(Debug, Clone)]
pub struct EmailJob {
    pub id: Uuid,
    pub to: String,
    pub from: String,
    pub subject: String,
    pub html: String,
    pub state: EmailJobState,
    pub attempts: i32,
    pub last_error: Option<String>,
    /// Optimistic-concurrency token; a save only applies if the stored version matches.
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
}

impl EmailJob {
    pub fn new(mail: OutgoingMail, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            to: mail.to,
            from: mail.from,
            subject: mail.subject,
            html: mail.html,
            state: EmailJobState::Queued,
            attempts: 0,
            last_error: None,
            version: 0,
            created_at: now,
            sent_at: None,
            failed_at: None,
        }
    }

    pub fn mail(&self) -> OutgoingMail {
        OutgoingMail {
            from: self.from.clone(),
            to: self.to.clone(),
            subject: self.subject.clone(),
            html: self.html.clone(),
        }
    }

    pub fn mark_sent(&mut self, now: DateTime<Utc>) {
        self.state = EmailJobState::Sent;
        self.sent_at = Some(now);
        self.failed_at = None;
    }

    /// Record a failed send from the primary dispatcher.
    /// Returns `true` if the job was dead-lettered by this failure.
    pub fn record_dispatch_failure(&mut self, error: &str, now: DateTime<Utc>) -> bool {
        self.record_failure(error);
        if self.attempts >= MAX_ATTEMPTS_PRIMARY {
            self.state = EmailJobState::DeadLetter;
            self.failed_at = Some(now);
            true
        } else {
            self.state = EmailJobState::Queued;
            false
        }
    }

    /// Record a failed send from the resurrector.
    /// Returns `true` if the job was abandoned; otherwise it goes back to the
    /// normal dispatch queue.
    pub fn record_resurrection_failure(&mut self, error: &str, now: DateTime<Utc>) -> bool {
        self.record_failure(error);
        if self.attempts >= MAX_ATTEMPTS_RESURRECT {
            self.state = EmailJobState::Abandoned;
            self.failed_at = Some(now);
            true
        } else {
            self.state = EmailJobState::Queued;
            false
        }
    }

    fn record_failure(&mut self, error: &str) {
        self.attempts += 1;
        self.last_error = Some(error.chars().take(MAX_ERROR_LEN).collect());
    }
}

/// Result of one dispatcher run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub processed: u64,
    pub sent_count: u64,
    /// Jobs dead-lettered during this run.
    pub failed_count: u64,
    pub remaining_in_queue: u64,
}

/// Result of one resurrector run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResurrectionSummary {
    pub retried: u64,
    pub revived: u64,
    pub permanently_dead: u64,
    pub remaining_dead: u64,
}

// ── Catalog ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Product {
    pub id: Uuid,
    pub store_id: Uuid,
    pub name: String,
    pub price: i64,
    pub stock: i32,
}

// ── Orders ───────────────────────────────────────────────────────────────────

/// One cart line. `price` is the unit price captured at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: i64,
}

#[derive(Debug, Clone)]
pub struct Order {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub email: String,
    pub items: Vec<CartItem>,
    pub status: OrderStatus,
    pub total_amount: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.buyer_id == user_id
    }
}

/// Sum of price × quantity over all items, refusing totals that overflow `i64`.
pub fn order_total(items: &[CartItem]) -> Result<i64, ShopServiceError> {
    items.iter().try_fold(0i64, |total, item| {
        item.price
            .checked_mul(i64::from(item.quantity))
            .and_then(|line| total.checked_add(line))
            .ok_or(ShopServiceError::OrderTotalOutOfRange)
    })
}

/// Payment fields supplied at checkout.
#[derive(Debug, Clone)]
pub struct PaymentDetails {
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub transaction_id: Option<String>,
    pub trxref: Option<String>,
}

impl PaymentDetails {
    /// Provider fields must all be present (non-blank) for provider methods
    /// and all absent for wallet payments.
    pub fn validate(&self) -> Result<(), ShopServiceError> {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        let fields = [&self.reference, &self.transaction_id, &self.trxref];
        let valid = if self.method.requires_provider_reference() {
            fields.into_iter().all(|f| present(f))
        } else {
            fields.into_iter().all(|f| f.is_none())
        };
        if valid {
            Ok(())
        } else {
            Err(ShopServiceError::InvalidPaymentDetails)
        }
    }
}

/// A payment attempt tied to an order.
#[derive(Debug, Clone)]
pub struct PaymentTransaction {
    pub id: Uuid,
    pub order_id: Uuid,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub transaction_id: Option<String>,
    pub trxref: Option<String>,
    pub status: TransactionStatus,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What the payment provider reported for a reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentVerification {
    pub status: String,
}

impl PaymentVerification {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// What fulfillment should do once the order and transaction rows are locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FulfillmentDecision {
    Apply,
    /// The reference was already settled; change nothing.
    AlreadyApplied,
}

/// Decide whether a verified payment may be applied to `order`.
///
/// The transaction status is the idempotency key: a completed transaction
/// short-circuits before any stock is touched.
pub fn decide_fulfillment(
    order: &Order,
    transaction: &PaymentTransaction,
) -> Result<FulfillmentDecision, ShopServiceError> {
    if transaction.order_id != order.id {
        return Err(ShopServiceError::TransactionNotFound);
    }
    if transaction.status == TransactionStatus::Completed {
        return Ok(FulfillmentDecision::AlreadyApplied);
    }
    if order.status != OrderStatus::Pending {
        return Err(ShopServiceError::OrderNotPayable);
    }
    Ok(FulfillmentDecision::Apply)
}

/// Outcome of payment fulfillment.
#[derive(Debug, Clone)]
pub enum PaymentOutcome {
    Applied(Order),
    AlreadyApplied(Order),
}

impl PaymentOutcome {
    pub fn order(&self) -> &Order {
        match self {
            Self::Applied(order) | Self::AlreadyApplied(order) => order,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            Self::Applied(order) | Self::AlreadyApplied(order) => order,
        }
    }
}

/// Receipt email enqueued alongside a fulfilled payment.
pub fn order_confirmation_mail(order: &Order, from: &str) -> OutgoingMail {
    let short_id = order.id.simple().to_string();
    let short_id = &short_id[short_id.len() - 8..];
    let items: String = order
        .items
        .iter()
        .map(|item| {
            format!(
                "<li>{} × {} @ ₦{}</li>",
                item.product_id,
                item.quantity,
                format_naira(item.price)
            )
        })
        .collect();
    OutgoingMail {
        from: from.to_owned(),
        to: order.email.clone(),
        subject: format!("Your Spriie order #{short_id} is confirmed"),
        html: format!(
            "<h1>Thank you for your order</h1>\
             <p>We received your payment and your order is now being processed.</p>\
             <ul>{items}</ul>\
             <p><strong>Total: ₦{}</strong></p>",
            format_naira(order.total_amount)
        ),
    }
}

/// Render kobo as a naira amount with two decimals.
fn format_naira(kobo: i64) -> String {
    let sign = if kobo < 0 { "-" } else { "" };
    let kobo = kobo.unsigned_abs();
    format!("{sign}{}.{:02}", kobo / 100, kobo % 100)
}
