#![allow(async_fn_in_trait)]

use uuid::Uuid;

use spriie_domain::order::OrderStatus;

use crate::domain::types::{
    EmailJob, Order, OutgoingMail, PaymentOutcome, PaymentTransaction, PaymentVerification,
    Product,
};
use crate::error::ShopServiceError;

/// Persisted queue of outbound email jobs.
pub trait EmailJobRepository: Send + Sync {
    /// Insert a new job (expected in `queued` with zero attempts).
    async fn enqueue(&self, job: &EmailJob) -> Result<(), ShopServiceError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<EmailJob>, ShopServiceError>;

    /// Up to `limit` queued jobs, oldest `created_at` first.
    async fn due_for_dispatch(&self, limit: u64) -> Result<Vec<EmailJob>, ShopServiceError>;

    /// Up to `limit` dead-lettered jobs, oldest `failed_at` first.
    async fn due_for_resurrection(&self, limit: u64) -> Result<Vec<EmailJob>, ShopServiceError>;

    /// Persist mutated job state if the stored version still equals `job.version`,
    /// bumping the version. Returns `false` when another worker got there first.
    async fn save(&self, job: &EmailJob) -> Result<bool, ShopServiceError>;

    async fn count_queued(&self) -> Result<u64, ShopServiceError>;

    async fn count_dead_letter(&self) -> Result<u64, ShopServiceError>;
}

/// External email-sending capability.
pub trait MailTransport: Send + Sync {
    /// Any error (provider rejection, non-2xx, timeout) counts as a failed attempt.
    async fn send(&self, mail: &OutgoingMail) -> Result<(), ShopServiceError>;
}

/// External payment provider.
pub trait PaymentGateway: Send + Sync {
    async fn verify(&self, reference: &str) -> Result<PaymentVerification, ShopServiceError>;
}

/// Read access to the product catalog.
pub trait ProductRepository: Send + Sync {
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>, ShopServiceError>;
}

/// Orders with their cart items and payment transactions.
pub trait OrderRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, ShopServiceError>;

    /// Insert the order, its items and its pending transaction atomically.
    /// Fails with `ReferenceInUse` if the transaction reference already exists.
    async fn create(
        &self,
        order: &Order,
        transaction: &PaymentTransaction,
    ) -> Result<(), ShopServiceError>;

    /// Compare-and-set the order status. Returns `false` if the order was no
    /// longer in `from` (or does not exist).
    async fn transition_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, ShopServiceError>;

    /// Apply a provider-verified payment in one database transaction:
    /// lock the order and the transaction matched by `reference`, consult
    /// `decide_fulfillment`, then move the order to `processing`, the
    /// transaction to `completed`, decrement stock for every item and enqueue
    /// an order confirmation from `confirmation_from`. Any error rolls back
    /// every write.
    async fn fulfill_payment(
        &self,
        order_id: Uuid,
        reference: &str,
        confirmation_from: &str,
    ) -> Result<PaymentOutcome, ShopServiceError>;
}
