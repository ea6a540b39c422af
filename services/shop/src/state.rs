use sea_orm::DatabaseConnection;

use crate::infra::db::{DbEmailJobRepository, DbOrderRepository, DbProductRepository};
use crate::infra::mail::HttpMailTransport;
use crate::infra::paystack::PaystackGateway;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub mail_transport: HttpMailTransport,
    pub payment_gateway: PaystackGateway,
    /// Default sender for enqueued mail and order confirmations.
    pub mail_from: String,
    pub cron_secret: Option<String>,
}

impl AppState {
    pub fn email_job_repo(&self) -> DbEmailJobRepository {
        DbEmailJobRepository {
            db: self.db.clone(),
        }
    }

    pub fn order_repo(&self) -> DbOrderRepository {
        DbOrderRepository {
            db: self.db.clone(),
        }
    }

    pub fn product_repo(&self) -> DbProductRepository {
        DbProductRepository {
            db: self.db.clone(),
        }
    }
}
