use axum::{
    Router,
    routing::{get, patch, post},
};

use spriie_core::health::healthz;
use spriie_core::middleware::{propagate_request_id_layer, request_id_layer, trace_layer};

use crate::handlers::{
    email::{enqueue_email, get_email_job},
    health::readyz,
    jobs::{dispatch_emails, resurrect_emails},
    order::{cancel_order, create_order, get_order, return_order},
    payment::verify_payment,
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Orders
        .route("/orders", post(create_order))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/cancel", patch(cancel_order))
        .route("/orders/{id}/return", patch(return_order))
        // Payments
        .route("/payments/verify", post(verify_payment))
        // Email queue
        .route("/emails", post(enqueue_email))
        .route("/emails/{id}", get(get_email_job))
        // Cron triggers
        .route("/jobs/emails/dispatch", post(dispatch_emails))
        .route("/jobs/emails/resurrect", post(resurrect_emails))
        .with_state(state)
        // The last layer wraps the rest, so the id is set before the trace span opens.
        .layer(propagate_request_id_layer())
        .layer(trace_layer())
        .layer(request_id_layer())
}
