use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};

use crate::domain::types::PaymentOutcome;
use crate::error::ShopServiceError;
use crate::handlers::order::OrderResponse;
use crate::state::AppState;
use crate::usecase::payment::{VerifyPaymentInput, VerifyPaymentUseCase};

// ── POST /payments/verify ────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub reference: Option<String>,
    pub order_id: Option<String>,
}

#[derive(Serialize)]
pub struct VerifyPaymentResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub order: OrderResponse,
}

pub async fn verify_payment(
    State(state): State<AppState>,
    body: Result<Json<VerifyPaymentRequest>, JsonRejection>,
) -> Result<Json<VerifyPaymentResponse>, ShopServiceError> {
    // An unreadable body is reported like an empty one.
    let Json(body) = body.map_err(|_| ShopServiceError::MissingFields)?;
    let usecase = VerifyPaymentUseCase {
        orders: state.order_repo(),
        gateway: state.payment_gateway.clone(),
        confirmation_from: state.mail_from.clone(),
    };
    let outcome = usecase
        .execute(VerifyPaymentInput {
            reference: body.reference,
            order_id: body.order_id,
        })
        .await?;

    let message = match outcome {
        PaymentOutcome::Applied(_) => "payment verified",
        PaymentOutcome::AlreadyApplied(_) => "payment already verified",
    };
    Ok(Json(VerifyPaymentResponse {
        status: "success",
        message,
        order: outcome.into_order().into(),
    }))
}
