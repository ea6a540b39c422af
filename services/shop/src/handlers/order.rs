use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spriie_auth_types::identity::IdentityHeaders;
use spriie_domain::order::OrderStatus;
use spriie_domain::payment::PaymentMethod;

use crate::domain::types::{Order, PaymentDetails};
use crate::error::ShopServiceError;
use crate::state::AppState;
use crate::usecase::order::{
    CancelOrderUseCase, CheckoutInput, CheckoutLine, CheckoutUseCase, GetOrderUseCase,
    ReturnOrderUseCase,
};

// ── Response shapes ──────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub email: String,
    pub status: OrderStatus,
    pub total_amount: i64,
    pub items: Vec<OrderItemResponse>,
    #[serde(serialize_with = "spriie_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "spriie_core::serde::to_rfc3339_ms")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            buyer_id: order.buyer_id,
            email: order.email,
            status: order.status,
            total_amount: order.total_amount,
            items: order
                .items
                .into_iter()
                .map(|item| OrderItemResponse {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct OrderEnvelope {
    pub order: OrderResponse,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// ── POST /orders ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLineRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub transaction_id: Option<String>,
    pub trxref: Option<String>,
}

#[derive(Deserialize)]
pub struct CheckoutRequest {
    pub email: String,
    pub items: Vec<CheckoutLineRequest>,
    pub payment: PaymentRequest,
}

pub async fn create_order(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    body: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderEnvelope>), ShopServiceError> {
    let Json(body) = body.map_err(|rejection| {
        tracing::debug!(%rejection, "unreadable checkout request");
        ShopServiceError::InvalidRequestBody
    })?;
    let usecase = CheckoutUseCase {
        orders: state.order_repo(),
        products: state.product_repo(),
    };
    let (order, _transaction) = usecase
        .execute(
            identity,
            CheckoutInput {
                email: body.email,
                items: body
                    .items
                    .into_iter()
                    .map(|line| CheckoutLine {
                        product_id: line.product_id,
                        quantity: line.quantity,
                    })
                    .collect(),
                payment: PaymentDetails {
                    method: body.payment.method,
                    reference: body.payment.reference,
                    transaction_id: body.payment.transaction_id,
                    trxref: body.payment.trxref,
                },
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(OrderEnvelope {
            order: order.into(),
        }),
    ))
}

// ── GET /orders/{id} ─────────────────────────────────────────────────────────

pub async fn get_order(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderEnvelope>, ShopServiceError> {
    let usecase = GetOrderUseCase {
        orders: state.order_repo(),
    };
    let order = usecase.execute(identity, id).await?;
    Ok(Json(OrderEnvelope {
        order: order.into(),
    }))
}

// ── PATCH /orders/{id}/cancel ────────────────────────────────────────────────

pub async fn cancel_order(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ShopServiceError> {
    let usecase = CancelOrderUseCase {
        orders: state.order_repo(),
    };
    usecase.execute(identity, id).await?;
    Ok(Json(MessageResponse {
        message: "order cancelled",
    }))
}

// ── PATCH /orders/{id}/return ────────────────────────────────────────────────

pub async fn return_order(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ShopServiceError> {
    let usecase = ReturnOrderUseCase {
        orders: state.order_repo(),
    };
    usecase.execute(identity, id).await?;
    Ok(Json(MessageResponse {
        message: "order returned",
    }))
}
