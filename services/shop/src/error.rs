use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use spriie_core::error::error_response;

/// Shop service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum ShopServiceError {
    #[error("reference and orderId are required")]
    MissingFields,
    #[error("invalid order id")]
    InvalidOrderId,
    #[error("cart is empty")]
    EmptyCart,
    #[error("invalid cart item quantity")]
    InvalidQuantity,
    #[error("email is required")]
    MissingEmail,
    #[error("to, subject and html are required")]
    InvalidEmailRequest,
    #[error("malformed request body")]
    InvalidRequestBody,
    #[error("order total out of range")]
    OrderTotalOutOfRange,
    #[error("invalid payment details")]
    InvalidPaymentDetails,
    #[error("payment was not successful")]
    PaymentNotSuccessful,
    #[error("only pending orders can be cancelled")]
    OrderNotCancellable,
    #[error("only delivered orders can be returned")]
    OrderNotReturnable,
    #[error("forbidden")]
    Forbidden,
    #[error("order not found")]
    OrderNotFound,
    #[error("transaction not found")]
    TransactionNotFound,
    #[error("product not found")]
    ProductNotFound,
    #[error("email job not found")]
    EmailJobNotFound,
    #[error("order is not awaiting payment")]
    OrderNotPayable,
    #[error("insufficient stock")]
    InsufficientStock,
    #[error("payment reference already in use")]
    ReferenceInUse,
    #[error("mail transport error: {0}")]
    MailTransport(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ShopServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingFields => "MISSING_FIELDS",
            Self::InvalidOrderId => "INVALID_ORDER_ID",
            Self::EmptyCart => "EMPTY_CART",
            Self::InvalidQuantity => "INVALID_QUANTITY",
            Self::MissingEmail => "MISSING_EMAIL",
            Self::InvalidEmailRequest => "INVALID_EMAIL_REQUEST",
            Self::InvalidRequestBody => "INVALID_REQUEST_BODY",
            Self::OrderTotalOutOfRange => "ORDER_TOTAL_OUT_OF_RANGE",
            Self::InvalidPaymentDetails => "INVALID_PAYMENT_DETAILS",
            Self::PaymentNotSuccessful => "PAYMENT_NOT_SUCCESSFUL",
            Self::OrderNotCancellable => "ORDER_NOT_CANCELLABLE",
            Self::OrderNotReturnable => "ORDER_NOT_RETURNABLE",
            Self::Forbidden => "FORBIDDEN",
            Self::OrderNotFound => "ORDER_NOT_FOUND",
            Self::TransactionNotFound => "TRANSACTION_NOT_FOUND",
            Self::ProductNotFound => "PRODUCT_NOT_FOUND",
            Self::EmailJobNotFound => "EMAIL_JOB_NOT_FOUND",
            Self::OrderNotPayable => "ORDER_NOT_PAYABLE",
            Self::InsufficientStock => "INSUFFICIENT_STOCK",
            Self::ReferenceInUse => "REFERENCE_IN_USE",
            Self::MailTransport(_) => "MAIL_TRANSPORT",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingFields
            | Self::InvalidOrderId
            | Self::EmptyCart
            | Self::InvalidQuantity
            | Self::MissingEmail
            | Self::InvalidEmailRequest
            | Self::InvalidRequestBody
            | Self::OrderTotalOutOfRange
            | Self::InvalidPaymentDetails
            | Self::PaymentNotSuccessful
            | Self::OrderNotCancellable
            | Self::OrderNotReturnable => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::OrderNotFound
            | Self::TransactionNotFound
            | Self::ProductNotFound
            | Self::EmailJobNotFound => StatusCode::NOT_FOUND,
            Self::OrderNotPayable | Self::InsufficientStock | Self::ReferenceInUse => {
                StatusCode::CONFLICT
            }
            Self::MailTransport(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ShopServiceError {
    fn into_response(self) -> Response {
        // 4xx are expected client errors and already show up in the TraceLayer span.
        // Internal errors need the anyhow chain logged so the root cause is traceable.
        if let Self::Internal(ref e) = self {
            let chain = format!("{e:#}");
            tracing::error!(error = %chain, kind = "INTERNAL", "internal error");
        }
        error_response(self.status(), self.kind(), &self.to_string())
    }
}
