use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::repository::{OrderRepository, PaymentGateway};
use crate::domain::types::PaymentOutcome;
use crate::error::ShopServiceError;

pub struct VerifyPaymentInput {
    pub reference: Option<String>,
    pub order_id: Option<String>,
}

pub struct VerifyPaymentUseCase<O, G>
where
    O: OrderRepository,
    G: PaymentGateway,
{
    pub orders: O,
    pub gateway: G,
    /// Sender of the order confirmation email.
    pub confirmation_from: String,
}

impl<O, G> VerifyPaymentUseCase<O, G>
where
    O: OrderRepository,
    G: PaymentGateway,
{
    pub async fn execute(
        &self,
        input: VerifyPaymentInput,
    ) -> Result<PaymentOutcome, ShopServiceError> {
        // 1. Validate input before any external call.
        let reference = non_blank(input.reference).ok_or(ShopServiceError::MissingFields)?;
        let order_id = non_blank(input.order_id).ok_or(ShopServiceError::MissingFields)?;
        let order_id =
            Uuid::parse_str(&order_id).map_err(|_| ShopServiceError::InvalidOrderId)?;

        // 2. Ask the provider.
        let verification = self.gateway.verify(&reference).await?;
        if !verification.is_success() {
            warn!(
                order_id = %order_id,
                provider_status = %verification.status,
                "payment not successful"
            );
            return Err(ShopServiceError::PaymentNotSuccessful);
        }

        // 3. Apply atomically; replays are absorbed by the repository.
        let outcome = self
            .orders
            .fulfill_payment(order_id, &reference, &self.confirmation_from)
            .await?;
        match &outcome {
            PaymentOutcome::Applied(_) => info!(order_id = %order_id, "payment applied"),
            PaymentOutcome::AlreadyApplied(_) => {
                info!(order_id = %order_id, "payment already applied")
            }
        }
        Ok(outcome)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
