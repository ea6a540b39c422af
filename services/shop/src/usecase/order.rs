use std::collections::BTreeMap;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use spriie_auth_types::identity::IdentityHeaders;
use spriie_domain::order::OrderStatus;
use spriie_domain::payment::TransactionStatus;

use crate::domain::repository::{OrderRepository, ProductRepository};
use crate::domain::types::{CartItem, Order, PaymentDetails, PaymentTransaction, order_total};
use crate::error::ShopServiceError;

// ── Checkout ─────────────────────────────────────────────────────────────────

pub struct CheckoutLine {
    pub product_id: Uuid,
    pub quantity: i32,
}

pub struct CheckoutInput {
    pub email: String,
    pub items: Vec<CheckoutLine>,
    pub payment: PaymentDetails,
}

pub struct CheckoutUseCase<O, P>
where
    O: OrderRepository,
    P: ProductRepository,
{
    pub orders: O,
    pub products: P,
}

impl<O, P> CheckoutUseCase<O, P>
where
    O: OrderRepository,
    P: ProductRepository,
{
    pub async fn execute(
        &self,
        identity: IdentityHeaders,
        input: CheckoutInput,
    ) -> Result<(Order, PaymentTransaction), ShopServiceError> {
        let email = input.email.trim();
        if email.is_empty() {
            return Err(ShopServiceError::MissingEmail);
        }
        if input.items.is_empty() {
            return Err(ShopServiceError::EmptyCart);
        }
        input.payment.validate()?;

        // Repeated product lines collapse into one; BTreeMap keeps items in product order.
        let mut quantities: BTreeMap<Uuid, i32> = BTreeMap::new();
        for line in &input.items {
            if line.quantity < 1 {
                return Err(ShopServiceError::InvalidQuantity);
            }
            let total = quantities.entry(line.product_id).or_insert(0);
            *total = total
                .checked_add(line.quantity)
                .ok_or(ShopServiceError::InvalidQuantity)?;
        }

        let ids: Vec<Uuid> = quantities.keys().copied().collect();
        let products = self.products.find_by_ids(&ids).await?;

        let mut items = Vec::with_capacity(quantities.len());
        for (product_id, quantity) in quantities {
            let product = products
                .iter()
                .find(|p| p.id == product_id)
                .ok_or(ShopServiceError::ProductNotFound)?;
            // Early rejection only; the authoritative check runs at payment time.
            if product.stock < quantity {
                return Err(ShopServiceError::InsufficientStock);
            }
            items.push(CartItem {
                product_id,
                quantity,
                price: product.price,
            });
        }

        let now = Utc::now();
        let total_amount = order_total(&items)?;
        let order = Order {
            id: Uuid::now_v7(),
            buyer_id: identity.user_id,
            email: email.to_owned(),
            items,
            status: OrderStatus::Pending,
            total_amount,
            created_at: now,
            updated_at: now,
        };
        let payment = input.payment;
        let transaction = PaymentTransaction {
            id: Uuid::now_v7(),
            order_id: order.id,
            method: payment.method,
            reference: payment.reference.map(|s| s.trim().to_owned()),
            transaction_id: payment.transaction_id.map(|s| s.trim().to_owned()),
            trxref: payment.trxref.map(|s| s.trim().to_owned()),
            status: TransactionStatus::Pending,
            amount: total_amount,
            created_at: now,
            updated_at: now,
        };

        self.orders.create(&order, &transaction).await?;
        info!(order_id = %order.id, total = total_amount, "order created");
        Ok((order, transaction))
    }
}

// ── GetOrder ─────────────────────────────────────────────────────────────────

pub struct GetOrderUseCase<O: OrderRepository> {
    pub orders: O,
}

impl<O: OrderRepository> GetOrderUseCase<O> {
    pub async fn execute(
        &self,
        identity: IdentityHeaders,
        order_id: Uuid,
    ) -> Result<Order, ShopServiceError> {
        load_owned(&self.orders, identity, order_id).await
    }
}

// ── Cancel / Return ──────────────────────────────────────────────────────────

pub struct CancelOrderUseCase<O: OrderRepository> {
    pub orders: O,
}

impl<O: OrderRepository> CancelOrderUseCase<O> {
    pub async fn execute(
        &self,
        identity: IdentityHeaders,
        order_id: Uuid,
    ) -> Result<(), ShopServiceError> {
        let order = load_owned(&self.orders, identity, order_id).await?;
        if !order.status.is_cancellable() {
            return Err(ShopServiceError::OrderNotCancellable);
        }
        // A payment may land between the read and the write.
        let applied = self
            .orders
            .transition_status(order_id, OrderStatus::Pending, OrderStatus::Cancelled)
            .await?;
        if !applied {
            return Err(ShopServiceError::OrderNotCancellable);
        }
        info!(order_id = %order_id, "order cancelled");
        Ok(())
    }
}

pub struct ReturnOrderUseCase<O: OrderRepository> {
    pub orders: O,
}

impl<O: OrderRepository> ReturnOrderUseCase<O> {
    pub async fn execute(
        &self,
        identity: IdentityHeaders,
        order_id: Uuid,
    ) -> Result<(), ShopServiceError> {
        let order = load_owned(&self.orders, identity, order_id).await?;
        if !order.status.is_returnable() {
            return Err(ShopServiceError::OrderNotReturnable);
        }
        let applied = self
            .orders
            .transition_status(order_id, OrderStatus::Delivered, OrderStatus::Returned)
            .await?;
        if !applied {
            return Err(ShopServiceError::OrderNotReturnable);
        }
        info!(order_id = %order_id, "order returned");
        Ok(())
    }
}

/// 404 before 403: a missing order is reported as missing to everyone.
async fn load_owned<O: OrderRepository>(
    orders: &O,
    identity: IdentityHeaders,
    order_id: Uuid,
) -> Result<Order, ShopServiceError> {
    let order = orders
        .find_by_id(order_id)
        .await?
        .ok_or(ShopServiceError::OrderNotFound)?;
    if !order.is_owned_by(identity.user_id) {
        return Err(ShopServiceError::Forbidden);
    }
    Ok(order)
}
