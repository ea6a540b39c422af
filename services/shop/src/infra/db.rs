use anyhow::Context as _;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    SqlErr, TransactionError, TransactionTrait,
};
use uuid::Uuid;

use spriie_domain::email::EmailJobState;
use spriie_domain::order::OrderStatus;
use spriie_domain::payment::{PaymentMethod, TransactionStatus};
use spriie_shop_schema::{email_jobs, order_items, orders, products, transactions};

use crate::domain::repository::{EmailJobRepository, OrderRepository, ProductRepository};
use crate::domain::types::{
    CartItem, EmailJob, FulfillmentDecision, Order, PaymentOutcome, PaymentTransaction, Product,
    decide_fulfillment, order_confirmation_mail,
};
use crate::error::ShopServiceError;

// ── EmailJob repository ──────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbEmailJobRepository {
    pub db: DatabaseConnection,
}

impl EmailJobRepository for DbEmailJobRepository {
    async fn enqueue(&self, job: &EmailJob) -> Result<(), ShopServiceError> {
        insert_email_job(&self.db, job)
            .await
            .context("enqueue email job")?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<EmailJob>, ShopServiceError> {
        let model = email_jobs::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find email job by id")?;
        model.map(email_job_from_model).transpose()
    }

    async fn due_for_dispatch(&self, limit: u64) -> Result<Vec<EmailJob>, ShopServiceError> {
        let models = email_jobs::Entity::find()
            .filter(email_jobs::Column::State.eq(EmailJobState::Queued.as_str()))
            .order_by_asc(email_jobs::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .context("list queued email jobs")?;
        models.into_iter().map(email_job_from_model).collect()
    }

    async fn due_for_resurrection(&self, limit: u64) -> Result<Vec<EmailJob>, ShopServiceError> {
        let models = email_jobs::Entity::find()
            .filter(email_jobs::Column::State.eq(EmailJobState::DeadLetter.as_str()))
            .order_by_asc(email_jobs::Column::FailedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .context("list dead-lettered email jobs")?;
        models.into_iter().map(email_job_from_model).collect()
    }

    async fn save(&self, job: &EmailJob) -> Result<bool, ShopServiceError> {
        let result = email_jobs::Entity::update_many()
            .col_expr(email_jobs::Column::State, Expr::value(job.state.as_str()))
            .col_expr(email_jobs::Column::Attempts, Expr::value(job.attempts))
            .col_expr(
                email_jobs::Column::LastError,
                Expr::value(job.last_error.clone()),
            )
            .col_expr(email_jobs::Column::SentAt, Expr::value(job.sent_at))
            .col_expr(email_jobs::Column::FailedAt, Expr::value(job.failed_at))
            .col_expr(
                email_jobs::Column::Version,
                Expr::col(email_jobs::Column::Version).add(1),
            )
            .filter(email_jobs::Column::Id.eq(job.id))
            .filter(email_jobs::Column::Version.eq(job.version))
            .exec(&self.db)
            .await
            .context("save email job")?;
        Ok(result.rows_affected == 1)
    }

    async fn count_queued(&self) -> Result<u64, ShopServiceError> {
        count_in_state(&self.db, EmailJobState::Queued).await
    }

    async fn count_dead_letter(&self) -> Result<u64, ShopServiceError> {
        count_in_state(&self.db, EmailJobState::DeadLetter).await
    }
}

async fn count_in_state(
    db: &DatabaseConnection,
    state: EmailJobState,
) -> Result<u64, ShopServiceError> {
    let count = email_jobs::Entity::find()
        .filter(email_jobs::Column::State.eq(state.as_str()))
        .count(db)
        .await
        .with_context(|| format!("count {state} email jobs"))?;
    Ok(count)
}

/// Shared by the public enqueue path and the payment outbox.
async fn insert_email_job<C: ConnectionTrait>(conn: &C, job: &EmailJob) -> Result<(), DbErr> {
    email_jobs::ActiveModel {
        id: Set(job.id),
        recipient: Set(job.to.clone()),
        sender: Set(job.from.clone()),
        subject: Set(job.subject.clone()),
        html: Set(job.html.clone()),
        state: Set(job.state.as_str().to_owned()),
        attempts: Set(job.attempts),
        last_error: Set(job.last_error.clone()),
        version: Set(job.version),
        created_at: Set(job.created_at),
        sent_at: Set(job.sent_at),
        failed_at: Set(job.failed_at),
    }
    .insert(conn)
    .await?;
    Ok(())
}

fn email_job_from_model(model: email_jobs::Model) -> Result<EmailJob, ShopServiceError> {
    let state = model
        .state
        .parse::<EmailJobState>()
        .with_context(|| format!("email job {}", model.id))?;
    Ok(EmailJob {
        id: model.id,
        to: model.recipient,
        from: model.sender,
        subject: model.subject,
        html: model.html,
        state,
        attempts: model.attempts,
        last_error: model.last_error,
        version: model.version,
        created_at: model.created_at,
        sent_at: model.sent_at,
        failed_at: model.failed_at,
    })
}

// ── Product repository ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbProductRepository {
    pub db: DatabaseConnection,
}

impl ProductRepository for DbProductRepository {
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>, ShopServiceError> {
        let models = products::Entity::find()
            .filter(products::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .context("find products by ids")?;
        Ok(models
            .into_iter()
            .map(|m| Product {
                id: m.id,
                store_id: m.store_id,
                name: m.name,
                price: m.price,
                stock: m.stock,
            })
            .collect())
    }
}

// ── Order repository ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbOrderRepository {
    pub db: DatabaseConnection,
}

impl OrderRepository for DbOrderRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, ShopServiceError> {
        let Some(model) = orders::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find order by id")?
        else {
            return Ok(None);
        };
        let items = load_items(&self.db, id).await?;
        order_from_models(model, items).map(Some)
    }

    async fn create(
        &self,
        order: &Order,
        transaction: &PaymentTransaction,
    ) -> Result<(), ShopServiceError> {
        let result = self
            .db
            .transaction::<_, (), DbErr>(|txn| {
                let order = order.clone();
                let transaction = transaction.clone();
                Box::pin(async move {
                    insert_order(txn, &order).await?;
                    insert_transaction(txn, &transaction).await?;
                    Ok(())
                })
            })
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(TransactionError::Transaction(e))
                if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
            {
                Err(ShopServiceError::ReferenceInUse)
            }
            Err(e) => Err(anyhow::Error::new(e).context("create order").into()),
        }
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, ShopServiceError> {
        let result = orders::Entity::update_many()
            .col_expr(orders::Column::Status, Expr::value(to.as_str()))
            .col_expr(orders::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(orders::Column::Id.eq(id))
            .filter(orders::Column::Status.eq(from.as_str()))
            .exec(&self.db)
            .await
            .with_context(|| format!("transition order {from} -> {to}"))?;
        Ok(result.rows_affected == 1)
    }

    async fn fulfill_payment(
        &self,
        order_id: Uuid,
        reference: &str,
        confirmation_from: &str,
    ) -> Result<PaymentOutcome, ShopServiceError> {
        let reference = reference.to_owned();
        let confirmation_from = confirmation_from.to_owned();
        self.db
            .transaction::<_, PaymentOutcome, ShopServiceError>(|txn| {
                Box::pin(async move {
                    apply_payment(txn, order_id, &reference, &confirmation_from).await
                })
            })
            .await
            .map_err(from_transaction_error)
    }
}

async fn apply_payment(
    txn: &DatabaseTransaction,
    order_id: Uuid,
    reference: &str,
    confirmation_from: &str,
) -> Result<PaymentOutcome, ShopServiceError> {
    // Lock order then transaction; every verifier takes them in this order.
    let order_model = orders::Entity::find_by_id(order_id)
        .lock_exclusive()
        .one(txn)
        .await
        .context("lock order")?
        .ok_or(ShopServiceError::OrderNotFound)?;
    let transaction_model = transactions::Entity::find()
        .filter(transactions::Column::Reference.eq(reference))
        .lock_exclusive()
        .one(txn)
        .await
        .context("lock transaction")?
        .ok_or(ShopServiceError::TransactionNotFound)?;

    let items = load_items(txn, order_id).await?;
    let mut order = order_from_models(order_model, items)?;
    let transaction = transaction_from_model(transaction_model)?;

    if decide_fulfillment(&order, &transaction)? == FulfillmentDecision::AlreadyApplied {
        return Ok(PaymentOutcome::AlreadyApplied(order));
    }

    let now = Utc::now();
    orders::ActiveModel {
        id: Set(order.id),
        status: Set(OrderStatus::Processing.as_str().to_owned()),
        updated_at: Set(now),
        ..Default::default()
    }
    .update(txn)
    .await
    .context("mark order processing")?;
    transactions::ActiveModel {
        id: Set(transaction.id),
        status: Set(TransactionStatus::Completed.as_str().to_owned()),
        updated_at: Set(now),
        ..Default::default()
    }
    .update(txn)
    .await
    .context("mark transaction completed")?;

    // Items are loaded in product order, so concurrent payments lock rows in the same order.
    for item in &order.items {
        decrement_stock(txn, item).await?;
    }

    order.status = OrderStatus::Processing;
    order.updated_at = now;
    let confirmation = EmailJob::new(order_confirmation_mail(&order, confirmation_from), now);
    insert_email_job(txn, &confirmation)
        .await
        .context("enqueue order confirmation")?;

    Ok(PaymentOutcome::Applied(order))
}

/// `stock = stock - quantity` guarded by `stock >= quantity`.
async fn decrement_stock(
    txn: &DatabaseTransaction,
    item: &CartItem,
) -> Result<(), ShopServiceError> {
    let result = products::Entity::update_many()
        .col_expr(
            products::Column::Stock,
            Expr::col(products::Column::Stock).sub(item.quantity),
        )
        .col_expr(products::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(products::Column::Id.eq(item.product_id))
        .filter(products::Column::Stock.gte(item.quantity))
        .exec(txn)
        .await
        .context("decrement stock")?;
    if result.rows_affected == 1 {
        return Ok(());
    }

    let exists = products::Entity::find_by_id(item.product_id)
        .count(txn)
        .await
        .context("find product")?
        > 0;
    Err(if exists {
        ShopServiceError::InsufficientStock
    } else {
        ShopServiceError::ProductNotFound
    })
}

fn from_transaction_error(e: TransactionError<ShopServiceError>) -> ShopServiceError {
    match e {
        TransactionError::Connection(db) => {
            anyhow::Error::new(db).context("payment transaction").into()
        }
        TransactionError::Transaction(e) => e,
    }
}

async fn insert_order(txn: &DatabaseTransaction, order: &Order) -> Result<(), DbErr> {
    orders::ActiveModel {
        id: Set(order.id),
        buyer_id: Set(order.buyer_id),
        email: Set(order.email.clone()),
        status: Set(order.status.as_str().to_owned()),
        total_amount: Set(order.total_amount),
        created_at: Set(order.created_at),
        updated_at: Set(order.updated_at),
    }
    .insert(txn)
    .await?;

    let items = order.items.iter().map(|item| order_items::ActiveModel {
        id: Set(Uuid::now_v7()),
        order_id: Set(order.id),
        product_id: Set(item.product_id),
        quantity: Set(item.quantity),
        price: Set(item.price),
    });
    order_items::Entity::insert_many(items).exec(txn).await?;
    Ok(())
}

async fn insert_transaction(
    txn: &DatabaseTransaction,
    transaction: &PaymentTransaction,
) -> Result<(), DbErr> {
    transactions::ActiveModel {
        id: Set(transaction.id),
        order_id: Set(transaction.order_id),
        method: Set(transaction.method.as_str().to_owned()),
        reference: Set(transaction.reference.clone()),
        transaction_id: Set(transaction.transaction_id.clone()),
        trxref: Set(transaction.trxref.clone()),
        status: Set(transaction.status.as_str().to_owned()),
        amount: Set(transaction.amount),
        created_at: Set(transaction.created_at),
        updated_at: Set(transaction.updated_at),
    }
    .insert(txn)
    .await?;
    Ok(())
}

async fn load_items<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
) -> Result<Vec<order_items::Model>, ShopServiceError> {
    let items = order_items::Entity::find()
        .filter(order_items::Column::OrderId.eq(order_id))
        .order_by_asc(order_items::Column::ProductId)
        .all(conn)
        .await
        .context("load order items")?;
    Ok(items)
}

fn order_from_models(
    model: orders::Model,
    items: Vec<order_items::Model>,
) -> Result<Order, ShopServiceError> {
    let status = model
        .status
        .parse::<OrderStatus>()
        .with_context(|| format!("order {}", model.id))?;
    Ok(Order {
        id: model.id,
        buyer_id: model.buyer_id,
        email: model.email,
        items: items
            .into_iter()
            .map(|i| CartItem {
                product_id: i.product_id,
                quantity: i.quantity,
                price: i.price,
            })
            .collect(),
        status,
        total_amount: model.total_amount,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

fn transaction_from_model(
    model: transactions::Model,
) -> Result<PaymentTransaction, ShopServiceError> {
    let context = || format!("transaction {}", model.id);
    let method = model.method.parse::<PaymentMethod>().with_context(context)?;
    let status = model
        .status
        .parse::<TransactionStatus>()
        .with_context(context)?;
    Ok(PaymentTransaction {
        id: model.id,
        order_id: model.order_id,
        method,
        reference: model.reference,
        transaction_id: model.transaction_id,
        trxref: model.trxref,
        status,
        amount: model.amount,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}
