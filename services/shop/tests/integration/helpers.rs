use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use spriie_domain::email::EmailJobState;
use spriie_domain::order::OrderStatus;
use spriie_domain::payment::{PaymentMethod, TransactionStatus};
use spriie_shop::domain::repository::{
    EmailJobRepository, MailTransport, OrderRepository, PaymentGateway, ProductRepository,
};
use spriie_shop::domain::types::{
    CartItem, EmailJob, FulfillmentDecision, Order, OutgoingMail, PaymentOutcome,
    PaymentTransaction, PaymentVerification, Product, decide_fulfillment, order_confirmation_mail,
    order_total,
};
use spriie_shop::error::ShopServiceError;

// ── InMemoryEmailJobs ────────────────────────────────────────────────────────

/// Email job store with the same version-checked save as the database adapter.
#[derive(Clone, Default)]
pub struct InMemoryEmailJobs {
    pub jobs: Arc<Mutex<Vec<EmailJob>>>,
    /// Simulates an unreachable database for the due queries.
    pub unavailable: bool,
}

impl InMemoryEmailJobs {
    pub fn with_jobs(jobs: Vec<EmailJob>) -> Self {
        Self {
            jobs: Arc::new(Mutex::new(jobs)),
            unavailable: false,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn get(&self, id: Uuid) -> EmailJob {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .find(|j| j.id == id)
            .cloned()
            .expect("job exists")
    }

    pub fn all(&self) -> Vec<EmailJob> {
        self.jobs.lock().unwrap().clone()
    }

    fn check_available(&self) -> Result<(), ShopServiceError> {
        if self.unavailable {
            return Err(anyhow::anyhow!("connection refused").into());
        }
        Ok(())
    }

    fn in_state(&self, state: EmailJobState) -> Vec<EmailJob> {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|j| j.state == state)
            .cloned()
            .collect()
    }
}

impl EmailJobRepository for InMemoryEmailJobs {
    async fn enqueue(&self, job: &EmailJob) -> Result<(), ShopServiceError> {
        self.jobs.lock().unwrap().push(job.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<EmailJob>, ShopServiceError> {
        Ok(self.jobs.lock().unwrap().iter().find(|j| j.id == id).cloned())
    }

    async fn due_for_dispatch(&self, limit: u64) -> Result<Vec<EmailJob>, ShopServiceError> {
        self.check_available()?;
        let mut due = self.in_state(EmailJobState::Queued);
        due.sort_by_key(|j| j.created_at);
        due.truncate(limit as usize);
        Ok(due)
    }

    async fn due_for_resurrection(&self, limit: u64) -> Result<Vec<EmailJob>, ShopServiceError> {
        self.check_available()?;
        let mut due = self.in_state(EmailJobState::DeadLetter);
        due.sort_by_key(|j| j.failed_at);
        due.truncate(limit as usize);
        Ok(due)
    }

    async fn save(&self, job: &EmailJob) -> Result<bool, ShopServiceError> {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(stored) = jobs.iter_mut().find(|j| j.id == job.id) else {
            return Ok(false);
        };
        if stored.version != job.version {
            return Ok(false);
        }
        *stored = EmailJob {
            version: job.version + 1,
            ..job.clone()
        };
        Ok(true)
    }

    async fn count_queued(&self) -> Result<u64, ShopServiceError> {
        Ok(self.in_state(EmailJobState::Queued).len() as u64)
    }

    async fn count_dead_letter(&self) -> Result<u64, ShopServiceError> {
        Ok(self.in_state(EmailJobState::DeadLetter).len() as u64)
    }
}

// ── ScriptedMailer ───────────────────────────────────────────────────────────

/// Mail transport that replays scripted outcomes; once the script runs out
/// every send succeeds.
#[derive(Clone, Default)]
pub struct ScriptedMailer {
    pub script: Arc<Mutex<VecDeque<Result<(), String>>>>,
    pub sent: Arc<Mutex<Vec<OutgoingMail>>>,
    /// Store and recipient whose row is bumped mid-send, as if a second
    /// worker saved it first.
    pub concurrent_writer: Option<(InMemoryEmailJobs, String)>,
}

impl ScriptedMailer {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn failing(times: usize) -> Self {
        Self::scripted((0..times).map(|_| Err("503 service unavailable".to_owned())))
    }

    pub fn scripted(outcomes: impl IntoIterator<Item = Result<(), String>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(outcomes.into_iter().collect())),
            ..Self::default()
        }
    }

    pub fn send_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl MailTransport for ScriptedMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), ShopServiceError> {
        self.sent.lock().unwrap().push(mail.clone());
        if let Some((store, recipient)) = &self.concurrent_writer {
            if *recipient == mail.to {
                let mut jobs = store.jobs.lock().unwrap();
                if let Some(job) = jobs.iter_mut().find(|j| j.to == mail.to) {
                    job.version += 1;
                }
            }
        }
        match self.script.lock().unwrap().pop_front() {
            Some(Err(e)) => Err(ShopServiceError::MailTransport(e)),
            Some(Ok(())) | None => Ok(()),
        }
    }
}

// ── MockGateway ──────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockGateway {
    pub status: String,
    pub calls: Arc<AtomicUsize>,
}

impl MockGateway {
    pub fn reporting(status: &str) -> Self {
        Self {
            status: status.to_owned(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PaymentGateway for MockGateway {
    async fn verify(&self, _reference: &str) -> Result<PaymentVerification, ShopServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(PaymentVerification {
            status: self.status.clone(),
        })
    }
}

// ── InMemoryShop ─────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct ShopData {
    pub orders: HashMap<Uuid, Order>,
    pub transactions: Vec<PaymentTransaction>,
    pub products: HashMap<Uuid, Product>,
}

/// Orders, transactions and products behind one lock. Fulfillment works on
/// a copy and commits it only on success, like a database transaction.
#[derive(Clone, Default)]
pub struct InMemoryShop {
    pub data: Arc<Mutex<ShopData>>,
    pub emails: InMemoryEmailJobs,
}

impl InMemoryShop {
    pub fn new(products: Vec<Product>) -> Self {
        let shop = Self::default();
        shop.data.lock().unwrap().products = products.into_iter().map(|p| (p.id, p)).collect();
        shop
    }

    pub fn insert_order(&self, order: Order, transaction: PaymentTransaction) {
        let mut data = self.data.lock().unwrap();
        data.orders.insert(order.id, order);
        data.transactions.push(transaction);
    }

    pub fn order(&self, id: Uuid) -> Order {
        self.data.lock().unwrap().orders[&id].clone()
    }

    pub fn transaction(&self, reference: &str) -> PaymentTransaction {
        self.data
            .lock()
            .unwrap()
            .transactions
            .iter()
            .find(|t| t.reference.as_deref() == Some(reference))
            .cloned()
            .expect("transaction exists")
    }

    pub fn stock(&self, product_id: Uuid) -> i32 {
        self.data.lock().unwrap().products[&product_id].stock
    }

    pub fn set_status(&self, order_id: Uuid, status: OrderStatus) {
        if let Some(order) = self.data.lock().unwrap().orders.get_mut(&order_id) {
            order.status = status;
        }
    }
}

fn apply_payment(
    data: &mut ShopData,
    order_id: Uuid,
    reference: &str,
    confirmation_from: &str,
) -> Result<(PaymentOutcome, Option<EmailJob>), ShopServiceError> {
    let mut order = data
        .orders
        .get(&order_id)
        .cloned()
        .ok_or(ShopServiceError::OrderNotFound)?;
    let transaction = data
        .transactions
        .iter_mut()
        .find(|t| t.reference.as_deref() == Some(reference))
        .ok_or(ShopServiceError::TransactionNotFound)?;

    if decide_fulfillment(&order, transaction)? == FulfillmentDecision::AlreadyApplied {
        return Ok((PaymentOutcome::AlreadyApplied(order), None));
    }

    let now = Utc::now();
    transaction.status = TransactionStatus::Completed;
    transaction.updated_at = now;

    for item in &order.items {
        let product = data
            .products
            .get_mut(&item.product_id)
            .ok_or(ShopServiceError::ProductNotFound)?;
        if product.stock < item.quantity {
            return Err(ShopServiceError::InsufficientStock);
        }
        product.stock -= item.quantity;
    }

    order.status = OrderStatus::Processing;
    order.updated_at = now;
    data.orders.insert(order.id, order.clone());

    let confirmation = EmailJob::new(order_confirmation_mail(&order, confirmation_from), now);
    Ok((PaymentOutcome::Applied(order), Some(confirmation)))
}

impl OrderRepository for InMemoryShop {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, ShopServiceError> {
        Ok(self.data.lock().unwrap().orders.get(&id).cloned())
    }

    async fn create(
        &self,
        order: &Order,
        transaction: &PaymentTransaction,
    ) -> Result<(), ShopServiceError> {
        let mut data = self.data.lock().unwrap();
        if transaction.reference.is_some()
            && data
                .transactions
                .iter()
                .any(|t| t.reference == transaction.reference)
        {
            return Err(ShopServiceError::ReferenceInUse);
        }
        data.orders.insert(order.id, order.clone());
        data.transactions.push(transaction.clone());
        Ok(())
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, ShopServiceError> {
        let mut data = self.data.lock().unwrap();
        match data.orders.get_mut(&id) {
            Some(order) if order.status == from => {
                order.status = to;
                order.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn fulfill_payment(
        &self,
        order_id: Uuid,
        reference: &str,
        confirmation_from: &str,
    ) -> Result<PaymentOutcome, ShopServiceError> {
        let mut data = self.data.lock().unwrap();
        let mut draft = data.clone();
        let (outcome, confirmation) =
            apply_payment(&mut draft, order_id, reference, confirmation_from)?;
        *data = draft;
        if let Some(job) = confirmation {
            self.emails.jobs.lock().unwrap().push(job);
        }
        Ok(outcome)
    }
}

impl ProductRepository for InMemoryShop {
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>, ShopServiceError> {
        let data = self.data.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| data.products.get(id).cloned())
            .collect())
    }
}

// ── Test fixture helpers ─────────────────────────────────────────────────────

pub const CONFIRMATION_FROM: &str = "Spriie Orders <orders@spriie.com>";

pub fn buyer_id() -> Uuid {
    Uuid::parse_str("00000000-0000-0000-0000-0000000000b1").unwrap()
}

pub fn test_mail(to: &str) -> OutgoingMail {
    OutgoingMail {
        from: "Spriie <no-reply@spriie.com>".to_owned(),
        to: to.to_owned(),
        subject: "Your Spriie verification code".to_owned(),
        html: "<p>123456</p>".to_owned(),
    }
}

/// A queued job created `age_secs` seconds ago.
pub fn queued_job(to: &str, age_secs: i64) -> EmailJob {
    EmailJob::new(test_mail(to), Utc::now() - Duration::seconds(age_secs))
}

/// A job the dispatcher already gave up on.
pub fn dead_job(to: &str, failed_at: DateTime<Utc>) -> EmailJob {
    let mut job = EmailJob::new(test_mail(to), failed_at - Duration::minutes(10));
    job.state = EmailJobState::DeadLetter;
    job.attempts = 3;
    job.last_error = Some("503 service unavailable".to_owned());
    job.failed_at = Some(failed_at);
    job.version = 3;
    job
}

pub fn test_product(price: i64, stock: i32) -> Product {
    Product {
        id: Uuid::now_v7(),
        store_id: Uuid::now_v7(),
        name: "Ankara tote bag".to_owned(),
        price,
        stock,
    }
}

pub fn pending_order(buyer_id: Uuid, items: Vec<CartItem>) -> Order {
    let now = Utc::now();
    Order {
        id: Uuid::now_v7(),
        buyer_id,
        email: "buyer@example.com".to_owned(),
        total_amount: order_total(&items).unwrap(),
        items,
        status: OrderStatus::Pending,
        created_at: now,
        updated_at: now,
    }
}

pub fn pending_transaction(order: &Order, reference: &str) -> PaymentTransaction {
    let now = Utc::now();
    PaymentTransaction {
        id: Uuid::now_v7(),
        order_id: order.id,
        method: PaymentMethod::Paystack,
        reference: Some(reference.to_owned()),
        transaction_id: Some("4099260516".to_owned()),
        trxref: Some(reference.to_owned()),
        status: TransactionStatus::Pending,
        amount: order.total_amount,
        created_at: now,
        updated_at: now,
    }
}
