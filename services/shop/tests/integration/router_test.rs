use reqwest::StatusCode;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};

use spriie_shop::infra::mail::HttpMailTransport;
use spriie_shop::infra::paystack::PaystackGateway;
use spriie_shop::router::build_router;
use spriie_shop::state::AppState;
use spriie_testing::auth::MockAuth;

use crate::helpers::buyer_id;

const CRON_SECRET: &str = "test-cron-secret";

/// The production router on an ephemeral port, backed by a database handle
/// that was never connected. Only paths that fail before touching storage
/// are exercised here.
struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let client = reqwest::Client::new();
        let state = AppState {
            db: DatabaseConnection::Disconnected,
            mail_transport: HttpMailTransport {
                client: client.clone(),
                api_url: "http://127.0.0.1:9/emails".to_owned(),
                api_key: "test".to_owned(),
            },
            payment_gateway: PaystackGateway {
                client,
                base_url: "http://127.0.0.1:9".to_owned(),
                secret_key: "sk_test".to_owned(),
            },
            mail_from: "Spriie <no-reply@spriie.com>".to_owned(),
            cron_secret: Some(CRON_SECRET.to_owned()),
        };
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let app = build_router(state);
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn should_report_liveness_but_not_readiness_without_database() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let live = client.get(server.url("/healthz")).send().await.unwrap();
    assert_eq!(live.status(), StatusCode::OK);
    assert!(live.headers().contains_key("x-request-id"));

    let ready = client.get(server.url("/readyz")).send().await.unwrap();
    assert_eq!(ready.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn should_guard_job_triggers_with_cron_secret() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for path in ["/jobs/emails/dispatch", "/jobs/emails/resurrect"] {
        let anonymous = client.post(server.url(path)).send().await.unwrap();
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED, "{path}");
        let body: Value = anonymous.json().await.unwrap();
        assert_eq!(body["kind"], "UNAUTHORIZED");

        let wrong = client
            .post(server.url(path))
            .bearer_auth("not-the-secret")
            .send()
            .await
            .unwrap();
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED, "{path}");
    }
}

#[tokio::test]
async fn should_reject_verify_without_fields() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let empty = client
        .post(server.url("/payments/verify"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
    let body: Value = empty.json().await.unwrap();
    assert_eq!(body["kind"], "MISSING_FIELDS");
    assert_eq!(body["error"], "reference and orderId are required");

    let garbage = client
        .post(server.url("/payments/verify"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(garbage.status(), StatusCode::BAD_REQUEST);

    let bad_id = client
        .post(server.url("/payments/verify"))
        .json(&json!({ "reference": "REF123", "orderId": "42" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);
    let body: Value = bad_id.json().await.unwrap();
    assert_eq!(body["kind"], "INVALID_ORDER_ID");
}

#[tokio::test]
async fn should_require_identity_for_orders() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let order_id = uuid::Uuid::now_v7();

    let anonymous = client
        .patch(server.url(&format!("/orders/{order_id}/cancel")))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    // Identity present but the cart is empty: rejected before any storage call.
    let auth = MockAuth::buyer(buyer_id());
    let empty_cart = client
        .post(server.url("/orders"))
        .headers(auth.headers())
        .json(&json!({
            "email": "buyer@example.com",
            "items": [],
            "payment": { "method": "wallet" }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(empty_cart.status(), StatusCode::BAD_REQUEST);
    let body: Value = empty_cart.json().await.unwrap();
    assert_eq!(body["kind"], "EMPTY_CART");
}

#[tokio::test]
async fn should_validate_email_requests_before_storage() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/emails"))
        .json(&json!({ "to": "ada@example.com", "subject": "", "html": "<p>hi</p>" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "INVALID_EMAIL_REQUEST");
}

#[tokio::test]
async fn should_answer_unreadable_email_body_with_json_error() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let missing_subject = client
        .post(server.url("/emails"))
        .json(&json!({ "to": "ada@example.com", "html": "<p>hi</p>" }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing_subject.status(), StatusCode::BAD_REQUEST);
    let body: Value = missing_subject.json().await.unwrap();
    assert_eq!(body["kind"], "INVALID_EMAIL_REQUEST");
    assert_eq!(body["error"], "to, subject and html are required");

    let wrong_type = client
        .post(server.url("/emails"))
        .json(&json!({ "to": 42, "subject": "hi", "html": "<p>hi</p>" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_type.status(), StatusCode::BAD_REQUEST);
    let body: Value = wrong_type.json().await.unwrap();
    assert_eq!(body["kind"], "INVALID_EMAIL_REQUEST");
}

#[tokio::test]
async fn should_answer_unreadable_checkout_body_with_json_error() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let auth = MockAuth::buyer(buyer_id());

    let cases = [
        json!({ "email": "buyer@example.com", "items": [] }),
        json!({
            "email": "buyer@example.com",
            "items": [],
            "payment": { "method": "barter" }
        }),
        json!({
            "email": "buyer@example.com",
            "items": [{ "productId": "not-a-uuid", "quantity": 1 }],
            "payment": { "method": "wallet" }
        }),
    ];
    for case in cases {
        let response = client
            .post(server.url("/orders"))
            .headers(auth.headers())
            .json(&case)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{case}");
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["kind"], "INVALID_REQUEST_BODY", "{case}");
    }
}
