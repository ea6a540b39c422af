use std::time::Duration;

use sea_orm::Database;
use tracing::info;

use spriie_core::tracing::init_tracing;
use spriie_shop::config::ShopConfig;
use spriie_shop::infra::mail::HttpMailTransport;
use spriie_shop::infra::paystack::PaystackGateway;
use spriie_shop::router::build_router;
use spriie_shop::state::AppState;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = ShopConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()
        .expect("failed to build HTTP client");

    let state = AppState {
        db,
        mail_transport: HttpMailTransport {
            client: http.clone(),
            api_url: config.mail_api_url,
            api_key: config.mail_api_key,
        },
        payment_gateway: PaystackGateway {
            client: http,
            base_url: config.paystack_base_url,
            secret_key: config.paystack_secret_key,
        },
        mail_from: config.mail_from,
        cron_secret: config.cron_secret,
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.shop_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("shop service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
