use crate::infra::mail::DEFAULT_MAIL_API_URL;
use crate::infra::paystack::DEFAULT_PAYSTACK_BASE_URL;

/// Shop service configuration loaded from environment variables.
#[derive(Debug)]
pub struct ShopConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// TCP port for the HTTP server (default 3114). Env var: `SHOP_PORT`.
    pub shop_port: u16,
    /// Paystack API root (default "https://api.paystack.co").
    pub paystack_base_url: String,
    /// Paystack secret key used as the bearer token for verification.
    pub paystack_secret_key: String,
    /// Mail provider send endpoint. Env var: `MAIL_API_URL`.
    pub mail_api_url: String,
    pub mail_api_key: String,
    /// Default sender for queued mail and order confirmations.
    pub mail_from: String,
    /// Bearer secret for the `/jobs/*` triggers. Unset or empty disables the check.
    pub cron_secret: Option<String>,
    /// Timeout for outbound HTTP calls in seconds (default 10).
    pub http_timeout_secs: u64,
}

impl ShopConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            shop_port: std::env::var("SHOP_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3114),
            paystack_base_url: std::env::var("PAYSTACK_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_PAYSTACK_BASE_URL.to_owned()),
            paystack_secret_key: std::env::var("PAYSTACK_SECRET_KEY")
                .expect("PAYSTACK_SECRET_KEY"),
            mail_api_url: std::env::var("MAIL_API_URL")
                .unwrap_or_else(|_| DEFAULT_MAIL_API_URL.to_owned()),
            mail_api_key: std::env::var("MAIL_API_KEY").expect("MAIL_API_KEY"),
            mail_from: std::env::var("MAIL_FROM").expect("MAIL_FROM"),
            cron_secret: std::env::var("CRON_SECRET")
                .ok()
                .filter(|s| !s.is_empty()),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        }
    }
}
