use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::domain::repository::MailTransport;
use crate::domain::types::OutgoingMail;
use crate::error::ShopServiceError;

pub const DEFAULT_MAIL_API_URL: &str = "https://api.resend.com/emails";

/// Mail provider reached over HTTP with a bearer API key.
#[derive(Clone)]
pub struct HttpMailTransport {
    pub client: Client,
    pub api_url: String,
    pub api_key: String,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

impl MailTransport for HttpMailTransport {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), ShopServiceError> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&SendRequest {
                from: &mail.from,
                to: &mail.to,
                subject: &mail.subject,
                html: &mail.html,
            })
            .send()
            .await
            .map_err(|e| ShopServiceError::MailTransport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ShopServiceError::MailTransport(e.to_string()))?;
        interpret_send_response(status, &body)
    }
}

/// A non-2xx status or a truthy `error` field in the body is a failed send.
fn interpret_send_response(status: StatusCode, body: &str) -> Result<(), ShopServiceError> {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed
        .as_ref()
        .and_then(|v| v.get("error"))
        .filter(|e| is_truthy(e));

    if let Some(error) = error {
        return Err(ShopServiceError::MailTransport(describe(error)));
    }
    if !status.is_success() {
        let detail = parsed
            .as_ref()
            .and_then(|v| v.get("message"))
            .and_then(Value::as_str)
            .unwrap_or(status.canonical_reason().unwrap_or("unexpected status"));
        return Err(ShopServiceError::MailTransport(format!(
            "{}: {detail}",
            status.as_u16()
        )));
    }
    Ok(())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn describe(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    }
}
