use anyhow::{Context as _, anyhow};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use crate::domain::repository::PaymentGateway;
use crate::domain::types::PaymentVerification;
use crate::error::ShopServiceError;

pub const DEFAULT_PAYSTACK_BASE_URL: &str = "https://api.paystack.co";

#[derive(Clone)]
pub struct PaystackGateway {
    pub client: Client,
    pub base_url: String,
    pub secret_key: String,
}

#[derive(Deserialize)]
struct VerifyResponse {
    data: Option<VerifyData>,
}

#[derive(Deserialize)]
struct VerifyData {
    status: String,
}

impl PaystackGateway {
    /// `{base}/transaction/verify/{reference}` with the reference as one
    /// percent-encoded path segment.
    fn verify_url(&self, reference: &str) -> anyhow::Result<Url> {
        let mut url = Url::parse(&self.base_url).context("invalid PAYSTACK_BASE_URL")?;
        url.path_segments_mut()
            .map_err(|()| anyhow!("PAYSTACK_BASE_URL cannot be a base"))?
            .pop_if_empty()
            .extend(["transaction", "verify", reference]);
        Ok(url)
    }
}

impl PaymentGateway for PaystackGateway {
    async fn verify(&self, reference: &str) -> Result<PaymentVerification, ShopServiceError> {
        let url = self.verify_url(reference)?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .context("paystack verify request")?;
        let status = response.status();
        let body = response.text().await.context("read paystack response")?;
        interpret_verify_response(status, &body)
    }
}

/// 2xx carries `{data: {status}}`. 400 and 404 mean the reference is not a
/// successful payment. Any other status (401 bad key, 429 throttled, 5xx) is internal.
fn interpret_verify_response(
    status: StatusCode,
    body: &str,
) -> Result<PaymentVerification, ShopServiceError> {
    if matches!(status, StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND) {
        return Ok(PaymentVerification {
            status: "failed".to_owned(),
        });
    }
    if !status.is_success() {
        return Err(anyhow!("paystack responded {status}").into());
    }
    let parsed: VerifyResponse =
        serde_json::from_str(body).context("decode paystack verify response")?;
    let data = parsed
        .data
        .ok_or_else(|| anyhow!("paystack verify response without data"))?;
    Ok(PaymentVerification {
        status: data.status,
    })
}
