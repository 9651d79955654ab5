//! Payment gateway client.
//!
//! [`PaymentGateway`] is the seam used by the payment service; [`PayOsClient`] talks
//! to the payOS merchant API. Requests and webhooks are authenticated with an
//! HMAC-SHA256 signature over the alphabetically sorted `key=value` pairs of the
//! data object.

use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::Sha256;

use crate::{config::PayOsConfig, error::AppError};

type HmacSha256 = Hmac<Sha256>;

/// Gateway result code for a successful operation.
pub const SUCCESS_CODE: &str = "00";

/// payOS rejects longer descriptions for unlinked bank accounts.
const MAX_DESCRIPTION_CHARS: usize = 25;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("gateway rejected request ({code}): {desc}")]
    Rejected { code: String, desc: String },
    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        AppError::Gateway(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreatePaymentLink {
    pub correlation_id: i64,
    pub amount: i64,
    pub description: String,
    pub item_name: String,
    pub buyer_name: Option<String>,
    pub buyer_email: Option<String>,
    pub buyer_phone: Option<String>,
    pub return_url: String,
    pub cancel_url: String,
    /// Unix timestamp after which the link stops accepting payments.
    pub expired_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentLink {
    pub checkout_url: String,
    pub payment_link_id: String,
}

/// Authoritative state of a payment request as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemotePaymentState {
    Pending,
    Paid,
    Failed,
}

impl RemotePaymentState {
    pub fn from_gateway(status: &str) -> Self {
        match status {
            "PAID" => RemotePaymentState::Paid,
            "CANCELLED" | "EXPIRED" | "FAILED" => RemotePaymentState::Failed,
            _ => RemotePaymentState::Pending,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaymentStatusReport {
    pub state: RemotePaymentState,
    pub reference: Option<String>,
    pub payload: Value,
}

/// Webhook payload that passed signature verification.
#[derive(Debug, Clone)]
pub struct VerifiedWebhook {
    pub correlation_id: i64,
    pub amount: i64,
    pub success: bool,
    pub reference: Option<String>,
    pub payload: Value,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment_link(&self, req: &CreatePaymentLink) -> Result<PaymentLink, GatewayError>;

    /// Returns `None` when the signature does not match the data object.
    fn verify_webhook(&self, body: &Value) -> Option<VerifiedWebhook>;

    async fn get_payment_status(&self, correlation_id: i64)
    -> Result<PaymentStatusReport, GatewayError>;
}

pub struct PayOsClient {
    client: Client,
    config: PayOsConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateBody<'a> {
    order_code: i64,
    amount: i64,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    buyer_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    buyer_email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    buyer_phone: Option<&'a str>,
    items: Vec<ItemBody<'a>>,
    cancel_url: &'a str,
    return_url: &'a str,
    expired_at: i64,
    signature: String,
}

#[derive(Serialize)]
struct ItemBody<'a> {
    name: &'a str,
    quantity: i32,
    price: i64,
}

#[derive(Deserialize)]
struct Envelope {
    code: String,
    #[serde(default)]
    desc: String,
    data: Option<Value>,
}

impl PayOsClient {
    pub fn new(config: PayOsConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { client, config })
    }

    fn sign(&self, data: &str) -> String {
        sign_with_key(&self.config.checksum_key, data)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, GatewayError> {
        let envelope: Envelope = request
            .header("x-client-id", &self.config.client_id)
            .header("x-api-key", &self.config.api_key)
            .send()
            .await?
            .json()
            .await?;
        if envelope.code != SUCCESS_CODE {
            return Err(GatewayError::Rejected {
                code: envelope.code,
                desc: envelope.desc,
            });
        }
        envelope
            .data
            .ok_or_else(|| GatewayError::InvalidResponse("missing data".into()))
    }
}

#[async_trait]
impl PaymentGateway for PayOsClient {
    async fn create_payment_link(&self, req: &CreatePaymentLink) -> Result<PaymentLink, GatewayError> {
        let description = truncate_description(&req.description);
        let signature = self.sign(&format!(
            "amount={}&cancelUrl={}&description={}&orderCode={}&returnUrl={}",
            req.amount, req.cancel_url, description, req.correlation_id, req.return_url
        ));
        let body = CreateBody {
            order_code: req.correlation_id,
            amount: req.amount,
            description: &description,
            buyer_name: req.buyer_name.as_deref(),
            buyer_email: req.buyer_email.as_deref(),
            buyer_phone: req.buyer_phone.as_deref(),
            items: vec![ItemBody {
                name: &req.item_name,
                quantity: 1,
                price: req.amount,
            }],
            cancel_url: &req.cancel_url,
            return_url: &req.return_url,
            expired_at: req.expired_at,
            signature,
        };

        let url = format!("{}/v2/payment-requests", self.config.base_url);
        let data = self.send(self.client.post(url).json(&body)).await?;

        let checkout_url = data
            .get("checkoutUrl")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::InvalidResponse("missing checkoutUrl".into()))?;
        let payment_link_id = data
            .get("paymentLinkId")
            .and_then(Value::as_str)
            .unwrap_or_default();
        tracing::debug!(correlation_id = req.correlation_id, "payment link created");
        Ok(PaymentLink {
            checkout_url: checkout_url.to_string(),
            payment_link_id: payment_link_id.to_string(),
        })
    }

    fn verify_webhook(&self, body: &Value) -> Option<VerifiedWebhook> {
        verify_webhook_with_key(&self.config.checksum_key, body)
    }

    async fn get_payment_status(
        &self,
        correlation_id: i64,
    ) -> Result<PaymentStatusReport, GatewayError> {
        let url = format!(
            "{}/v2/payment-requests/{}",
            self.config.base_url, correlation_id
        );
        let data = self.send(self.client.get(url)).await?;
        let status = data
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::InvalidResponse("missing status".into()))?;
        let reference = data
            .get("transactions")
            .and_then(Value::as_array)
            .and_then(|txs| txs.last())
            .and_then(|tx| tx.get("reference"))
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(PaymentStatusReport {
            state: RemotePaymentState::from_gateway(status),
            reference,
            payload: data,
        })
    }
}

fn keyed_mac(key: &str, data: &str) -> Option<HmacSha256> {
    // HMAC accepts keys of any length.
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).ok()?;
    mac.update(data.as_bytes());
    Some(mac)
}

/// Hex-encoded HMAC-SHA256 of `data` under `key`.
pub fn sign_with_key(key: &str, data: &str) -> String {
    keyed_mac(key, data)
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
        .unwrap_or_default()
}

/// Builds `k1=v1&k2=v2...` over the object's keys in alphabetical order.
/// Nulls become empty strings; nested values are serialized as JSON.
pub fn canonical_data_string(data: &Map<String, Value>) -> String {
    let mut keys: Vec<&String> = data.keys().collect();
    keys.sort();
    keys.into_iter()
        .map(|key| {
            let value = match &data[key] {
                Value::Null => String::new(),
                Value::String(s) if s == "null" || s == "undefined" => String::new(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("{key}={value}")
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Checks a webhook body `{code, desc, data, signature}` against `key`.
pub fn verify_webhook_with_key(key: &str, body: &Value) -> Option<VerifiedWebhook> {
    let data = body.get("data")?.as_object()?;
    let signature = body.get("signature")?.as_str()?;
    let signature = hex::decode(signature).ok()?;
    keyed_mac(key, &canonical_data_string(data))?
        .verify_slice(&signature)
        .ok()?;

    let correlation_id = data.get("orderCode")?.as_i64()?;
    let amount = data.get("amount").and_then(Value::as_i64).unwrap_or(0);
    let body_code = body.get("code").and_then(Value::as_str);
    let data_code = data.get("code").and_then(Value::as_str);
    let success = body_code == Some(SUCCESS_CODE) && data_code.is_none_or(|c| c == SUCCESS_CODE);
    let reference = data
        .get("reference")
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(VerifiedWebhook {
        correlation_id,
        amount,
        success,
        reference,
        payload: body.clone(),
    })
}

fn truncate_description(description: &str) -> String {
    description.chars().take(MAX_DESCRIPTION_CHARS).collect()
}
