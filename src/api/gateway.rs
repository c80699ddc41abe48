// src/api/gateway.rs
//
// Minimal client for the hosted checkout provider's order API.
// Auth: x-client-id / x-client-secret headers plus a pinned API version.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const API_VERSION: &str = "2023-08-01";
pub const PRODUCTION_API_BASE: &str = "https://api.cashfree.com/pg";
pub const SANDBOX_API_BASE: &str = "https://sandbox.cashfree.com/pg";

#[derive(Debug)]
pub enum GatewayError {
    Http(reqwest::Error),
    Api { status: u16, body: String },
    InvalidResponse(String),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Http(e) => write!(f, "http error: {e}"),
            GatewayError::Api { status, body } => {
                write!(f, "gateway api error status={status} body={body}")
            }
            GatewayError::InvalidResponse(e) => write!(f, "invalid response: {e}"),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

#[derive(Debug, Serialize)]
pub struct CustomerDetails {
    pub customer_id: String,
    pub customer_email: String,
    pub customer_phone: String,
}

#[derive(Debug, Serialize)]
pub struct OrderMeta {
    pub return_url: String,
}

#[derive(Debug, Serialize)]
pub struct CreateOrderRequest {
    pub order_id: String,
    pub order_amount: f64,
    pub order_currency: String,
    pub customer_details: CustomerDetails,
    pub order_meta: OrderMeta,
}

/// Session identifier pair the hosted checkout UI is opened with.
#[derive(Debug, Deserialize)]
pub struct GatewayOrder {
    pub order_id: String,
    pub payment_session_id: String,
}

pub async fn create_order(
    api_base: &str,
    client_id: &str,
    client_secret: &str,
    req: CreateOrderRequest,
) -> Result<GatewayOrder, GatewayError> {
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{api_base}/orders"))
        .header("x-api-version", API_VERSION)
        .header("x-client-id", client_id)
        .header("x-client-secret", client_secret)
        .json(&req)
        .send()
        .await?;

    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        return Err(GatewayError::Api {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str::<GatewayOrder>(&body)
        .map_err(|e| GatewayError::InvalidResponse(format!("{e}; body={body}")))
}
