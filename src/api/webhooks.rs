// src/api/webhooks.rs

use actix_web::{post, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::{db, AppState};

pub const STATUS_SUCCESS: &str = "SUCCESS";

#[derive(Debug, Deserialize, ToSchema)]
pub struct CustomerInfo {
    pub customer_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentWebhook {
    #[serde(rename = "orderId")]
    pub order_id: Option<String>,

    #[serde(rename = "orderAmount")]
    pub order_amount: Option<f64>,

    /// Gateway-side payment reference.
    #[serde(rename = "referenceId")]
    pub reference_id: Option<String>,

    #[serde(rename = "paymentStatus")]
    pub payment_status: Option<String>,

    #[serde(rename = "customerDetails")]
    pub customer_details: Option<CustomerInfo>,
}

/// Order ids have the shape `order_<courseId>_<timestampMillis>`. Course ids
/// may themselves contain underscores, so the timestamp is split off the end.
pub fn parse_order_id(order_id: &str) -> Option<&str> {
    let rest = order_id.strip_prefix("order_")?;
    let (course_id, timestamp) = rest.rsplit_once('_')?;
    if course_id.is_empty() || timestamp.parse::<i64>().is_err() {
        return None;
    }
    Some(course_id)
}

/// Customer ids have the shape `cust_<userId>`.
pub fn parse_customer_id(customer_id: &str) -> Option<i32> {
    customer_id.strip_prefix("cust_")?.parse().ok()
}

/// Asynchronous payment confirmation from the gateway. This is the only writer
/// of purchase records; repeated delivery overwrites the same row.
#[utoipa::path(
    post,
    path = "/webhook/payment",
    tag = "webhooks",
    request_body = PaymentWebhook,
    responses(
        (status = 200, description = "Webhook processed"),
        (status = 400, description = "Invalid webhook data"),
        (status = 401, description = "Bad webhook key"),
        (status = 500, description = "Server error")
    )
)]
#[post("/webhook/payment")]
pub async fn payment_webhook(
    req: HttpRequest,
    payload: web::Json<PaymentWebhook>,
    state: web::Data<AppState>,
) -> HttpResponse {
    if let Some(expected) = state.webhook_api_key.as_deref() {
        let provided = req
            .headers()
            .get("X-Api-Key")
            .and_then(|h| h.to_str().ok())
            .unwrap_or("");
        if provided != expected {
            log::warn!("payment webhook rejected: bad api key");
            return HttpResponse::Unauthorized().json(json!({"error": "invalid api key"}));
        }
    }

    let payload = payload.into_inner();

    let (Some(order_id), Some(payment_status)) =
        (payload.order_id.as_deref(), payload.payment_status.as_deref())
    else {
        return HttpResponse::BadRequest().json(json!({"error": "Invalid webhook data"}));
    };

    if payment_status != STATUS_SUCCESS {
        // Accepted so the gateway stops retrying; no side effect.
        log::info!("payment webhook ignored order_id={order_id} status={payment_status}");
        return HttpResponse::Ok().json(json!({"success": true}));
    }

    let Some(course_id) = parse_order_id(order_id) else {
        log::warn!("payment webhook malformed order_id={order_id}");
        return HttpResponse::BadRequest().json(json!({"error": "Invalid webhook data"}));
    };

    let Some(user_id) = payload
        .customer_details
        .as_ref()
        .and_then(|c| parse_customer_id(&c.customer_id))
    else {
        log::warn!("payment webhook missing or malformed customer id order_id={order_id}");
        return HttpResponse::BadRequest().json(json!({"error": "Invalid webhook data"}));
    };

    // Unknown course or user (deleted row, out-of-sync gateway, forged id):
    // accepted so the gateway stops retrying; nothing to record against.
    match db::get_course(&state.pool, course_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            log::warn!("payment webhook for unknown course_id={course_id} order_id={order_id}");
            return HttpResponse::Ok().json(json!({"success": true, "ignored": true}));
        }
        Err(e) => {
            log::error!("payment webhook get_course error: {e} order_id={order_id}");
            return HttpResponse::InternalServerError()
                .json(json!({"error": "Internal server error"}));
        }
    }

    match db::get_user_email(&state.pool, user_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            log::warn!("payment webhook for unknown user_id={user_id} order_id={order_id}");
            return HttpResponse::Ok().json(json!({"success": true, "ignored": true}));
        }
        Err(e) => {
            log::error!("payment webhook get_user_email error: {e} order_id={order_id}");
            return HttpResponse::InternalServerError()
                .json(json!({"error": "Internal server error"}));
        }
    }

    let amount = payload.order_amount.map(|a| a.to_string());

    if let Err(e) = db::record_purchase(
        &state.pool,
        user_id,
        course_id,
        order_id,
        payload.reference_id.as_deref(),
        amount.as_deref(),
    )
    .await
    {
        log::error!("record_purchase error: {e} order_id={order_id}");
        return HttpResponse::InternalServerError().json(json!({"error": "Internal server error"}));
    }

    log::info!("purchase recorded user_id={user_id} course_id={course_id} order_id={order_id}");
    HttpResponse::Ok().json(json!({"success": true}))
}
