// src/api/orders.rs

use actix_web::{post, web, HttpResponse, Responder};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::api::gateway;
use crate::{db, AppState};

/// The gateway requires a phone number; the storefront never collects one.
const PLACEHOLDER_CUSTOMER_PHONE: &str = "9999999999";

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub amount: Option<f64>,

    /// Course being purchased. `courseId` accepted for older clients.
    #[serde(rename = "productId", alias = "courseId")]
    pub product_id: Option<String>,
}

/// Creates an order with the payment gateway and returns the checkout session
/// the client opens the hosted payment UI with. The purchase record itself is
/// only ever written by the webhook once the gateway confirms payment.
#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order created"),
        (status = 400, description = "Missing or invalid amount/productId"),
        (status = 409, description = "Course already purchased"),
        (status = 500, description = "Gateway failure")
    ),
    security(("bearer_auth" = []))
)]
#[post("/orders")]
pub async fn create_order(
    state: web::Data<AppState>,
    user_id: web::ReqData<i32>,
    payload: web::Json<CreateOrderRequest>,
) -> impl Responder {
    let user_id = *user_id;

    // Validate before anything upstream is contacted.
    let (Some(amount), Some(course_id)) = (payload.amount, payload.product_id.as_deref()) else {
        return HttpResponse::BadRequest().json(json!({
            "error": "amount and productId are required"
        }));
    };

    let course = match db::get_course(&state.pool, course_id).await {
        Ok(Some(c)) => c,
        Ok(None) => return HttpResponse::BadRequest().json(json!({"error": "invalid course"})),
        Err(e) => {
            log::error!("create_order get_course error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    // The stored price is the source of truth; a stale client price is rejected.
    let price: f64 = match course.price.parse() {
        Ok(p) => p,
        Err(e) => {
            log::error!("course {} has unparseable price {}: {e}", course.id, course.price);
            return HttpResponse::InternalServerError().finish();
        }
    };

    if (amount - price).abs() > 0.005 {
        return HttpResponse::BadRequest().json(json!({
            "error": format!("amount does not match course price {}", course.price)
        }));
    }

    match db::has_purchase(&state.pool, user_id, course_id).await {
        Ok(true) => {
            return HttpResponse::Conflict().json(json!({
                "error": "course already purchased"
            }));
        }
        Ok(false) => {}
        Err(e) => {
            log::error!("create_order has_purchase error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    }

    let customer_email = match db::get_user_email(&state.pool, user_id).await {
        Ok(Some(email)) => email,
        Ok(None) => return HttpResponse::BadRequest().json(json!({"error": "user not found"})),
        Err(e) => {
            log::error!("create_order get_user_email error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    // The webhook later derives course and user back out of these two ids.
    let order_id = format!("order_{}_{}", course.id, Utc::now().timestamp_millis());
    let customer_id = format!("cust_{user_id}");

    log::info!(
        "gateway create order user_id={user_id} course_id={} order_id={order_id}",
        course.id
    );

    let order = match gateway::create_order(
        &state.gateway_api_base,
        &state.gateway_client_id,
        &state.gateway_client_secret,
        gateway::CreateOrderRequest {
            order_id,
            order_amount: price,
            order_currency: "INR".to_string(),
            customer_details: gateway::CustomerDetails {
                customer_id,
                customer_email,
                customer_phone: PLACEHOLDER_CUSTOMER_PHONE.to_string(),
            },
            order_meta: gateway::OrderMeta {
                return_url: format!(
                    "{}/courses/view?product={}",
                    state.checkout_return_base, course.id
                ),
            },
        },
    )
    .await
    {
        Ok(o) => o,
        Err(e) => {
            log::error!("gateway create_order error: {e} user_id={user_id}");
            return HttpResponse::InternalServerError().json(json!({
                "error": e.to_string()
            }));
        }
    };

    HttpResponse::Ok().json(json!({
        "success": true,
        "data": {
            "order_id": order.order_id,
            "payment_session_id": order.payment_session_id,
        }
    }))
}
