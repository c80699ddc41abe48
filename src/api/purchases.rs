// src/api/purchases.rs

use actix_web::{get, web, HttpResponse, Responder};

use crate::{db, AppState};

/// The caller's purchased courses, newest first.
#[utoipa::path(
    get,
    path = "/api/purchases",
    tag = "orders",
    responses((status = 200, description = "Purchases for the current user", body = [crate::models::Purchase])),
    security(("bearer_auth" = []))
)]
#[get("/purchases")]
pub async fn list_purchases(
    state: web::Data<AppState>,
    user_id: web::ReqData<i32>,
) -> impl Responder {
    match db::list_user_purchases(&state.pool, *user_id).await {
        Ok(purchases) => HttpResponse::Ok().json(purchases),
        Err(e) => {
            log::error!("list_purchases db error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
