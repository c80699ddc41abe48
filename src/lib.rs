pub mod api;
pub mod db;
pub mod docs;
pub mod models;
pub mod viewer;

use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub gateway_api_base: String,
    pub gateway_client_id: String,
    pub gateway_client_secret: String,
    /// Shared key the gateway echoes back on webhook calls. `None` disables the check.
    pub webhook_api_key: Option<String>,
    /// Origin the hosted checkout redirects back to after payment.
    pub checkout_return_base: String,
}
