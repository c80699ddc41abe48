use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::auth::register,
        crate::api::auth::login,
        crate::api::courses::list_courses,
        crate::api::courses::get_course,
        crate::api::courses::list_course_files,
        crate::api::orders::create_order,
        crate::api::purchases::list_purchases,
        crate::api::webhooks::payment_webhook,
        crate::api::documents::document_outline,
        crate::api::documents::page_text,
        crate::api::documents::search_document
    ),
    components(
        schemas(
            crate::api::auth::RegisterRequest,
            crate::api::auth::LoginRequest,
            crate::api::auth::AuthResponse,
            crate::api::orders::CreateOrderRequest,
            crate::api::webhooks::PaymentWebhook,
            crate::api::webhooks::CustomerInfo,
            crate::models::Course,
            crate::models::CourseFile,
            crate::models::Purchase,
            crate::viewer::FileGroup,
            crate::viewer::SearchOutcome
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Authentication"),
        (name = "catalog", description = "Course catalog"),
        (name = "content", description = "Purchase-gated course content"),
        (name = "orders", description = "Checkout order creation"),
        (name = "webhooks", description = "Payment gateway callbacks"),
        (name = "reader", description = "Document reading and search")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
