// src/main.rs
use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use dotenvy::dotenv;
use sqlx::PgPool;
use std::env;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use studyvault::{api, docs, AppState};

async fn index() -> impl Responder {
    HttpResponse::Ok().body("Service ready!")
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let gateway_client_id = env::var("GATEWAY_CLIENT_ID").expect("GATEWAY_CLIENT_ID required");
    let gateway_client_secret =
        env::var("GATEWAY_CLIENT_SECRET").expect("GATEWAY_CLIENT_SECRET required");

    // GATEWAY_MODE picks the provider host; GATEWAY_API_BASE overrides it outright.
    let gateway_api_base = env::var("GATEWAY_API_BASE").unwrap_or_else(|_| {
        match env::var("GATEWAY_MODE").as_deref() {
            Ok("production") => api::gateway::PRODUCTION_API_BASE.to_string(),
            _ => api::gateway::SANDBOX_API_BASE.to_string(),
        }
    });

    let webhook_api_key = env::var("WEBHOOK_API_KEY").ok();
    let checkout_return_base =
        env::var("CHECKOUT_RETURN_BASE").unwrap_or_else(|_| "https://your-domain.com".to_string());

    let state = web::Data::new(AppState {
        pool,
        gateway_api_base,
        gateway_client_id,
        gateway_client_secret,
        webhook_api_key,
        checkout_return_base,
    });

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allow_any_header();

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .route("/", web::get().to(index))
            .service(
                SwaggerUi::new("/docs/{_:.*}")
                    .url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
            )
            // Public routes
            .service(api::auth::register)
            .service(api::auth::login)
            .service(api::courses::list_courses)
            .service(api::courses::get_course)
            // Authenticated routes
            .service(
                web::scope("/api")
                    .wrap(api::auth::JwtMiddleware)
                    .service(api::courses::list_course_files)
                    .service(api::orders::create_order)
                    .service(api::purchases::list_purchases)
                    .service(api::documents::document_outline)
                    .service(api::documents::page_text)
                    .service(api::documents::search_document),
            )
            // Gateway callback (public)
            .service(api::webhooks::payment_webhook)
    })
    .bind(("0.0.0.0", 8065))?
    .run()
    .await
}
