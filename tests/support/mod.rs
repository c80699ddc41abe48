use sqlx::PgPool;
use sqlx::Row;
use std::env;
use std::sync::OnceLock;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use studyvault::AppState;

fn split_db_url(url: &str) -> Result<(String, String), String> {
    let (base, query) = match url.split_once('?') {
        Some((base, query)) => (base.to_string(), Some(query)),
        None => (url.to_string(), None),
    };

    let db_start = base
        .rfind('/')
        .ok_or_else(|| "invalid database url".to_string())?;
    if db_start + 1 >= base.len() {
        return Err("database name is empty".to_string());
    }

    let db_name = base[db_start + 1..].to_string();
    let mut admin_url = format!("{}postgres", &base[..db_start + 1]);
    if let Some(query) = query {
        admin_url = format!("{admin_url}?{query}");
    }

    Ok((admin_url, db_name))
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

static TEST_DB_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

pub struct TestDb {
    pub pool: PgPool,
    _guard: MutexGuard<'static, ()>,
}

pub async fn init_test_db() -> TestDb {
    dotenvy::dotenv().ok();
    let test_url = env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let (admin_url, db_name) = split_db_url(&test_url).expect("invalid TEST_DATABASE_URL format");

    let lock = TEST_DB_LOCK.get_or_init(|| Mutex::new(()));
    let guard = lock.lock().await;

    let admin_pool = PgPool::connect(&admin_url).await.expect("connect admin db");

    let _ = sqlx::query("SELECT pg_advisory_lock(424242)")
        .execute(&admin_pool)
        .await;

    let quoted_name = quote_identifier(&db_name);
    let drop_sql = format!("DROP DATABASE IF EXISTS {quoted_name} WITH (FORCE)");
    let create_sql = format!("CREATE DATABASE {quoted_name}");

    let _ = sqlx::query(&drop_sql).execute(&admin_pool).await;
    let create_result = sqlx::query(&create_sql).execute(&admin_pool).await;
    if let Err(e) = create_result {
        eprintln!("create test db error: {e}");
        let _ = sqlx::query(&drop_sql).execute(&admin_pool).await;
        sqlx::query(&create_sql)
            .execute(&admin_pool)
            .await
            .expect("create test db retry");
    }

    let _ = sqlx::query("SELECT pg_advisory_unlock(424242)")
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;

    let pool = PgPool::connect(&test_url).await.expect("connect test db");
    sqlx::migrate!().run(&pool).await.expect("migrations");
    TestDb {
        pool,
        _guard: guard,
    }
}

pub fn build_state(pool: PgPool, gateway_api_base: &str, webhook_api_key: Option<&str>) -> AppState {
    AppState {
        pool,
        gateway_api_base: gateway_api_base.to_string(),
        gateway_client_id: "test-client-id".to_string(),
        gateway_client_secret: "test-client-secret".to_string(),
        webhook_api_key: webhook_api_key.map(|k| k.to_string()),
        checkout_return_base: "http://localhost".to_string(),
    }
}

pub async fn insert_user(pool: &PgPool, suffix: &str) -> i32 {
    sqlx::query(
        r#"INSERT INTO users (username, email, password_hash)
           VALUES ($1, $2, $3)
           RETURNING id"#,
    )
    .bind(format!("user_{suffix}"))
    .bind(format!("user_{suffix}@example.com"))
    .bind("test-hash")
    .fetch_one(pool)
    .await
    .expect("insert user")
    .get("id")
}

pub async fn insert_course(pool: &PgPool, suffix: &str, price: &str) -> String {
    let course_id = format!("course_{suffix}");
    sqlx::query(
        r#"INSERT INTO courses (id, name, description, price, rating)
           VALUES ($1, $2, $3, $4::numeric, 4.5)"#,
    )
    .bind(&course_id)
    .bind("Test Course")
    .bind("Study materials")
    .bind(price)
    .execute(pool)
    .await
    .expect("insert course");
    course_id
}

pub async fn insert_file(pool: &PgPool, course_id: &str, subfolder: Option<&str>, name: &str) -> String {
    let pdf_id = format!("pdf_{}", Uuid::new_v4());
    let url = format!("http://localhost/files/{pdf_id}.pdf");
    insert_file_with_url(pool, course_id, subfolder, name, &pdf_id, &url).await;
    pdf_id
}

pub async fn insert_file_with_url(
    pool: &PgPool,
    course_id: &str,
    subfolder: Option<&str>,
    name: &str,
    pdf_id: &str,
    url: &str,
) {
    sqlx::query(
        r#"INSERT INTO files (pdf_id, folder, subfolder, name, date, url)
           VALUES ($1, $2, $3, $4, NOW(), $5)"#,
    )
    .bind(pdf_id)
    .bind(course_id)
    .bind(subfolder)
    .bind(name)
    .bind(url)
    .execute(pool)
    .await
    .expect("insert file");
}
