// src/db.rs
//
// Runtime queries throughout so the build does not depend on a live database.

use sqlx::{PgPool, Row};

use crate::models::{Course, CourseFile, Purchase};

fn course_from_row(r: &sqlx::postgres::PgRow) -> Course {
    Course {
        id: r.get("id"),
        name: r.get("name"),
        description: r.get("description"),
        price: r.get("price"),
        rating: r.get("rating"),
        created_at: r.get("created_at"),
    }
}

pub async fn list_courses(pool: &PgPool) -> Result<Vec<Course>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT id, name, description, price::text AS price, rating, created_at
           FROM courses
           ORDER BY name ASC"#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(course_from_row).collect())
}

pub async fn get_course(pool: &PgPool, course_id: &str) -> Result<Option<Course>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT id, name, description, price::text AS price, rating, created_at
           FROM courses
           WHERE id = $1"#,
    )
    .bind(course_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(course_from_row))
}

pub async fn list_course_files(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<CourseFile>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT pdf_id, folder, subfolder, name, date, url
           FROM files
           WHERE folder = $1
           ORDER BY name ASC"#,
    )
    .bind(course_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| CourseFile {
            pdf_id: r.get("pdf_id"),
            folder: r.get("folder"),
            subfolder: r.get("subfolder"),
            name: r.get("name"),
            date: r.get("date"),
            url: r.get("url"),
        })
        .collect())
}

pub async fn get_course_file(
    pool: &PgPool,
    course_id: &str,
    pdf_id: &str,
) -> Result<Option<CourseFile>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT pdf_id, folder, subfolder, name, date, url
           FROM files
           WHERE pdf_id = $1 AND folder = $2"#,
    )
    .bind(pdf_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| CourseFile {
        pdf_id: r.get("pdf_id"),
        folder: r.get("folder"),
        subfolder: r.get("subfolder"),
        name: r.get("name"),
        date: r.get("date"),
        url: r.get("url"),
    }))
}

/// The purchase gate: no caching, every call hits the store.
pub async fn has_purchase(
    pool: &PgPool,
    user_id: i32,
    course_id: &str,
) -> Result<bool, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT 1 AS present FROM purchases WHERE user_id = $1 AND course_id = $2"#,
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

/// Full-overwrite upsert. Repeated webhook delivery for the same user/course
/// leaves exactly one row.
pub async fn record_purchase(
    pool: &PgPool,
    user_id: i32,
    course_id: &str,
    order_id: &str,
    payment_id: Option<&str>,
    amount: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO purchases (user_id, course_id, order_id, payment_id, amount, purchased_at)
           VALUES ($1, $2, $3, $4, $5::numeric, NOW())
           ON CONFLICT (user_id, course_id)
           DO UPDATE SET
               order_id = EXCLUDED.order_id,
               payment_id = EXCLUDED.payment_id,
               amount = EXCLUDED.amount,
               purchased_at = NOW()"#,
    )
    .bind(user_id)
    .bind(course_id)
    .bind(order_id)
    .bind(payment_id)
    .bind(amount)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_user_purchases(
    pool: &PgPool,
    user_id: i32,
) -> Result<Vec<Purchase>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT user_id, course_id, order_id, payment_id, amount::text AS amount, purchased_at
           FROM purchases
           WHERE user_id = $1
           ORDER BY purchased_at DESC"#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| Purchase {
            user_id: r.get("user_id"),
            course_id: r.get("course_id"),
            order_id: r.get("order_id"),
            payment_id: r.get("payment_id"),
            amount: r.get("amount"),
            purchased_at: r.get("purchased_at"),
        })
        .collect())
}

pub async fn get_user_email(pool: &PgPool, user_id: i32) -> Result<Option<String>, sqlx::Error> {
    let row = sqlx::query(r#"SELECT email FROM users WHERE id = $1"#)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| r.get("email")))
}
