// src/models.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Course {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub rating: f32,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseFile {
    pub pdf_id: String,
    /// Course the file belongs to.
    pub folder: String,
    pub subfolder: Option<String>,
    pub name: String,
    pub date: Option<DateTime<Utc>>,
    pub url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Purchase {
    pub user_id: i32,
    pub course_id: String,
    pub order_id: String,
    pub payment_id: Option<String>,
    pub amount: Option<String>,
    pub purchased_at: Option<DateTime<Utc>>,
}
