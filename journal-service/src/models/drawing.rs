use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Drawing {
    pub drawing_id: i64,
    pub drawing_box_id: i64,
    pub drawing_title: String,
    pub drawing_diary: Option<String>,
    pub drawing_image_path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateDrawing {
    pub drawing_box_id: i64,
    pub drawing_title: String,
    pub drawing_diary: Option<String>,
    pub drawing_image_path: String,
}

#[derive(Debug, Clone)]
pub struct UpdateDrawing {
    pub drawing_title: String,
    pub drawing_diary: Option<String>,
}
