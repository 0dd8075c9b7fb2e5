use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub comment_id: i64,
    pub board_id: i64,
    pub user_id: i64,
    pub comment_content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CommentWithAuthor {
    pub comment_id: i64,
    pub user_id: i64,
    pub writer_nickname: String,
    pub comment_content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateComment {
    pub board_id: i64,
    pub user_id: i64,
    pub comment_content: String,
}
