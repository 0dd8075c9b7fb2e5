use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardCategory {
    Free,
    Showcase,
    Question,
    Info,
}

impl BoardCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoardCategory::Free => "free",
            BoardCategory::Showcase => "showcase",
            BoardCategory::Question => "question",
            BoardCategory::Info => "info",
        }
    }
}

impl std::str::FromStr for BoardCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(BoardCategory::Free),
            "showcase" => Ok(BoardCategory::Showcase),
            "question" => Ok(BoardCategory::Question),
            "info" => Ok(BoardCategory::Info),
            _ => Err(format!("Invalid board type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Board {
    pub board_id: i64,
    pub user_id: i64,
    pub board_title: String,
    pub board_content: String,
    pub board_category: String,
    pub board_image: Option<String>,
    pub board_view: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Board joined with its author's nickname.
#[derive(Debug, Clone, FromRow)]
pub struct BoardWithAuthor {
    #[sqlx(flatten)]
    pub board: Board,
    pub writer_nickname: String,
}

/// Listing row: title plus author and comment count.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BoardTitle {
    pub board_id: i64,
    pub board_title: String,
    pub board_category: String,
    pub board_view: i64,
    pub writer_nickname: String,
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateBoard {
    pub user_id: i64,
    pub board_title: String,
    pub board_content: String,
    pub board_category: BoardCategory,
    pub board_image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateBoard {
    pub board_title: String,
    pub board_content: String,
    pub board_category: BoardCategory,
}
