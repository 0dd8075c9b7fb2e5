use crate::models::{Board, BoardCategory, BoardTitle, BoardWithAuthor, Comment, CommentWithAuthor};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use validator::Validate;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE: i64 = 1_000_000;

/// Query string for the board listings.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BoardListParams {
    #[validate(range(min = 0, max = MAX_PAGE, message = "Page must be between 0 and 1000000"))]
    pub page: Option<i64>,

    #[validate(range(min = 1, max = 100, message = "Size must be between 1 and 100"))]
    pub size: Option<i64>,

    pub board_type: Option<String>,

    pub keyword: Option<String>,
}

impl BoardListParams {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(0)
    }

    pub fn size(&self) -> i64 {
        self.size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Parsed `boardType`; unknown categories are a bad request.
    pub fn category(&self) -> Result<Option<BoardCategory>, AppError> {
        self.board_type
            .as_deref()
            .map(|raw| raw.parse::<BoardCategory>())
            .transpose()
            .map_err(|e| AppError::BadRequest(anyhow::anyhow!(e)))
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BoardRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub board_title: String,

    #[validate(length(min = 1, max = 5000, message = "Content must be 1-5000 characters"))]
    pub board_content: String,

    pub board_type: String,

    pub board_image: Option<String>,
}

impl BoardRequest {
    pub fn category(&self) -> Result<BoardCategory, AppError> {
        self.board_type
            .parse()
            .map_err(|e: String| AppError::BadRequest(anyhow::anyhow!(e)))
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardTitleResponse {
    pub board_id: i64,
    pub board_title: String,
    pub board_type: String,
    pub board_view: i64,
    pub writer_nickname: String,
    pub comment_count: i64,
    pub created_at: String,
}

impl From<BoardTitle> for BoardTitleResponse {
    fn from(row: BoardTitle) -> Self {
        Self {
            board_id: row.board_id,
            board_title: row.board_title,
            board_type: row.board_category,
            board_view: row.board_view,
            writer_nickname: row.writer_nickname,
            comment_count: row.comment_count,
            created_at: row.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardListResponse {
    pub boards: Vec<BoardTitleResponse>,
    pub page: i64,
    pub size: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardResponse {
    pub board_id: i64,
    pub writer_id: i64,
    pub board_title: String,
    pub board_content: String,
    pub board_type: String,
    pub board_image: Option<String>,
    pub board_view: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Board> for BoardResponse {
    fn from(board: Board) -> Self {
        Self {
            board_id: board.board_id,
            writer_id: board.user_id,
            board_title: board.board_title,
            board_content: board.board_content,
            board_type: board.board_category,
            board_image: board.board_image,
            board_view: board.board_view,
            created_at: board.created_at.to_rfc3339(),
            updated_at: board.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardDetailResponse {
    #[serde(flatten)]
    pub board: BoardResponse,
    pub writer_nickname: String,
    pub comments: Vec<CommentResponse>,
}

impl BoardDetailResponse {
    pub fn new(board: BoardWithAuthor, comments: Vec<CommentWithAuthor>) -> Self {
        Self {
            board: board.board.into(),
            writer_nickname: board.writer_nickname,
            comments: comments.into_iter().map(CommentResponse::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    #[validate(length(min = 1, max = 500, message = "Comment must be 1-500 characters"))]
    pub comment_content: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub comment_id: i64,
    pub writer_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writer_nickname: Option<String>,
    pub comment_content: String,
    pub created_at: String,
}

impl From<CommentWithAuthor> for CommentResponse {
    fn from(comment: CommentWithAuthor) -> Self {
        Self {
            comment_id: comment.comment_id,
            writer_id: comment.user_id,
            writer_nickname: Some(comment.writer_nickname),
            comment_content: comment.comment_content,
            created_at: comment.created_at.to_rfc3339(),
        }
    }
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            comment_id: comment.comment_id,
            writer_id: comment.user_id,
            writer_nickname: None,
            comment_content: comment.comment_content,
            created_at: comment.created_at.to_rfc3339(),
        }
    }
}
