//! Community boards. Public reads; writes by the author only.

use super::extract::ValidatedJson;
use crate::authz::AuthUser;
use crate::dtos::{
    BoardDetailResponse, BoardListParams, BoardListResponse, BoardRequest, BoardResponse,
    BoardTitleResponse,
};
use crate::models::{Board, CreateBoard, UpdateBoard};
use crate::services::BoardListFilter;
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

async fn list_with_filter(
    state: &AppState,
    params: &BoardListParams,
    filter: BoardListFilter,
) -> Result<BoardListResponse, AppError> {
    let (page, size) = (params.page(), params.size());
    let boards = state
        .db
        .list_board_titles(&filter, page, size)
        .await?
        .into_iter()
        .map(BoardTitleResponse::from)
        .collect();

    Ok(BoardListResponse { boards, page, size })
}

pub async fn list_boards(
    State(state): State<AppState>,
    Query(params): Query<BoardListParams>,
) -> Result<impl IntoResponse, AppError> {
    params.validate()?;
    let response = list_with_filter(&state, &params, BoardListFilter::default()).await?;
    Ok(Json(response))
}

pub async fn list_boards_by_category(
    State(state): State<AppState>,
    Query(params): Query<BoardListParams>,
) -> Result<impl IntoResponse, AppError> {
    params.validate()?;
    let category = params
        .category()?
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("boardType is required")))?;

    let filter = BoardListFilter {
        category: Some(category),
        keyword: None,
    };
    Ok(Json(list_with_filter(&state, &params, filter).await?))
}

/// Title search, optionally narrowed to one category.
pub async fn search_boards(
    State(state): State<AppState>,
    Query(params): Query<BoardListParams>,
) -> Result<impl IntoResponse, AppError> {
    params.validate()?;
    let keyword = params
        .keyword
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("keyword is required")))?
        .to_string();

    let filter = BoardListFilter {
        category: params.category()?,
        keyword: Some(keyword),
    };
    Ok(Json(list_with_filter(&state, &params, filter).await?))
}

/// Board with its comments. Each call counts as a view.
pub async fn get_board(
    State(state): State<AppState>,
    Path(board_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let board = state
        .db
        .view_board(board_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Board not found")))?;
    let comments = state.db.list_comments(board_id).await?;

    Ok(Json(BoardDetailResponse::new(board, comments)))
}

pub async fn create_board(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<BoardRequest>,
) -> Result<impl IntoResponse, AppError> {
    let board_category = req.category()?;

    let board = state
        .db
        .create_board(&CreateBoard {
            user_id: user.account_id(),
            board_title: req.board_title,
            board_content: req.board_content,
            board_category,
            board_image: req.board_image,
        })
        .await?;

    tracing::info!(board_id = board.board_id, user_id = board.user_id, "Board created");

    Ok((StatusCode::CREATED, Json(BoardResponse::from(board))))
}

async fn authored_board(state: &AppState, user: &AuthUser, board_id: i64) -> Result<Board, AppError> {
    let board = state
        .db
        .find_board(board_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Board not found")))?;

    if board.user_id != user.account_id() {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "Only the author may modify this board"
        )));
    }
    Ok(board)
}

pub async fn update_board(
    State(state): State<AppState>,
    user: AuthUser,
    Path(board_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<BoardRequest>,
) -> Result<impl IntoResponse, AppError> {
    let board_category = req.category()?;
    authored_board(&state, &user, board_id).await?;

    let board = state
        .db
        .update_board(
            board_id,
            &UpdateBoard {
                board_title: req.board_title,
                board_content: req.board_content,
                board_category,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Board not found")))?;

    Ok(Json(BoardResponse::from(board)))
}

pub async fn delete_board(
    State(state): State<AppState>,
    user: AuthUser,
    Path(board_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    authored_board(&state, &user, board_id).await?;

    if !state.db.delete_board(board_id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Board not found")));
    }

    tracing::info!(board_id = board_id, user_id = user.account_id(), "Board deleted");

    Ok(StatusCode::NO_CONTENT)
}
