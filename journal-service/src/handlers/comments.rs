use super::extract::ValidatedJson;
use crate::authz::AuthUser;
use crate::dtos::{CommentRequest, CommentResponse};
use crate::models::{Comment, CreateComment};
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

pub async fn create_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(board_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<CommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let comment = state
        .db
        .create_comment(&CreateComment {
            board_id,
            user_id: user.account_id(),
            comment_content: req.comment_content,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CommentResponse::from(comment))))
}

async fn authored_comment(
    state: &AppState,
    user: &AuthUser,
    comment_id: i64,
) -> Result<Comment, AppError> {
    let comment = state
        .db
        .find_comment(comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Comment not found")))?;

    if comment.user_id != user.account_id() {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "Only the author may modify this comment"
        )));
    }
    Ok(comment)
}

pub async fn update_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(comment_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<CommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    authored_comment(&state, &user, comment_id).await?;

    let comment = state
        .db
        .update_comment(comment_id, &req.comment_content)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Comment not found")))?;

    Ok(Json(CommentResponse::from(comment)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(comment_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let comment = authored_comment(&state, &user, comment_id).await?;

    if !state.db.delete_comment(comment_id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Comment not found")));
    }

    tracing::info!(
        comment_id = comment_id,
        board_id = comment.board_id,
        "Comment deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}
