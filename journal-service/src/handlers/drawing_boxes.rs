use super::ensure_family_owns;
use super::extract::ValidatedJson;
use crate::authz::{AuthUser, FamilyContext, ResourceKind, ResourceReference};
use crate::dtos::{DrawingBoxDetailResponse, DrawingBoxRequest, DrawingBoxResponse};
use crate::models::{BoxCategory, DrawingBox};
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use service_core::error::AppError;

/// Adds a custom drawing box to a kid of the caller's family.
pub async fn create_drawing_box(
    State(state): State<AppState>,
    user: AuthUser,
    Path(kid_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<DrawingBoxRequest>,
) -> Result<impl IntoResponse, AppError> {
    let family_id = user.require_family()?;
    ensure_family_owns(
        &state.db,
        state.config.authz.lookup_timeout(),
        family_id,
        ResourceReference::new(ResourceKind::Kid, kid_id),
    )
    .await?;

    let drawing_box = state
        .db
        .create_drawing_box(kid_id, &req.drawing_box_name, BoxCategory::Custom)
        .await?;

    tracing::info!(
        drawing_box_id = drawing_box.drawing_box_id,
        kid_id = kid_id,
        "Drawing box created"
    );

    Ok((StatusCode::CREATED, Json(DrawingBoxResponse::from(drawing_box))))
}

pub async fn get_drawing_box(
    State(state): State<AppState>,
    Extension(_family): Extension<FamilyContext>,
    Path(drawing_box_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let drawing_box = state
        .db
        .find_drawing_box(drawing_box_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Drawing box not found")))?;
    let drawings = state.db.list_drawings(drawing_box_id).await?;

    Ok(Json(DrawingBoxDetailResponse::new(drawing_box, drawings)))
}

pub async fn rename_drawing_box(
    State(state): State<AppState>,
    Extension(_family): Extension<FamilyContext>,
    Path(drawing_box_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<DrawingBoxRequest>,
) -> Result<impl IntoResponse, AppError> {
    let drawing_box = state
        .db
        .rename_drawing_box(drawing_box_id, &req.drawing_box_name)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Drawing box not found")))?;

    Ok(Json(DrawingBoxResponse::from(drawing_box)))
}

/// Deletes a custom box and its drawings. Default boxes stay.
pub async fn delete_drawing_box(
    State(state): State<AppState>,
    Extension(family): Extension<FamilyContext>,
    Path(drawing_box_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !state.db.delete_custom_drawing_box(drawing_box_id).await? {
        let existing = state.db.find_drawing_box(drawing_box_id).await?;
        return Err(delete_refusal(existing.as_ref()));
    }

    tracing::info!(
        drawing_box_id = drawing_box_id,
        family_id = %family.family_id,
        "Drawing box deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Why a delete matched no row: the box is gone, or it is not a custom box.
fn delete_refusal(existing: Option<&DrawingBox>) -> AppError {
    match existing {
        None => AppError::NotFound(anyhow::anyhow!("Drawing box not found")),
        Some(_) => AppError::Conflict(anyhow::anyhow!(
            "Only custom drawing boxes can be deleted"
        )),
    }
}
