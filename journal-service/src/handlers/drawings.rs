use super::ensure_family_owns;
use super::extract::{read_multipart, ValidatedJson};
use crate::authz::{AuthUser, FamilyContext, ResourceKind, ResourceReference};
use crate::dtos::{DrawingRequest, DrawingResponse};
use crate::models::{CreateDrawing, UpdateDrawing};
use crate::startup::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use service_core::error::AppError;

pub const IMAGE_PART: &str = "image";

/// Uploads a drawing into a box of the caller's family.
pub async fn create_drawing(
    State(state): State<AppState>,
    user: AuthUser,
    Path(drawing_box_id): Path<i64>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let family_id = user.require_family()?;
    ensure_family_owns(
        &state.db,
        state.config.authz.lookup_timeout(),
        family_id,
        ResourceReference::new(ResourceKind::DrawingBox, drawing_box_id),
    )
    .await?;

    let (req, image) = read_multipart::<DrawingRequest>(multipart, IMAGE_PART).await?;
    let image =
        image.ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Drawing image is required")))?;
    let drawing_image_path = state.storage.upload_and_get_url(image).await?;

    let drawing = state
        .db
        .create_drawing(&CreateDrawing {
            drawing_box_id,
            drawing_title: req.drawing_title,
            drawing_diary: req.drawing_diary,
            drawing_image_path,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(DrawingResponse::from(drawing))))
}

pub async fn get_drawing(
    State(state): State<AppState>,
    Extension(_family): Extension<FamilyContext>,
    Path(drawing_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let drawing = state
        .db
        .find_drawing(drawing_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Drawing not found")))?;

    Ok(Json(DrawingResponse::from(drawing)))
}

pub async fn update_drawing(
    State(state): State<AppState>,
    Extension(_family): Extension<FamilyContext>,
    Path(drawing_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<DrawingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let drawing = state
        .db
        .update_drawing(
            drawing_id,
            &UpdateDrawing {
                drawing_title: req.drawing_title,
                drawing_diary: req.drawing_diary,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Drawing not found")))?;

    Ok(Json(DrawingResponse::from(drawing)))
}

/// Files a drawing under another box. The gate has authorized the drawing;
/// the target box must belong to the same family.
pub async fn move_drawing(
    State(state): State<AppState>,
    Extension(family): Extension<FamilyContext>,
    Path((drawing_id, drawing_box_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    ensure_family_owns(
        &state.db,
        state.config.authz.lookup_timeout(),
        family.family_id,
        ResourceReference::new(ResourceKind::DrawingBox, drawing_box_id),
    )
    .await?;

    let drawing = state
        .db
        .move_drawing(drawing_id, drawing_box_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Drawing not found")))?;

    tracing::info!(
        drawing_id = drawing_id,
        drawing_box_id = drawing_box_id,
        "Drawing moved"
    );

    Ok(Json(DrawingResponse::from(drawing)))
}

pub async fn delete_drawing(
    State(state): State<AppState>,
    Extension(family): Extension<FamilyContext>,
    Path(drawing_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !state.db.delete_drawing(drawing_id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Drawing not found")));
    }

    tracing::info!(drawing_id = drawing_id, family_id = %family.family_id, "Drawing deleted");

    Ok(StatusCode::NO_CONTENT)
}
