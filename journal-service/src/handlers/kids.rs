use super::extract::read_multipart;
use crate::authz::{AuthUser, FamilyContext};
use crate::dtos::{KidRequest, KidResponse};
use crate::models::{CreateKid, UpdateKid};
use crate::startup::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use service_core::error::AppError;

pub const PROFILE_IMAGE_PART: &str = "profileImage";

/// Registers a kid in the caller's family.
pub async fn create_kid(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let family_id = user.require_family()?;
    let (req, image) = read_multipart::<KidRequest>(multipart, PROFILE_IMAGE_PART).await?;

    let kid_profile_image = match image {
        Some(file) => state.storage.upload_and_get_url(file).await?,
        None => String::new(),
    };

    let (kid, drawing_boxes) = state
        .db
        .create_kid(&CreateKid {
            family_id: family_id.0,
            kid_name: req.kid_name,
            kid_birth: req.kid_birth,
            kid_profile_image,
        })
        .await?;

    tracing::info!(
        kid_id = kid.kid_id,
        family_id = %family_id,
        account_id = user.account_id(),
        "Kid created"
    );

    Ok((StatusCode::CREATED, Json(KidResponse::new(kid, drawing_boxes))))
}

pub async fn get_kid(
    State(state): State<AppState>,
    Extension(family): Extension<FamilyContext>,
    Path(kid_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let kid = state
        .db
        .find_kid(kid_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Kid not found")))?;
    let drawing_boxes = state.db.list_drawing_boxes(kid_id).await?;

    tracing::debug!(kid_id = kid_id, family_id = %family.family_id, "Kid loaded");

    Ok(Json(KidResponse::new(kid, drawing_boxes)))
}

/// Updates name and birth date; the profile image changes only when a new one
/// is uploaded.
pub async fn update_kid(
    State(state): State<AppState>,
    Extension(family): Extension<FamilyContext>,
    Path(kid_id): Path<i64>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let (req, image) = read_multipart::<KidRequest>(multipart, PROFILE_IMAGE_PART).await?;

    let kid_profile_image = match image {
        Some(file) => Some(state.storage.upload_and_get_url(file).await?),
        None => None,
    };

    let kid = state
        .db
        .update_kid(
            kid_id,
            &UpdateKid {
                kid_name: req.kid_name,
                kid_birth: req.kid_birth,
                kid_profile_image,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Kid not found")))?;
    let drawing_boxes = state.db.list_drawing_boxes(kid_id).await?;

    tracing::info!(kid_id = kid_id, family_id = %family.family_id, "Kid updated");

    Ok(Json(KidResponse::new(kid, drawing_boxes)))
}

pub async fn delete_kid(
    State(state): State<AppState>,
    Extension(family): Extension<FamilyContext>,
    Path(kid_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !state.db.delete_kid(kid_id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Kid not found")));
    }

    tracing::info!(kid_id = kid_id, family_id = %family.family_id, "Kid deleted");

    Ok(StatusCode::NO_CONTENT)
}
