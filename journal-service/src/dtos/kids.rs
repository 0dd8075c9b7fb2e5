use super::drawing_boxes::DrawingBoxResponse;
use crate::models::{DrawingBox, Kid};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// JSON carried in the `request` part of the kid multipart forms.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct KidRequest {
    #[validate(length(min = 1, max = 50, message = "Kid name must be 1-50 characters"))]
    pub kid_name: String,

    /// `YYYY-MM-DD`
    pub kid_birth: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KidResponse {
    pub kid_id: i64,
    pub kid_name: String,
    pub kid_birth: NaiveDate,
    pub kid_profile_image: String,
    pub drawing_boxes: Vec<DrawingBoxResponse>,
}

impl KidResponse {
    pub fn new(kid: Kid, drawing_boxes: Vec<DrawingBox>) -> Self {
        Self {
            kid_id: kid.kid_id,
            kid_name: kid.kid_name,
            kid_birth: kid.kid_birth,
            kid_profile_image: kid.kid_profile_image,
            drawing_boxes: drawing_boxes.into_iter().map(DrawingBoxResponse::from).collect(),
        }
    }
}
