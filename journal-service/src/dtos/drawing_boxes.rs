use super::drawings::DrawingResponse;
use crate::models::{Drawing, DrawingBox};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DrawingBoxRequest {
    #[validate(length(min = 1, max = 30, message = "Drawing box name must be 1-30 characters"))]
    pub drawing_box_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingBoxResponse {
    pub drawing_box_id: i64,
    pub kid_id: i64,
    pub drawing_box_name: String,
    pub drawing_box_category: String,
}

impl From<DrawingBox> for DrawingBoxResponse {
    fn from(drawing_box: DrawingBox) -> Self {
        Self {
            drawing_box_id: drawing_box.drawing_box_id,
            kid_id: drawing_box.kid_id,
            drawing_box_name: drawing_box.drawing_box_name,
            drawing_box_category: drawing_box.drawing_box_category,
        }
    }
}

/// A drawing box together with the drawings filed in it, newest first.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingBoxDetailResponse {
    #[serde(flatten)]
    pub drawing_box: DrawingBoxResponse,
    pub drawings: Vec<DrawingResponse>,
}

impl DrawingBoxDetailResponse {
    pub fn new(drawing_box: DrawingBox, drawings: Vec<Drawing>) -> Self {
        Self {
            drawing_box: drawing_box.into(),
            drawings: drawings.into_iter().map(DrawingResponse::from).collect(),
        }
    }
}
