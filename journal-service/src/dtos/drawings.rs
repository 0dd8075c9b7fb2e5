use crate::models::Drawing;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DrawingRequest {
    #[validate(length(min = 1, max = 100, message = "Drawing title must be 1-100 characters"))]
    pub drawing_title: String,

    #[validate(length(max = 2000, message = "Diary must be at most 2000 characters"))]
    pub drawing_diary: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingResponse {
    pub drawing_id: i64,
    pub drawing_box_id: i64,
    pub drawing_title: String,
    pub drawing_diary: Option<String>,
    pub drawing_image_path: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Drawing> for DrawingResponse {
    fn from(drawing: Drawing) -> Self {
        Self {
            drawing_id: drawing.drawing_id,
            drawing_box_id: drawing.drawing_box_id,
            drawing_title: drawing.drawing_title,
            drawing_diary: drawing.drawing_diary,
            drawing_image_path: drawing.drawing_image_path,
            created_at: drawing.created_at.to_rfc3339(),
            updated_at: drawing.updated_at.to_rfc3339(),
        }
    }
}
