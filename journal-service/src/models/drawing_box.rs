use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Every kid starts with one `Basic` and one `Diary` box; those two cannot be
/// deleted. Boxes created later are `Custom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoxCategory {
    Basic,
    Diary,
    Custom,
}

impl BoxCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoxCategory::Basic => "basic",
            BoxCategory::Diary => "diary",
            BoxCategory::Custom => "custom",
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, BoxCategory::Basic | BoxCategory::Diary)
    }

    /// Boxes created alongside every new kid.
    pub fn defaults() -> [(&'static str, BoxCategory); 2] {
        [
            ("Basic", BoxCategory::Basic),
            ("Picture diary", BoxCategory::Diary),
        ]
    }
}

impl std::str::FromStr for BoxCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(BoxCategory::Basic),
            "diary" => Ok(BoxCategory::Diary),
            "custom" => Ok(BoxCategory::Custom),
            _ => Err(format!("Invalid drawing box category: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DrawingBox {
    pub drawing_box_id: i64,
    pub kid_id: i64,
    pub drawing_box_name: String,
    pub drawing_box_category: String,
    pub created_at: DateTime<Utc>,
}
