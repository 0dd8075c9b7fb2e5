use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Kid {
    pub kid_id: i64,
    pub family_id: i64,
    pub kid_name: String,
    pub kid_birth: NaiveDate,
    pub kid_profile_image: String,
    pub created_at: DateTime<Utc>,
}

/// Input for registering a kid.
#[derive(Debug, Clone)]
pub struct CreateKid {
    pub family_id: i64,
    pub kid_name: String,
    pub kid_birth: NaiveDate,
    pub kid_profile_image: String,
}

/// Input for updating a kid. The profile image is kept when `None`.
#[derive(Debug, Clone)]
pub struct UpdateKid {
    pub kid_name: String,
    pub kid_birth: NaiveDate,
    pub kid_profile_image: Option<String>,
}
