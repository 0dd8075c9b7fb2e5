//! Request extractors shared by the handlers.

use crate::services::UploadedFile;
use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
    Json,
};
use serde::de::DeserializeOwned;
use service_core::error::AppError;
use validator::Validate;

/// Name of the multipart part carrying the JSON body.
pub const REQUEST_PART: &str = "request";

/// JSON body that has passed `validator` checks.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Json parse error: {}", e)))?;

        value.validate()?;

        Ok(ValidatedJson(value))
    }
}

/// Reads a multipart form made of a JSON `request` part and an optional file
/// part named `file_field`. An empty file part counts as absent.
pub async fn read_multipart<T>(
    mut multipart: Multipart,
    file_field: &str,
) -> Result<(T, Option<UploadedFile>), AppError>
where
    T: DeserializeOwned + Validate,
{
    let mut request: Option<T> = None;
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(anyhow::anyhow!("Failed to read multipart field: {}", e))
    })? {
        let name = field.name().unwrap_or_default().to_string();

        if name == REQUEST_PART {
            let bytes = field.bytes().await.map_err(|e| {
                AppError::BadRequest(anyhow::anyhow!("Failed to read request part: {}", e))
            })?;
            let value: T = serde_json::from_slice(&bytes).map_err(|e| {
                AppError::BadRequest(anyhow::anyhow!("Json parse error: {}", e))
            })?;
            request = Some(value);
        } else if name == file_field {
            let file_name = field.file_name().unwrap_or("unnamed").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field.bytes().await.map_err(|e| {
                AppError::BadRequest(anyhow::anyhow!("Failed to read file bytes: {}", e))
            })?;

            if !data.is_empty() {
                file = Some(UploadedFile {
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
            }
        }
    }

    let request = request.ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!("Missing '{}' part", REQUEST_PART))
    })?;
    request.validate()?;

    Ok((request, file))
}
