use async_trait::async_trait;
use service_core::error::AppError;
use std::path::PathBuf;
use tokio::fs;
use uuid::Uuid;

/// An uploaded file as received from a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    /// Lowercased extension of the original file name, `bin` when absent.
    pub fn extension(&self) -> String {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_else(|| "bin".to_string())
    }
}

/// Object storage for profile pictures and drawings.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Stores the file and returns the URL clients load it from.
    async fn upload_and_get_url(&self, file: UploadedFile) -> Result<String, AppError>;
}

pub struct LocalStorage {
    base_path: PathBuf,
    public_base_url: String,
    max_upload_bytes: usize,
}

impl LocalStorage {
    pub async fn new(
        base_path: impl Into<PathBuf>,
        public_base_url: &str,
        max_upload_bytes: usize,
    ) -> Result<Self, AppError> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).await?;
        }
        Ok(Self {
            base_path,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            max_upload_bytes,
        })
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload_and_get_url(&self, file: UploadedFile) -> Result<String, AppError> {
        if file.data.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!("Uploaded file is empty")));
        }
        if file.data.len() > self.max_upload_bytes {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "File too large (max {} bytes)",
                self.max_upload_bytes
            )));
        }
        if !file.is_image() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Unsupported content type: {}",
                file.content_type
            )));
        }

        let key = format!("{}.{}", Uuid::new_v4(), file.extension());
        let size = file.data.len();
        fs::write(self.base_path.join(&key), file.data)
            .await
            .map_err(|e| {
                tracing::error!("Failed to write {} to storage: {}", key, e);
                AppError::from(e)
            })?;

        tracing::info!(key = %key, size = size, "File stored");

        Ok(format!("{}/{}", self.public_base_url, key))
    }
}
