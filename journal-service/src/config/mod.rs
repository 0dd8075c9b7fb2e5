use secrecy::Secret;
use serde::Deserialize;
use service_core::config::{self as core_config, get_env, get_env_parsed};
use service_core::error::AppError;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct JournalConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub authz: AuthzConfig,
    pub storage: StorageConfig,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    pub issuer: Option<String>,
    pub access_token_expiry_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthzConfig {
    pub lookup_timeout_ms: u64,
}

impl AuthzConfig {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub local_path: String,
    pub public_base_url: String,
    pub max_upload_bytes: usize,
}

impl JournalConfig {
    pub fn load() -> Result<Self, AppError> {
        // Handles .env and the APP__ prefix.
        let common = core_config::Config::load()?;
        let is_prod = common.is_prod();

        let default_base_url = format!("http://localhost:{}/files", common.port);

        Ok(JournalConfig {
            service_name: get_env("SERVICE_NAME", Some("journal-service"), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
            database: DatabaseConfig {
                url: Secret::new(get_env("DATABASE_URL", None, is_prod)?),
                max_connections: get_env_parsed("DATABASE_MAX_CONNECTIONS", Some("10"), is_prod)?,
                min_connections: get_env_parsed("DATABASE_MIN_CONNECTIONS", Some("1"), is_prod)?,
            },
            jwt: JwtConfig {
                secret: Secret::new(get_env("JWT_SECRET", None, is_prod)?),
                issuer: env::var("JWT_ISSUER").ok().filter(|v| !v.is_empty()),
                access_token_expiry_minutes: get_env_parsed(
                    "JWT_ACCESS_TOKEN_EXPIRY_MINUTES",
                    Some("60"),
                    is_prod,
                )?,
            },
            authz: AuthzConfig {
                lookup_timeout_ms: get_env_parsed("AUTHZ_LOOKUP_TIMEOUT_MS", Some("3000"), is_prod)?,
            },
            storage: StorageConfig {
                local_path: get_env("STORAGE_LOCAL_PATH", Some("storage"), is_prod)?,
                public_base_url: get_env(
                    "STORAGE_PUBLIC_BASE_URL",
                    Some(&default_base_url),
                    is_prod,
                )?,
                max_upload_bytes: get_env_parsed(
                    "MAX_UPLOAD_BYTES",
                    Some("10485760"),
                    is_prod,
                )?,
            },
            allowed_origins: get_env(
                "ALLOWED_ORIGINS",
                Some("http://localhost:3000"),
                is_prod,
            )?
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect(),
            common,
        })
    }
}
