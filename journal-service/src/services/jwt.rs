use crate::authz::{CredentialError, Identity, TokenVerifier};
use crate::config::JwtConfig;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Verifies (and, for tooling and tests, issues) HS256 access tokens.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: Option<String>,
    access_token_expiry_minutes: i64,
}

/// Claims carried by access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (account email)
    pub sub: String,
    /// Login provider the email belongs to, e.g. "kakao" or "google"
    pub provider: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    pub jti: String,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Result<Self, anyhow::Error> {
        let secret = config.secret.expose_secret();
        if secret.len() < 16 {
            anyhow::bail!("JWT secret must be at least 16 bytes");
        }

        tracing::info!(issuer = ?config.issuer, "JWT service initialized with HS256 key");

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: config.issuer.clone(),
            access_token_expiry_minutes: config.access_token_expiry_minutes,
        })
    }

    pub fn generate_access_token(&self, email: &str, provider: &str) -> Result<String, anyhow::Error> {
        self.generate_access_token_valid_for(
            email,
            provider,
            Duration::minutes(self.access_token_expiry_minutes),
        )
    }

    /// Issues a token with an explicit lifetime; a negative lifetime yields an
    /// already-expired token.
    pub fn generate_access_token_valid_for(
        &self,
        email: &str,
        provider: &str,
        lifetime: Duration,
    ) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: email.to_string(),
            provider: provider.to_string(),
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode access token: {}", e))
    }

    pub fn validate_access_token(
        &self,
        token: &str,
    ) -> Result<AccessTokenClaims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }

        Ok(decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)?.claims)
    }
}

#[async_trait]
impl TokenVerifier for JwtService {
    async fn verify(&self, credential: &str) -> Result<Identity, CredentialError> {
        let claims = self
            .validate_access_token(credential)
            .map_err(|e| CredentialError::Invalid(e.to_string()))?;

        if claims.sub.is_empty() || claims.provider.is_empty() {
            return Err(CredentialError::Invalid(
                "token is missing subject or provider".to_string(),
            ));
        }

        Ok(Identity {
            email: claims.sub,
            provider: claims.provider,
        })
    }
}
