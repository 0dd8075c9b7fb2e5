//! Axum glue for the ownership gate and the authenticated-caller extractor.

use super::engine::{AuthnFailure, AuthorizationDecision, AuthorizationEngine, Authenticator, DenyReason};
use super::resolvers::{Account, FamilyId};
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, RawPathParams, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;

/// Header used by older clients instead of `Authorization`. They send it as
/// `accessToken`; header names compare case-insensitively.
pub const LEGACY_TOKEN_HEADER: &str = "accesstoken";

/// Bearer token from `Authorization`, falling back to the legacy header.
pub fn extract_credential(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
        });

    bearer.or_else(|| {
        headers
            .get(LEGACY_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
    })
}

impl From<DenyReason> for AppError {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::Unauthenticated => {
                AppError::Unauthorized(anyhow::anyhow!("Missing or invalid credential"))
            }
            DenyReason::NotOwner => AppError::Forbidden(anyhow::anyhow!(
                "Resource belongs to another family"
            )),
            DenyReason::ResourceNotFound => {
                AppError::NotFound(anyhow::anyhow!("Resource not found"))
            }
            DenyReason::MalformedRequest => AppError::BadRequest(anyhow::anyhow!(
                "Request does not identify a family resource"
            )),
            DenyReason::Unavailable => AppError::ServiceUnavailable,
        }
    }
}

/// Route layer for family-scoped endpoints. Must be attached with
/// `route_layer` so path parameters are already matched.
pub async fn ownership_gate(
    State(engine): State<Arc<AuthorizationEngine>>,
    path: Option<RawPathParams>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path_params: HashMap<String, String> = path
        .map(|params| {
            params
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect()
        })
        .unwrap_or_default();

    let decision = engine
        .decide(
            req.method(),
            &path_params,
            extract_credential(req.headers()),
        )
        .await;

    match decision {
        AuthorizationDecision::CreationBypass => Ok(next.run(req).await),
        AuthorizationDecision::Allowed(context) => {
            req.extensions_mut().insert(context);
            Ok(next.run(req).await)
        }
        AuthorizationDecision::Denied(reason) => Err(reason.into()),
    }
}

/// Verified caller, for endpoints outside the ownership gate and for
/// creation requests the gate lets through.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Account);

impl AuthUser {
    pub fn account_id(&self) -> i64 {
        self.0.account_id
    }

    /// Family of the caller; callers without one may not touch family data.
    pub fn require_family(&self) -> Result<FamilyId, AppError> {
        self.0.family_id.ok_or_else(|| {
            AppError::Forbidden(anyhow::anyhow!("Account is not a member of any family"))
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    Arc<Authenticator>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let authenticator = Arc::<Authenticator>::from_ref(state);
        let account = authenticator
            .authenticate(extract_credential(&parts.headers))
            .await
            .map_err(|failure: AuthnFailure| AppError::from(DenyReason::from(failure)))?;

        tracing::Span::current().record("account_id", account.account_id);
        Ok(AuthUser(account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};

    #[test]
    fn bearer_header_takes_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(LEGACY_TOKEN_HEADER, HeaderValue::from_static("legacy"));
        assert_eq!(extract_credential(&headers), Some("abc"));
    }

    #[test]
    fn legacy_header_is_accepted() {
        let mut headers = HeaderMap::new();
        headers.insert(LEGACY_TOKEN_HEADER, HeaderValue::from_static("legacy"));
        assert_eq!(extract_credential(&headers), Some("legacy"));
    }

    #[test]
    fn non_bearer_authorization_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(extract_credential(&headers), None);
    }

    #[test]
    fn deny_reasons_map_to_client_errors() {
        let cases = [
            (DenyReason::Unauthenticated, StatusCode::UNAUTHORIZED),
            (DenyReason::NotOwner, StatusCode::FORBIDDEN),
            (DenyReason::ResourceNotFound, StatusCode::NOT_FOUND),
            (DenyReason::MalformedRequest, StatusCode::BAD_REQUEST),
            (DenyReason::Unavailable, StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (reason, status) in cases {
            assert_eq!(AppError::from(reason).status_code(), status);
        }
    }
}
