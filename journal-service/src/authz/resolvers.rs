//! Contracts for the lookups the authorization gate depends on.
//!
//! Each trait is implemented by an infrastructure service (JWT verification,
//! the PostgreSQL repository) and by in-memory fakes in tests.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Family id: the access-isolation boundary. Compared by value only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FamilyId(pub i64);

impl fmt::Display for FamilyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Claims extracted from a verified credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub provider: String,
}

/// Account resolved from an identity. `family_id` is absent for accounts that
/// have not joined a family yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub account_id: i64,
    pub identity: Identity,
    pub family_id: Option<FamilyId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Drawing,
    DrawingBox,
    Kid,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Drawing => "drawing",
            ResourceKind::DrawingBox => "drawing_box",
            ResourceKind::Kid => "kid",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed `{kind, id}` pair taken from one request's path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResourceReference {
    pub kind: ResourceKind,
    pub id: i64,
}

impl ResourceReference {
    pub fn new(kind: ResourceKind, id: i64) -> Self {
        Self { kind, id }
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Credential missing")]
    Missing,

    #[error("Invalid credential: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("No account matches the verified identity")]
    NotFound,

    #[error("Identity lookup failed: {0}")]
    Unavailable(anyhow::Error),
}

#[derive(Debug, Error)]
pub enum OwnershipError {
    #[error("{} {} not found", .0.kind, .0.id)]
    NotFound(ResourceReference),

    #[error("Ownership lookup failed: {0}")]
    Unavailable(anyhow::Error),
}

/// Validates an opaque credential and extracts the identity it carries.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<Identity, CredentialError>;
}

/// Maps a verified identity to its account record.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve_account(&self, identity: &Identity) -> Result<Account, IdentityError>;
}

/// Maps a resource to the family that owns it.
#[async_trait]
pub trait OwnershipResolver: Send + Sync {
    async fn resolve_owner_family(
        &self,
        resource: ResourceReference,
    ) -> Result<FamilyId, OwnershipError>;
}
