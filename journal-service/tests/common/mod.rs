#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Response;
use http_body_util::BodyExt;
use journal_service::authz::{
    Account, Authenticator, AuthorizationEngine, FamilyId, Identity, IdentityError,
    IdentityResolver, OwnershipError, OwnershipResolver, ResourceKind, ResourceReference,
    ResourceRegistry,
};
use journal_service::config::JwtConfig;
use journal_service::services::JwtService;
use secrecy::Secret;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const TEST_SECRET: &str = "journal-test-secret-0123456789";
pub const PROVIDER: &str = "kakao";

pub const MOM: &str = "mom@family-one.test";
pub const AUNT: &str = "aunt@family-two.test";
pub const LODGER: &str = "lodger@nowhere.test";

pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: Secret::new(TEST_SECRET.to_string()),
        issuer: None,
        access_token_expiry_minutes: 15,
    }
}

pub fn jwt() -> JwtService {
    JwtService::new(&jwt_config()).unwrap()
}

pub fn token_for(email: &str) -> String {
    jwt().generate_access_token(email, PROVIDER).unwrap()
}

/// Accounts and resource owners held in memory.
#[derive(Default)]
pub struct Directory {
    accounts: HashMap<String, Account>,
    owners: HashMap<(ResourceKind, i64), FamilyId>,
}

impl Directory {
    /// Family 1: MOM, kid 10, box 20, drawing 30.
    /// Family 2: AUNT, kid 11, box 21, drawing 31.
    /// LODGER has an account but no family.
    pub fn two_families() -> Self {
        let mut directory = Directory::default();
        directory.add_account(1, MOM, Some(FamilyId(1)));
        directory.add_account(2, AUNT, Some(FamilyId(2)));
        directory.add_account(3, LODGER, None);

        directory.add_owner(ResourceKind::Kid, 10, FamilyId(1));
        directory.add_owner(ResourceKind::DrawingBox, 20, FamilyId(1));
        directory.add_owner(ResourceKind::Drawing, 30, FamilyId(1));

        directory.add_owner(ResourceKind::Kid, 11, FamilyId(2));
        directory.add_owner(ResourceKind::DrawingBox, 21, FamilyId(2));
        directory.add_owner(ResourceKind::Drawing, 31, FamilyId(2));
        directory
    }

    pub fn add_account(&mut self, account_id: i64, email: &str, family_id: Option<FamilyId>) {
        self.accounts.insert(
            email.to_string(),
            Account {
                account_id,
                identity: Identity {
                    email: email.to_string(),
                    provider: PROVIDER.to_string(),
                },
                family_id,
            },
        );
    }

    pub fn add_owner(&mut self, kind: ResourceKind, id: i64, family_id: FamilyId) {
        self.owners.insert((kind, id), family_id);
    }
}

#[async_trait]
impl IdentityResolver for Directory {
    async fn resolve_account(&self, identity: &Identity) -> Result<Account, IdentityError> {
        self.accounts
            .get(&identity.email)
            .filter(|account| account.identity.provider == identity.provider)
            .cloned()
            .ok_or(IdentityError::NotFound)
    }
}

#[async_trait]
impl OwnershipResolver for Directory {
    async fn resolve_owner_family(
        &self,
        resource: ResourceReference,
    ) -> Result<FamilyId, OwnershipError> {
        self.owners
            .get(&(resource.kind, resource.id))
            .copied()
            .ok_or(OwnershipError::NotFound(resource))
    }
}

/// Ownership store that never answers.
pub struct Unresponsive;

#[async_trait]
impl OwnershipResolver for Unresponsive {
    async fn resolve_owner_family(
        &self,
        _resource: ResourceReference,
    ) -> Result<FamilyId, OwnershipError> {
        std::future::pending().await
    }
}

pub fn engine_with(
    directory: Arc<Directory>,
    owners: Arc<dyn OwnershipResolver>,
    lookup_timeout: Duration,
) -> Arc<AuthorizationEngine> {
    let authenticator = Arc::new(Authenticator::new(
        Arc::new(jwt()),
        directory,
        lookup_timeout,
    ));
    Arc::new(AuthorizationEngine::new(
        ResourceRegistry::standard(owners),
        authenticator,
    ))
}

pub fn engine() -> Arc<AuthorizationEngine> {
    let directory = Arc::new(Directory::two_families());
    engine_with(directory.clone(), directory, Duration::from_secs(1))
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
