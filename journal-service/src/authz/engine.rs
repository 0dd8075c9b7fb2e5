//! Family-ownership decision for requests touching family-scoped resources.

use super::registry::{ResourceRegistry, Resolution};
use super::resolvers::{
    Account, CredentialError, FamilyId, IdentityError, IdentityResolver, OwnershipError,
    ResourceReference, TokenVerifier,
};
use axum::http::Method;
use metrics::counter;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Missing, malformed or expired credential, or no matching account.
    Unauthenticated,
    ResourceNotFound,
    NotOwner,
    /// No recognized resource identifier on a non-creation request.
    MalformedRequest,
    /// A lookup failed or timed out.
    Unavailable,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::Unauthenticated => "unauthenticated",
            DenyReason::ResourceNotFound => "resource_not_found",
            DenyReason::NotOwner => "not_owner",
            DenyReason::MalformedRequest => "malformed_request",
            DenyReason::Unavailable => "unavailable",
        }
    }
}

/// Requester and resource, both resolved to the same family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyContext {
    pub account_id: i64,
    pub family_id: FamilyId,
    pub resource: ResourceReference,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationDecision {
    /// Creation requests have no prior owner to compare against.
    CreationBypass,
    Allowed(FamilyContext),
    Denied(DenyReason),
}

impl AuthorizationDecision {
    pub fn allow(&self) -> bool {
        !matches!(self, AuthorizationDecision::Denied(_))
    }

    pub fn reason(&self) -> &'static str {
        match self {
            AuthorizationDecision::CreationBypass => "creation_bypass",
            AuthorizationDecision::Allowed(_) => "same_family",
            AuthorizationDecision::Denied(reason) => reason.as_str(),
        }
    }
}

/// Authentication failure as seen by callers. Bad credentials and unknown
/// accounts collapse into one case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthnFailure {
    Unauthenticated,
    Unavailable,
}

impl From<AuthnFailure> for DenyReason {
    fn from(failure: AuthnFailure) -> Self {
        match failure {
            AuthnFailure::Unauthenticated => DenyReason::Unauthenticated,
            AuthnFailure::Unavailable => DenyReason::Unavailable,
        }
    }
}

/// Credential verification followed by account lookup, bounded by a timeout.
pub struct Authenticator {
    verifier: Arc<dyn TokenVerifier>,
    identities: Arc<dyn IdentityResolver>,
    lookup_timeout: Duration,
}

impl Authenticator {
    pub fn new(
        verifier: Arc<dyn TokenVerifier>,
        identities: Arc<dyn IdentityResolver>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            verifier,
            identities,
            lookup_timeout,
        }
    }

    pub async fn authenticate(&self, credential: Option<&str>) -> Result<Account, AuthnFailure> {
        let credential = credential
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                tracing::debug!(error = %CredentialError::Missing, "Rejecting request");
                AuthnFailure::Unauthenticated
            })?;

        let identity = match bounded(self.lookup_timeout, self.verifier.verify(credential)).await
        {
            Some(Ok(identity)) => identity,
            Some(Err(e)) => {
                tracing::debug!(error = %e, "Credential verification failed");
                return Err(AuthnFailure::Unauthenticated);
            }
            None => {
                tracing::warn!("Credential verification timed out");
                return Err(AuthnFailure::Unavailable);
            }
        };

        match bounded(self.lookup_timeout, self.identities.resolve_account(&identity)).await {
            Some(Ok(account)) => Ok(account),
            Some(Err(IdentityError::NotFound)) => {
                tracing::debug!(provider = %identity.provider, "No account for verified identity");
                Err(AuthnFailure::Unauthenticated)
            }
            Some(Err(IdentityError::Unavailable(e))) => {
                tracing::error!(error = %e, "Identity lookup failed");
                Err(AuthnFailure::Unavailable)
            }
            None => {
                tracing::warn!("Identity lookup timed out");
                Err(AuthnFailure::Unavailable)
            }
        }
    }

    pub fn lookup_timeout(&self) -> Duration {
        self.lookup_timeout
    }
}

/// The policy gate run before every family-scoped endpoint.
pub struct AuthorizationEngine {
    registry: ResourceRegistry,
    authenticator: Arc<Authenticator>,
}

impl AuthorizationEngine {
    pub fn new(registry: ResourceRegistry, authenticator: Arc<Authenticator>) -> Self {
        Self {
            registry,
            authenticator,
        }
    }

    pub fn authenticator(&self) -> &Arc<Authenticator> {
        &self.authenticator
    }

    pub fn is_creation_method(method: &Method) -> bool {
        *method == Method::POST
    }

    #[instrument(skip_all, fields(method = %method))]
    pub async fn decide(
        &self,
        method: &Method,
        path_params: &HashMap<String, String>,
        credential: Option<&str>,
    ) -> AuthorizationDecision {
        let decision = self.evaluate(method, path_params, credential).await;

        let outcome = if decision.allow() { "allow" } else { "deny" };
        counter!(
            "authz_decisions_total",
            "outcome" => outcome,
            "reason" => decision.reason()
        )
        .increment(1);

        decision
    }

    async fn evaluate(
        &self,
        method: &Method,
        path_params: &HashMap<String, String>,
        credential: Option<&str>,
    ) -> AuthorizationDecision {
        if Self::is_creation_method(method) {
            return AuthorizationDecision::CreationBypass;
        }

        let (reference, resolver) = match self.registry.resolve_kind(path_params) {
            Resolution::Resolved {
                reference,
                resolver,
            } => (reference, resolver),
            Resolution::InvalidId { param, value } => {
                tracing::warn!(param = %param, value = %value, "Resource id is not numeric");
                return AuthorizationDecision::Denied(DenyReason::MalformedRequest);
            }
            Resolution::NotApplicable => {
                let recognized: Vec<&str> = self.registry.parameters().map(|(p, _)| p).collect();
                tracing::error!(
                    params = ?path_params.keys().collect::<Vec<_>>(),
                    recognized = ?recognized,
                    "Family-scoped route exposes no recognized resource identifier"
                );
                return AuthorizationDecision::Denied(DenyReason::MalformedRequest);
            }
        };

        let account = match self.authenticator.authenticate(credential).await {
            Ok(account) => account,
            Err(failure) => {
                tracing::info!(resource = %reference.kind, id = reference.id, "Unauthenticated request");
                return AuthorizationDecision::Denied(failure.into());
            }
        };

        let owner = match bounded(
            self.authenticator.lookup_timeout(),
            resolver.resolve_owner_family(reference),
        )
        .await
        {
            Some(Ok(owner)) => owner,
            Some(Err(OwnershipError::NotFound(_))) => {
                tracing::info!(resource = %reference.kind, id = reference.id, "Resource not found");
                return AuthorizationDecision::Denied(DenyReason::ResourceNotFound);
            }
            Some(Err(OwnershipError::Unavailable(e))) => {
                tracing::error!(resource = %reference.kind, id = reference.id, error = %e, "Ownership lookup failed");
                return AuthorizationDecision::Denied(DenyReason::Unavailable);
            }
            None => {
                tracing::warn!(resource = %reference.kind, id = reference.id, "Ownership lookup timed out");
                return AuthorizationDecision::Denied(DenyReason::Unavailable);
            }
        };

        // An account without a family never matches, not even another empty one.
        match account.family_id {
            Some(family_id) if family_id == owner => {
                tracing::debug!(
                    account_id = account.account_id,
                    family_id = %family_id,
                    resource = %reference.kind,
                    id = reference.id,
                    "Access granted"
                );
                AuthorizationDecision::Allowed(FamilyContext {
                    account_id: account.account_id,
                    family_id,
                    resource: reference,
                })
            }
            requester => {
                tracing::warn!(
                    account_id = account.account_id,
                    requester_family = ?requester.map(|f| f.0),
                    owner_family = %owner,
                    resource = %reference.kind,
                    id = reference.id,
                    "Access denied: resource belongs to another family"
                );
                AuthorizationDecision::Denied(DenyReason::NotOwner)
            }
        }
    }
}

pub(crate) async fn bounded<F: Future>(limit: Duration, fut: F) -> Option<F::Output> {
    tokio::time::timeout(limit, fut).await.ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::resolvers::{Identity, OwnershipResolver, ResourceKind};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const F1: FamilyId = FamilyId(1);
    const F2: FamilyId = FamilyId(2);

    struct StaticVerifier;

    #[async_trait]
    impl TokenVerifier for StaticVerifier {
        async fn verify(&self, credential: &str) -> Result<Identity, CredentialError> {
            match credential.strip_prefix("token-") {
                Some(email) => Ok(Identity {
                    email: email.to_string(),
                    provider: "kakao".to_string(),
                }),
                None => Err(CredentialError::Invalid("unknown token".into())),
            }
        }
    }

    struct Accounts(HashMap<String, Option<FamilyId>>);

    #[async_trait]
    impl IdentityResolver for Accounts {
        async fn resolve_account(&self, identity: &Identity) -> Result<Account, IdentityError> {
            let family_id = self.0.get(&identity.email).ok_or(IdentityError::NotFound)?;
            Ok(Account {
                account_id: 10,
                identity: identity.clone(),
                family_id: *family_id,
            })
        }
    }

    #[derive(Default)]
    struct Owners {
        families: HashMap<(ResourceKind, i64), FamilyId>,
        consulted: Mutex<Vec<ResourceReference>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl OwnershipResolver for Owners {
        async fn resolve_owner_family(
            &self,
            resource: ResourceReference,
        ) -> Result<FamilyId, OwnershipError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.consulted.lock().unwrap().push(resource);
            self.families
                .get(&(resource.kind, resource.id))
                .copied()
                .ok_or(OwnershipError::NotFound(resource))
        }
    }

    struct Hanging;

    #[async_trait]
    impl OwnershipResolver for Hanging {
        async fn resolve_owner_family(
            &self,
            _resource: ResourceReference,
        ) -> Result<FamilyId, OwnershipError> {
            std::future::pending().await
        }
    }

    struct Broken;

    #[async_trait]
    impl OwnershipResolver for Broken {
        async fn resolve_owner_family(
            &self,
            _resource: ResourceReference,
        ) -> Result<FamilyId, OwnershipError> {
            Err(OwnershipError::Unavailable(anyhow::anyhow!("connection refused")))
        }
    }

    fn engine_with(owners: Arc<dyn OwnershipResolver>) -> AuthorizationEngine {
        let accounts = Accounts(HashMap::from([
            ("mom@example.com".to_string(), Some(F1)),
            ("orphan@example.com".to_string(), None),
        ]));
        let authenticator = Authenticator::new(
            Arc::new(StaticVerifier),
            Arc::new(accounts),
            Duration::from_millis(200),
        );
        AuthorizationEngine::new(ResourceRegistry::standard(owners), Arc::new(authenticator))
    }

    fn owners(entries: &[(ResourceKind, i64, FamilyId)]) -> Arc<Owners> {
        Arc::new(Owners {
            families: entries.iter().map(|(k, id, f)| ((*k, *id), *f)).collect(),
            ..Default::default()
        })
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    const MOM: Option<&str> = Some("token-mom@example.com");

    #[tokio::test]
    async fn creation_requests_bypass_every_check() {
        let owners = owners(&[]);
        let engine = engine_with(owners.clone());

        for path in [params(&[]), params(&[("drawingId", "42")]), params(&[("x", "y")])] {
            for credential in [None, Some("garbage"), MOM] {
                let decision = engine.decide(&Method::POST, &path, credential).await;
                assert_eq!(decision, AuthorizationDecision::CreationBypass);
                assert!(decision.allow());
            }
        }
        assert_eq!(owners.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn same_family_is_allowed() {
        let engine = engine_with(owners(&[(ResourceKind::Drawing, 42, F1)]));
        let decision = engine
            .decide(&Method::GET, &params(&[("drawingId", "42")]), MOM)
            .await;

        assert_eq!(
            decision,
            AuthorizationDecision::Allowed(FamilyContext {
                account_id: 10,
                family_id: F1,
                resource: ResourceReference {
                    kind: ResourceKind::Drawing,
                    id: 42
                },
            })
        );
    }

    #[tokio::test]
    async fn other_family_is_denied_as_not_owner() {
        let engine = engine_with(owners(&[(ResourceKind::Drawing, 42, F2)]));
        let decision = engine
            .decide(&Method::DELETE, &params(&[("drawingId", "42")]), MOM)
            .await;
        assert_eq!(decision, AuthorizationDecision::Denied(DenyReason::NotOwner));
        assert!(!decision.allow());
    }

    #[tokio::test]
    async fn missing_resource_is_denied() {
        let engine = engine_with(owners(&[]));
        let decision = engine
            .decide(&Method::GET, &params(&[("drawingId", "42")]), MOM)
            .await;
        assert_eq!(
            decision,
            AuthorizationDecision::Denied(DenyReason::ResourceNotFound)
        );
    }

    #[tokio::test]
    async fn no_recognized_identifier_is_malformed() {
        let engine = engine_with(owners(&[]));
        for path in [params(&[]), params(&[("boardId", "3")]), params(&[("kidId", "x1")])] {
            let decision = engine.decide(&Method::PUT, &path, MOM).await;
            assert_eq!(
                decision,
                AuthorizationDecision::Denied(DenyReason::MalformedRequest)
            );
        }
    }

    #[tokio::test]
    async fn bad_credentials_are_unauthenticated_even_for_missing_resources() {
        let owners = owners(&[]);
        let engine = engine_with(owners.clone());
        let path = params(&[("drawingId", "999")]);

        for credential in [None, Some(""), Some("   "), Some("garbage"), Some("token-stranger@example.com")] {
            let decision = engine.decide(&Method::GET, &path, credential).await;
            assert_eq!(
                decision,
                AuthorizationDecision::Denied(DenyReason::Unauthenticated)
            );
        }
        assert_eq!(owners.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn account_without_family_is_never_allowed() {
        let engine = engine_with(owners(&[(ResourceKind::Kid, 5, F1)]));
        let decision = engine
            .decide(
                &Method::GET,
                &params(&[("kidId", "5")]),
                Some("token-orphan@example.com"),
            )
            .await;
        assert_eq!(decision, AuthorizationDecision::Denied(DenyReason::NotOwner));
    }

    #[tokio::test]
    async fn precedence_decides_and_other_ids_are_not_consulted() {
        let owners = owners(&[
            (ResourceKind::Drawing, 1, F2),
            (ResourceKind::DrawingBox, 2, F1),
            (ResourceKind::Kid, 3, F1),
        ]);
        let engine = engine_with(owners.clone());

        let decision = engine
            .decide(
                &Method::PUT,
                &params(&[("kidId", "3"), ("drawingBoxId", "2"), ("drawingId", "1")]),
                MOM,
            )
            .await;

        assert_eq!(decision, AuthorizationDecision::Denied(DenyReason::NotOwner));
        assert_eq!(
            *owners.consulted.lock().unwrap(),
            vec![ResourceReference {
                kind: ResourceKind::Drawing,
                id: 1
            }]
        );
    }

    #[tokio::test]
    async fn hanging_lookup_fails_closed() {
        let engine = engine_with(Arc::new(Hanging));
        let decision = engine
            .decide(&Method::GET, &params(&[("kidId", "5")]), MOM)
            .await;
        assert_eq!(decision, AuthorizationDecision::Denied(DenyReason::Unavailable));
    }

    #[tokio::test]
    async fn broken_lookup_fails_closed() {
        let engine = engine_with(Arc::new(Broken));
        let decision = engine
            .decide(&Method::GET, &params(&[("drawingBoxId", "5")]), MOM)
            .await;
        assert_eq!(decision, AuthorizationDecision::Denied(DenyReason::Unavailable));
    }
}
