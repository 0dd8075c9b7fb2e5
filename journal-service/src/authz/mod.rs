//! Family-ownership authorization.
//!
//! A request that touches a drawing, drawing box or kid is allowed only when
//! the caller's family, derived from their bearer credential, owns the
//! resource named in the path. Creation requests are exempt: the resource does
//! not exist yet, so the handler binds it to the caller's family itself.
//!
//! The gate fails closed: credential, account and ownership lookups that fail
//! or time out all end in a denial.

pub mod engine;
pub mod gate;
pub mod registry;
pub mod resolvers;

pub use engine::{
    AuthnFailure, AuthorizationDecision, AuthorizationEngine, Authenticator, DenyReason,
    FamilyContext,
};
pub use gate::{extract_credential, ownership_gate, AuthUser};
pub use registry::{ResourceRegistry, Resolution};
pub use resolvers::{
    Account, CredentialError, FamilyId, Identity, IdentityError, IdentityResolver,
    OwnershipError, OwnershipResolver, ResourceKind, ResourceReference, TokenVerifier,
};
