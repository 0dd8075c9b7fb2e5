pub mod boards;
pub mod comments;
pub mod drawing_boxes;
pub mod drawings;
pub mod extract;
pub mod health;
pub mod kids;

pub use health::{health_check, metrics_endpoint, readiness_check};

use crate::authz::engine::bounded;
use crate::authz::{DenyReason, FamilyId, OwnershipError, OwnershipResolver, ResourceReference};
use service_core::error::AppError;
use std::time::Duration;

/// Ownership check for routes the gate lets through without one: creation
/// requests and the target of a move. Bounded by the same lookup timeout as
/// the gate.
pub async fn ensure_family_owns(
    owners: &dyn OwnershipResolver,
    lookup_timeout: Duration,
    family_id: FamilyId,
    resource: ResourceReference,
) -> Result<(), AppError> {
    let owner = match bounded(lookup_timeout, owners.resolve_owner_family(resource)).await {
        Some(Ok(owner)) => owner,
        Some(Err(OwnershipError::NotFound(_))) => {
            return Err(DenyReason::ResourceNotFound.into());
        }
        Some(Err(OwnershipError::Unavailable(err))) => {
            tracing::error!(error = %err, resource = %resource.kind, "Ownership lookup failed");
            return Err(DenyReason::Unavailable.into());
        }
        None => {
            tracing::error!(
                resource = %resource.kind,
                timeout_ms = lookup_timeout.as_millis() as u64,
                "Ownership lookup timed out"
            );
            return Err(DenyReason::Unavailable.into());
        }
    };

    if owner != family_id {
        tracing::warn!(
            resource = %resource.kind,
            resource_id = resource.id,
            "Cross-family access refused"
        );
        return Err(DenyReason::NotOwner.into());
    }
    Ok(())
}
