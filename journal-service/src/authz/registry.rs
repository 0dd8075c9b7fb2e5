//! Ordered table of path parameters that identify family-scoped resources.
//!
//! Registration order is precedence: when a path carries several recognized
//! parameters, the earliest entry decides and the rest are ignored.

use super::resolvers::{OwnershipResolver, ResourceKind, ResourceReference};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub const DRAWING_ID_PARAM: &str = "drawingId";
pub const DRAWING_BOX_ID_PARAM: &str = "drawingBoxId";
pub const KID_ID_PARAM: &str = "kidId";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Path parameter '{0}' registered twice")]
    DuplicateParameter(String),

    #[error("Registry has no entries")]
    Empty,
}

struct RegistryEntry {
    param: String,
    kind: ResourceKind,
    resolver: Arc<dyn OwnershipResolver>,
}

/// Outcome of matching a request's path parameters against the registry.
pub enum Resolution<'r> {
    Resolved {
        reference: ResourceReference,
        resolver: &'r dyn OwnershipResolver,
    },
    /// The winning parameter is present but its value is not an id.
    InvalidId {
        param: &'r str,
        value: String,
    },
    NotApplicable,
}

pub struct ResourceRegistry {
    entries: Vec<RegistryEntry>,
}

impl ResourceRegistry {
    pub fn builder() -> ResourceRegistryBuilder {
        ResourceRegistryBuilder {
            entries: Vec::new(),
        }
    }

    /// Drawing, then drawing box, then kid, all resolved by one resolver.
    pub fn standard(resolver: Arc<dyn OwnershipResolver>) -> Self {
        Self {
            entries: vec![
                RegistryEntry {
                    param: DRAWING_ID_PARAM.to_string(),
                    kind: ResourceKind::Drawing,
                    resolver: resolver.clone(),
                },
                RegistryEntry {
                    param: DRAWING_BOX_ID_PARAM.to_string(),
                    kind: ResourceKind::DrawingBox,
                    resolver: resolver.clone(),
                },
                RegistryEntry {
                    param: KID_ID_PARAM.to_string(),
                    kind: ResourceKind::Kid,
                    resolver,
                },
            ],
        }
    }

    pub fn resolve_kind(&self, path_params: &HashMap<String, String>) -> Resolution<'_> {
        for entry in &self.entries {
            let Some(raw) = path_params.get(&entry.param) else {
                continue;
            };
            return match raw.trim().parse::<i64>() {
                Ok(id) => Resolution::Resolved {
                    reference: ResourceReference {
                        kind: entry.kind,
                        id,
                    },
                    resolver: entry.resolver.as_ref(),
                },
                Err(_) => Resolution::InvalidId {
                    param: &entry.param,
                    value: raw.clone(),
                },
            };
        }
        Resolution::NotApplicable
    }

    /// Recognized parameter names in precedence order.
    pub fn parameters(&self) -> impl Iterator<Item = (&str, ResourceKind)> {
        self.entries.iter().map(|e| (e.param.as_str(), e.kind))
    }
}

pub struct ResourceRegistryBuilder {
    entries: Vec<RegistryEntry>,
}

impl ResourceRegistryBuilder {
    pub fn register(
        mut self,
        param: impl Into<String>,
        kind: ResourceKind,
        resolver: Arc<dyn OwnershipResolver>,
    ) -> Self {
        self.entries.push(RegistryEntry {
            param: param.into(),
            kind,
            resolver,
        });
        self
    }

    pub fn build(self) -> Result<ResourceRegistry, RegistryError> {
        if self.entries.is_empty() {
            return Err(RegistryError::Empty);
        }
        for (i, entry) in self.entries.iter().enumerate() {
            if self.entries[..i].iter().any(|e| e.param == entry.param) {
                return Err(RegistryError::DuplicateParameter(entry.param.clone()));
            }
        }
        Ok(ResourceRegistry {
            entries: self.entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::resolvers::{FamilyId, OwnershipError};
    use async_trait::async_trait;

    struct NoopResolver;

    #[async_trait]
    impl OwnershipResolver for NoopResolver {
        async fn resolve_owner_family(
            &self,
            resource: ResourceReference,
        ) -> Result<FamilyId, OwnershipError> {
            Err(OwnershipError::NotFound(resource))
        }
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn resolved(resolution: Resolution<'_>) -> Option<ResourceReference> {
        match resolution {
            Resolution::Resolved { reference, .. } => Some(reference),
            _ => None,
        }
    }

    #[test]
    fn resolves_single_parameter() {
        let registry = ResourceRegistry::standard(Arc::new(NoopResolver));
        let reference = resolved(registry.resolve_kind(&params(&[("kidId", "7")])));
        assert_eq!(
            reference,
            Some(ResourceReference {
                kind: ResourceKind::Kid,
                id: 7
            })
        );
    }

    #[test]
    fn earliest_registered_parameter_wins() {
        let registry = ResourceRegistry::standard(Arc::new(NoopResolver));

        let reference = resolved(registry.resolve_kind(&params(&[
            ("kidId", "3"),
            ("drawingBoxId", "2"),
            ("drawingId", "1"),
        ])));
        assert_eq!(reference.map(|r| r.kind), Some(ResourceKind::Drawing));

        let reference =
            resolved(registry.resolve_kind(&params(&[("kidId", "3"), ("drawingBoxId", "2")])));
        assert_eq!(
            reference,
            Some(ResourceReference {
                kind: ResourceKind::DrawingBox,
                id: 2
            })
        );
    }

    #[test]
    fn unrecognized_parameters_are_not_applicable() {
        let registry = ResourceRegistry::standard(Arc::new(NoopResolver));
        assert!(matches!(
            registry.resolve_kind(&params(&[("boardId", "5")])),
            Resolution::NotApplicable
        ));
        assert!(matches!(
            registry.resolve_kind(&HashMap::new()),
            Resolution::NotApplicable
        ));
    }

    #[test]
    fn non_numeric_winner_is_invalid_even_if_later_entry_parses() {
        let registry = ResourceRegistry::standard(Arc::new(NoopResolver));
        match registry.resolve_kind(&params(&[("drawingId", "abc"), ("kidId", "3")])) {
            Resolution::InvalidId { param, value } => {
                assert_eq!(param, "drawingId");
                assert_eq!(value, "abc");
            }
            _ => panic!("expected invalid id"),
        }
    }

    #[test]
    fn builder_rejects_duplicates_and_empty_tables() {
        let resolver: Arc<dyn OwnershipResolver> = Arc::new(NoopResolver);
        let err = ResourceRegistry::builder()
            .register("kidId", ResourceKind::Kid, resolver.clone())
            .register("kidId", ResourceKind::Kid, resolver)
            .build()
            .err();
        assert_eq!(err, Some(RegistryError::DuplicateParameter("kidId".into())));

        assert_eq!(
            ResourceRegistry::builder().build().err(),
            Some(RegistryError::Empty)
        );
    }

    #[test]
    fn builder_extends_with_new_kind_in_order() {
        let resolver: Arc<dyn OwnershipResolver> = Arc::new(NoopResolver);
        let registry = ResourceRegistry::builder()
            .register("kidId", ResourceKind::Kid, resolver.clone())
            .register("drawingId", ResourceKind::Drawing, resolver)
            .build()
            .expect("valid registry");

        let order: Vec<_> = registry.parameters().map(|(p, _)| p).collect();
        assert_eq!(order, vec!["kidId", "drawingId"]);

        let reference =
            resolved(registry.resolve_kind(&params(&[("drawingId", "1"), ("kidId", "9")])));
        assert_eq!(reference.map(|r| r.kind), Some(ResourceKind::Kid));
    }
}
