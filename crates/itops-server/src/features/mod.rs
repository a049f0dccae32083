//! Feature slices of the admin API
//!
//! Each slice is a vertical cut with its own `commands/` (writes),
//! `queries/` (reads) and `routes.rs`:
//!
//! - **users**: accounts and role assignment
//! - **roles**: roles and their permission sets
//! - **permissions**: the permission catalogue and role grants
//! - **audit_logs**: read access to the audit trail
//!
//! Audited slices are mounted through [`ApiRoutes::resource`], which also
//! registers the collection with the audit classifier. The mounted routes
//! and the registry therefore cannot drift apart.

pub mod audit_logs;
pub mod permissions;
pub mod roles;
pub mod shared;
pub mod users;

use axum::{extract::FromRef, Router};
use itops_common::Telemetry;
use sqlx::PgPool;

use crate::associations::AssociationService;
use crate::audit::{ResourceRegistry, ResourceSpec};

/// Shared state for all feature routes
///
/// Handlers extract the part they need (`State<PgPool>` or
/// `State<AssociationService>`).
#[derive(Clone, FromRef)]
pub struct FeatureState {
    pub db: PgPool,
    pub associations: AssociationService,
}

impl FeatureState {
    pub fn new(db: PgPool, telemetry: Telemetry) -> Self {
        let associations = AssociationService::new(db.clone(), telemetry);
        Self { db, associations }
    }
}

/// Builder that mounts feature routers and records audited collections
#[derive(Default)]
pub struct ApiRoutes {
    router: Router<FeatureState>,
    registry: ResourceRegistry,
}

impl ApiRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount `router` under `/{collection}` and register it for auditing.
    pub fn resource(mut self, spec: ResourceSpec, router: Router<FeatureState>) -> Self {
        let path = format!("/{}", spec.collection_segment());
        self.router = self.router.nest(&path, router);
        self.registry.register(spec);
        self
    }

    /// Mount `router` without a registry entry.
    pub fn unaudited(mut self, path: &str, router: Router<FeatureState>) -> Self {
        self.router = self.router.nest(path, router);
        self
    }

    pub fn into_parts(self) -> (Router<FeatureState>, ResourceRegistry) {
        (self.router, self.registry)
    }
}

/// The `/api/v1` surface and the registry describing it
pub fn api_routes() -> ApiRoutes {
    ApiRoutes::new()
        .resource(ResourceSpec::collection("users"), users::users_routes())
        .resource(ResourceSpec::collection("roles"), roles::roles_routes())
        .resource(
            ResourceSpec::collection("permissions"),
            permissions::permissions_routes(),
        )
        .unaudited("/audit-logs", audit_logs::audit_logs_routes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_routes_register_audited_collections() {
        let (_, registry) = api_routes().into_parts();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get("users").map(|s| s.resource_token()), Some("USER"));
        assert_eq!(registry.get("roles").map(|s| s.resource_token()), Some("ROLE"));
        assert_eq!(
            registry.get("permissions").map(|s| s.resource_token()),
            Some("PERMISSION")
        );
        assert!(!registry.contains("audit-logs"));
    }
}
