//! Permissions granted to a role

use crate::associations::{AssociationError, AssociationService};
use crate::models::Permission;

#[derive(Debug, Clone)]
pub struct ListRolePermissionsQuery {
    pub role_id: i64,
}

#[tracing::instrument(skip(service))]
pub async fn handle(
    service: &AssociationService,
    query: ListRolePermissionsQuery,
) -> Result<Vec<Permission>, AssociationError> {
    service.permissions_of_role(query.role_id).await
}
