//! Revoke permissions from a role

use crate::associations::{AssociationChange, AssociationError, AssociationService};

#[derive(Debug, Clone)]
pub struct RemovePermissionsCommand {
    pub role_id: i64,
    pub permission_ids: Vec<i64>,
}

#[tracing::instrument(skip(service), fields(role_id = command.role_id))]
pub async fn handle(
    service: &AssociationService,
    command: RemovePermissionsCommand,
) -> Result<AssociationChange, AssociationError> {
    service
        .remove_permissions_from_role(command.role_id, &command.permission_ids)
        .await
}
