//! Grant permissions to a role

use crate::associations::{AssociationChange, AssociationError, AssociationService};

/// The request body is a bare array of permission IDs.
#[derive(Debug, Clone)]
pub struct AddPermissionsCommand {
    pub role_id: i64,
    pub permission_ids: Vec<i64>,
}

#[tracing::instrument(skip(service), fields(role_id = command.role_id))]
pub async fn handle(
    service: &AssociationService,
    command: AddPermissionsCommand,
) -> Result<AssociationChange, AssociationError> {
    service
        .add_permissions_to_role(command.role_id, &command.permission_ids)
        .await
}
