//! Remove roles from a user

use serde::Deserialize;

use crate::associations::{AssociationChange, AssociationError, AssociationService};

/// Same body as assignment: `{ "roleIds": [...] }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveRolesCommand {
    #[serde(skip)]
    pub user_id: i64,
    pub role_ids: Vec<i64>,
}

#[tracing::instrument(skip(service), fields(user_id = command.user_id))]
pub async fn handle(
    service: &AssociationService,
    command: RemoveRolesCommand,
) -> Result<AssociationChange, AssociationError> {
    service.remove_roles(command.user_id, &command.role_ids).await
}
