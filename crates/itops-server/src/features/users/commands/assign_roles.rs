//! Assign roles to a user

use serde::Deserialize;

use crate::associations::{AssociationChange, AssociationError, AssociationService};

/// `{ "roleIds": [1, 2] }`; the user ID comes from the path.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRolesCommand {
    #[serde(skip)]
    pub user_id: i64,
    pub role_ids: Vec<i64>,
}

#[tracing::instrument(skip(service), fields(user_id = command.user_id))]
pub async fn handle(
    service: &AssociationService,
    command: AssignRolesCommand,
) -> Result<AssociationChange, AssociationError> {
    service.assign_roles(command.user_id, &command.role_ids).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_camel_case_body() {
        let command: AssignRolesCommand = serde_json::from_str(r#"{"roleIds": [3, 1]}"#).unwrap();
        assert_eq!(command.role_ids, vec![3, 1]);
        assert_eq!(command.user_id, 0);
    }

    #[test]
    fn test_missing_role_ids_is_rejected() {
        assert!(serde_json::from_str::<AssignRolesCommand>("{}").is_err());
    }
}
