//! Roles held by a user

use crate::associations::{AssociationError, AssociationService};
use crate::models::Role;

#[derive(Debug, Clone)]
pub struct ListUserRolesQuery {
    pub user_id: i64,
}

#[tracing::instrument(skip(service))]
pub async fn handle(
    service: &AssociationService,
    query: ListUserRolesQuery,
) -> Result<Vec<Role>, AssociationError> {
    service.roles_of_user(query.user_id).await
}
