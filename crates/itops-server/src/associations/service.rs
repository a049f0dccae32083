use itops_common::Telemetry;
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::BTreeSet;

use super::{
    Association, AssociationError, EntityKind, ROLE_PERMISSIONS, USER_ROLES,
};
use crate::models::{Permission, Role, PERMISSION_COLUMNS, ROLE_COLUMNS};

/// Outcome of a bulk association call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationChange {
    pub target_id: i64,
    /// Deduplicated candidate IDs, ascending.
    pub requested: Vec<i64>,
    /// Join rows actually inserted or deleted.
    pub affected: u64,
}

#[derive(Debug, Clone, Copy)]
enum Mutation {
    Link,
    Unlink,
}

/// Transactional bulk operations over the join tables
#[derive(Clone)]
pub struct AssociationService {
    pool: PgPool,
    telemetry: Telemetry,
}

impl AssociationService {
    pub fn new(pool: PgPool, telemetry: Telemetry) -> Self {
        Self { pool, telemetry }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Assign roles to a user. Already-assigned roles are left untouched.
    pub async fn assign_roles(
        &self,
        user_id: i64,
        role_ids: &[i64],
    ) -> Result<AssociationChange, AssociationError> {
        self.mutate(USER_ROLES, Mutation::Link, user_id, role_ids).await
    }

    /// Remove roles from a user. Roles the user does not hold are ignored.
    pub async fn remove_roles(
        &self,
        user_id: i64,
        role_ids: &[i64],
    ) -> Result<AssociationChange, AssociationError> {
        self.mutate(USER_ROLES, Mutation::Unlink, user_id, role_ids).await
    }

    pub async fn add_permissions_to_role(
        &self,
        role_id: i64,
        permission_ids: &[i64],
    ) -> Result<AssociationChange, AssociationError> {
        self.mutate(ROLE_PERMISSIONS, Mutation::Link, role_id, permission_ids)
            .await
    }

    pub async fn remove_permissions_from_role(
        &self,
        role_id: i64,
        permission_ids: &[i64],
    ) -> Result<AssociationChange, AssociationError> {
        self.mutate(ROLE_PERMISSIONS, Mutation::Unlink, role_id, permission_ids)
            .await
    }

    /// Live roles held by a live user, ordered by ID
    pub async fn roles_of_user(&self, user_id: i64) -> Result<Vec<Role>, AssociationError> {
        self.telemetry
            .instrument(async {
                ensure_exists(&self.pool, EntityKind::User, user_id).await?;

                let sql = format!(
                    "SELECT {} FROM roles r \
                     JOIN user_roles ur ON ur.role_id = r.id \
                     WHERE ur.user_id = $1 AND r.deleted_at IS NULL \
                     ORDER BY r.id",
                    prefixed(ROLE_COLUMNS, "r")
                );

                let roles = sqlx::query_as::<_, Role>(&sql)
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await?;

                Ok(roles)
            })
            .await
    }

    /// Live permissions granted to a live role, ordered by ID
    pub async fn permissions_of_role(
        &self,
        role_id: i64,
    ) -> Result<Vec<Permission>, AssociationError> {
        self.telemetry
            .instrument(async {
                ensure_exists(&self.pool, EntityKind::Role, role_id).await?;

                let sql = format!(
                    "SELECT {} FROM permissions p \
                     JOIN role_permissions rp ON rp.permission_id = p.id \
                     WHERE rp.role_id = $1 AND p.deleted_at IS NULL \
                     ORDER BY p.id",
                    prefixed(PERMISSION_COLUMNS, "p")
                );

                let permissions = sqlx::query_as::<_, Permission>(&sql)
                    .bind(role_id)
                    .fetch_all(&self.pool)
                    .await?;

                Ok(permissions)
            })
            .await
    }

    async fn mutate(
        &self,
        association: Association,
        mutation: Mutation,
        target_id: i64,
        candidate_ids: &[i64],
    ) -> Result<AssociationChange, AssociationError> {
        let requested = dedupe(candidate_ids);

        self.telemetry
            .instrument(async move {
                if requested.is_empty() {
                    // A missing target is an error even with nothing to write.
                    ensure_exists(&self.pool, association.target, target_id).await?;
                    tracing::debug!(
                        target_id,
                        table = association.table,
                        "Empty candidate list, nothing to do"
                    );
                    return Ok(AssociationChange {
                        target_id,
                        requested,
                        affected: 0,
                    });
                }

                // Dropping `tx` on any early return rolls the transaction back.
                let mut tx = self.pool.begin().await?;

                lock_target(&mut tx, association.target, target_id).await?;
                ensure_candidates(&mut tx, association.candidate, &requested).await?;

                let affected = match mutation {
                    Mutation::Link => link(&mut tx, &association, target_id, &requested).await?,
                    Mutation::Unlink => {
                        unlink(&mut tx, &association, target_id, &requested).await?
                    },
                };

                tx.commit().await?;

                tracing::info!(
                    target_id,
                    table = association.table,
                    mutation = ?mutation,
                    requested = requested.len(),
                    affected,
                    "Association updated"
                );

                Ok(AssociationChange {
                    target_id,
                    requested,
                    affected,
                })
            })
            .await
    }
}

fn dedupe(ids: &[i64]) -> Vec<i64> {
    ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

fn prefixed(columns: &str, alias: &str) -> String {
    columns
        .split(',')
        .map(|c| format!("{}.{}", alias, c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

async fn ensure_exists(
    pool: &PgPool,
    entity: EntityKind,
    id: i64,
) -> Result<(), AssociationError> {
    let sql = format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1 AND deleted_at IS NULL)",
        entity.table()
    );

    let exists: bool = sqlx::query_scalar(&sql).bind(id).fetch_one(pool).await?;

    if exists {
        Ok(())
    } else {
        Err(AssociationError::TargetNotFound { entity, id })
    }
}

async fn lock_target(
    tx: &mut Transaction<'_, Postgres>,
    entity: EntityKind,
    id: i64,
) -> Result<(), AssociationError> {
    let sql = format!(
        "SELECT id FROM {} WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        entity.table()
    );

    let locked: Option<i64> = sqlx::query_scalar(&sql)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

    locked
        .map(|_| ())
        .ok_or(AssociationError::TargetNotFound { entity, id })
}

/// Verify every candidate exists, holding share locks until commit so a
/// concurrent soft delete cannot slip in between check and write.
async fn ensure_candidates(
    tx: &mut Transaction<'_, Postgres>,
    entity: EntityKind,
    ids: &[i64],
) -> Result<(), AssociationError> {
    let sql = format!(
        "SELECT id FROM {} WHERE id = ANY($1) AND deleted_at IS NULL ORDER BY id FOR SHARE",
        entity.table()
    );

    let found: BTreeSet<i64> = sqlx::query_scalar::<_, i64>(&sql)
        .bind(ids)
        .fetch_all(&mut **tx)
        .await?
        .into_iter()
        .collect();

    let missing: Vec<i64> = ids.iter().copied().filter(|id| !found.contains(id)).collect();

    if missing.is_empty() {
        Ok(())
    } else {
        tracing::debug!(entity = %entity, ?missing, "Association candidates not found");
        Err(AssociationError::CandidatesNotFound { entity, missing })
    }
}

async fn link(
    tx: &mut Transaction<'_, Postgres>,
    association: &Association,
    target_id: i64,
    ids: &[i64],
) -> Result<u64, sqlx::Error> {
    let sql = format!(
        "INSERT INTO {} ({}, {}) SELECT $1, UNNEST($2::BIGINT[]) ON CONFLICT DO NOTHING",
        association.table, association.target_column, association.candidate_column
    );

    let result = sqlx::query(&sql)
        .bind(target_id)
        .bind(ids)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected())
}

async fn unlink(
    tx: &mut Transaction<'_, Postgres>,
    association: &Association,
    target_id: i64,
    ids: &[i64],
) -> Result<u64, sqlx::Error> {
    let sql = format!(
        "DELETE FROM {} WHERE {} = $1 AND {} = ANY($2)",
        association.table, association.target_column, association.candidate_column
    );

    let result = sqlx::query(&sql)
        .bind(target_id)
        .bind(ids)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupe_sorts_and_collapses() {
        assert_eq!(dedupe(&[5, 2, 5, 9, 2]), vec![2, 5, 9]);
        assert!(dedupe(&[]).is_empty());
    }

    #[test]
    fn test_prefixed_columns() {
        assert_eq!(prefixed("id, name", "r"), "r.id, r.name");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_empty_list_still_requires_target(pool: PgPool) {
        let service = AssociationService::new(pool, Telemetry::disabled());

        for result in [
            service.assign_roles(424242, &[]).await,
            service.remove_roles(424242, &[]).await,
            service.add_permissions_to_role(424242, &[]).await,
        ] {
            assert!(matches!(
                result,
                Err(AssociationError::TargetNotFound { id: 424242, .. })
            ));
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_missing_target_reported_before_candidates(pool: PgPool) {
        let service = AssociationService::new(pool, Telemetry::disabled());

        let err = service.remove_roles(424242, &[1, 2]).await.unwrap_err();
        assert!(matches!(
            err,
            AssociationError::TargetNotFound {
                entity: EntityKind::User,
                id: 424242
            }
        ));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_read_helpers_require_target(pool: PgPool) {
        let service = AssociationService::new(pool, Telemetry::disabled());

        assert!(matches!(
            service.roles_of_user(1).await,
            Err(AssociationError::TargetNotFound { .. })
        ));
        assert!(matches!(
            service.permissions_of_role(1).await,
            Err(AssociationError::TargetNotFound { .. })
        ));
    }
}
