//! Database queries for audit logs

use sqlx::PgPool;
use tracing::debug;

use super::models::{AuditLog, AuditLogFilter, NewAuditLog, MAX_AUDIT_PAGE_SIZE};

const AUDIT_LOG_COLUMNS: &str = "id, user_id, username, action, resource, resource_id, \
                                 details, ip_address, user_agent, created_at";

/// Insert a new audit row and return it with its generated ID and timestamp
pub async fn create_audit_log(pool: &PgPool, entry: &NewAuditLog) -> sqlx::Result<AuditLog> {
    let sql = format!(
        r#"
        INSERT INTO audit_logs (
            user_id, username, action, resource, resource_id,
            details, ip_address, user_agent
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {AUDIT_LOG_COLUMNS}
        "#
    );

    let record = sqlx::query_as::<_, AuditLog>(&sql)
        .bind(entry.user_id)
        .bind(&entry.username)
        .bind(entry.action.as_str())
        .bind(&entry.resource)
        .bind(entry.resource_id)
        .bind(&entry.details)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .fetch_one(pool)
        .await?;

    debug!(
        audit_id = record.id,
        action = %entry.action,
        resource = %entry.resource,
        "Created audit log entry"
    );

    Ok(record)
}

/// Build the WHERE conditions for a filter.
///
/// Returns the clause and the next free bind index. Binds must be applied in
/// the order user_id, action, resource.
fn filter_clause(filter: &AuditLogFilter) -> (String, usize) {
    let mut bind_count = 1;
    let mut conditions = Vec::new();

    if filter.user_id.is_some() {
        conditions.push(format!("user_id = ${}", bind_count));
        bind_count += 1;
    }
    if filter.action.is_some() {
        conditions.push(format!("action = ${}", bind_count));
        bind_count += 1;
    }
    if filter.resource.is_some() {
        conditions.push(format!("resource = ${}", bind_count));
        bind_count += 1;
    }

    let mut clause = String::from(" WHERE 1=1");
    for condition in conditions {
        clause.push_str(" AND ");
        clause.push_str(&condition);
    }

    (clause, bind_count)
}

/// List audit logs matching a filter, newest first
pub async fn list_audit_logs(pool: &PgPool, filter: &AuditLogFilter) -> sqlx::Result<Vec<AuditLog>> {
    let limit = filter.limit.clamp(1, MAX_AUDIT_PAGE_SIZE);
    let (clause, bind_count) = filter_clause(filter);

    let sql = format!(
        "SELECT {AUDIT_LOG_COLUMNS} FROM audit_logs{clause} \
         ORDER BY created_at DESC, id DESC LIMIT ${} OFFSET ${}",
        bind_count,
        bind_count + 1
    );

    let mut query = sqlx::query_as::<_, AuditLog>(&sql);

    if let Some(user_id) = filter.user_id {
        query = query.bind(user_id);
    }
    if let Some(action) = filter.action {
        query = query.bind(action.as_str());
    }
    if let Some(resource) = &filter.resource {
        query = query.bind(resource);
    }

    let records = query
        .bind(limit)
        .bind(filter.offset.max(0))
        .fetch_all(pool)
        .await?;

    debug!(count = records.len(), "Queried audit logs");

    Ok(records)
}

/// Count audit logs matching a filter, ignoring limit and offset
pub async fn count_audit_logs(pool: &PgPool, filter: &AuditLogFilter) -> sqlx::Result<i64> {
    let (clause, _) = filter_clause(filter);
    let sql = format!("SELECT COUNT(*) FROM audit_logs{clause}");

    let mut query = sqlx::query_scalar::<_, i64>(&sql);

    if let Some(user_id) = filter.user_id {
        query = query.bind(user_id);
    }
    if let Some(action) = filter.action {
        query = query.bind(action.as_str());
    }
    if let Some(resource) = &filter.resource {
        query = query.bind(resource);
    }

    query.fetch_one(pool).await
}

pub async fn get_audit_log(pool: &PgPool, id: i64) -> sqlx::Result<Option<AuditLog>> {
    let sql = format!("SELECT {AUDIT_LOG_COLUMNS} FROM audit_logs WHERE id = $1");

    sqlx::query_as::<_, AuditLog>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}
