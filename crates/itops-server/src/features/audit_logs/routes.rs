//! Audit log API routes
//!
//! - `GET /api/v1/audit-logs` - Filtered, paginated list, newest first
//! - `GET /api/v1/audit-logs/:id` - A single entry
//!
//! Both require an authenticated caller.

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use sqlx::PgPool;

use super::queries::{GetAuditLogQuery, ListAuditLogsQuery};
use crate::api::extract::{ApiPath, ApiQuery};
use crate::api::response::ApiResponse;
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::features::FeatureState;

pub fn audit_logs_routes() -> Router<FeatureState> {
    Router::new()
        .route("/", get(list_audit_logs))
        .route("/:id", get(get_audit_log))
}

/// List audit entries
///
/// - `200 OK` - `data` holds the page, `meta.pagination` the totals
/// - `400 Bad Request` - Unknown action or out-of-range pagination
#[tracing::instrument(skip_all)]
async fn list_audit_logs(
    AuthUser(_actor): AuthUser,
    State(pool): State<PgPool>,
    ApiQuery(query): ApiQuery<ListAuditLogsQuery>,
) -> AppResult<impl IntoResponse> {
    let response = super::queries::list::handle(pool, query).await?;

    Ok(Json(ApiResponse::success_with_meta(
        response.items,
        json!({ "pagination": response.pagination }),
    )))
}

#[tracing::instrument(skip_all, fields(audit_log_id = %id))]
async fn get_audit_log(
    AuthUser(_actor): AuthUser,
    State(pool): State<PgPool>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<impl IntoResponse> {
    let entry = super::queries::get::handle(pool, GetAuditLogQuery { id }).await?;

    Ok(Json(ApiResponse::success(entry)))
}
