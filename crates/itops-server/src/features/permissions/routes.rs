//! Permission API routes
//!
//! - `POST /api/v1/permissions` - Create a permission
//! - `GET /api/v1/permissions` - List permissions
//! - `GET /api/v1/permissions/:permissionId` - Get a permission
//! - `DELETE /api/v1/permissions/:permissionId` - Soft-delete a permission
//! - `GET /api/v1/permissions/roles/:roleId` - Permissions granted to a role
//! - `POST /api/v1/permissions/roles/:roleId` - Grant permissions (`[1, 2]`)
//! - `DELETE /api/v1/permissions/roles/:roleId` - Revoke permissions (`[1, 2]`)
//!
//! Grant and revoke are audited as an `UPDATE` of the role.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use sqlx::PgPool;

use super::{
    commands::{
        AddPermissionsCommand, CreatePermissionCommand, DeletePermissionCommand,
        RemovePermissionsCommand,
    },
    queries::{GetPermissionQuery, ListPermissionsQuery, ListRolePermissionsQuery},
};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::response::ApiResponse;
use crate::associations::AssociationService;
use crate::audit::{AuditAction, AuditOverrides};
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::features::FeatureState;

pub fn permissions_routes() -> Router<FeatureState> {
    Router::new()
        .route("/", post(create_permission).get(list_permissions))
        .route(
            "/roles/:roleId",
            get(list_role_permissions)
                .post(add_permissions_to_role)
                .delete(remove_permissions_from_role),
        )
        .route("/:permissionId", get(get_permission).delete(delete_permission))
}

// ============================================================================
// Command Handlers (Write Operations)
// ============================================================================

#[tracing::instrument(skip_all, fields(actor = actor.user_id))]
async fn create_permission(
    AuthUser(actor): AuthUser,
    State(pool): State<PgPool>,
    ApiJson(command): ApiJson<CreatePermissionCommand>,
) -> AppResult<impl IntoResponse> {
    let permission = super::commands::create::handle(pool, command).await?;

    let audit = AuditOverrides::new().resource_id(permission.id).detail(json!({
        "name": permission.name,
        "resource": permission.resource,
        "action": permission.action,
    }));

    Ok((StatusCode::CREATED, audit, Json(ApiResponse::success(permission))))
}

#[tracing::instrument(skip_all, fields(permission_id = %permission_id))]
async fn delete_permission(
    AuthUser(_actor): AuthUser,
    State(pool): State<PgPool>,
    ApiPath(permission_id): ApiPath<i64>,
) -> AppResult<impl IntoResponse> {
    let command = DeletePermissionCommand { id: permission_id };
    let response = super::commands::delete::handle(pool, command).await?;

    Ok(Json(ApiResponse::success(response)))
}

/// Grant permissions to a role
///
/// - `200 OK` - Every permission granted; existing grants are left alone
/// - `400 Bad Request` - Unknown permission IDs, nothing written
/// - `404 Not Found` - Role does not exist
#[tracing::instrument(skip_all, fields(role_id = %role_id))]
async fn add_permissions_to_role(
    AuthUser(_actor): AuthUser,
    State(service): State<AssociationService>,
    ApiPath(role_id): ApiPath<i64>,
    ApiJson(permission_ids): ApiJson<Vec<i64>>,
) -> AppResult<impl IntoResponse> {
    let command = AddPermissionsCommand {
        role_id,
        permission_ids,
    };
    let change = super::commands::add_to_role::handle(&service, command).await?;

    let audit = AuditOverrides::new()
        .resource("ROLE")
        .action(AuditAction::Update)
        .resource_id(role_id)
        .detail(json!({ "addedPermissionIds": change.requested }));

    Ok((audit, Json(ApiResponse::success(change))))
}

#[tracing::instrument(skip_all, fields(role_id = %role_id))]
async fn remove_permissions_from_role(
    AuthUser(_actor): AuthUser,
    State(service): State<AssociationService>,
    ApiPath(role_id): ApiPath<i64>,
    ApiJson(permission_ids): ApiJson<Vec<i64>>,
) -> AppResult<impl IntoResponse> {
    let command = RemovePermissionsCommand {
        role_id,
        permission_ids,
    };
    let change = super::commands::remove_from_role::handle(&service, command).await?;

    let audit = AuditOverrides::new()
        .resource("ROLE")
        .action(AuditAction::Update)
        .resource_id(role_id)
        .detail(json!({ "removedPermissionIds": change.requested }));

    Ok((audit, Json(ApiResponse::success(change))))
}

// ============================================================================
// Query Handlers (Read Operations)
// ============================================================================

#[tracing::instrument(skip_all)]
async fn list_permissions(
    State(pool): State<PgPool>,
    ApiQuery(query): ApiQuery<ListPermissionsQuery>,
) -> AppResult<impl IntoResponse> {
    let response = super::queries::list::handle(pool, query).await?;

    Ok(Json(ApiResponse::success_with_meta(
        response.items,
        json!({ "pagination": response.pagination }),
    )))
}

#[tracing::instrument(skip_all, fields(permission_id = %permission_id))]
async fn get_permission(
    State(pool): State<PgPool>,
    ApiPath(permission_id): ApiPath<i64>,
) -> AppResult<impl IntoResponse> {
    let permission =
        super::queries::get::handle(pool, GetPermissionQuery { id: permission_id }).await?;

    Ok(Json(ApiResponse::success(permission)))
}

#[tracing::instrument(skip_all, fields(role_id = %role_id))]
async fn list_role_permissions(
    State(service): State<AssociationService>,
    ApiPath(role_id): ApiPath<i64>,
) -> AppResult<impl IntoResponse> {
    let permissions =
        super::queries::list_for_role::handle(&service, ListRolePermissionsQuery { role_id })
            .await?;

    Ok(Json(ApiResponse::success(permissions)))
}
