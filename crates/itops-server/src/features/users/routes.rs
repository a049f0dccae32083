//! User API routes
//!
//! - `POST /api/v1/users` - Create a user
//! - `GET /api/v1/users` - List users with pagination
//! - `GET /api/v1/users/:userId` - Get a user with its roles
//! - `DELETE /api/v1/users/:userId` - Soft-delete a user
//! - `GET /api/v1/users/:userId/roles` - Roles held by a user
//! - `POST /api/v1/users/:userId/roles` - Assign roles (`{ "roleIds": [...] }`)
//! - `DELETE /api/v1/users/:userId/roles` - Remove roles (`{ "roleIds": [...] }`)
//!
//! Mutating routes require an authenticated caller.

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
    commands::{AssignRolesCommand, CreateUserCommand, DeleteUserCommand, RemoveRolesCommand},
    queries::{GetUserQuery, ListUserRolesQuery, ListUsersQuery},
};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::response::ApiResponse;
use crate::associations::AssociationService;
use crate::audit::{AuditAction, AuditOverrides};
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::features::FeatureState;

pub fn users_routes() -> Router<FeatureState> {
    Router::new()
        .route("/", post(create_user).get(list_users))
        .route("/:userId", get(get_user).delete(delete_user))
        .route(
            "/:userId/roles",
            get(list_user_roles).post(assign_roles).delete(remove_roles),
        )
}

// ============================================================================
// Command Handlers (Write Operations)
// ============================================================================

/// Create a user
///
/// - `201 Created` - User created, audited with the new ID
/// - `400 Bad Request` - Validation error
/// - `409 Conflict` - Email already registered
#[tracing::instrument(skip_all, fields(actor = actor.user_id))]
async fn create_user(
    AuthUser(actor): AuthUser,
    State(pool): State<PgPool>,
    ApiJson(command): ApiJson<CreateUserCommand>,
) -> AppResult<impl IntoResponse> {
    let user = super::commands::create::handle(pool, command).await?;

    tracing::info!(user_id = user.id, "User created via API");

    let audit = AuditOverrides::new()
        .resource_id(user.id)
        .detail(json!({ "email": user.email, "username": user.username }));

    Ok((StatusCode::CREATED, audit, Json(ApiResponse::success(user))))
}

/// Soft-delete a user
#[tracing::instrument(skip_all, fields(user_id = %user_id))]
async fn delete_user(
    AuthUser(_actor): AuthUser,
    State(pool): State<PgPool>,
    ApiPath(user_id): ApiPath<i64>,
) -> AppResult<impl IntoResponse> {
    let response = super::commands::delete::handle(pool, DeleteUserCommand { id: user_id }).await?;

    Ok(Json(ApiResponse::success(response)))
}

/// Assign roles to a user
///
/// - `200 OK` - Every role linked; already-held roles are left alone
/// - `400 Bad Request` - One or more role IDs do not exist, nothing written
/// - `404 Not Found` - User does not exist
#[tracing::instrument(skip_all, fields(user_id = %user_id))]
async fn assign_roles(
    AuthUser(_actor): AuthUser,
    State(service): State<AssociationService>,
    ApiPath(user_id): ApiPath<i64>,
    ApiJson(mut command): ApiJson<AssignRolesCommand>,
) -> AppResult<impl IntoResponse> {
    command.user_id = user_id;

    let change = super::commands::assign_roles::handle(&service, command).await?;

    let audit = AuditOverrides::new()
        .resource("USER")
        .action(AuditAction::Update)
        .resource_id(user_id)
        .detail(json!({ "assignedRoleIds": change.requested }));

    Ok((audit, Json(ApiResponse::success(change))))
}

/// Remove roles from a user
#[tracing::instrument(skip_all, fields(user_id = %user_id))]
async fn remove_roles(
    AuthUser(_actor): AuthUser,
    State(service): State<AssociationService>,
    ApiPath(user_id): ApiPath<i64>,
    ApiJson(mut command): ApiJson<RemoveRolesCommand>,
) -> AppResult<impl IntoResponse> {
    command.user_id = user_id;

    let change = super::commands::remove_roles::handle(&service, command).await?;

    let audit = AuditOverrides::new()
        .resource("USER")
        .action(AuditAction::Update)
        .resource_id(user_id)
        .detail(json!({ "removedRoleIds": change.requested }));

    Ok((audit, Json(ApiResponse::success(change))))
}

// ============================================================================
// Query Handlers (Read Operations)
// ============================================================================

#[tracing::instrument(skip_all)]
async fn list_users(
    State(pool): State<PgPool>,
    ApiQuery(query): ApiQuery<ListUsersQuery>,
) -> AppResult<impl IntoResponse> {
    let response = super::queries::list::handle(pool, query).await?;

    Ok(Json(ApiResponse::success_with_meta(
        response.items,
        json!({ "pagination": response.pagination }),
    )))
}

#[tracing::instrument(skip_all, fields(user_id = %user_id))]
async fn get_user(
    State(service): State<AssociationService>,
    ApiPath(user_id): ApiPath<i64>,
) -> AppResult<impl IntoResponse> {
    let response = super::queries::get::handle(&service, GetUserQuery { id: user_id }).await?;

    Ok(Json(ApiResponse::success(response)))
}

#[tracing::instrument(skip_all, fields(user_id = %user_id))]
async fn list_user_roles(
    State(service): State<AssociationService>,
    ApiPath(user_id): ApiPath<i64>,
) -> AppResult<impl IntoResponse> {
    let roles = super::queries::list_roles::handle(&service, ListUserRolesQuery { user_id }).await?;

    Ok(Json(ApiResponse::success(roles)))
}
