//! Role API routes
//!
//! - `POST /api/v1/roles` - Create a role
//! - `GET /api/v1/roles` - List roles
//! - `GET /api/v1/roles/:roleId` - Get a role with its permissions
//! - `DELETE /api/v1/roles/:roleId` - Soft-delete a role

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
    commands::{CreateRoleCommand, DeleteRoleCommand},
    queries::{GetRoleQuery, ListRolesQuery},
};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::response::ApiResponse;
use crate::associations::AssociationService;
use crate::audit::AuditOverrides;
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::features::FeatureState;

pub fn roles_routes() -> Router<FeatureState> {
    Router::new()
        .route("/", post(create_role).get(list_roles))
        .route("/:roleId", get(get_role).delete(delete_role))
}

/// Create a role
///
/// - `201 Created` - Role created
/// - `400 Bad Request` - Validation error
/// - `409 Conflict` - A live role already uses the name
#[tracing::instrument(skip_all, fields(actor = actor.user_id))]
async fn create_role(
    AuthUser(actor): AuthUser,
    State(pool): State<PgPool>,
    ApiJson(command): ApiJson<CreateRoleCommand>,
) -> AppResult<impl IntoResponse> {
    let role = super::commands::create::handle(pool, command).await?;

    let audit = AuditOverrides::new()
        .resource_id(role.id)
        .detail(json!({ "name": role.name }));

    Ok((StatusCode::CREATED, audit, Json(ApiResponse::success(role))))
}

#[tracing::instrument(skip_all, fields(role_id = %role_id))]
async fn delete_role(
    AuthUser(_actor): AuthUser,
    State(pool): State<PgPool>,
    ApiPath(role_id): ApiPath<i64>,
) -> AppResult<impl IntoResponse> {
    let response = super::commands::delete::handle(pool, DeleteRoleCommand { id: role_id }).await?;

    Ok(Json(ApiResponse::success(response)))
}

#[tracing::instrument(skip_all)]
async fn list_roles(
    State(pool): State<PgPool>,
    ApiQuery(query): ApiQuery<ListRolesQuery>,
) -> AppResult<impl IntoResponse> {
    let response = super::queries::list::handle(pool, query).await?;

    Ok(Json(ApiResponse::success_with_meta(
        response.items,
        json!({ "pagination": response.pagination }),
    )))
}

#[tracing::instrument(skip_all, fields(role_id = %role_id))]
async fn get_role(
    State(service): State<AssociationService>,
    ApiPath(role_id): ApiPath<i64>,
) -> AppResult<impl IntoResponse> {
    let response = super::queries::get::handle(&service, GetRoleQuery { id: role_id }).await?;

    Ok(Json(ApiResponse::success(response)))
}
