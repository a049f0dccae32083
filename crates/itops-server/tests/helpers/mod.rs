//! Test helpers for IT-Ops server integration tests
//!
//! - Seeding users, roles and permissions directly through SQL
//! - Building the full application router over a test pool
//! - Request builders and JSON body decoding
//! - Waiting for detached audit writes to land
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request, Response},
    Router,
};
use http_body_util::BodyExt;
use itops_common::Telemetry;
use itops_server::{
    api,
    audit::{AuditLog, AuditWrites},
    auth::USER_ID_HEADER,
    config::Config,
};
use serde_json::Value;
use sqlx::PgPool;
use std::time::Duration;

pub async fn seed_user(pool: &PgPool, username: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO users (email, username, password_hash) VALUES ($1, $2, 'not-a-hash') RETURNING id",
    )
    .bind(format!("{username}@example.com"))
    .bind(username)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn seed_role(pool: &PgPool, name: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO roles (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn seed_permission(pool: &PgPool, resource: &str, action: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO permissions (name, resource, action) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(format!("{resource}:{action}"))
    .bind(resource)
    .bind(action)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn user_role_ids(pool: &PgPool, user_id: i64) -> Vec<i64> {
    sqlx::query_scalar("SELECT role_id FROM user_roles WHERE user_id = $1 ORDER BY role_id")
        .bind(user_id)
        .fetch_all(pool)
        .await
        .unwrap()
}

pub async fn role_permission_ids(pool: &PgPool, role_id: i64) -> Vec<i64> {
    sqlx::query_scalar(
        "SELECT permission_id FROM role_permissions WHERE role_id = $1 ORDER BY permission_id",
    )
    .bind(role_id)
    .fetch_all(pool)
    .await
    .unwrap()
}

/// The production router with default configuration over `pool`
pub fn app(pool: PgPool) -> Router {
    api::build_app(pool, &Config::default(), Telemetry::disabled(), AuditWrites::new())
}

/// Build a request, optionally authenticated as `user_id`, with a JSON body
pub fn request(method: Method, uri: &str, user_id: Option<i64>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("user-agent", "itops-tests/1.0")
        .header("x-forwarded-for", "203.0.113.9");

    if let Some(user_id) = user_id {
        builder = builder.header(USER_ID_HEADER, user_id.to_string());
    }

    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

pub async fn audit_rows(pool: &PgPool) -> Vec<AuditLog> {
    sqlx::query_as::<_, AuditLog>(
        "SELECT id, user_id, username, action, resource, resource_id, details, \
         ip_address, user_agent, created_at FROM audit_logs ORDER BY id",
    )
    .fetch_all(pool)
    .await
    .unwrap()
}

/// Audit rows are written on a detached task; poll until `expected` exist.
pub async fn wait_for_audit_rows(pool: &PgPool, expected: usize) -> Vec<AuditLog> {
    for _ in 0..50 {
        let rows = audit_rows(pool).await;
        if rows.len() >= expected {
            return rows;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    audit_rows(pool).await
}

/// Give any stray detached write a chance to land before asserting absence.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(200)).await;
}
