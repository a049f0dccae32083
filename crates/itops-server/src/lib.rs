//! IT-Ops Server Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! HTTP backend for IT-operations administration.
//!
//! # Overview
//!
//! - **Identity store**: users, roles, permissions and their join relations
//! - **Associations**: atomic bulk assignment of roles to users and
//!   permissions to roles
//! - **Audit trail**: a tower layer that classifies every successful request
//!   and records who did what to which resource
//!
//! ## Audit Logging
//!
//! Every 2xx response that is not skip-listed produces exactly one row in
//! `audit_logs`. Classification uses the [`audit::ResourceRegistry`] that the
//! feature routers populate while they are mounted, so the resource token of
//! `/api/v1/responsibility-groups/7` is whatever that collection registered.
//! Handlers refine the record by returning [`audit::AuditOverrides`] as a
//! response part.
//!
//! Recording runs on a tracked background task that the binary drains at
//! shutdown. A failing recorder logs a warning and the client never notices.
//!
//! ## Framework Stack
//!
//! - **Axum**: routing and extractors
//! - **SQLx**: PostgreSQL access and migrations
//! - **Tower**: middleware and service abstractions
//!
//! # Example
//!
//! ```no_run
//! use itops_server::{api, audit::AuditWrites, config::Config, db};
//! use itops_common::Telemetry;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let pool = db::create_pool(&db::DbConfig::from(&config.database)).await?;
//! let app = api::build_app(pool, &config, Telemetry::disabled(), AuditWrites::new());
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod associations;
pub mod audit;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod middleware;
pub mod models;

// Re-export commonly used types
pub use error::{AppError, AppResult};
