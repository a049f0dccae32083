//! IT-Ops Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared plumbing for the IT-Ops workspace members.
//!
//! - **Logging**: `LogConfig` and subscriber construction
//! - **Telemetry**: the explicitly constructed handle components log through
//!
//! # Example
//!
//! ```no_run
//! use itops_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     let telemetry = init_logging(&config)?;
//!     telemetry.in_scope(|| tracing::info!("Application started"));
//!     Ok(())
//! }
//! ```

pub mod logging;
pub mod telemetry;

pub use telemetry::Telemetry;
