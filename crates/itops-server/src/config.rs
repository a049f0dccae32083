//! Runtime configuration
//!
//! [`Config::load`] reads `.env` (if present) and then the process
//! environment. Every variable is optional; the constants below are the
//! fallbacks.

use serde::{Deserialize, Serialize};

use crate::audit::DEFAULT_SKIP_PATHS;

pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Drain wait after a shutdown signal, capped at 5s by the binary.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/itops";

pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 2;

pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

/// The admin UI dev server.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:3000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub audit: AuditConfig,
}

/// `ITOPS_HOST`, `ITOPS_PORT`, `ITOPS_SHUTDOWN_TIMEOUT`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// `DATABASE_*`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// `CORS_ALLOWED_ORIGINS` (comma list, `*` for any), `CORS_ALLOW_CREDENTIALS`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// `AUDIT_SKIP_PATHS` (comma list replacing the defaults),
/// `AUDIT_STRICT_RESOURCES`, `AUDIT_RECORD_READS`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Path prefixes that are never classified or recorded.
    pub skip_paths: Vec<String>,
    /// Skip collections that no router registered instead of deriving a token.
    pub strict_resources: bool,
    /// Record successful GET requests as READ entries.
    pub record_reads: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            skip_paths: DEFAULT_SKIP_PATHS.iter().map(|p| p.to_string()).collect(),
            strict_resources: false,
            record_reads: true,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let audit_defaults = AuditConfig::default();

        let config = Config {
            server: ServerConfig {
                host: std::env::var("ITOPS_HOST")
                    .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
                port: env_or("ITOPS_PORT", DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: env_or(
                    "ITOPS_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                ),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
                max_connections: env_or(
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                ),
                min_connections: env_or(
                    "DATABASE_MIN_CONNECTIONS",
                    DEFAULT_DATABASE_MIN_CONNECTIONS,
                ),
                connect_timeout_secs: env_or(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                ),
                idle_timeout_secs: env_or(
                    "DATABASE_IDLE_TIMEOUT",
                    DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
                ),
            },
            cors: CorsConfig {
                allowed_origins: split_list(
                    &std::env::var("CORS_ALLOWED_ORIGINS")
                        .unwrap_or_else(|_| DEFAULT_CORS_ALLOWED_ORIGIN.to_string()),
                ),
                allow_credentials: env_or("CORS_ALLOW_CREDENTIALS", true),
            },
            audit: AuditConfig {
                skip_paths: std::env::var("AUDIT_SKIP_PATHS")
                    .map(|raw| split_list(&raw))
                    .unwrap_or(audit_defaults.skip_paths),
                strict_resources: env_or(
                    "AUDIT_STRICT_RESOURCES",
                    audit_defaults.strict_resources,
                ),
                record_reads: env_or("AUDIT_RECORD_READS", audit_defaults.record_reads),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Reject settings the server cannot start with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("ITOPS_PORT must not be 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("DATABASE_URL is empty");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("DATABASE_MAX_CONNECTIONS must be at least 1");
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "DATABASE_MIN_CONNECTIONS ({}) exceeds DATABASE_MAX_CONNECTIONS ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty, any origin is accepted");
        }

        if let Some(bad) = self.audit.skip_paths.iter().find(|p| !p.starts_with('/')) {
            anyhow::bail!("Audit skip path '{}' must start with '/'", bad);
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                idle_timeout_secs: DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: true,
            },
            audit: AuditConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const AUDIT_VARS: [&str; 3] = [
        "AUDIT_SKIP_PATHS",
        "AUDIT_STRICT_RESOURCES",
        "AUDIT_RECORD_READS",
    ];

    fn clear_audit_vars() {
        for key in AUDIT_VARS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.audit.record_reads);
        assert!(!config.audit.strict_resources);
        assert!(config
            .audit
            .skip_paths
            .contains(&"/api/v1/audit-logs".to_string()));
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_database_url() {
        let mut config = Config::default();
        config.database.url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_max_connections() {
        let mut config = Config::default();
        config.database.max_connections = 0;
        config.database.min_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_min_above_max() {
        let mut config = Config::default();
        config.database.min_connections = 20;
        config.database.max_connections = 5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("DATABASE_MIN_CONNECTIONS"));
    }

    #[test]
    fn test_validate_rejects_relative_skip_path() {
        let mut config = Config::default();
        config.audit.skip_paths = vec!["health".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_split_list_trims_and_drops_empty() {
        assert_eq!(
            split_list(" /health , ,/metrics,"),
            vec!["/health".to_string(), "/metrics".to_string()]
        );
    }

    #[test]
    #[serial]
    fn test_load_reads_audit_settings() {
        clear_audit_vars();
        std::env::set_var("AUDIT_SKIP_PATHS", "/health,/internal");
        std::env::set_var("AUDIT_STRICT_RESOURCES", "true");
        std::env::set_var("AUDIT_RECORD_READS", "false");

        let config = Config::load().unwrap();
        assert_eq!(
            config.audit.skip_paths,
            vec!["/health".to_string(), "/internal".to_string()]
        );
        assert!(config.audit.strict_resources);
        assert!(!config.audit.record_reads);

        clear_audit_vars();
    }

    #[test]
    #[serial]
    fn test_load_falls_back_to_default_skip_list() {
        clear_audit_vars();

        let config = Config::load().unwrap();
        assert_eq!(config.audit.skip_paths.len(), DEFAULT_SKIP_PATHS.len());
    }
}
