//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use std::net::SocketAddr;
use std::str::FromStr;
use tourney::db::{DatabaseConfig, DatabaseConfigError};

/// Default bind address when neither `SERVER_BIND` nor `PORT` is set
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Where tournaments are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// Process memory, lost on restart
    #[default]
    Memory,
    /// PostgreSQL through sqlx
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            other => Err(ConfigError::Invalid {
                var: "STORAGE_BACKEND".to_string(),
                reason: format!("Unknown backend '{other}', expected memory or postgres"),
            }),
        }
    }
}

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Storage backend
    pub storage: StorageBackend,
    /// Database configuration, only present for the postgres backend
    pub database: Option<DatabaseConfig>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    /// * `storage_override` - Optional storage backend override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a variable is invalid, or if the postgres backend is
    /// selected without any database URL
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
        storage_override: Option<StorageBackend>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => bind_from_env()?,
        };

        let storage = match storage_override {
            Some(storage) => storage,
            None => std::env::var("STORAGE_BACKEND")
                .ok()
                .map(|v| v.parse())
                .transpose()?
                .unwrap_or_default(),
        };

        let database = match storage {
            StorageBackend::Memory => None,
            StorageBackend::Postgres => Some(database_config(database_url_override)?),
        };

        Ok(ServerConfig {
            bind,
            storage,
            database,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(database) = &self.database {
            database.validate()?;
        }
        Ok(())
    }
}

/// Database settings from env, with the CLI URL taking precedence over `DATABASE_URL`
fn database_config(url_override: Option<String>) -> Result<DatabaseConfig, ConfigError> {
    match (DatabaseConfig::from_env(), url_override) {
        (Ok(config), Some(database_url)) => Ok(DatabaseConfig {
            database_url,
            ..config
        }),
        (Ok(config), None) => Ok(config),
        (Err(DatabaseConfigError::Missing(_)), Some(database_url)) => Ok(DatabaseConfig {
            database_url,
            ..DatabaseConfig::development()
        }),
        (Err(e), _) => Err(e.into()),
    }
}

/// `SERVER_BIND`, then `PORT` on all interfaces, then the default
fn bind_from_env() -> Result<SocketAddr, ConfigError> {
    if let Ok(bind) = std::env::var("SERVER_BIND") {
        return parse_var("SERVER_BIND", &bind);
    }
    if let Ok(port) = std::env::var("PORT") {
        let port: u16 = parse_var("PORT", &port)?;
        return Ok(SocketAddr::from(([0, 0, 0, 0], port)));
    }
    parse_var("SERVER_BIND", DEFAULT_BIND)
}

fn parse_var<T: FromStr>(var: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        var: var.to_string(),
        reason: format!("Cannot parse '{value}'"),
    })
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },

    #[error(transparent)]
    Database(#[from] DatabaseConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid {
            var: "PORT".to_string(),
            reason: "Cannot parse 'eighty'".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("PORT"));
        assert!(msg.contains("eighty"));

        let err = ConfigError::from(DatabaseConfigError::Missing("DATABASE_URL"));
        assert_eq!(err.to_string(), "DATABASE_URL must be set");
    }

    #[test]
    fn test_storage_backend_parsing() {
        assert_eq!("memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert_eq!("Postgres".parse::<StorageBackend>().unwrap(), StorageBackend::Postgres);
        assert!(matches!(
            "sqlite".parse::<StorageBackend>(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_parse_var() {
        let addr: SocketAddr = parse_var("SERVER_BIND", DEFAULT_BIND).unwrap();
        assert_eq!(addr.port(), 8080);
        assert!(parse_var::<u16>("PORT", "eighty").is_err());
    }

    #[test]
    fn test_overrides_skip_environment() {
        let config = ServerConfig::from_env(
            Some("0.0.0.0:9000".parse().unwrap()),
            None,
            Some(StorageBackend::Memory),
        )
        .unwrap();
        assert_eq!(config.bind.port(), 9000);
        assert!(config.database.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_checks_pool_sizes() {
        let config = ServerConfig {
            bind: DEFAULT_BIND.parse().unwrap(),
            storage: StorageBackend::Postgres,
            database: Some(DatabaseConfig {
                max_connections: 0, // Invalid
                ..DatabaseConfig::development()
            }),
        };

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Database(_)));
    }
}
