//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub owner: OwnerConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub uploads: UploadStorageConfig,
}

/// Upload (image blob) storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UploadStorageConfig {
    /// Directory uploaded images are written to
    pub dir: PathBuf,
    /// Maximum accepted image size in bytes (default: 5 MB)
    #[serde(default = "default_upload_max_bytes")]
    pub max_bytes: usize,
}

fn default_upload_max_bytes() -> usize {
    5 * 1024 * 1024
}

/// Owner account configuration
///
/// A single distinguished user id with irrevocable top-level privilege.
/// The id is read once at startup and passed into every policy decision;
/// it is never stored per-record.
#[derive(Debug, Clone, Deserialize)]
pub struct OwnerConfig {
    /// The configured owner identifier
    pub id: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (INKPOST_*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.path", "data/inkpost.db")?
            .set_default("storage.uploads.dir", "data/uploads/images")?
            .set_default("storage.uploads.max_bytes", 5 * 1024 * 1024)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (INKPOST_*)
            .add_source(
                Environment::with_prefix("INKPOST")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        if self.owner.id.trim().is_empty() {
            return Err(crate::error::AppError::Config(
                "owner.id must not be empty".to_string(),
            ));
        }

        if self.storage.uploads.max_bytes == 0 {
            return Err(crate::error::AppError::Config(
                "storage.uploads.max_bytes must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                path: PathBuf::from("/tmp/inkpost-test.db"),
            },
            storage: StorageConfig {
                uploads: UploadStorageConfig {
                    dir: PathBuf::from("/tmp/inkpost-uploads"),
                    max_bytes: 5 * 1024 * 1024,
                },
            },
            owner: OwnerConfig {
                id: "01ARZ3NDEKTSV4RRFFQ69G5FAV".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    #[test]
    fn validate_accepts_valid_config() {
        let config = valid_config();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_owner_id() {
        let mut config = valid_config();
        config.owner.id = "  ".to_string();

        let error = config
            .validate()
            .expect_err("blank owner id must fail validation");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("owner.id")
        ));
    }

    #[test]
    fn validate_rejects_zero_upload_limit() {
        let mut config = valid_config();
        config.storage.uploads.max_bytes = 0;

        let error = config
            .validate()
            .expect_err("zero upload limit must fail validation");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("max_bytes")
        ));
    }
}
