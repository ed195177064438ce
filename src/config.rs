//! # Configuration Management Module
//!
//! ## Purpose
//! Centralized configuration management for the document metadata service,
//! supporting TOML files and environment variables with validation and
//! type-safe access to all system settings.
//!
//! ## Input/Output Specification
//! - **Input**: Configuration files (TOML), environment variables, CLI arguments
//! - **Output**: Validated configuration structs with defaults and overrides
//! - **Validation**: Type checking, range validation, secret-length checks
//!
//! ## Configuration Sources (in order of precedence)
//! 1. Command line arguments (highest priority)
//! 2. Environment variables
//! 3. Configuration files
//! 4. Default values (lowest priority)
//!
//! ## Usage
//! ```rust,no_run
//! use docmeta_service::config::Config;
//!
//! let config = Config::from_file("config.toml").unwrap();
//! println!("Server port: {}", config.server.port);
//! ```

use crate::errors::{DocumentError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure containing all system settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server and API configuration
    pub server: ServerConfig,
    /// Storage and database settings
    pub storage: StorageConfig,
    /// Bearer-token identity settings
    pub auth: AuthConfig,
    /// Query engine behavior
    pub query: QueryConfig,
    /// Logging and monitoring
    pub logging: LoggingConfig,
}

/// Server and API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Maximum request payload size in MB
    pub max_payload_size_mb: u32,
    /// Enable permissive CORS
    pub enable_cors: bool,
}

/// Storage and database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database file path
    pub db_path: PathBuf,
    /// Flush to disk after every write (durability over throughput)
    pub flush_on_write: bool,
}

/// Bearer-token identity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared HS256 secret the upstream issuer signs tokens with.
    /// Must be at least 32 bytes.
    pub jwt_secret: String,
    /// Clock-skew tolerance applied to token expiry, in seconds
    pub leeway_seconds: u64,
}

/// Query engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Minimum search term length
    pub min_term_length: usize,
    /// Maximum search term length
    pub max_term_length: usize,
}

/// Logging and monitoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable structured JSON logging
    pub json_format: bool,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::from_file("config.toml")
    }

    /// Load configuration from a specific file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!("Configuration file not found: {:?}, using defaults", path);
            let mut config = Self::default();
            config.apply_env_overrides()?;
            config.validate()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path).map_err(|e| DocumentError::Config {
            message: format!("Failed to read config file {:?}: {}", path, e),
        })?;

        let mut config: Config = toml::from_str(&content).map_err(|e| DocumentError::Config {
            message: format!("Failed to parse config file {:?}: {}", path, e),
        })?;

        // Apply environment variable overrides
        config.apply_env_overrides()?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("DOCMETA_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("DOCMETA_PORT") {
            self.server.port = port.parse().map_err(|_| DocumentError::Config {
                message: "Invalid port number in DOCMETA_PORT".to_string(),
            })?;
        }
        if let Ok(db_path) = std::env::var("DOCMETA_DB_PATH") {
            self.storage.db_path = PathBuf::from(db_path);
        }
        if let Ok(secret) = std::env::var("DOCMETA_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }

        Ok(())
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(DocumentError::ValidationFailed {
                field: "server.port".to_string(),
                reason: "Port cannot be zero".to_string(),
            });
        }

        // HS256 needs a key at least as long as the hash output
        if self.auth.jwt_secret.len() < 32 {
            return Err(DocumentError::ValidationFailed {
                field: "auth.jwt_secret".to_string(),
                reason: "HS256 secret must be at least 32 bytes".to_string(),
            });
        }

        if self.query.min_term_length > self.query.max_term_length {
            return Err(DocumentError::ValidationFailed {
                field: "query.min_term_length".to_string(),
                reason: "Minimum term length cannot be greater than maximum".to_string(),
            });
        }

        Ok(())
    }

    /// Get configuration as TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| DocumentError::Config {
            message: format!("Failed to serialize config to TOML: {}", e),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                max_payload_size_mb: 10,
                enable_cors: true,
            },
            storage: StorageConfig {
                db_path: PathBuf::from("./data/documents.db"),
                flush_on_write: false,
            },
            auth: AuthConfig {
                // Development default, matches what the upstream issuer ships
                // with out of the box. Override via DOCMETA_JWT_SECRET.
                jwt_secret: "jwt.myVerySecureSecretKeyThatIsAtLeast32CharactersLongForHS256Algorithm"
                    .to_string(),
                leeway_seconds: 60,
            },
            query: QueryConfig {
                min_term_length: 1,
                max_term_length: 256,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json_format: false,
            },
        }
    }
}
