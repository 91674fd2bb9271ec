use crate::error::{PoolError, Result};
use crate::models::RegionFlag;
use crate::rotation::RotationStrategy;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,
    /// Selection defaults
    pub selection: SelectionConfig,
    /// Logging configuration
    pub log: LogConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// SQLite connection string (default: sqlite://proxy_pool.db)
    pub url: String,
    /// Maximum connections in pool
    pub max_connections: u32,
    /// Seconds SQLite waits on a locked database before failing
    pub busy_timeout: u64,
}

#[derive(Debug, Clone)]
pub struct SelectionConfig {
    /// Rotation strategy (random, least_time)
    pub strategy: RotationStrategy,
    /// Region flag passed to random selection
    pub region: RegionFlag,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level (debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            database: DatabaseConfig {
                url: get_env_or("DB_URL", "sqlite://proxy_pool.db"),
                max_connections: get_env_or("DB_MAX_CONNECTIONS", "5").parse().map_err(|_| {
                    PoolError::InvalidConfig("DB_MAX_CONNECTIONS must be a valid number".into())
                })?,
                busy_timeout: get_env_or("DB_BUSY_TIMEOUT", "5").parse().map_err(|_| {
                    PoolError::InvalidConfig("DB_BUSY_TIMEOUT must be a number of seconds".into())
                })?,
            },
            selection: SelectionConfig {
                strategy: RotationStrategy::from_str(&get_env_or(
                    "PROXY_ROTATION_STRATEGY",
                    "random",
                )),
                region: RegionFlag::from_flag(get_env_or("PROXY_REGION", "0").parse().map_err(
                    |_| PoolError::InvalidConfig("PROXY_REGION must be an integer".into()),
                )?),
            },
            log: LogConfig {
                level: get_env_or("LOG_LEVEL", "info"),
                format: get_env_or("LOG_FORMAT", "json"),
            },
        })
    }

    /// Whether logs should be emitted as JSON lines
    pub fn json_logs(&self) -> bool {
        !self.log.format.eq_ignore_ascii_case("pretty")
    }
}

/// Get environment variable with a default value
fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
