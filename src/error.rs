use thiserror::Error;

/// Unified error type for the proxy pool
#[derive(Error, Debug)]
pub enum PoolError {
    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database connection failed: {0}")]
    DatabaseConnection(String),

    // Proxy errors
    #[error("Proxy already registered: {url}")]
    DuplicateProxy { url: String },

    #[error("No proxies available")]
    NoProxiesAvailable,

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for proxy pool operations
pub type Result<T> = std::result::Result<T, PoolError>;

impl PoolError {
    /// The pool had no record matching the selection predicate
    pub fn is_empty_pool(&self) -> bool {
        matches!(self, PoolError::NoProxiesAvailable)
    }

    /// Failure originated in the storage layer rather than in pool state
    pub fn is_storage_error(&self) -> bool {
        matches!(self, PoolError::Database(_) | PoolError::DatabaseConnection(_))
    }

    /// Map a sqlx insert failure, turning unique-constraint violations on
    /// the url column into `DuplicateProxy`.
    pub(crate) fn from_insert(err: sqlx::Error, url: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => PoolError::DuplicateProxy {
                url: url.to_string(),
            },
            _ => PoolError::Database(err),
        }
    }
}
