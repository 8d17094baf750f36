//! Store error types.

use thiserror::Error;

/// Convenience alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Persistence-layer failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite error.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Connection pool exhausted or broken.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    /// JSON (de)serialization of a stored column failed.
    #[error("stored JSON column error: {0}")]
    Json(#[from] serde_json::Error),
    /// Referenced campaign does not exist.
    #[error("campaign {0} not found")]
    CampaignNotFound(i64),
}
