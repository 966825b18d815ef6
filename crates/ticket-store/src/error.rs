use thiserror::Error;

/// Errors that can occur when interacting with the ticket store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique business number is already taken by another record.
    #[error("Duplicate {entity} number: {number}")]
    Duplicate { entity: &'static str, number: String },

    /// A stored row could not be mapped back to a domain value.
    #[error("Invalid {entity} record: {reason}")]
    InvalidRecord {
        entity: &'static str,
        reason: String,
    },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for ticket store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
