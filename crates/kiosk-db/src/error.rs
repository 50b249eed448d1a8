//! # Store Errors
//!
//! ```text
//! sqlx::Error ──► DbError ──► StoreError (settlement) ──► CheckoutError ──► TerminalError
//! ```
//!
//! Constraint failures are classified with [`sqlx::error::ErrorKind`], so a
//! duplicate barcode surfaces as `UniqueViolation` and a stock update that
//! would go negative as `CheckViolation`.

use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// No row for this id or barcode. Deleted products end up here too.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Barcode already registered.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Negative stock or price, non-positive quantity, inconsistent totals.
    #[error("Constraint violation: {message}")]
    CheckViolation { message: String },

    /// File missing and not creatable, bad permissions, closed pool.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Begin, commit or rollback failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Every pooled connection stayed busy past the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A stored value that does not map back to its type.
    #[error("Corrupt {field} in stored row: {value}")]
    CorruptRow { field: String, value: String },

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn corrupt(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::CorruptRow {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound { .. })
    }
}

/// Column named in a SQLite constraint message:
/// `UNIQUE constraint failed: products.barcode` gives `barcode`.
fn constraint_column(message: &str) -> String {
    message
        .rsplit(": ")
        .next()
        .and_then(|target| target.split(',').next())
        .map(|target| target.rsplit('.').next().unwrap_or(target).trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    ErrorKind::UniqueViolation => DbError::UniqueViolation {
                        field: constraint_column(&message),
                        value: "unknown".to_string(),
                    },
                    ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation { message },
                    ErrorKind::CheckViolation | ErrorKind::NotNullViolation => {
                        DbError::CheckViolation { message }
                    }
                    _ => DbError::QueryFailed(message),
                }
            }
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
