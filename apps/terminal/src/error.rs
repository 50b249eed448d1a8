//! # Register Error Type
//!
//! What the cashier sees when a command fails.
//!
//! ## Error Flow
//! ```text
//! ValidationError ─┐
//! CoreError ───────┼──► TerminalError { code, message } ──► "✗ message"
//! DbError ─────────┤
//! CheckoutError ───┘
//! ```
//!
//! Store failures are logged in full and shown with a generic message.

use serde::Serialize;
use std::fmt;

use kiosk_core::{CoreError, ValidationError};
use kiosk_db::{CheckoutError, DbError};

/// Error returned from register operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminalError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for register responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Product, line or sale not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Store operation failed
    DatabaseError,

    /// Cart operation failed
    CartError,

    /// Insufficient stock
    InsufficientStock,

    /// Sale recorded but stock not fully updated
    PartialSettlement,

    /// Command not valid in the current scan state
    InvalidState,

    /// Unknown or malformed command
    UnknownCommand,
}

impl TerminalError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        TerminalError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        TerminalError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        TerminalError::new(ErrorCode::ValidationError, message)
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        TerminalError::new(ErrorCode::InvalidState, message)
    }

    pub fn unknown_command(message: impl Into<String>) -> Self {
        TerminalError::new(ErrorCode::UnknownCommand, message)
    }
}

impl From<DbError> for TerminalError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => TerminalError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => TerminalError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::CheckViolation { message } => TerminalError::validation(message),
            DbError::ConnectionFailed(_) => {
                TerminalError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::PoolExhausted => {
                TerminalError::new(ErrorCode::DatabaseError, "Database is busy, try again")
            }
            other => {
                tracing::error!(error = %other, "Database operation failed");
                TerminalError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<CoreError> for TerminalError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound { barcode } => TerminalError::not_found("Product", &barcode),
            CoreError::InsufficientStock {
                name,
                available,
                requested,
                max_addable,
                ..
            } => {
                let message = if available <= 0 {
                    format!("{} is out of stock", name)
                } else if max_addable <= 0 {
                    format!("All {} units of {} are already in the cart", available, name)
                } else {
                    format!(
                        "Only {} units of {} available ({} requested, you can add {} more)",
                        available, name, requested, max_addable
                    )
                };
                TerminalError::new(ErrorCode::InsufficientStock, message)
            }
            CoreError::InvalidQuantity { .. } => TerminalError::validation(err.to_string()),
            CoreError::LineNotFound(_) => TerminalError::new(ErrorCode::NotFound, err.to_string()),
            CoreError::EmptyCart => TerminalError::new(ErrorCode::CartError, "Cart is empty, scan a product first"),
            CoreError::Validation(e) => TerminalError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for TerminalError {
    fn from(err: ValidationError) -> Self {
        TerminalError::validation(err.to_string())
    }
}

impl From<CheckoutError> for TerminalError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Core(e) => e.into(),
            CheckoutError::LookupFailed(_) => {
                TerminalError::new(ErrorCode::DatabaseError, "Could not look the product up, try again")
            }
            CheckoutError::SettlementFailed(_) => TerminalError::new(
                ErrorCode::DatabaseError,
                "Sale could not be recorded; the cart was kept, try again",
            ),
            CheckoutError::PartialSettlement { sale_id, pending } => TerminalError::new(
                ErrorCode::PartialSettlement,
                format!(
                    "Sale {} was recorded but stock was not updated for {} product(s); reconcile manually",
                    sale_id,
                    pending.len()
                ),
            ),
        }
    }
}

impl fmt::Display for TerminalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TerminalError {}

/// Result type for register operations.
pub type TerminalResult<T> = Result<T, TerminalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_messages() {
        let err: TerminalError = CoreError::InsufficientStock {
            product_id: "p1".to_string(),
            name: "Agua".to_string(),
            available: 5,
            requested: 6,
            max_addable: 1,
        }
        .into();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(
            err.message,
            "Only 5 units of Agua available (6 requested, you can add 1 more)"
        );

        let err: TerminalError = CoreError::InsufficientStock {
            product_id: "p1".to_string(),
            name: "Agua".to_string(),
            available: 0,
            requested: 1,
            max_addable: 0,
        }
        .into();
        assert_eq!(err.message, "Agua is out of stock");
    }

    #[test]
    fn test_partial_settlement_is_its_own_code() {
        let err: TerminalError = CheckoutError::PartialSettlement {
            sale_id: "s1".to_string(),
            pending: vec!["p1".to_string(), "p2".to_string()],
        }
        .into();
        assert_eq!(err.code, ErrorCode::PartialSettlement);
        assert!(err.message.contains("2 product(s)"));
    }

    #[test]
    fn test_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&TerminalError::not_found("Product", "123")).unwrap();
        assert_eq!(json, r#"{"code":"NOT_FOUND","message":"Product not found: 123"}"#);
    }
}
