//! # Error Types
//!
//! Domain-specific error types for kiosk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kiosk-core errors (this file)                                         │
//! │  ├── CoreError        - Cart and domain rule violations                │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  kiosk-db errors (separate crate)                                      │
//! │  ├── DbError          - Database operation failures                    │
//! │  ├── StoreError       - Store seam failures (stock conflict, partial)  │
//! │  └── CheckoutError    - Lookup / settlement outcome                    │
//! │                                                                         │
//! │  Register errors (apps/terminal)                                       │
//! │  └── TerminalError    - What the cashier sees                          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → TerminalError     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (barcode, id, bounds)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every cart operation that returns one of these leaves the cart exactly as
/// it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// No product carries the scanned barcode.
    #[error("Product not found: {barcode}")]
    ProductNotFound { barcode: String },

    /// Requested quantity exceeds the stock bound.
    ///
    /// ## User Workflow
    /// ```text
    /// Scan "123" (stock 5), cart already holds 4
    ///      │
    ///      ▼
    /// add_or_merge(qty: 2)
    ///      │
    ///      ▼
    /// InsufficientStock { available: 5, requested: 6, max_addable: 1 }
    ///      │
    ///      ▼
    /// Register shows: "Only 5 units of Agua 500ml available"
    /// ```
    ///
    /// `available` is the bound that was applied: the snapshot taken at first
    /// scan for cart edits, or the store's live count at settlement.
    /// `max_addable` is how many more units the caller may still request.
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        name: String,
        available: i64,
        requested: i64,
        max_addable: i64,
    },

    /// Quantity is non-numeric, non-positive, or beyond the field width.
    #[error("Invalid quantity '{input}': {reason}")]
    InvalidQuantity { input: String, reason: String },

    /// No line for this product in the cart.
    #[error("Product {0} is not in the cart")]
    LineNotFound(String),

    /// Checkout requested with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidQuantity error.
    pub fn invalid_quantity(input: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidQuantity {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when form input doesn't meet requirements.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, non-numeric price).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: "p1".to_string(),
            name: "Agua 500ml".to_string(),
            available: 5,
            requested: 6,
            max_addable: 1,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Agua 500ml: available 5, requested 6"
        );

        assert_eq!(CoreError::EmptyCart.to_string(), "Cart is empty");
        assert_eq!(
            CoreError::ProductNotFound {
                barcode: "123".to_string()
            }
            .to_string(),
            "Product not found: 123"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "barcode".to_string(),
        };
        assert_eq!(err.to_string(), "barcode is required");

        let err = ValidationError::MustBePositive {
            field: "price".to_string(),
        };
        assert_eq!(err.to_string(), "price must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
