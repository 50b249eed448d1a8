//! # Validation Module
//!
//! Input validation for the register and the product forms.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Register input (text typed or scanned)                       │
//! │  └── THIS MODULE: parse quantities, product forms                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Cart rules (cart.rs)                                         │
//! │  └── Snapshot stock bounds, merge rules                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE(barcode)                                                   │
//! │  └── CHECK(stock >= 0), conditional decrement at settlement            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quantity Input Policy
//! A quantity field that is mid-edit often holds text that is not a number
//! (the cashier cleared it to type a new value). [`QuantityInputPolicy`]
//! names what happens then instead of leaving it to an implicit fallback.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::Category;
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum barcode length accepted by the product form.
pub const MAX_BARCODE_LEN: usize = 64;

/// Maximum product name length.
pub const MAX_NAME_LEN: usize = 200;

// =============================================================================
// Quantity Input
// =============================================================================

/// What to do with quantity text that is not a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityInputPolicy {
    /// Non-numeric text is rejected with `InvalidQuantity`.
    Strict,
    /// Non-numeric or empty text counts as a provisional quantity of 1.
    ///
    /// Numeric text is never clamped: `"0"` or `"-3"` is rejected with
    /// `InvalidQuantity` instead of becoming 1, so a cashier typing zero
    /// sees an error rather than a silent line of one.
    #[default]
    CoerceToOne,
}

impl fmt::Display for QuantityInputPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuantityInputPolicy::Strict => f.write_str("strict"),
            QuantityInputPolicy::CoerceToOne => f.write_str("coerce_to_one"),
        }
    }
}

impl FromStr for QuantityInputPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(QuantityInputPolicy::Strict),
            "coerce_to_one" | "coerce" => Ok(QuantityInputPolicy::CoerceToOne),
            _ => Err(ValidationError::NotAllowed {
                field: "quantity_input".to_string(),
                allowed: vec!["strict".to_string(), "coerce_to_one".to_string()],
            }),
        }
    }
}

/// Parses quantity text under the given policy.
///
/// ## Rules
/// ```text
/// text          Strict              CoerceToOne
/// ───────────   ─────────────────   ─────────────────
/// "3"           Ok(3)               Ok(3)
/// "" / "abc"    InvalidQuantity     Ok(1)  (provisional)
/// "0" / "-2"    InvalidQuantity     InvalidQuantity
/// "1000"        InvalidQuantity     InvalidQuantity
/// ```
///
/// ## Example
/// ```rust
/// use kiosk_core::validation::{parse_quantity, QuantityInputPolicy};
///
/// assert_eq!(parse_quantity("4", QuantityInputPolicy::Strict).unwrap(), 4);
/// assert_eq!(parse_quantity("", QuantityInputPolicy::CoerceToOne).unwrap(), 1);
/// assert!(parse_quantity("x", QuantityInputPolicy::Strict).is_err());
/// ```
pub fn parse_quantity(text: &str, policy: QuantityInputPolicy) -> CoreResult<i64> {
    let trimmed = text.trim();

    let quantity = match trimmed.parse::<i64>() {
        Ok(quantity) => quantity,
        Err(_) if is_numeric_overflow(trimmed) => {
            return Err(CoreError::invalid_quantity(
                trimmed,
                format!("cannot exceed {}", MAX_ITEM_QUANTITY),
            ));
        }
        Err(_) => match policy {
            QuantityInputPolicy::CoerceToOne => return Ok(1),
            QuantityInputPolicy::Strict => {
                return Err(CoreError::invalid_quantity(trimmed, "must be a whole number"));
            }
        },
    };

    validate_quantity(quantity).map_err(|e| CoreError::invalid_quantity(trimmed, e.to_string()))?;
    Ok(quantity)
}

fn is_numeric_overflow(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a barcode.
///
/// ## Rules
/// - Must not be empty
/// - At most 64 characters
/// - Letters, digits and hyphens only (covers EAN/UPC and Code 39/128 labels)
///
/// ## Example
/// ```rust
/// use kiosk_core::validation::validate_barcode;
///
/// assert!(validate_barcode("7790895000997").is_ok());
/// assert!(validate_barcode("").is_err());
/// assert!(validate_barcode("12 34").is_err());
/// ```
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    let barcode = barcode.trim();

    if barcode.is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }

    if barcode.len() > MAX_BARCODE_LEN {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: MAX_BARCODE_LEN,
        });
    }

    if !barcode.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must contain only letters, numbers and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a search query. Returns the trimmed query.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a product price: greater than zero, at most [`MAX_PRICE_CENTS`].
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if !price.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }

    if price.cents() > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 1,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Parses stock text. Must be a whole number >= 0.
pub fn parse_stock(text: &str) -> ValidationResult<i64> {
    let text = text.trim();

    if text.is_empty() {
        return Err(ValidationError::Required {
            field: "stock".to_string(),
        });
    }

    let stock: i64 = text.parse().map_err(|_| ValidationError::InvalidFormat {
        field: "stock".to_string(),
        reason: "must be a whole number".to_string(),
    })?;

    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(stock)
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Product Form
// =============================================================================

/// Raw product form input, exactly as typed.
///
/// Used by both the create and the edit flow. On edit the barcode is carried
/// over from the stored product, since it cannot change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductForm {
    pub barcode: String,
    pub name: String,
    pub price: String,
    pub stock: String,
    pub category: String,
}

/// A product form that passed every rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedProduct {
    pub barcode: String,
    pub name: String,
    pub price: Money,
    pub stock: i64,
    pub category: Category,
}

impl ProductForm {
    /// Applies the form rules: all fields required, price > 0, stock >= 0,
    /// category from the fixed taxonomy.
    ///
    /// ## Example
    /// ```rust
    /// use kiosk_core::validation::ProductForm;
    ///
    /// let form = ProductForm {
    ///     barcode: "7790001".into(),
    ///     name: "Agua 500ml".into(),
    ///     price: "10.50".into(),
    ///     stock: "24".into(),
    ///     category: "beverages".into(),
    /// };
    /// let product = form.validate().unwrap();
    /// assert_eq!(product.price.cents(), 1050);
    /// ```
    pub fn validate(&self) -> ValidationResult<ValidatedProduct> {
        for (field, value) in [
            ("barcode", &self.barcode),
            ("name", &self.name),
            ("price", &self.price),
            ("stock", &self.stock),
            ("category", &self.category),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::Required {
                    field: field.to_string(),
                });
            }
        }

        validate_barcode(&self.barcode)?;
        validate_product_name(&self.name)?;

        let price = Money::parse_decimal(&self.price)?;
        validate_price(price)?;

        let stock = parse_stock(&self.stock)?;
        let category: Category = self.category.parse()?;

        Ok(ValidatedProduct {
            barcode: self.barcode.trim().to_string(),
            name: self.name.trim().to_string(),
            price,
            stock,
            category,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
