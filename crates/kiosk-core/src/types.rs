//! # Domain Types
//!
//! Core domain types used throughout Kiosk POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    SaleItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  product_id     │       │
//! │  │  barcode        │   │  items ─────────┼──►│  barcode, name  │       │
//! │  │  price_cents    │   │  total_cents    │   │  price_cents    │       │
//! │  │  stock          │   │  date           │   │  quantity       │       │
//! │  │  category       │   │  cashier_id     │   │  subtotal_cents │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Product is owned by the store. Sale is written once at settlement     │
//! │  and never mutated.                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! - `id`: UUID v4, immutable, used for relations
//! - `barcode`: what the scanner reads, unique within the catalog

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Category
// =============================================================================

/// Fixed product taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Beverages,
    Snacks,
    Sweets,
    Dairy,
    Bakery,
    Groceries,
    Cleaning,
    PersonalCare,
    Other,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 9] = [
        Category::Beverages,
        Category::Snacks,
        Category::Sweets,
        Category::Dairy,
        Category::Bakery,
        Category::Groceries,
        Category::Cleaning,
        Category::PersonalCare,
        Category::Other,
    ];

    /// Stable identifier (what is stored and typed).
    pub const fn id(&self) -> &'static str {
        match self {
            Category::Beverages => "beverages",
            Category::Snacks => "snacks",
            Category::Sweets => "sweets",
            Category::Dairy => "dairy",
            Category::Bakery => "bakery",
            Category::Groceries => "groceries",
            Category::Cleaning => "cleaning",
            Category::PersonalCare => "personal_care",
            Category::Other => "other",
        }
    }

    /// Human-readable label.
    pub const fn label(&self) -> &'static str {
        match self {
            Category::Beverages => "Beverages",
            Category::Snacks => "Snacks",
            Category::Sweets => "Sweets",
            Category::Dairy => "Dairy",
            Category::Bakery => "Bakery",
            Category::Groceries => "Groceries",
            Category::Cleaning => "Cleaning",
            Category::PersonalCare => "Personal care",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace([' ', '-'], "_");
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.id() == wanted)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "category".to_string(),
                allowed: Category::ALL.iter().map(|c| c.id().to_string()).collect(),
            })
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Barcode read by the scanner (EAN-13, UPC-A, Code 128, ...).
    pub barcode: String,

    /// Display name shown to the cashier and on the sale record.
    pub name: String,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Units available for sale.
    pub stock: i64,

    pub category: Category,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a product with a fresh id and timestamps.
    pub fn new(
        barcode: impl Into<String>,
        name: impl Into<String>,
        price: Money,
        stock: i64,
        category: Category,
    ) -> Self {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4().to_string(),
            barcode: barcode.into(),
            name: name.into(),
            price_cents: price.cents(),
            stock,
            category,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether at least one unit can be sold.
    #[inline]
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Checks whether the stock is under the given threshold.
    #[inline]
    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.stock < threshold
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line of a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItem {
    pub product_id: String,
    /// Barcode at time of sale (frozen).
    pub barcode: String,
    /// Product name at time of sale (frozen).
    pub name: String,
    /// Unit price in cents at time of sale (frozen).
    pub price_cents: i64,
    pub quantity: i64,
    /// price × quantity.
    pub subtotal_cents: i64,
}

impl SaleItem {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// The Sale snapshot built from a cart, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleDraft {
    pub items: Vec<SaleItem>,
    pub total_cents: i64,
    pub date: DateTime<Utc>,
}

impl SaleDraft {
    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A settled sale. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    pub items: Vec<SaleItem>,
    pub total_cents: i64,
    pub date: DateTime<Utc>,
    /// Who was signed in at the register, if anyone.
    pub cashier_id: Option<String>,
}

impl Sale {
    /// Promotes a draft to a sale record with the given id.
    pub fn from_draft(id: impl Into<String>, draft: SaleDraft, cashier_id: Option<String>) -> Self {
        Sale {
            id: id.into(),
            items: draft.items,
            total_cents: draft.total_cents,
            date: draft.date,
            cashier_id,
        }
    }

    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Total number of units sold.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip_through_id() {
        for category in Category::ALL {
            assert_eq!(category.id().parse::<Category>().unwrap(), category);
        }
        assert_eq!("Personal Care".parse::<Category>().unwrap(), Category::PersonalCare);
        assert!("weapons".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serializes_as_id() {
        let json = serde_json::to_string(&Category::PersonalCare).unwrap();
        assert_eq!(json, "\"personal_care\"");
    }

    #[test]
    fn test_product_stock_checks() {
        let mut product = Product::new("123", "Agua", Money::from_cents(1000), 5, Category::Beverages);
        assert!(product.in_stock());
        assert!(product.is_low_stock(10));

        product.stock = 0;
        assert!(!product.in_stock());

        product.stock = 10;
        assert!(!product.is_low_stock(10));
    }

    #[test]
    fn test_sale_from_draft_keeps_snapshot() {
        let draft = SaleDraft {
            items: vec![SaleItem {
                product_id: "p1".to_string(),
                barcode: "123".to_string(),
                name: "Agua".to_string(),
                price_cents: 1000,
                quantity: 4,
                subtotal_cents: 4000,
            }],
            total_cents: 4000,
            date: Utc::now(),
        };

        let sale = Sale::from_draft("s1", draft.clone(), Some("cashier".to_string()));
        assert_eq!(sale.items, draft.items);
        assert_eq!(sale.total().cents(), 4000);
        assert_eq!(sale.total_quantity(), 4);
        assert_eq!(sale.date, draft.date);
    }
}
