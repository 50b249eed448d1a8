//! # kiosk-core: Pure Business Logic for Kiosk POS
//!
//! This crate holds the checkout logic of the register as pure functions and
//! plain data types with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kiosk POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Register (apps/terminal)                     │   │
//! │  │     scan ──► confirm qty ──► edit cart ──► checkout             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kiosk-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ │   │
//! │  │   │  types  │ │  money  │ │  cart   │ │validation│ │ history │ │   │
//! │  │   │ Product │ │  Money  │ │  Cart   │ │ quantity │ │ periods │ │   │
//! │  │   │  Sale   │ │         │ │CartLine │ │  forms   │ │ search  │ │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └──────────┘ └─────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kiosk-db (Store Layer)                       │   │
//! │  │        SQLite repositories, lookup, atomic settlement           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Category, Sale, SaleItem)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - The shopping cart and its snapshot bounds
//! - [`validation`] - Quantity input policy and product form rules
//! - [`catalog`] - Client-side product filtering
//! - [`history`] - Sales history periods, search and summaries
//! - [`session`] - Explicit session context (who is at the register)
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use kiosk_core::cart::Cart;
//! use kiosk_core::money::Money;
//! use kiosk_core::types::{Category, Product};
//!
//! let product = Product::new("7790001", "Agua 500ml", Money::from_cents(1000), 5, Category::Beverages);
//!
//! let mut cart = Cart::new();
//! cart.add_or_merge(&product, 2).unwrap();
//! cart.add_or_merge(&product, 2).unwrap();
//!
//! assert_eq!(cart.line_count(), 1);
//! assert_eq!(cart.total().cents(), 4000);
//!
//! // 4 + 2 would exceed the 5 units seen at scan time
//! assert!(cart.add_or_merge(&product, 2).is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod error;
pub mod history;
pub mod money;
pub mod session;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine, CartTotals};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use session::Session;
pub use types::*;
pub use validation::QuantityInputPolicy;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single line in the cart.
///
/// ## Business Reason
/// The quantity field on the register accepts three digits.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest unit price accepted by the product form (999,999.99).
///
/// Keeps `price × MAX_ITEM_QUANTITY` and cart totals far from `i64` limits.
pub const MAX_PRICE_CENTS: i64 = 99_999_999;

/// Stock level below which the catalog flags a product.
pub const LOW_STOCK_THRESHOLD: i64 = 10;
