//! # kiosk-db: Store Layer for Kiosk POS
//!
//! SQLite persistence, the store seams checkout depends on, and checkout
//! itself (scan lookup + atomic settlement).
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kiosk POS Data Flow                              │
//! │                                                                         │
//! │  Register command (scan 7790001)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     kiosk-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Checkout    │───►│  store seams  │───►│ Repositories │  │   │
//! │  │   │ lookup/settle │    │ Lookup/Settle │    │ product/sale │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────┬───────┘  │   │
//! │  │                                                     │          │   │
//! │  │   ┌───────────────┐    ┌───────────────┐           │          │   │
//! │  │   │   Database    │◄───┤  Migrations   │◄──────────┘          │   │
//! │  │   │   (pool.rs)   │    │  (embedded)   │                      │   │
//! │  │   └───────────────┘    └───────────────┘                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (WAL)                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Product and sale repositories
//! - [`store`] - `InventoryLookup` / `SettlementStore` traits
//! - [`checkout`] - Scan lookup and settlement
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kiosk_db::{Checkout, Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("kiosk.db")).await?;
//! let checkout = Checkout::new(db.clone());
//!
//! let product = checkout.lookup("7790001").await?;
//! cart.add_or_merge(&product, 2)?;
//! let sale = checkout.settle(&cart, &session).await?;
//! cart.clear();
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::{Checkout, CheckoutError};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use store::{InventoryLookup, SettlementStore, StoreError};

// Repository re-exports for convenience
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
