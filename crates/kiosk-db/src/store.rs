//! # Store Seams
//!
//! The two things checkout needs from a store, as traits.
//!
//! ```text
//! ┌──────────────┐  find_by_barcode   ┌─────────────────────┐
//! │   Checkout   │ ─────────────────► │  InventoryLookup    │
//! │              │                    ├─────────────────────┤
//! │              │  commit_sale       │  SettlementStore    │
//! │              │ ─────────────────► │                     │
//! └──────────────┘                    └─────────────────────┘
//!                                       impl for Database (SQLite)
//! ```
//!
//! `Database` settles in one transaction and never reports `Partial`.
//! Stores that cannot group the sale insert with the decrements must
//! report what was left undone through [`StoreError::Partial`].

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use kiosk_core::{Product, Sale, SaleDraft, Session};

use crate::error::DbError;
use crate::pool::Database;

/// Errors surfaced by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Live stock is below what the sale needs. Nothing was written.
    #[error("Stock conflict for {name}: available {available}, requested {requested}")]
    StockConflict {
        product_id: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// The sale was written but the listed products were not decremented.
    #[error("Sale {sale_id} written but stock not updated for {pending:?}")]
    Partial { sale_id: String, pending: Vec<String> },

    #[error(transparent)]
    Db(#[from] DbError),
}

/// Barcode lookup, queried fresh on every scan.
#[async_trait]
pub trait InventoryLookup: Send + Sync {
    async fn find_by_barcode(&self, barcode: &str) -> Result<Option<Product>, StoreError>;
}

/// Persists a sale and decrements stock for each of its items.
///
/// Implementations either apply all of it or none of it, or report
/// [`StoreError::Partial`].
#[async_trait]
pub trait SettlementStore: Send + Sync {
    async fn commit_sale(&self, draft: &SaleDraft, session: &Session) -> Result<Sale, StoreError>;
}

#[async_trait]
impl InventoryLookup for Database {
    async fn find_by_barcode(&self, barcode: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.products().find_by_barcode(barcode).await?)
    }
}

#[async_trait]
impl SettlementStore for Database {
    async fn commit_sale(&self, draft: &SaleDraft, session: &Session) -> Result<Sale, StoreError> {
        debug!(user_id = %session.user_id, "Settling through SQLite");
        self.sales().commit(draft, session.cashier_id()).await
    }
}
