//! # Checkout
//!
//! The scan path and settlement, over the store seams.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  lookup(code) ──► InventoryLookup::find_by_barcode (fresh, no cache)    │
//! │       │                                                                 │
//! │       ├── None         ──► ProductNotFound                              │
//! │       ├── stock <= 0   ──► InsufficientStock { available: 0 }           │
//! │       └── Product      ──► caller confirms qty, Cart::add_or_merge      │
//! │                                                                         │
//! │  settle(cart, session)                                                  │
//! │       ├── empty cart   ──► EmptyCart (store never called)               │
//! │       └── SettlementStore::commit_sale(draft)                           │
//! │              ├── Ok(sale)          ──► caller clears the cart           │
//! │              ├── StockConflict     ──► InsufficientStock                │
//! │              ├── Partial           ──► PartialSettlement                │
//! │              └── anything else     ──► SettlementFailed                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Failures leave the cart untouched so the cashier can fix it and retry.
//! Nothing here retries on its own.

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use kiosk_core::validation::validate_barcode;
use kiosk_core::{Cart, CoreError, Product, Sale, Session};

use crate::store::{InventoryLookup, SettlementStore, StoreError};

/// Outcome of a failed lookup or settlement.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Domain rule violation: not found, insufficient stock, empty cart.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The store could not be queried.
    #[error("Lookup failed: {0}")]
    LookupFailed(String),

    /// The store rejected or failed the sale. Nothing was written.
    #[error("Settlement failed: {0}")]
    SettlementFailed(String),

    /// The sale was recorded but some stock decrements were not.
    /// Needs manual reconciliation.
    #[error("Sale {sale_id} recorded but stock not updated for {} product(s)", .pending.len())]
    PartialSettlement { sale_id: String, pending: Vec<String> },
}

impl CheckoutError {
    /// Returns the wrapped domain error, if any.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            CheckoutError::Core(e) => Some(e),
            _ => None,
        }
    }
}

/// Lookup and settlement against a store.
#[derive(Debug, Clone)]
pub struct Checkout<S> {
    store: S,
}

impl<S> Checkout<S>
where
    S: InventoryLookup + SettlementStore,
{
    pub fn new(store: S) -> Self {
        Checkout { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolves a scanned code to a sellable product.
    ///
    /// The cart is not touched. The caller asks for a quantity and then calls
    /// [`Cart::add_or_merge`].
    pub async fn lookup(&self, code: &str) -> Result<Product, CheckoutError> {
        let code = code.trim();
        validate_barcode(code).map_err(CoreError::from)?;

        debug!(barcode = %code, "Scanned");

        let product = self
            .store
            .find_by_barcode(code)
            .await
            .map_err(|e| {
                error!(barcode = %code, error = %e, "Product lookup failed");
                CheckoutError::LookupFailed(e.to_string())
            })?
            .ok_or_else(|| CoreError::ProductNotFound {
                barcode: code.to_string(),
            })?;

        if product.stock <= 0 {
            return Err(CoreError::InsufficientStock {
                product_id: product.id,
                name: product.name,
                available: 0,
                requested: 1,
                max_addable: 0,
            }
            .into());
        }

        Ok(product)
    }

    /// Looks a code up and adds `quantity` units to the cart.
    pub async fn scan_into(&self, cart: &mut Cart, code: &str, quantity: i64) -> Result<Product, CheckoutError> {
        let product = self.lookup(code).await?;
        cart.add_or_merge(&product, quantity)?;
        Ok(product)
    }

    /// Settles the cart as one sale.
    ///
    /// The cart is borrowed, not consumed. On success the caller clears it;
    /// on failure it still holds every line.
    pub async fn settle(&self, cart: &Cart, session: &Session) -> Result<Sale, CheckoutError> {
        let draft = cart.to_sale_draft(Utc::now())?;

        info!(
            lines = draft.items.len(),
            total_cents = draft.total_cents,
            user_id = %session.user_id,
            "Settling cart"
        );

        match self.store.commit_sale(&draft, session).await {
            Ok(sale) => {
                info!(sale_id = %sale.id, total_cents = sale.total_cents, "Sale settled");
                Ok(sale)
            }
            Err(StoreError::StockConflict {
                product_id,
                name,
                available,
                requested,
            }) => {
                warn!(product = %name, available, requested, "Settlement rejected: insufficient stock");
                Err(CoreError::InsufficientStock {
                    product_id,
                    name,
                    available,
                    requested,
                    max_addable: available.max(0),
                }
                .into())
            }
            Err(StoreError::Partial { sale_id, pending }) => {
                error!(sale_id = %sale_id, pending = ?pending, "Sale recorded without all stock updates");
                Err(CheckoutError::PartialSettlement { sale_id, pending })
            }
            Err(StoreError::Db(e)) => {
                error!(error = %e, "Settlement failed");
                Err(CheckoutError::SettlementFailed(e.to_string()))
            }
        }
    }
}
