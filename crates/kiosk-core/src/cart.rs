//! # Cart
//!
//! The shopping cart of one scanning session.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  scan ──► lookup (kiosk-db) ──► confirm qty ──► add_or_merge            │
//! │                                                     │                   │
//! │                            ┌────────────────────────┤                   │
//! │                            ▼                        ▼                   │
//! │                  product already in cart     new product                │
//! │                  quantity += qty             push CartLine              │
//! │                  (bound: stock_at_scan)      (bound: product.stock)     │
//! │                                                                         │
//! │  update_quantity / remove ──► total() ──► to_sale_draft ──► settle     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Bounds
//! A line records the stock seen when its product was first scanned and
//! never re-reads it. Later merges and edits are checked against that number.
//! The store re-checks live stock at settlement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Product, SaleDraft, SaleItem};
use crate::validation::{parse_quantity, validate_quantity, QuantityInputPolicy};

/// A line in the shopping cart.
///
/// ## Design Notes
/// - `product_id`: weak reference to the stored product
/// - `barcode`, `name`, `price_cents`: frozen at first scan
/// - `stock_at_scan`: upper bound for this line's quantity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    pub barcode: String,
    pub name: String,
    pub price_cents: i64,
    pub quantity: i64,
    pub stock_at_scan: i64,
}

impl CartLine {
    /// Creates a line from a product, freezing its price and stock.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartLine {
            product_id: product.id.clone(),
            barcode: product.barcode.clone(),
            name: product.name.clone(),
            price_cents: product.price_cents,
            quantity,
            stock_at_scan: product.stock,
        }
    }

    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Price × quantity.
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.price().multiply_quantity(self.quantity)
    }

    /// Units that can still be added before hitting the snapshot bound.
    #[inline]
    pub fn remaining(&self) -> i64 {
        (self.stock_at_scan - self.quantity).max(0)
    }

    fn insufficient(&self, requested: i64) -> CoreError {
        CoreError::InsufficientStock {
            product_id: self.product_id.clone(),
            name: self.name.clone(),
            available: self.stock_at_scan,
            requested,
            max_addable: self.remaining(),
        }
    }

    fn to_sale_item(&self) -> SaleItem {
        SaleItem {
            product_id: self.product_id.clone(),
            barcode: self.barcode.clone(),
            name: self.name.clone(),
            price_cents: self.price_cents,
            quantity: self.quantity,
            subtotal_cents: self.subtotal().cents(),
        }
    }
}

/// The shopping cart.
///
/// ## Invariants
/// - At most one line per `product_id` (scanning again merges)
/// - `1 <= quantity <= stock_at_scan` for every line
/// - Lines keep first-insertion order
/// - A failed operation leaves the cart unchanged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,

    /// When the cart was created/last cleared
    started_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            started_at: Utc::now(),
        }
    }

    /// Adds a product to the cart or increases its line's quantity.
    ///
    /// ## Behavior
    /// - New product: `quantity <= product.stock`, line appended
    /// - Known product: `line.quantity + quantity <= line.stock_at_scan`,
    ///   quantity increased in place (the product argument's stock is not
    ///   consulted again)
    ///
    /// ## Errors
    /// - `InvalidQuantity` if `quantity` is not in `1..=999`
    /// - `InsufficientStock` if the bound would be exceeded
    pub fn add_or_merge(&mut self, product: &Product, quantity: i64) -> CoreResult<&CartLine> {
        validate_quantity(quantity)
            .map_err(|e| CoreError::invalid_quantity(quantity.to_string(), e.to_string()))?;

        if let Some(index) = self.position(&product.id) {
            let line = &self.lines[index];
            let new_qty = line.quantity + quantity;
            if new_qty > line.stock_at_scan {
                return Err(line.insufficient(new_qty));
            }
            validate_quantity(new_qty)
                .map_err(|e| CoreError::invalid_quantity(new_qty.to_string(), e.to_string()))?;
            self.ensure_total_fits(&product.id, line.price_cents, new_qty)?;

            self.lines[index].quantity = new_qty;
            return Ok(&self.lines[index]);
        }

        if quantity > product.stock {
            return Err(CoreError::InsufficientStock {
                product_id: product.id.clone(),
                name: product.name.clone(),
                available: product.stock,
                requested: quantity,
                max_addable: product.stock.max(0),
            });
        }
        self.ensure_total_fits(&product.id, product.price_cents, quantity)?;

        self.lines.push(CartLine::from_product(product, quantity));
        Ok(&self.lines[self.lines.len() - 1])
    }

    /// Replaces the quantity of a line.
    ///
    /// ## Errors
    /// - `LineNotFound` if no line exists for `product_id`
    /// - `InvalidQuantity` if `new_quantity < 1` (or beyond 999)
    /// - `InsufficientStock` if `new_quantity > stock_at_scan`
    pub fn update_quantity(&mut self, product_id: &str, new_quantity: i64) -> CoreResult<&CartLine> {
        let index = self
            .position(product_id)
            .ok_or_else(|| CoreError::LineNotFound(product_id.to_string()))?;

        validate_quantity(new_quantity)
            .map_err(|e| CoreError::invalid_quantity(new_quantity.to_string(), e.to_string()))?;

        let line = &self.lines[index];
        if new_quantity > line.stock_at_scan {
            return Err(CoreError::InsufficientStock {
                product_id: line.product_id.clone(),
                name: line.name.clone(),
                available: line.stock_at_scan,
                requested: new_quantity,
                max_addable: line.stock_at_scan,
            });
        }
        self.ensure_total_fits(product_id, line.price_cents, new_quantity)?;

        self.lines[index].quantity = new_quantity;
        Ok(&self.lines[index])
    }

    /// Replaces the quantity of a line from text typed into the quantity field.
    ///
    /// The text goes through [`parse_quantity`] with `policy`, so under
    /// `CoerceToOne` a cleared field sets the line to 1.
    pub fn update_quantity_input(
        &mut self,
        product_id: &str,
        text: &str,
        policy: QuantityInputPolicy,
    ) -> CoreResult<&CartLine> {
        if self.position(product_id).is_none() {
            return Err(CoreError::LineNotFound(product_id.to_string()));
        }
        let quantity = parse_quantity(text, policy)?;
        self.update_quantity(product_id, quantity)
    }

    /// Removes the line for a product. Absent products are a no-op.
    pub fn remove(&mut self, product_id: &str) -> Option<CartLine> {
        let index = self.position(product_id)?;
        Some(self.lines.remove(index))
    }

    /// Clears all lines from the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.started_at = Utc::now();
    }

    /// Σ(price × quantity), recomputed from the current lines.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines in first-insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, product_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    pub fn line_by_barcode(&self, barcode: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.barcode == barcode)
    }

    /// Returns the number of distinct products in the cart.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns the total quantity of all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Builds the Sale snapshot for settlement.
    ///
    /// ## Errors
    /// - `EmptyCart` if there is nothing to sell
    pub fn to_sale_draft(&self, date: DateTime<Utc>) -> CoreResult<SaleDraft> {
        if self.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let items: Vec<SaleItem> = self.lines.iter().map(CartLine::to_sale_item).collect();
        let total_cents = items.iter().map(|i| i.subtotal_cents).sum();

        Ok(SaleDraft {
            items,
            total_cents,
            date,
        })
    }

    /// Rejects a quantity whose line subtotal or cart total would overflow.
    fn ensure_total_fits(&self, product_id: &str, price_cents: i64, quantity: i64) -> CoreResult<()> {
        let others = self
            .lines
            .iter()
            .filter(|l| l.product_id != product_id)
            .try_fold(Money::zero(), |acc, l| {
                acc.checked_add(l.price().checked_multiply_quantity(l.quantity)?)
            });

        Money::from_cents(price_cents)
            .checked_multiply_quantity(quantity)
            .and_then(|subtotal| others?.checked_add(subtotal))
            .map(|_| ())
            .ok_or_else(|| {
                CoreError::invalid_quantity(quantity.to_string(), "total exceeds the largest supported amount")
            })
    }

    fn position(&self, product_id: &str) -> Option<usize> {
        self.lines.iter().position(|l| l.product_id == product_id)
    }
}

/// Cart totals summary for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub line_count: usize,
    pub total_quantity: i64,
    pub total: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            line_count: cart.line_count(),
            total_quantity: cart.total_quantity(),
            total: cart.total(),
        }
    }
}
