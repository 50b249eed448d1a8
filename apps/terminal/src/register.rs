//! # Register
//!
//! Owns the cart and the scan state for one register session, and turns each
//! command into a [`Refresh`] for the renderer.
//!
//! ## Scan State
//! ```text
//!            scan ok                     quantity ok / cancel
//! Scanning ──────────► ConfirmingQuantity ───────────────────► Scanning
//!    │                        │
//!    │ checkout               └── invalid quantity or stock: stays here
//!    ▼
//! Settling ──── ok: cart cleared / failed: cart kept ────► Scanning
//! ```
//!
//! While a quantity is pending, further scans and cart edits are refused.

use tracing::{debug, info, warn};

use kiosk_core::catalog::{low_stock, ProductFilter};
use kiosk_core::history::{SalesPeriod, SaleSearch, SalesSummary};
use kiosk_core::validation::{parse_quantity, ProductForm};
use kiosk_core::{
    Cart, CartLine, CartTotals, CoreError, Product, QuantityInputPolicy, Sale, Session,
    MAX_ITEM_QUANTITY,
};
use kiosk_db::{Checkout, Database};

use crate::commands::{Command, LineRef, ProductEdits};
use crate::config::TerminalConfig;
use crate::error::{TerminalError, TerminalResult};

/// Where the register is in the scan cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    Scanning,
    /// A product was scanned and its quantity has not been typed yet.
    ConfirmingQuantity(Product),
    Settling,
}

/// Cart contents as shown to the cashier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        CartView {
            lines: cart.lines().to_vec(),
            totals: CartTotals::from(cart),
        }
    }
}

/// What changed after a command, for the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum Refresh {
    Cart(CartView),
    AwaitingQuantity {
        product: Product,
        in_cart: i64,
        max_addable: i64,
    },
    SaleCompleted(Sale),
    Products {
        products: Vec<Product>,
        low_stock_threshold: i64,
    },
    ProductSaved(Product),
    ProductDeleted { barcode: String, name: String },
    Sales {
        period: SalesPeriod,
        sales: Vec<Sale>,
        summary: SalesSummary,
        json: bool,
    },
    Help,
    Quit,
}

pub struct Register {
    db: Database,
    checkout: Checkout<Database>,
    cart: Cart,
    state: ScanState,
    session: Session,
    quantity_input: QuantityInputPolicy,
    low_stock_threshold: i64,
}

impl Register {
    pub fn new(db: Database, session: Session, config: &TerminalConfig) -> Self {
        Register {
            checkout: Checkout::new(db.clone()),
            db,
            cart: Cart::new(),
            state: ScanState::Scanning,
            session,
            quantity_input: config.quantity_input,
            low_stock_threshold: config.low_stock_threshold,
        }
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Runs one parsed command.
    pub async fn dispatch(&mut self, command: Command) -> TerminalResult<Refresh> {
        match command {
            Command::Bare(text) => match self.state {
                ScanState::ConfirmingQuantity(_) => self.confirm_quantity(&text),
                _ => self.scan(&text).await,
            },
            Command::Scan(code) => self.scan(&code).await,
            Command::Quantity(text) => self.confirm_quantity(&text),
            Command::SetQuantity { line, quantity } => self.set_quantity(&line, &quantity),
            Command::Step { line, delta } => self.step_quantity(&line, delta),
            Command::Remove(line) => self.remove(&line),
            Command::ShowCart => Ok(self.view()),
            Command::Checkout => self.checkout().await,
            Command::Cancel => Ok(self.cancel()),
            Command::ClearCart => self.clear_cart(),
            Command::Products { filter, low_only } => self.list_products(&filter, low_only).await,
            Command::AddProduct(form) => self.add_product(&form).await,
            Command::EditProduct { barcode, edits } => self.edit_product(&barcode, &edits).await,
            Command::DeleteProduct(barcode) => self.delete_product(&barcode).await,
            Command::Sales { period, search, json } => self.list_sales(period, &search, json).await,
            Command::Help => Ok(Refresh::Help),
            Command::Quit => Ok(Refresh::Quit),
        }
    }

    // =========================================================================
    // Scanning
    // =========================================================================

    /// Looks a code up and asks for its quantity.
    pub async fn scan(&mut self, code: &str) -> TerminalResult<Refresh> {
        self.ensure_scanning("Finish or cancel the pending quantity before scanning again")?;

        let product = self.checkout.lookup(code).await?;

        let (in_cart, max_addable) = match self.cart.line(&product.id) {
            Some(line) => (line.quantity, line.remaining()),
            None => (0, product.stock),
        };
        let max_addable = max_addable.min(MAX_ITEM_QUANTITY - in_cart);
        if max_addable <= 0 {
            return Err(CoreError::InsufficientStock {
                product_id: product.id,
                name: product.name,
                available: product.stock,
                requested: in_cart + 1,
                max_addable: 0,
            }
            .into());
        }

        debug!(barcode = %product.barcode, in_cart, max_addable, "Awaiting quantity");
        self.state = ScanState::ConfirmingQuantity(product.clone());

        Ok(Refresh::AwaitingQuantity {
            product,
            in_cart,
            max_addable,
        })
    }

    /// Adds the pending product with the typed quantity.
    ///
    /// Always strict: a mistyped quantity is asked for again.
    pub fn confirm_quantity(&mut self, text: &str) -> TerminalResult<Refresh> {
        let ScanState::ConfirmingQuantity(product) = &self.state else {
            return Err(TerminalError::invalid_state("No scanned product is waiting for a quantity"));
        };

        let quantity = parse_quantity(text, QuantityInputPolicy::Strict)?;
        self.cart.add_or_merge(product, quantity)?;

        self.state = ScanState::Scanning;
        Ok(self.view())
    }

    /// Drops the pending scan. The cart is untouched.
    pub fn cancel(&mut self) -> Refresh {
        if let ScanState::ConfirmingQuantity(product) = &self.state {
            debug!(barcode = %product.barcode, "Scan cancelled");
        }
        self.state = ScanState::Scanning;
        self.view()
    }

    // =========================================================================
    // Cart Edits
    // =========================================================================

    /// Sets a line's quantity from typed text under the configured policy.
    pub fn set_quantity(&mut self, line: &LineRef, text: &str) -> TerminalResult<Refresh> {
        self.ensure_scanning("Finish or cancel the pending quantity first")?;

        let product_id = self
            .resolve(line)
            .ok_or_else(|| TerminalError::from(CoreError::LineNotFound(describe(line))))?;

        self.cart
            .update_quantity_input(&product_id, text, self.quantity_input)?;
        Ok(self.view())
    }

    /// Moves a line's quantity by `delta` units.
    ///
    /// Stepping below 1 is rejected; the line stays until removed with `rm`.
    pub fn step_quantity(&mut self, line: &LineRef, delta: i64) -> TerminalResult<Refresh> {
        self.ensure_scanning("Finish or cancel the pending quantity first")?;

        let (product_id, current) = self
            .resolve(line)
            .and_then(|id| self.cart.line(&id).map(|l| (id, l.quantity)))
            .ok_or_else(|| TerminalError::from(CoreError::LineNotFound(describe(line))))?;

        self.cart.update_quantity(&product_id, current + delta)?;
        Ok(self.view())
    }

    /// Removes a line. Unknown lines leave the cart as it is.
    pub fn remove(&mut self, line: &LineRef) -> TerminalResult<Refresh> {
        self.ensure_scanning("Finish or cancel the pending quantity first")?;

        if let Some(product_id) = self.resolve(line) {
            if let Some(removed) = self.cart.remove(&product_id) {
                debug!(barcode = %removed.barcode, "Line removed");
            }
        }
        Ok(self.view())
    }

    pub fn clear_cart(&mut self) -> TerminalResult<Refresh> {
        self.ensure_scanning("Finish or cancel the pending quantity first")?;
        self.cart.clear();
        Ok(self.view())
    }

    pub fn view(&self) -> Refresh {
        Refresh::Cart(CartView::from(&self.cart))
    }

    // =========================================================================
    // Settlement
    // =========================================================================

    /// Settles the cart. The cart is cleared only when the sale was recorded.
    pub async fn checkout(&mut self) -> TerminalResult<Refresh> {
        self.ensure_scanning("Finish or cancel the pending quantity before checkout")?;

        self.state = ScanState::Settling;
        let result = self.checkout.settle(&self.cart, &self.session).await;
        self.state = ScanState::Scanning;

        match result {
            Ok(sale) => {
                self.cart.clear();
                Ok(Refresh::SaleCompleted(sale))
            }
            Err(e) => {
                warn!(error = %e, lines = self.cart.line_count(), "Checkout failed, cart kept");
                Err(e.into())
            }
        }
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    pub async fn list_products(&self, filter: &ProductFilter, low_only: bool) -> TerminalResult<Refresh> {
        let all = self.db.products().list_all().await?;

        let products: Vec<Product> = if low_only {
            low_stock(&all, self.low_stock_threshold)
                .into_iter()
                .filter(|p| filter.matches(p))
                .cloned()
                .collect()
        } else {
            filter.apply(&all).into_iter().cloned().collect()
        };

        Ok(Refresh::Products {
            products,
            low_stock_threshold: self.low_stock_threshold,
        })
    }

    pub async fn add_product(&self, form: &ProductForm) -> TerminalResult<Refresh> {
        let validated = form.validate()?;
        let product = self.db.products().create(validated).await?;

        info!(id = %product.id, barcode = %product.barcode, "Product added");
        Ok(Refresh::ProductSaved(product))
    }

    /// Edits a product found by barcode. The barcode itself cannot change.
    ///
    /// Lines already in the cart keep their scan-time snapshot.
    pub async fn edit_product(&self, barcode: &str, edits: &ProductEdits) -> TerminalResult<Refresh> {
        let current = self.find_product(barcode).await?;

        let mut form = ProductForm {
            barcode: current.barcode.clone(),
            name: current.name.clone(),
            price: current.price().to_plain_string(),
            stock: current.stock.to_string(),
            category: current.category.id().to_string(),
        };
        edits.apply_to(&mut form);

        let validated = form.validate()?;
        let product = self.db.products().update_from_form(&current.id, validated).await?;

        info!(id = %product.id, "Product updated");
        Ok(Refresh::ProductSaved(product))
    }

    pub async fn delete_product(&self, barcode: &str) -> TerminalResult<Refresh> {
        let product = self.find_product(barcode).await?;
        self.db.products().delete(&product.id).await?;

        info!(id = %product.id, "Product deleted");
        Ok(Refresh::ProductDeleted {
            barcode: product.barcode,
            name: product.name,
        })
    }

    // =========================================================================
    // History
    // =========================================================================

    pub async fn list_sales(&self, period: SalesPeriod, search: &str, json: bool) -> TerminalResult<Refresh> {
        let all = self.db.sales().list_since(period.start_local()).await?;

        let search = SaleSearch::new(search);
        let sales: Vec<Sale> = search.apply(&all).into_iter().cloned().collect();
        let summary = SalesSummary::of(&sales);

        Ok(Refresh::Sales {
            period,
            sales,
            summary,
            json,
        })
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn ensure_scanning(&self, message: &str) -> TerminalResult<()> {
        match self.state {
            ScanState::Scanning => Ok(()),
            _ => Err(TerminalError::invalid_state(message)),
        }
    }

    fn resolve(&self, line: &LineRef) -> Option<String> {
        let found = match line {
            LineRef::Barcode(barcode) => self.cart.line_by_barcode(barcode.trim()),
            LineRef::Index(n) => n.checked_sub(1).and_then(|i| self.cart.lines().get(i)),
        };
        found.map(|l| l.product_id.clone())
    }

    async fn find_product(&self, barcode: &str) -> TerminalResult<Product> {
        let barcode = barcode.trim();
        self.db
            .products()
            .find_by_barcode(barcode)
            .await?
            .ok_or_else(|| TerminalError::not_found("Product", barcode))
    }
}

fn describe(line: &LineRef) -> String {
    match line {
        LineRef::Barcode(barcode) => barcode.clone(),
        LineRef::Index(n) => format!("#{}", n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use kiosk_core::{Category, Money};
    use kiosk_db::DbConfig;

    async fn register() -> Register {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products()
            .insert(&Product::new("123", "Agua 500ml", Money::from_cents(1000), 5, Category::Beverages))
            .await
            .unwrap();
        db.products()
            .insert(&Product::new("456", "Alfajor", Money::from_cents(350), 0, Category::Snacks))
            .await
            .unwrap();

        Register::new(db, Session::new("user-1", "Ana"), &TerminalConfig::default())
    }

    fn cart_view(refresh: Refresh) -> CartView {
        match refresh {
            Refresh::Cart(view) => view,
            other => panic!("expected cart refresh, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_scan_then_confirm_adds_line() {
        let mut reg = register().await;

        match reg.scan("123").await.unwrap() {
            Refresh::AwaitingQuantity { product, in_cart, max_addable } => {
                assert_eq!(product.barcode, "123");
                assert_eq!(in_cart, 0);
                assert_eq!(max_addable, 5);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(reg.state(), ScanState::ConfirmingQuantity(_)));

        let view = cart_view(reg.confirm_quantity("2").unwrap());
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.totals.total.cents(), 2000);
        assert_eq!(reg.state(), &ScanState::Scanning);
    }

    #[tokio::test]
    async fn test_scanning_paused_while_confirming() {
        let mut reg = register().await;
        reg.scan("123").await.unwrap();

        let err = reg.scan("123").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);

        let err = reg.checkout().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);

        reg.cancel();
        assert_eq!(reg.state(), &ScanState::Scanning);
        assert!(reg.cart().is_empty());
    }

    #[tokio::test]
    async fn test_bad_quantity_keeps_confirming() {
        let mut reg = register().await;
        reg.scan("123").await.unwrap();

        let err = reg.confirm_quantity("abc").unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = reg.confirm_quantity("6").unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        assert!(matches!(reg.state(), ScanState::ConfirmingQuantity(_)));
        assert!(reg.cart().is_empty());

        reg.confirm_quantity("5").unwrap();
        assert_eq!(reg.cart().total_quantity(), 5);
    }

    #[tokio::test]
    async fn test_unknown_and_out_of_stock_scans() {
        let mut reg = register().await;

        let err = reg.scan("999").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = reg.scan("456").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(reg.state(), &ScanState::Scanning);
    }

    #[tokio::test]
    async fn test_rescan_merges_and_stops_at_stock() {
        let mut reg = register().await;
        reg.scan("123").await.unwrap();
        reg.confirm_quantity("2").unwrap();
        reg.scan("123").await.unwrap();
        reg.confirm_quantity("2").unwrap();

        assert_eq!(reg.cart().line_count(), 1);
        assert_eq!(reg.cart().total_quantity(), 4);

        match reg.scan("123").await.unwrap() {
            Refresh::AwaitingQuantity { in_cart, max_addable, .. } => {
                assert_eq!(in_cart, 4);
                assert_eq!(max_addable, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(reg.confirm_quantity("2").is_err());
        reg.confirm_quantity("1").unwrap();

        // Every unit is in the cart now
        let err = reg.scan("123").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
    }

    #[tokio::test]
    async fn test_set_quantity_uses_configured_policy() {
        let mut reg = register().await;
        reg.scan("123").await.unwrap();
        reg.confirm_quantity("3").unwrap();

        let view = cart_view(reg.set_quantity(&LineRef::Index(1), "abc").unwrap());
        assert_eq!(view.lines[0].quantity, 1);

        let view = cart_view(reg.set_quantity(&LineRef::Barcode("123".into()), "4").unwrap());
        assert_eq!(view.lines[0].quantity, 4);

        assert!(reg.set_quantity(&LineRef::Index(1), "0").is_err());
        assert!(reg.set_quantity(&LineRef::Index(1), "6").is_err());
        assert_eq!(reg.cart().total_quantity(), 4);

        let err = reg.set_quantity(&LineRef::Index(3), "2").unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_step_quantity_within_bounds() {
        let mut reg = register().await;
        reg.scan("123").await.unwrap();
        reg.confirm_quantity("4").unwrap();

        let view = cart_view(reg.step_quantity(&LineRef::Index(1), 1).unwrap());
        assert_eq!(view.lines[0].quantity, 5);

        let err = reg.step_quantity(&LineRef::Index(1), 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        reg.set_quantity(&LineRef::Index(1), "1").unwrap();
        assert!(reg.step_quantity(&LineRef::Barcode("123".into()), -1).is_err());
        assert_eq!(reg.cart().total_quantity(), 1);

        let err = reg.step_quantity(&LineRef::Index(2), 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_remove_unknown_line_is_noop() {
        let mut reg = register().await;
        reg.scan("123").await.unwrap();
        reg.confirm_quantity("1").unwrap();

        let view = cart_view(reg.remove(&LineRef::Barcode("999".into())).unwrap());
        assert_eq!(view.lines.len(), 1);

        let view = cart_view(reg.remove(&LineRef::Index(1)).unwrap());
        assert!(view.lines.is_empty());
    }

    #[tokio::test]
    async fn test_checkout_records_sale_and_clears_cart() {
        let mut reg = register().await;
        reg.scan("123").await.unwrap();
        reg.confirm_quantity("4").unwrap();

        let sale = match reg.checkout().await.unwrap() {
            Refresh::SaleCompleted(sale) => sale,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(sale.total_cents, 4000);
        assert_eq!(sale.cashier_id.as_deref(), Some("user-1"));
        assert!(reg.cart().is_empty());
        assert_eq!(reg.state(), &ScanState::Scanning);

        let stored = reg.db.products().find_by_barcode("123").await.unwrap().unwrap();
        assert_eq!(stored.stock, 1);

        match reg.list_sales(SalesPeriod::Today, "", false).await.unwrap() {
            Refresh::Sales { sales, summary, .. } => {
                assert_eq!(sales.len(), 1);
                assert_eq!(summary.total.cents(), 4000);
                assert_eq!(summary.units, 4);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_checkout_rejected() {
        let mut reg = register().await;
        let err = reg.checkout().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);
        assert_eq!(reg.db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stale_cart_keeps_lines_on_conflict() {
        let mut reg = register().await;
        reg.scan("123").await.unwrap();
        reg.confirm_quantity("4").unwrap();

        // Another register sold most of the stock meanwhile
        let id = reg.cart().lines()[0].product_id.clone();
        reg.db.products().adjust_stock(&id, -3).await.unwrap();

        let err = reg.checkout().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(reg.cart().total_quantity(), 4);
        assert_eq!(reg.db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_product_add_edit_delete() {
        let reg = register().await;

        let form = ProductForm {
            barcode: "789".into(),
            name: "Chicle".into(),
            price: "1.50".into(),
            stock: "40".into(),
            category: "sweets".into(),
        };
        let saved = match reg.add_product(&form).await.unwrap() {
            Refresh::ProductSaved(p) => p,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(saved.price_cents, 150);

        let err = reg.add_product(&form).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let edits = ProductEdits {
            price: Some("2".into()),
            ..Default::default()
        };
        match reg.edit_product("789", &edits).await.unwrap() {
            Refresh::ProductSaved(p) => {
                assert_eq!(p.price_cents, 200);
                assert_eq!(p.name, "Chicle");
                assert_eq!(p.stock, 40);
            }
            other => panic!("unexpected {other:?}"),
        }

        reg.delete_product("789").await.unwrap();
        let err = reg.delete_product("789").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_low_stock_listing() {
        let reg = register().await;

        match reg.list_products(&ProductFilter::default(), true).await.unwrap() {
            Refresh::Products { products, .. } => {
                let barcodes: Vec<&str> = products.iter().map(|p| p.barcode.as_str()).collect();
                assert_eq!(barcodes, vec!["456", "123"]);
            }
            other => panic!("unexpected {other:?}"),
        }

        let filter = ProductFilter::new("agua", None);
        match reg.list_products(&filter, false).await.unwrap() {
            Refresh::Products { products, .. } => assert_eq!(products.len(), 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bare_line_follows_state() {
        let mut reg = register().await;

        reg.dispatch(Command::Bare("123".into())).await.unwrap();
        assert!(matches!(reg.state(), ScanState::ConfirmingQuantity(_)));

        reg.dispatch(Command::Bare("2".into())).await.unwrap();
        assert_eq!(reg.state(), &ScanState::Scanning);
        assert_eq!(reg.cart().total_quantity(), 2);
    }
}
