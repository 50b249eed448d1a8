//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - Barcode lookup (the scan path)
//! - CRUD for the product maintenance screens
//! - Stock adjustments
//!
//! ## Barcode Identity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products.barcode is UNIQUE                                             │
//! │                                                                         │
//! │  insert("7790001")  ──► pre-check ──► exists? ──► UniqueViolation       │
//! │                                  └──► INSERT                            │
//! │                                                                         │
//! │  update(product)    ──► barcode is never rewritten                      │
//! │  delete(id)         ──► hard delete, sale_items keep their snapshot     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use kiosk_core::validation::ValidatedProduct;
use kiosk_core::{Category, Product};

use super::{decode_timestamp, encode_timestamp};
use crate::error::{DbError, DbResult};

const PRODUCT_COLUMNS: &str =
    "id, barcode, name, price_cents, stock, category, created_at, updated_at";

/// Raw `products` row.
#[derive(Debug, FromRow)]
struct ProductRow {
    id: String,
    barcode: String,
    name: String,
    price_cents: i64,
    stock: i64,
    category: Category,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> DbResult<Self> {
        Ok(Product {
            created_at: decode_timestamp("products.created_at", &row.created_at)?,
            updated_at: decode_timestamp("products.updated_at", &row.updated_at)?,
            id: row.id,
            barcode: row.barcode,
            name: row.name,
            price_cents: row.price_cents,
            stock: row.stock,
            category: row.category,
        })
    }
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let product = repo.find_by_barcode("7790001").await?;
/// let all = repo.list_all().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Looks a product up by the barcode the scanner read.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - No product carries this barcode
    pub async fn find_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        debug!(barcode = %barcode, "Looking up product by barcode");

        let sql = format!("SELECT {} FROM products WHERE barcode = ?1", PRODUCT_COLUMNS);
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(barcode)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    /// Lists the whole catalog sorted by name.
    ///
    /// Filtering happens in memory through `kiosk_core::catalog::ProductFilter`.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products ORDER BY name COLLATE NOCASE, barcode",
            PRODUCT_COLUMNS
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let products = rows
            .into_iter()
            .map(Product::try_from)
            .collect::<DbResult<Vec<_>>>()?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The inserted product
    /// * `Err(DbError::UniqueViolation)` - Barcode already registered
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(barcode = %product.barcode, "Inserting product");

        if self.find_by_barcode(&product.barcode).await?.is_some() {
            return Err(DbError::duplicate("barcode", &product.barcode));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO products (
                id, barcode, name, price_cents, stock, category, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.category)
        .bind(encode_timestamp(product.created_at))
        .bind(encode_timestamp(product.updated_at))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(product.clone()),
            // Another register won the race between pre-check and insert
            Err(e) => match DbError::from(e) {
                DbError::UniqueViolation { field, .. } if field.ends_with("barcode") => {
                    Err(DbError::duplicate("barcode", &product.barcode))
                }
                other => Err(other),
            },
        }
    }

    /// Creates a product from a validated form.
    pub async fn create(&self, form: ValidatedProduct) -> DbResult<Product> {
        let product = Product::new(form.barcode, form.name, form.price, form.stock, form.category);
        self.insert(&product).await
    }

    /// Updates name, price, stock and category of an existing product.
    ///
    /// The barcode is the product's scan identity and is left as stored.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The product as now stored
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                price_cents = ?3,
                stock = ?4,
                category = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.category)
        .bind(encode_timestamp(now))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        self.get_by_id(&product.id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", &product.id))
    }

    /// Applies a validated form to an existing product.
    pub async fn update_from_form(&self, id: &str, form: ValidatedProduct) -> DbResult<Product> {
        let mut product = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        product.name = form.name;
        product.price_cents = form.price.cents();
        product.stock = form.stock;
        product.category = form.category;

        self.update(&product).await
    }

    /// Adds `delta` to the stock (negative to remove units).
    ///
    /// ## Returns
    /// * `Ok(i64)` - The new stock level
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    /// * `Err(DbError::CheckViolation)` - Stock would go below zero
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<i64> {
        debug!(id = %id, delta = %delta, "Adjusting stock");

        let now = Utc::now();

        let new_stock: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock + ?2, updated_at = ?3
            WHERE id = ?1 AND stock + ?2 >= 0
            RETURNING stock
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(encode_timestamp(now))
        .fetch_optional(&self.pool)
        .await?;

        match new_stock {
            Some(stock) => Ok(stock),
            None => match self.get_by_id(id).await? {
                Some(product) => Err(DbError::CheckViolation {
                    message: format!(
                        "stock of {} would drop to {}",
                        product.barcode,
                        product.stock + delta
                    ),
                }),
                None => Err(DbError::not_found("Product", id)),
            },
        }
    }

    /// Deletes a product permanently.
    ///
    /// Past sales keep their item snapshots.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts products in the catalog.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
