//! # Sale Repository
//!
//! Settlement and history for sales.
//!
//! ## Settlement Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    INSERT sales                                                         │
//! │    INSERT sale_items (one per cart line, in cart order)                 │
//! │    for each item:                                                       │
//! │      UPDATE products SET stock = stock - qty                            │
//! │      WHERE id = ? AND stock >= qty        ── 0 rows? ──► ROLLBACK       │
//! │  COMMIT                                                 StockConflict   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Either the sale and every decrement land together or nothing does.
//! The conditional UPDATE is the live stock check: a register whose cart
//! snapshot went stale loses to whoever settled first.

use chrono::{DateTime, SubsecRound, Utc};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use kiosk_core::{Sale, SaleDraft, SaleItem};

use super::{decode_timestamp, encode_timestamp};
use crate::error::{DbError, DbResult};
use crate::store::StoreError;

#[derive(Debug, FromRow)]
struct SaleRow {
    id: String,
    total_cents: i64,
    date: String,
    cashier_id: Option<String>,
}

#[derive(Debug, FromRow)]
struct SaleItemRow {
    sale_id: String,
    product_id: String,
    barcode: String,
    name: String,
    price_cents: i64,
    quantity: i64,
    subtotal_cents: i64,
}

impl From<SaleItemRow> for SaleItem {
    fn from(row: SaleItemRow) -> Self {
        SaleItem {
            product_id: row.product_id,
            barcode: row.barcode,
            name: row.name,
            price_cents: row.price_cents,
            quantity: row.quantity,
            subtotal_cents: row.subtotal_cents,
        }
    }
}

impl SaleRow {
    fn into_sale(self, items: Vec<SaleItem>) -> DbResult<Sale> {
        Ok(Sale {
            date: decode_timestamp("sales.date", &self.date)?,
            id: self.id,
            items,
            total_cents: self.total_cents,
            cashier_id: self.cashier_id,
        })
    }
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Persists a sale and decrements stock for every item, atomically.
    ///
    /// ## Returns
    /// * `Ok(Sale)` - The stored sale with its new id
    /// * `Err(StoreError::StockConflict)` - Live stock is below an item's quantity;
    ///   nothing was written
    /// * `Err(StoreError::Db)` - The product vanished, a constraint failed or the
    ///   transaction could not run; nothing was written
    pub async fn commit(&self, draft: &SaleDraft, cashier_id: Option<String>) -> Result<Sale, StoreError> {
        check_draft(draft)?;

        let sale_id = Uuid::new_v4().to_string();
        // Stored with microsecond precision
        let date = draft.date.trunc_subsecs(6);

        debug!(sale_id = %sale_id, items = draft.items.len(), "Committing sale");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let written = write_sale(&mut tx, &sale_id, draft, date, cashier_id.as_deref()).await;
        if let Err(err) = written {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            if let StoreError::StockConflict { ref name, available, requested, .. } = err {
                warn!(
                    sale_id = %sale_id,
                    product = %name,
                    available,
                    requested,
                    "Settlement rejected: stock changed since scan"
                );
            }
            return Err(err);
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            sale_id = %sale_id,
            total_cents = draft.total_cents,
            items = draft.items.len(),
            "Sale committed"
        );

        let mut draft = draft.clone();
        draft.date = date;
        Ok(Sale::from_draft(sale_id, draft, cashier_id))
    }

    /// Gets a sale with its items.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let row = sqlx::query_as::<_, SaleRow>(
            "SELECT id, total_cents, date, cashier_id FROM sales WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = self.get_items(id).await?;
        row.into_sale(items).map(Some)
    }

    /// Gets the items of a sale in cart order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let rows = sqlx::query_as::<_, SaleItemRow>(
            r#"
            SELECT sale_id, product_id, barcode, name, price_cents, quantity, subtotal_cents
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY position
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SaleItem::from).collect())
    }

    /// Lists sales dated at or after `since` (all sales for `None`), newest first.
    pub async fn list_since(&self, since: Option<DateTime<Utc>>) -> DbResult<Vec<Sale>> {
        // Lexicographic order equals chronological order for the stored format
        let lower = since.map(encode_timestamp).unwrap_or_default();

        let rows = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT id, total_cents, date, cashier_id
            FROM sales
            WHERE date >= ?1
            ORDER BY date DESC, id
            "#,
        )
        .bind(&lower)
        .fetch_all(&self.pool)
        .await?;

        let item_rows = sqlx::query_as::<_, SaleItemRow>(
            r#"
            SELECT i.sale_id, i.product_id, i.barcode, i.name, i.price_cents, i.quantity, i.subtotal_cents
            FROM sale_items i
            INNER JOIN sales s ON s.id = i.sale_id
            WHERE s.date >= ?1
            ORDER BY i.sale_id, i.position
            "#,
        )
        .bind(&lower)
        .fetch_all(&self.pool)
        .await?;

        let mut items: HashMap<String, Vec<SaleItem>> = HashMap::new();
        for row in item_rows {
            items.entry(row.sale_id.clone()).or_default().push(row.into());
        }

        let sales = rows
            .into_iter()
            .map(|row| {
                let sale_items = items.remove(&row.id).unwrap_or_default();
                row.into_sale(sale_items)
            })
            .collect::<DbResult<Vec<_>>>()?;

        debug!(count = sales.len(), since = ?since, "Listed sales");
        Ok(sales)
    }

    /// Counts stored sales.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Rejects drafts the cart could never have produced.
fn check_draft(draft: &SaleDraft) -> Result<(), StoreError> {
    if draft.items.is_empty() {
        return Err(DbError::CheckViolation {
            message: "sale has no items".to_string(),
        }
        .into());
    }

    let sum: i64 = draft.items.iter().map(|i| i.subtotal_cents).sum();
    if sum != draft.total_cents {
        return Err(DbError::CheckViolation {
            message: format!("sale total {} does not match items {}", draft.total_cents, sum),
        }
        .into());
    }

    Ok(())
}

async fn write_sale(
    tx: &mut Transaction<'_, Sqlite>,
    sale_id: &str,
    draft: &SaleDraft,
    date: DateTime<Utc>,
    cashier_id: Option<&str>,
) -> Result<(), StoreError> {
    sqlx::query("INSERT INTO sales (id, total_cents, date, cashier_id) VALUES (?1, ?2, ?3, ?4)")
        .bind(sale_id)
        .bind(draft.total_cents)
        .bind(encode_timestamp(date))
        .bind(cashier_id)
        .execute(&mut **tx)
        .await
        .map_err(DbError::from)?;

    for (position, item) in draft.items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO sale_items (
                sale_id, position, product_id, barcode, name,
                price_cents, quantity, subtotal_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(sale_id)
        .bind(position as i64)
        .bind(&item.product_id)
        .bind(&item.barcode)
        .bind(&item.name)
        .bind(item.price_cents)
        .bind(item.quantity)
        .bind(item.subtotal_cents)
        .execute(&mut **tx)
        .await
        .map_err(DbError::from)?;
    }

    let now = encode_timestamp(Utc::now());
    for item in &draft.items {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - ?2, updated_at = ?3
            WHERE id = ?1 AND stock >= ?2
            "#,
        )
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(&now)
        .execute(&mut **tx)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            let live: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
                .bind(&item.product_id)
                .fetch_optional(&mut **tx)
                .await
                .map_err(DbError::from)?;

            return Err(match live {
                Some(available) => StoreError::StockConflict {
                    product_id: item.product_id.clone(),
                    name: item.name.clone(),
                    available,
                    requested: item.quantity,
                },
                None => DbError::not_found("Product", &item.product_id).into(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::TimeZone;
    use kiosk_core::{Category, Money, Product};

    async fn seeded() -> (Database, Product) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .insert(&Product::new("123", "Agua 500ml", Money::from_cents(1000), 5, Category::Beverages))
            .await
            .unwrap();
        (db, product)
    }

    fn draft_for(product: &Product, quantity: i64, date: DateTime<Utc>) -> SaleDraft {
        SaleDraft {
            items: vec![SaleItem {
                product_id: product.id.clone(),
                barcode: product.barcode.clone(),
                name: product.name.clone(),
                price_cents: product.price_cents,
                quantity,
                subtotal_cents: product.price_cents * quantity,
            }],
            total_cents: product.price_cents * quantity,
            date,
        }
    }

    #[tokio::test]
    async fn test_commit_writes_sale_and_decrements_stock() {
        let (db, product) = seeded().await;
        let sales = db.sales();

        let sale = sales
            .commit(&draft_for(&product, 4, Utc::now()), Some("u-1".to_string()))
            .await
            .unwrap();

        assert_eq!(sale.total_cents, 4000);
        assert_eq!(sale.cashier_id.as_deref(), Some("u-1"));

        let stored = sales.get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored, sale);

        let product = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 1);
    }

    #[tokio::test]
    async fn test_commit_rolls_back_on_stock_conflict() {
        let (db, product) = seeded().await;
        let sales = db.sales();

        // Another register sold 3 of the 5 after this cart was built
        db.products().adjust_stock(&product.id, -3).await.unwrap();

        let err = sales
            .commit(&draft_for(&product, 4, Utc::now()), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::StockConflict {
                available: 2,
                requested: 4,
                ..
            }
        ));

        assert_eq!(sales.count().await.unwrap(), 0);
        let product = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 2);
    }

    #[tokio::test]
    async fn test_commit_rejects_deleted_product() {
        let (db, product) = seeded().await;
        db.products().delete(&product.id).await.unwrap();

        let err = db
            .sales()
            .commit(&draft_for(&product, 1, Utc::now()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Db(ref e) if e.is_not_found()));
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_commit_rejects_inconsistent_draft() {
        let (db, product) = seeded().await;
        let mut draft = draft_for(&product, 2, Utc::now());
        draft.total_cents += 1;

        assert!(db.sales().commit(&draft, None).await.is_err());

        draft.items.clear();
        draft.total_cents = 0;
        assert!(db.sales().commit(&draft, None).await.is_err());
    }

    #[tokio::test]
    async fn test_list_since_filters_and_orders() {
        let (db, product) = seeded().await;
        let sales = db.sales();
        let old = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
        let recent = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();

        sales.commit(&draft_for(&product, 1, old), None).await.unwrap();
        sales.commit(&draft_for(&product, 2, recent), None).await.unwrap();

        let all = sales.list_since(None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].date, recent);
        assert_eq!(all[0].items.len(), 1);
        assert_eq!(all[0].items[0].quantity, 2);

        let since = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let filtered = sales.list_since(Some(since)).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].total_cents, 2000);
    }

    #[tokio::test]
    async fn test_sale_survives_product_deletion() {
        let (db, product) = seeded().await;
        let sale = db
            .sales()
            .commit(&draft_for(&product, 1, Utc::now()), None)
            .await
            .unwrap();

        db.products().delete(&product.id).await.unwrap();

        let stored = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored.items[0].name, "Agua 500ml");
    }
}
