//! # Product Repository
//!
//! Catalog rows joined with their inventory level.
//!
//! ```text
//! ┌───────────────────────┐        ┌──────────────────────────┐
//! │ products              │ 1    1 │ inventory                │
//! │ id, sku, barcode,     │───────►│ product_id, quantity,    │
//! │ name, price_paise     │        │ reserved                 │
//! └───────────────────────┘        └──────────────────────────┘
//!             │ LEFT JOIN → CatalogProduct { .., stock: StockLevel }
//!             ▼
//!   a product with no inventory row reads as 0 on hand
//! ```
//!
//! Every stock change outside a sale writes a `stock_movements` row in the
//! same transaction.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::order::insert_movement;
use storefront_core::import::ProductImportRow;
use storefront_core::order::{MovementReason, StockMovement};
use storefront_core::CatalogProduct;

const SELECT_PRODUCT: &str = r#"
    SELECT
        p.id,
        p.sku,
        p.barcode,
        p.name,
        p.price_paise,
        p.is_active,
        COALESCE(i.quantity, 0) AS quantity,
        COALESCE(i.reserved, 0) AS reserved
    FROM products p
    LEFT JOIN inventory i ON i.product_id = p.id
"#;

/// Result of a catalog import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub updated: usize,
}

#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CatalogProduct>> {
        let sql = format!("{SELECT_PRODUCT} WHERE p.id = ?1");
        let product = sqlx::query_as::<_, CatalogProduct>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<CatalogProduct>> {
        let sql = format!("{SELECT_PRODUCT} WHERE p.sku = ?1");
        let product = sqlx::query_as::<_, CatalogProduct>(&sql)
            .bind(sku.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Scanner lookup. Inactive products are not sellable and never match.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<CatalogProduct>> {
        debug!(barcode = %barcode, "Looking up product by barcode");

        let sql = format!("{SELECT_PRODUCT} WHERE p.barcode = ?1 AND p.is_active = 1");
        let product = sqlx::query_as::<_, CatalogProduct>(&sql)
            .bind(barcode.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Substring match over name, SKU and barcode. An empty query lists
    /// active products by name.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<CatalogProduct>> {
        let query = query.trim();
        debug!(query = %query, limit = %limit, "Searching products");

        let pattern = format!("%{}%", query.replace('%', "").replace('_', ""));
        let sql = format!(
            "{SELECT_PRODUCT}
             WHERE p.is_active = 1
               AND (?1 = '' OR p.name LIKE ?2 OR p.sku LIKE ?2 OR p.barcode LIKE ?2)
             ORDER BY p.name
             LIMIT ?3"
        );

        let products = sqlx::query_as::<_, CatalogProduct>(&sql)
            .bind(query)
            .bind(&pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Inserts a product and its inventory row.
    ///
    /// `Err(UniqueViolation)` when the SKU already exists.
    pub async fn insert(&self, row: &ProductImportRow) -> DbResult<CatalogProduct> {
        debug!(sku = %row.sku, "Inserting product");

        let id = Uuid::new_v4().to_string();
        let mut tx = self.pool.begin().await?;

        insert_product(&mut tx, &id, row).await?;
        write_inventory(&mut tx, &id, row.quantity).await?;
        if row.quantity != 0 {
            let movement =
                StockMovement::new(id.clone(), None, row.quantity, MovementReason::Import, Utc::now());
            insert_movement(&mut tx, &movement).await?;
        }

        tx.commit().await?;

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Inserts new SKUs and updates existing ones in one transaction.
    ///
    /// Imported quantity replaces the on-hand count; the difference is logged
    /// as an import movement.
    pub async fn import(&self, rows: &[ProductImportRow]) -> DbResult<ImportSummary> {
        let mut summary = ImportSummary::default();
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        for row in rows {
            let existing: Option<String> = sqlx::query_scalar("SELECT id FROM products WHERE sku = ?1")
                .bind(&row.sku)
                .fetch_optional(&mut *tx)
                .await?;

            let (id, previous) = match existing {
                Some(id) => {
                    sqlx::query(
                        r#"
                        UPDATE products SET
                            name = ?2,
                            barcode = ?3,
                            price_paise = ?4,
                            is_active = 1,
                            updated_at = ?5
                        WHERE id = ?1
                        "#,
                    )
                    .bind(&id)
                    .bind(&row.name)
                    .bind(&row.barcode)
                    .bind(row.price_paise)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;

                    let previous: i64 =
                        sqlx::query_scalar("SELECT quantity FROM inventory WHERE product_id = ?1")
                            .bind(&id)
                            .fetch_optional(&mut *tx)
                            .await?
                            .unwrap_or(0);

                    summary.updated += 1;
                    (id, previous)
                }
                None => {
                    let id = Uuid::new_v4().to_string();
                    insert_product(&mut tx, &id, row).await?;
                    summary.inserted += 1;
                    (id, 0)
                }
            };

            write_inventory(&mut tx, &id, row.quantity).await?;

            let delta = row.quantity - previous;
            if delta != 0 {
                let movement = StockMovement::new(id, None, delta, MovementReason::Import, now);
                insert_movement(&mut tx, &movement).await?;
            }
        }

        tx.commit().await?;

        info!(
            inserted = summary.inserted,
            updated = summary.updated,
            "Catalog import committed"
        );
        Ok(summary)
    }

    /// Moves on-hand stock by `delta` (manual count correction).
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<()> {
        debug!(id = %id, delta = %delta, "Adjusting stock");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE inventory SET quantity = quantity + ?2, updated_at = ?3 WHERE product_id = ?1",
        )
        .bind(id)
        .bind(delta)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory", id));
        }

        let movement = StockMovement::new(id, None, delta, MovementReason::Adjustment, Utc::now());
        insert_movement(&mut tx, &movement).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Sets units held for in-flight online orders.
    pub async fn set_reserved(&self, id: &str, reserved: i64) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE inventory SET reserved = ?2, updated_at = ?3 WHERE product_id = ?1",
        )
        .bind(id)
        .bind(reserved)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory", id));
        }
        Ok(())
    }

    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    /// Active products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

async fn insert_product(conn: &mut SqliteConnection, id: &str, row: &ProductImportRow) -> DbResult<()> {
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO products (id, sku, barcode, name, price_paise, is_active, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)
        "#,
    )
    .bind(id)
    .bind(&row.sku)
    .bind(&row.barcode)
    .bind(&row.name)
    .bind(row.price_paise)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| match DbError::from(e) {
        DbError::UniqueViolation { field, .. } => DbError::duplicate(field, row.sku.clone()),
        other => other,
    })?;

    Ok(())
}

async fn write_inventory(conn: &mut SqliteConnection, product_id: &str, quantity: i64) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO inventory (product_id, quantity, reserved, updated_at)
        VALUES (?1, ?2, 0, ?3)
        ON CONFLICT (product_id) DO UPDATE SET
            quantity = excluded.quantity,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    pub(crate) fn row(sku: &str, name: &str, price_paise: i64, quantity: i64) -> ProductImportRow {
        ProductImportRow {
            sku: sku.to_string(),
            name: name.to_string(),
            price_paise,
            barcode: Some(format!("8901{}", sku.len())),
            quantity,
        }
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = db().await;
        let repo = db.products();

        let product = repo.insert(&row("ATTA-5KG", "Atta 5kg", 28_900, 40)).await.unwrap();
        assert_eq!(product.stock.quantity, 40);
        assert_eq!(product.available(), 40);

        let by_sku = repo.get_by_sku("ATTA-5KG").await.unwrap().unwrap();
        assert_eq!(by_sku.id, product.id);

        let barcode = product.barcode.clone().unwrap();
        assert!(repo.get_by_barcode(&barcode).await.unwrap().is_some());
        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_sku_is_rejected() {
        let db = db().await;
        let repo = db.products();

        repo.insert(&row("DAL-1KG", "Toor Dal", 16_500, 5)).await.unwrap();
        let err = repo.insert(&row("DAL-1KG", "Other", 100, 1)).await.unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_search_matches_name_and_sku() {
        let db = db().await;
        let repo = db.products();
        repo.insert(&row("RICE-BAS", "Basmati Rice", 45_000, 3)).await.unwrap();
        repo.insert(&row("RICE-SON", "Sona Masoori Rice", 38_000, 3)).await.unwrap();
        repo.insert(&row("SALT-1KG", "Tata Salt", 2_800, 3)).await.unwrap();

        assert_eq!(repo.search("rice", 10).await.unwrap().len(), 2);
        assert_eq!(repo.search("SALT", 10).await.unwrap().len(), 1);
        assert_eq!(repo.search("", 2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_reserved_reduces_available() {
        let db = db().await;
        let repo = db.products();
        let product = repo.insert(&row("OIL-1L", "Sunflower Oil", 18_000, 10)).await.unwrap();

        repo.set_reserved(&product.id, 7).await.unwrap();
        let product = repo.get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(product.available(), 3);
    }

    #[tokio::test]
    async fn test_import_upserts_and_logs_movements() {
        let db = db().await;
        let repo = db.products();
        repo.insert(&row("TEA-250", "Tea 250g", 14_000, 10)).await.unwrap();

        let summary = repo
            .import(&[row("TEA-250", "Assam Tea 250g", 15_000, 25), row("SUGAR-1KG", "Sugar", 4_500, 12)])
            .await
            .unwrap();

        assert_eq!(summary, ImportSummary { inserted: 1, updated: 1 });

        let tea = repo.get_by_sku("TEA-250").await.unwrap().unwrap();
        assert_eq!(tea.name, "Assam Tea 250g");
        assert_eq!(tea.price_paise, 15_000);
        assert_eq!(tea.stock.quantity, 25);

        let movements = db.orders().movements_for_product(&tea.id).await.unwrap();
        let deltas: Vec<i64> = movements.iter().map(|m| m.quantity_delta).collect();
        assert_eq!(deltas, vec![10, 15]);
    }

    #[tokio::test]
    async fn test_adjust_and_deactivate() {
        let db = db().await;
        let repo = db.products();
        let product = repo.insert(&row("SOAP", "Soap", 4_000, 5)).await.unwrap();

        repo.adjust_stock(&product.id, -2).await.unwrap();
        assert_eq!(repo.get_by_id(&product.id).await.unwrap().unwrap().stock.quantity, 3);

        repo.deactivate(&product.id).await.unwrap();
        let barcode = product.barcode.unwrap();
        assert!(repo.get_by_barcode(&barcode).await.unwrap().is_none());
        assert!(matches!(
            repo.adjust_stock("missing", 1).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
