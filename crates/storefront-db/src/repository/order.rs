//! # Order Repository
//!
//! Writes finalized sales and reads them back.
//!
//! ## record_sale: One Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   ├── INSERT orders                                                     │
//! │   ├── INSERT order_items        × lines                                 │
//! │   ├── UPDATE inventory          × lines  (guarded: never below reserved)│
//! │   ├── INSERT stock_movements    × lines                                 │
//! │   ├── INSERT payments           × 1 or 2                                │
//! │   └── INSERT coupon_redemptions × 0 or 1                                │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any failure drops the transaction → rollback → nothing persisted.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use storefront_core::order::{FinalizedSale, Order, OrderItem, PaymentRecord, StockMovement};

#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Persists every row of a sale atomically.
    ///
    /// ## Errors
    /// - `StockConflict` when a line would take inventory below the reserved
    ///   count (another terminal sold it first)
    /// - `NotFound` when a product has no inventory row
    /// - constraint errors for missing customers or coupons
    pub async fn record_sale(&self, sale: &FinalizedSale) -> DbResult<()> {
        let order = &sale.order;
        debug!(
            order_id = %order.id,
            order_number = %order.order_number,
            lines = sale.items.len(),
            "Recording sale"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, customer_id, channel, payment_method,
                subtotal_paise, discount_paise, tax_paise, total_paise,
                coupon_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&order.id)
        .bind(&order.order_number)
        .bind(&order.customer_id)
        .bind(order.channel)
        .bind(order.payment_method)
        .bind(order.subtotal_paise)
        .bind(order.discount_paise)
        .bind(order.tax_paise)
        .bind(order.total_paise)
        .bind(&order.coupon_id)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await?;

        for item in &sale.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, product_id, sku_snapshot, name_snapshot,
                    unit_price_paise, quantity, line_total_paise
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&item.id)
            .bind(&item.order_id)
            .bind(&item.product_id)
            .bind(&item.sku_snapshot)
            .bind(&item.name_snapshot)
            .bind(item.unit_price_paise)
            .bind(item.quantity)
            .bind(item.line_total_paise)
            .execute(&mut *tx)
            .await?;
        }

        for movement in &sale.movements {
            apply_sale_movement(&mut tx, movement).await?;
            insert_movement(&mut tx, movement).await?;
        }

        for payment in &sale.payments {
            sqlx::query(
                r#"
                INSERT INTO payments (id, order_id, method, amount_paise, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&payment.id)
            .bind(&payment.order_id)
            .bind(payment.method)
            .bind(payment.amount_paise)
            .bind(payment.created_at)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(redemption) = &sale.redemption {
            sqlx::query(
                r#"
                INSERT INTO coupon_redemptions (
                    id, coupon_id, order_id, customer_id, discount_paise, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&redemption.id)
            .bind(&redemption.coupon_id)
            .bind(&redemption.order_id)
            .bind(&redemption.customer_id)
            .bind(redemption.discount_paise)
            .bind(redemption.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total_paise = order.total_paise,
            "Sale recorded"
        );
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT
                id, order_number, customer_id, channel, payment_method,
                subtotal_paise, discount_paise, tax_paise, total_paise,
                coupon_id, created_at
            FROM orders
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT
                id, order_id, product_id, sku_snapshot, name_snapshot,
                unit_price_paise, quantity, line_total_paise
            FROM order_items
            WHERE order_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    pub async fn get_payments(&self, order_id: &str) -> DbResult<Vec<PaymentRecord>> {
        let payments = sqlx::query_as::<_, PaymentRecord>(
            r#"
            SELECT id, order_id, method, amount_paise, created_at
            FROM payments
            WHERE order_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Stock history of a product, oldest first.
    pub async fn movements_for_product(&self, product_id: &str) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, product_id, order_id, quantity_delta, reason, created_at
            FROM stock_movements
            WHERE product_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    pub async fn count_redemptions(&self, coupon_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM coupon_redemptions WHERE coupon_id = ?1")
                .bind(coupon_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Decrements inventory for one sale line, refusing to dip into stock that
/// is reserved for other orders.
async fn apply_sale_movement(conn: &mut SqliteConnection, movement: &StockMovement) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE inventory
        SET quantity = quantity + ?2, updated_at = ?3
        WHERE product_id = ?1 AND quantity - reserved + ?2 >= 0
        "#,
    )
    .bind(&movement.product_id)
    .bind(movement.quantity_delta)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(());
    }

    let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM inventory WHERE product_id = ?1")
        .bind(&movement.product_id)
        .fetch_optional(&mut *conn)
        .await?;

    match exists {
        Some(_) => {
            warn!(product_id = %movement.product_id, "Stock changed since the product was added");
            Err(DbError::StockConflict {
                product_id: movement.product_id.clone(),
            })
        }
        None => Err(DbError::not_found("Inventory", movement.product_id.clone())),
    }
}

/// Appends to the stock ledger on an open connection or transaction.
pub(crate) async fn insert_movement(conn: &mut SqliteConnection, movement: &StockMovement) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements (id, product_id, order_id, quantity_delta, reason, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.product_id)
    .bind(&movement.order_id)
    .bind(movement.quantity_delta)
    .bind(movement.reason)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
