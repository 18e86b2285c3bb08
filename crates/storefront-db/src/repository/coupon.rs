//! # Coupon Repository
//!
//! Codes are stored uppercase and matched case-insensitively. Eligibility
//! and expiry are judged by `storefront_core::pricing::validate_coupon`, not
//! in SQL, so an expired code still comes back and can be reported as such.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use storefront_core::Coupon;

#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

impl CouponRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CouponRepository { pool }
    }

    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Coupon>> {
        debug!(code = %code, "Looking up coupon");

        let coupon = sqlx::query_as::<_, Coupon>(
            r#"
            SELECT
                id, code, discount_type, discount_value,
                pos_eligible, online_eligible, is_active, expires_at
            FROM coupons
            WHERE code = ?1 COLLATE NOCASE
            "#,
        )
        .bind(code.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(coupon)
    }

    pub async fn insert(&self, coupon: &Coupon) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO coupons (
                id, code, discount_type, discount_value,
                pos_eligible, online_eligible, is_active, expires_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&coupon.id)
        .bind(coupon.code.to_uppercase())
        .bind(coupon.discount_type)
        .bind(coupon.discount_value)
        .bind(coupon.pos_eligible)
        .bind(coupon.online_eligible)
        .bind(coupon.is_active)
        .bind(coupon.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, coupon.code.clone()),
            other => other,
        })?;

        Ok(())
    }

    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE coupons SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Coupon", id));
        }
        Ok(())
    }
}
