//! # Serviceable Pincode Repository
//!
//! The delivery areas the store ships to.

use sqlx::SqlitePool;

use crate::error::DbResult;
use storefront_core::ServiceablePincode;

#[derive(Debug, Clone)]
pub struct PincodeRepository {
    pool: SqlitePool,
}

impl PincodeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PincodeRepository { pool }
    }

    pub async fn get(&self, pincode: &str) -> DbResult<Option<ServiceablePincode>> {
        let row = sqlx::query_as::<_, ServiceablePincode>(
            r#"
            SELECT pincode, city, state, delivery_days, is_active
            FROM serviceable_pincodes
            WHERE pincode = ?1
            "#,
        )
        .bind(pincode.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn upsert(&self, pincode: &ServiceablePincode) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO serviceable_pincodes (pincode, city, state, delivery_days, is_active)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (pincode) DO UPDATE SET
                city = excluded.city,
                state = excluded.state,
                delivery_days = excluded.delivery_days,
                is_active = excluded.is_active
            "#,
        )
        .bind(&pincode.pincode)
        .bind(&pincode.city)
        .bind(&pincode.state)
        .bind(pincode.delivery_days)
        .bind(pincode.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_active(&self) -> DbResult<Vec<ServiceablePincode>> {
        let rows = sqlx::query_as::<_, ServiceablePincode>(
            r#"
            SELECT pincode, city, state, delivery_days, is_active
            FROM serviceable_pincodes
            WHERE is_active = 1
            ORDER BY pincode
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
