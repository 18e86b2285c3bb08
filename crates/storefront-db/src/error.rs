//! # Database Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sqlx::Error / MigrateError                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module)      constraint failures get their own variants  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PosError::Database (storefront-pos) → ErrorResponse for the UI         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the write (duplicate SKU, phone, coupon code).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Usually a sale referencing a product or customer that is gone.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A CHECK constraint failed, e.g. a negative price slipped past validation.
    #[error("Constraint violation: {0}")]
    CheckViolation(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Inventory moved since the product was added to the cart.
    #[error("Stock changed for product {product_id}; re-add the item")]
    StockConflict { product_id: String },

    /// The sale transaction was rolled back; nothing was written.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Sorts a SQLite error message into the constraint that rejected it.
///
/// ```text
/// "UNIQUE constraint failed: customers.phone"  → UniqueViolation { field: customers.phone }
/// "FOREIGN KEY constraint failed"              → ForeignKeyViolation
/// "CHECK constraint failed: price_paise >= 0"  → CheckViolation
/// anything else                                → QueryFailed
/// ```
fn classify_sqlite(message: &str) -> DbError {
    if let Some(field) = message.strip_prefix("UNIQUE constraint failed: ") {
        return DbError::duplicate(field, "?");
    }
    if message.contains("FOREIGN KEY constraint failed") {
        return DbError::ForeignKeyViolation {
            message: message.to_owned(),
        };
    }
    if message.contains("CHECK constraint failed") {
        return DbError::CheckViolation(message.to_owned());
    }
    DbError::QueryFailed(message.to_owned())
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Row", "?"),
            sqlx::Error::Database(db_err) => classify_sqlite(db_err.message()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool closed".to_owned()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
