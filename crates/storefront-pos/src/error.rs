//! # Terminal Error Type
//!
//! Every fallible terminal operation returns [`PosError`]. The UI layer turns
//! it into an [`ErrorResponse`] with a machine-readable code.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Terminal                           │
//! │                                                                         │
//! │  PosTerminal::complete()                                                │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Business rule? ──── CoreError::SplitMismatch ────────┐                 │
//! │         │                                             │                 │
//! │         ▼                                             ▼                 │
//! │  Database? ───────── DbError::StockConflict ──────► PosError            │
//! │         │                                             │                 │
//! │         ▼                                             ▼                 │
//! │  Device storage? ─── io / serde_json ─────────► ErrorResponse           │
//! │                                                 { code, message }       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ```json
//! {
//!   "code": "INSUFFICIENT_STOCK",
//!   "message": "Insufficient stock for Basmati Rice: 2 available, 3 requested"
//! }
//! ```

use serde::Serialize;
use thiserror::Error;

use storefront_core::{CoreError, CouponError, ValidationError};
use storefront_db::DbError;

pub type PosResult<T> = Result<T, PosError>;

#[derive(Debug, Error)]
pub enum PosError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Database(#[from] DbError),

    /// No active product carries the scanned barcode.
    #[error("No product with barcode {0}")]
    UnknownBarcode(String),

    /// The pincode is unknown or its delivery area is switched off.
    #[error("We do not deliver to pincode {0} yet")]
    NotServiceable(String),

    #[error("Device storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Stored data is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to write config file: {0}")]
    ConfigSave(#[from] toml::ser::Error),
}

impl From<ValidationError> for PosError {
    fn from(err: ValidationError) -> Self {
        PosError::Core(CoreError::Validation(err))
    }
}

impl From<CouponError> for PosError {
    fn from(err: CouponError) -> Self {
        PosError::Core(CoreError::Coupon(err))
    }
}

/// Machine-readable error codes for the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Database operation failed
    DatabaseError,

    /// Unexpected failure
    Internal,

    /// Cart operation failed
    CartError,

    /// Insufficient stock
    InsufficientStock,

    /// Tender could not be accepted
    PaymentError,

    /// Coupon lookup or eligibility failed
    CouponError,

    /// Show the "select a customer" prompt
    CustomerRequired,

    /// Device-local storage failed
    StorageError,

    /// Delivery area not covered
    NotServiceable,
}

/// What the UI receives when a terminal action fails.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ErrorResponse {
            code,
            message: message.into(),
        }
    }
}

impl PosError {
    pub fn code(&self) -> ErrorCode {
        match self {
            PosError::Core(err) => match err {
                CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
                CoreError::CustomerRequired => ErrorCode::CustomerRequired,
                CoreError::LineNotFound(_) => ErrorCode::NotFound,
                CoreError::EmptyCart | CoreError::CartTooLarge { .. } => ErrorCode::CartError,
                CoreError::MissingCustomerContact { .. } => ErrorCode::ValidationError,
                CoreError::SplitMismatch { .. } => ErrorCode::PaymentError,
                CoreError::Coupon(_) => ErrorCode::CouponError,
                CoreError::Validation(_) => ErrorCode::ValidationError,
            },
            PosError::Database(err) => match err {
                DbError::NotFound { .. } => ErrorCode::NotFound,
                DbError::UniqueViolation { .. }
                | DbError::ForeignKeyViolation { .. }
                | DbError::CheckViolation(_) => ErrorCode::ValidationError,
                DbError::StockConflict { .. } => ErrorCode::InsufficientStock,
                _ => ErrorCode::DatabaseError,
            },
            PosError::UnknownBarcode(_) => ErrorCode::NotFound,
            PosError::NotServiceable(_) => ErrorCode::NotServiceable,
            PosError::Storage(_) | PosError::Serialization(_) => ErrorCode::StorageError,
            PosError::InvalidConfig(_) | PosError::ConfigParse(_) | PosError::ConfigSave(_) => {
                ErrorCode::Internal
            }
        }
    }

    /// Converts to the UI shape. Internal database details are logged, not shown.
    pub fn to_response(&self) -> ErrorResponse {
        let message = match self {
            PosError::Database(
                e @ (DbError::QueryFailed(_)
                | DbError::TransactionFailed(_)
                | DbError::Internal(_)
                | DbError::ForeignKeyViolation { .. }),
            ) => {
                tracing::error!("Database operation failed: {}", e);
                "Database operation failed".to_string()
            }
            PosError::Database(DbError::ConnectionFailed(_)) => {
                "Database connection failed".to_string()
            }
            PosError::Database(DbError::StockConflict { .. }) => {
                "Stock changed while completing the sale; please review the cart".to_string()
            }
            other => other.to_string(),
        };

        ErrorResponse::new(self.code(), message)
    }
}

impl From<PosError> for ErrorResponse {
    fn from(err: PosError) -> Self {
        err.to_response()
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ErrorResponse {}
