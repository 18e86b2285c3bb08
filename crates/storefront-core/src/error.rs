//! # Error Types
//!
//! Domain-specific error types for storefront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  storefront-core (this file)                                            │
//! │  ├── CoreError        - Cart, session and payment rule violations       │
//! │  ├── CouponError      - Coupon rejected (invalid/ineligible/expired)    │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  storefront-db                                                          │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  storefront-pos                                                         │
//! │  └── PosError         - What the terminal UI sees (code + message)      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → PosError ← DbError                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant is recoverable by the cashier: none of them leave the
//! session half-mutated.

use thiserror::Error;

use crate::money::Money;
use crate::types::SalesChannel;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the cart, session and finalizer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Requested quantity is above available stock (quantity − reserved).
    ///
    /// ## User Workflow
    /// ```text
    /// Scan "Basmati Rice 5kg" (available: 2, in cart: 2)
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Basmati Rice 5kg", available: 2, requested: 3 }
    ///      │
    ///      ▼
    /// Toast: "Only 2 Basmati Rice 5kg in stock", cart unchanged
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// A cart mutation or hold was attempted with no customer bound.
    #[error("Select a customer before adding items")]
    CustomerRequired,

    /// The line id is not in the cart.
    #[error("Line item not found: {0}")]
    LineNotFound(String),

    /// Operation needs at least one line item.
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Walk-in sale without enough contact details to create a customer.
    #[error("Customer {field} is required to complete the sale")]
    MissingCustomerContact { field: String },

    /// Split tender amounts do not add up to the amount due.
    #[error("Split payment mismatch: cash + other = {received}, total due {expected}")]
    SplitMismatch { expected: Money, received: Money },

    #[error(transparent)]
    Coupon(#[from] CouponError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Coupon Error
// =============================================================================

/// Reasons a coupon is not applied. No other session state changes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CouponError {
    /// Code does not exist or the coupon was deactivated.
    #[error("Invalid coupon code: {0}")]
    Invalid(String),

    #[error("Coupon {code} is not valid for {channel} orders")]
    NotEligibleForChannel { code: String, channel: SalesChannel },

    #[error("Coupon {0} has expired")]
    Expired(String),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before any business logic runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (phone, email, pincode, price).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
