//! # Domain Types
//!
//! Core domain types shared by the terminal, the database layer and the
//! web storefront (via ts-rs bindings).
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ CatalogProduct  │   │    Customer     │   │     Coupon      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id / sku       │   │  id             │   │  code           │       │
//! │  │  price_paise    │   │  name, phone    │   │  discount_type  │       │
//! │  │  stock ─────────┼─► │  email?         │   │  pos/online     │       │
//! │  └─────────────────┘ │ └─────────────────┘   │  expires_at?    │       │
//! │                      ▼                       └─────────────────┘       │
//! │               ┌─────────────┐   ┌──────────────┐   ┌────────────────┐  │
//! │               │ StockLevel  │   │ DiscountSpec │   │ PaymentMethod  │  │
//! │               │ quantity    │   │ Percentage   │   │ Cash Upi Card  │  │
//! │               │ reserved    │   │ FixedAmount  │   │ Split          │  │
//! │               └─────────────┘   └──────────────┘   └────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate in basis points (1 bps = 0.01%). 1800 bps = 18% GST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Rate as a percentage, for display only.
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::from_bps(crate::DEFAULT_TAX_RATE_BPS)
    }
}

// =============================================================================
// Sales Channel
// =============================================================================

/// Where an order originates. Coupons carry a flag per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SalesChannel {
    /// In-store point of sale.
    Pos,
    /// Web storefront checkout.
    Online,
}

impl fmt::Display for SalesChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SalesChannel::Pos => write!(f, "pos"),
            SalesChannel::Online => write!(f, "online"),
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Inventory row for one product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockLevel {
    /// Units on hand.
    pub quantity: i64,
    /// Units already held by other in-flight orders.
    pub reserved: i64,
}

impl StockLevel {
    pub const fn new(quantity: i64, reserved: i64) -> Self {
        StockLevel { quantity, reserved }
    }

    /// Units the terminal may sell right now. Never negative.
    #[inline]
    pub fn available(&self) -> i64 {
        (self.quantity - self.reserved).max(0)
    }
}

/// A product as the terminal sees it: price plus the stock snapshot fetched
/// when the product was looked up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CatalogProduct {
    pub id: String,
    pub sku: String,
    pub barcode: Option<String>,
    pub name: String,
    pub price_paise: i64,
    pub is_active: bool,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub stock: StockLevel,
}

impl CatalogProduct {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_paise(self.price_paise)
    }

    #[inline]
    pub fn available(&self) -> i64 {
        self.stock.available()
    }
}

// =============================================================================
// Customers
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: String,
    /// Needed to link the customer to an online account.
    pub email: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Contact details typed at the counter for a walk-in customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerContact {
    pub name: Option<String>,
    pub phone: String,
    pub email: Option<String>,
}

// =============================================================================
// Discounts & Coupons
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    Percentage,
    FixedAmount,
}

/// A cashier-entered discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscountSpec {
    /// Basis points of the subtotal (1000 = 10%).
    Percentage { bps: u32 },
    FixedAmount { amount: Money },
}

impl DiscountSpec {
    /// Resolves the discount amount for a subtotal, clamped to `[0, subtotal]`.
    pub fn amount_for(&self, subtotal: Money) -> Money {
        let raw = match self {
            DiscountSpec::Percentage { bps } => subtotal.percentage(*bps),
            DiscountSpec::FixedAmount { amount } => *amount,
        };
        if raw.is_negative() {
            return Money::zero();
        }
        raw.min(subtotal)
    }
}

/// A promotional code.
///
/// `discount_value` is basis points for percentage coupons and paise for
/// fixed-amount coupons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Coupon {
    pub id: String,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    pub pos_eligible: bool,
    pub online_eligible: bool,
    pub is_active: bool,
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Coupon {
    pub fn is_eligible_for(&self, channel: SalesChannel) -> bool {
        match channel {
            SalesChannel::Pos => self.pos_eligible,
            SalesChannel::Online => self.online_eligible,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// The coupon expressed as a discount.
    pub fn discount_spec(&self) -> DiscountSpec {
        match self.discount_type {
            DiscountType::Percentage => DiscountSpec::Percentage {
                bps: self.discount_value.clamp(0, 10_000) as u32,
            },
            DiscountType::FixedAmount => DiscountSpec::FixedAmount {
                amount: Money::from_paise(self.discount_value),
            },
        }
    }
}

// =============================================================================
// Payment
// =============================================================================

/// What the cashier picked on the tender screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Upi,
    Card,
    /// Part cash, part UPI/card.
    Split,
}

/// The method recorded on a single payment row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TenderMethod {
    #[default]
    Cash,
    Upi,
    Card,
}

impl fmt::Display for TenderMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TenderMethod::Cash => write!(f, "cash"),
            TenderMethod::Upi => write!(f, "upi"),
            TenderMethod::Card => write!(f, "card"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SplitAmounts {
    pub cash: Money,
    pub other: Money,
    pub other_method: TenderMethod,
}

impl Default for SplitAmounts {
    fn default() -> Self {
        SplitAmounts {
            cash: Money::zero(),
            other: Money::zero(),
            other_method: TenderMethod::Upi,
        }
    }
}

impl SplitAmounts {
    pub fn total(&self) -> Money {
        self.cash + self.other
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentSelection {
    pub method: PaymentMethod,
    /// Only read when `method` is `Split`.
    pub split: SplitAmounts,
}

// =============================================================================
// Delivery
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ServiceablePincode {
    pub pincode: String,
    pub city: String,
    pub state: String,
    pub delivery_days: i64,
    pub is_active: bool,
}

/// The customer's last chosen delivery area, remembered on the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeliveryLocation {
    pub pincode: String,
    pub city: String,
    pub state: String,
    pub delivery_days: i64,
    #[ts(as = "String")]
    pub selected_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
