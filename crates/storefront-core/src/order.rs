//! # Finalized Sale Assembly
//!
//! Turns a priced session into the rows the order store persists.
//!
//! ## What Gets Written
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  FinalizedSale                                                          │
//! │  ├── Order             header: number, customer, totals, channel        │
//! │  ├── OrderItem × n     frozen name/SKU/price per cart line              │
//! │  ├── StockMovement × n negative quantity per line (reason: sale)        │
//! │  ├── PaymentRecord     one row, or two for a split tender               │
//! │  └── CouponRedemption  only when a coupon priced the sale               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Assembly is pure; nothing here touches the database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::cart::LineItem;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::{DiscountSource, PriceBreakdown};
use crate::types::{Coupon, PaymentMethod, PaymentSelection, SalesChannel, SplitAmounts, TenderMethod};
use crate::SPLIT_TOLERANCE_PAISE;

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub customer_id: String,
    pub channel: SalesChannel,
    pub payment_method: PaymentMethod,
    pub subtotal_paise: i64,
    pub discount_paise: i64,
    pub tax_paise: i64,
    pub total_paise: i64,
    pub coupon_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn total(&self) -> Money {
        Money::from_paise(self.total_paise)
    }
}

/// Snapshot pattern: product details are frozen at time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub sku_snapshot: Option<String>,
    pub name_snapshot: String,
    pub unit_price_paise: i64,
    pub quantity: i64,
    pub line_total_paise: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementReason {
    Sale,
    Import,
    Adjustment,
}

/// Signed inventory change; sales are negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    pub order_id: Option<String>,
    pub quantity_delta: i64,
    pub reason: MovementReason,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    pub fn new(
        product_id: impl Into<String>,
        order_id: Option<String>,
        quantity_delta: i64,
        reason: MovementReason,
        now: DateTime<Utc>,
    ) -> Self {
        StockMovement {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.into(),
            order_id,
            quantity_delta,
            reason,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PaymentRecord {
    pub id: String,
    pub order_id: String,
    pub method: TenderMethod,
    pub amount_paise: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CouponRedemption {
    pub id: String,
    pub coupon_id: String,
    pub order_id: String,
    pub customer_id: String,
    pub discount_paise: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Finalized Sale
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedSale {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub movements: Vec<StockMovement>,
    pub payments: Vec<PaymentRecord>,
    pub redemption: Option<CouponRedemption>,
}

/// Inputs to [`FinalizedSale::assemble`], borrowed from the session.
#[derive(Debug, Clone, Copy)]
pub struct SaleDraft<'a> {
    pub items: &'a [LineItem],
    pub customer_id: &'a str,
    pub coupon: Option<&'a Coupon>,
    pub payment: &'a PaymentSelection,
    pub totals: &'a PriceBreakdown,
    pub channel: SalesChannel,
}

impl FinalizedSale {
    /// Builds every row for a completed sale.
    ///
    /// ## Errors
    /// - `EmptyCart` when there are no lines
    /// - `SplitMismatch` when a split tender does not add up to the total
    pub fn assemble(draft: SaleDraft<'_>, now: DateTime<Utc>) -> CoreResult<Self> {
        if draft.items.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let totals = draft.totals;
        let payment = draft.payment;

        if payment.method == PaymentMethod::Split {
            verify_split(&payment.split, totals.total)?;
        }

        let order_id = Uuid::new_v4().to_string();
        // Only a coupon that actually priced the sale is redeemed
        let coupon = draft
            .coupon
            .filter(|_| totals.discount_source == DiscountSource::Coupon);

        let order = Order {
            id: order_id.clone(),
            order_number: generate_order_number(now),
            customer_id: draft.customer_id.to_string(),
            channel: draft.channel,
            payment_method: payment.method,
            subtotal_paise: totals.subtotal.paise(),
            discount_paise: totals.discount.paise(),
            tax_paise: totals.tax.paise(),
            total_paise: totals.total.paise(),
            coupon_id: coupon.map(|c| c.id.clone()),
            created_at: now,
        };

        let items = draft
            .items
            .iter()
            .map(|line| OrderItem {
                id: Uuid::new_v4().to_string(),
                order_id: order_id.clone(),
                product_id: line.product_id.clone(),
                sku_snapshot: line.sku.clone(),
                name_snapshot: line.name.clone(),
                unit_price_paise: line.unit_price.paise(),
                quantity: line.quantity,
                line_total_paise: line.line_total().paise(),
            })
            .collect();

        let movements = draft
            .items
            .iter()
            .map(|line| {
                StockMovement::new(
                    line.product_id.clone(),
                    Some(order_id.clone()),
                    -line.quantity,
                    MovementReason::Sale,
                    now,
                )
            })
            .collect();

        let payments = payment_rows(&order_id, payment, totals.total, now);

        let redemption = coupon.map(|c| CouponRedemption {
            id: Uuid::new_v4().to_string(),
            coupon_id: c.id.clone(),
            order_id: order_id.clone(),
            customer_id: draft.customer_id.to_string(),
            discount_paise: totals.discount.paise(),
            created_at: now,
        });

        Ok(FinalizedSale {
            order,
            items,
            movements,
            payments,
            redemption,
        })
    }
}

/// Split tender must add up to the amount due.
pub fn verify_split(split: &SplitAmounts, total: Money) -> CoreResult<()> {
    if split.cash.is_negative() || split.other.is_negative() {
        return Err(CoreError::SplitMismatch {
            expected: total,
            received: split.total(),
        });
    }

    if (split.total() - total).paise().abs() >= SPLIT_TOLERANCE_PAISE {
        return Err(CoreError::SplitMismatch {
            expected: total,
            received: split.total(),
        });
    }

    Ok(())
}

fn payment_rows(
    order_id: &str,
    payment: &PaymentSelection,
    total: Money,
    now: DateTime<Utc>,
) -> Vec<PaymentRecord> {
    let row = |method: TenderMethod, amount: Money| PaymentRecord {
        id: Uuid::new_v4().to_string(),
        order_id: order_id.to_string(),
        method,
        amount_paise: amount.paise(),
        created_at: now,
    };

    match payment.method {
        PaymentMethod::Cash => vec![row(TenderMethod::Cash, total)],
        PaymentMethod::Upi => vec![row(TenderMethod::Upi, total)],
        PaymentMethod::Card => vec![row(TenderMethod::Card, total)],
        PaymentMethod::Split => {
            let split = &payment.split;
            let mut rows = Vec::with_capacity(2);
            if split.cash.is_positive() {
                rows.push(row(TenderMethod::Cash, split.cash));
            }
            if split.other.is_positive() {
                rows.push(row(split.other_method, split.other));
            }
            rows
        }
    }
}

/// Order number: `POS-YYMMDD-HHMMSS-NNNN`.
fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix = (Uuid::new_v4().as_u128() % 10_000) as u16;
    format!("POS-{}-{:04}", now.format("%y%m%d-%H%M%S"), suffix)
}

// =============================================================================
// Receipt
// =============================================================================

/// What the terminal shows after a successful sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleReceipt {
    pub order_id: String,
    pub order_number: String,
    pub customer_name: String,
    pub items: Vec<OrderItem>,
    pub totals: PriceBreakdown,
    pub payments: Vec<PaymentRecord>,
    pub coupon_code: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================
