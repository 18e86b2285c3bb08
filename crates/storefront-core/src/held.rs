//! # Held Sales
//!
//! A held sale is a session snapshot set aside so the cashier can serve the
//! next customer and resume later.
//!
//! ## Held List Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  newest ──────────────────────────────────────────────────────► oldest │
//! │  [ "Table 4" ] [ "Sale 14:05" ] [ "Asha - rice" ] ... (≤ capacity)     │
//! │       ▲                                                        │       │
//! │  hold() prepends                                  truncated past cap   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Storage lives in `storefront-pos`; this module only defines the records
//! and the capped-insert rule.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::money::Money;
use crate::session::SessionSnapshot;
use crate::types::TaxRate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HeldSale {
    pub id: String,
    pub label: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub snapshot: SessionSnapshot,
}

impl HeldSale {
    /// Wraps a snapshot with a fresh id. Blank labels become `"Sale HH:MM"`.
    pub fn new(label: Option<&str>, snapshot: SessionSnapshot, now: DateTime<Utc>) -> Self {
        let label = label
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Sale {}", now.format("%H:%M")));

        HeldSale {
            id: Uuid::new_v4().to_string(),
            label,
            created_at: now,
            snapshot,
        }
    }

    /// Row for the resume list.
    pub fn summary(&self, rate: TaxRate) -> HeldSaleSummary {
        let totals = crate::pricing::calculate(
            self.snapshot.cart.items(),
            self.snapshot.discount.as_ref(),
            self.snapshot.coupon.as_ref(),
            rate,
        );

        HeldSaleSummary {
            id: self.id.clone(),
            label: self.label.clone(),
            created_at: self.created_at,
            customer_name: self.snapshot.customer.as_ref().map(|c| c.name.clone()),
            item_count: self.snapshot.cart.total_quantity(),
            total: totals.total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HeldSaleSummary {
    pub id: String,
    pub label: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub customer_name: Option<String>,
    pub item_count: i64,
    pub total: Money,
}

/// Prepends `sale` and drops the oldest entries beyond `capacity`.
///
/// Returns the evicted entries so the caller can log them.
pub fn push_capped(list: &mut Vec<HeldSale>, sale: HeldSale, capacity: usize) -> Vec<HeldSale> {
    list.insert(0, sale);
    if list.len() > capacity {
        list.split_off(capacity)
    } else {
        Vec::new()
    }
}
