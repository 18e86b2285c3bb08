//! # Pricing Calculator
//!
//! Pure function from (line items, manual discount, coupon, tax rate) to the
//! totals shown on the tender screen.
//!
//! ## Order of Operations
//! ```text
//! subtotal  = Σ(unit price × quantity)
//!     │
//!     ▼
//! discount  = coupon ?? manual discount      (coupon wins when both exist)
//!             percentage → bps of subtotal, fixed → value
//!             clamped to [0, subtotal]
//!     │
//!     ▼
//! tax       = (subtotal − discount) × rate   (GST on the post-discount amount)
//!     │
//!     ▼
//! total     = subtotal − discount + tax
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::LineItem;
use crate::error::CouponError;
use crate::money::Money;
use crate::types::{Coupon, DiscountSpec, SalesChannel, TaxRate};

/// Which input produced the discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountSource {
    None,
    Manual,
    Coupon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceBreakdown {
    pub subtotal: Money,
    pub discount: Money,
    pub discount_source: DiscountSource,
    pub tax: Money,
    pub total: Money,
}

impl PriceBreakdown {
    /// The amount GST is charged on.
    pub fn taxable(&self) -> Money {
        self.subtotal - self.discount
    }
}

/// Computes the price breakdown. No side effects.
///
/// ```rust
/// use storefront_core::pricing::{calculate, DiscountSource};
/// use storefront_core::{Money, TaxRate};
///
/// let totals = calculate(&[], None, None, TaxRate::from_bps(1800));
/// assert_eq!(totals.total, Money::zero());
/// assert_eq!(totals.discount_source, DiscountSource::None);
/// ```
pub fn calculate(
    items: &[LineItem],
    manual: Option<&DiscountSpec>,
    coupon: Option<&Coupon>,
    rate: TaxRate,
) -> PriceBreakdown {
    let subtotal: Money = items.iter().map(LineItem::line_total).sum();

    let (discount, discount_source) = match (coupon, manual) {
        (Some(c), _) => (c.discount_spec().amount_for(subtotal), DiscountSource::Coupon),
        (None, Some(spec)) => (spec.amount_for(subtotal), DiscountSource::Manual),
        (None, None) => (Money::zero(), DiscountSource::None),
    };

    let tax = (subtotal - discount).calculate_tax(rate);

    PriceBreakdown {
        subtotal,
        discount,
        discount_source,
        tax,
        total: subtotal - discount + tax,
    }
}

/// Checks a looked-up coupon may be used on `channel` at `now`.
///
/// Checked in order: active, channel flag, expiry.
pub fn validate_coupon(
    coupon: &Coupon,
    channel: SalesChannel,
    now: DateTime<Utc>,
) -> Result<(), CouponError> {
    if !coupon.is_active {
        return Err(CouponError::Invalid(coupon.code.clone()));
    }

    if !coupon.is_eligible_for(channel) {
        return Err(CouponError::NotEligibleForChannel {
            code: coupon.code.clone(),
            channel,
        });
    }

    if coupon.is_expired(now) {
        return Err(CouponError::Expired(coupon.code.clone()));
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::tests::product;
    use crate::cart::Cart;
    use crate::types::DiscountType;
    use chrono::Duration;

    const GST: TaxRate = TaxRate::from_bps(1800);

    fn coupon(discount_type: DiscountType, value: i64) -> Coupon {
        Coupon {
            id: "coupon-1".into(),
            code: "SAVE10".into(),
            discount_type,
            discount_value: value,
            pos_eligible: true,
            online_eligible: true,
            is_active: true,
            expires_at: None,
        }
    }

    fn cart_with(price_rupees: i64, qty: i64) -> Cart {
        let mut cart = Cart::new();
        let p = product("1", price_rupees * 100, qty + 5, 0);
        for _ in 0..qty {
            cart.add_item(&p).unwrap();
        }
        cart
    }

    #[test]
    fn test_ten_percent_coupon_example() {
        // price 1000 × 2, 10% coupon, 18% tax
        let cart = cart_with(1000, 2);
        let c = coupon(DiscountType::Percentage, 1000);

        let totals = calculate(cart.items(), None, Some(&c), GST);

        assert_eq!(totals.subtotal, Money::from_rupees(2000));
        assert_eq!(totals.discount, Money::from_rupees(200));
        assert_eq!(totals.tax, Money::from_rupees(324));
        assert_eq!(totals.total, Money::from_rupees(2124));
        assert_eq!(totals.discount_source, DiscountSource::Coupon);
    }

    #[test]
    fn test_coupon_overrides_manual_discount() {
        let cart = cart_with(500, 1);
        let manual = DiscountSpec::FixedAmount {
            amount: Money::from_rupees(100),
        };
        let c = coupon(DiscountType::FixedAmount, 5_000);

        let totals = calculate(cart.items(), Some(&manual), Some(&c), GST);
        assert_eq!(totals.discount, Money::from_rupees(50));
        assert_eq!(totals.discount_source, DiscountSource::Coupon);

        let totals = calculate(cart.items(), Some(&manual), None, GST);
        assert_eq!(totals.discount, Money::from_rupees(100));
        assert_eq!(totals.discount_source, DiscountSource::Manual);
    }

    #[test]
    fn test_fixed_discount_clamped_to_subtotal() {
        let cart = cart_with(100, 1);
        let manual = DiscountSpec::FixedAmount {
            amount: Money::from_rupees(250),
        };

        let totals = calculate(cart.items(), Some(&manual), None, GST);
        assert_eq!(totals.discount, totals.subtotal);
        assert_eq!(totals.tax, Money::zero());
        assert_eq!(totals.total, Money::zero());
    }

    #[test]
    fn test_total_identity_holds_across_discounts() {
        let cart = cart_with(333, 3);
        let specs = [
            None,
            Some(DiscountSpec::Percentage { bps: 1 }),
            Some(DiscountSpec::Percentage { bps: 3333 }),
            Some(DiscountSpec::Percentage { bps: 10_000 }),
            Some(DiscountSpec::FixedAmount {
                amount: Money::from_paise(12_345),
            }),
        ];

        for spec in specs.iter() {
            let t = calculate(cart.items(), spec.as_ref(), None, GST);
            assert_eq!(t.total, t.subtotal - t.discount + t.tax);
            assert!(t.discount <= t.subtotal);
            assert_eq!(t.tax, t.taxable().calculate_tax(GST));
        }
    }

    #[test]
    fn test_validate_coupon() {
        let now = Utc::now();
        let mut c = coupon(DiscountType::Percentage, 1000);
        assert!(validate_coupon(&c, SalesChannel::Pos, now).is_ok());

        c.pos_eligible = false;
        assert!(matches!(
            validate_coupon(&c, SalesChannel::Pos, now),
            Err(CouponError::NotEligibleForChannel { .. })
        ));

        c.pos_eligible = true;
        c.expires_at = Some(now - Duration::days(1));
        assert_eq!(
            validate_coupon(&c, SalesChannel::Pos, now),
            Err(CouponError::Expired("SAVE10".into()))
        );

        c.is_active = false;
        assert_eq!(
            validate_coupon(&c, SalesChannel::Pos, now),
            Err(CouponError::Invalid("SAVE10".into()))
        );
    }
}
