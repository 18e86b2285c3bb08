//! # Session & Customer Binding
//!
//! The in-memory state of one point-of-sale transaction, expressed as a
//! type-state machine so cart mutation only exists once a customer is bound.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Session<NoCustomer> ──select_customer()──► Session<CustomerBound>     │
//! │          ▲                                        │        │            │
//! │          │                                        │        │ select_    │
//! │          └────────────clear_customer()────────────┘        │ customer() │
//! │                                                            ▼ (replace)  │
//! │   Available in both:   remove_item, discount, coupon, payment selection │
//! │   Bound only:          add_item, change_quantity, snapshot (for hold)   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! UI callbacks and the realtime channel do not know the state at compile
//! time, so [`PosSession`] wraps both variants and answers
//! `CustomerRequired` instead of mutating an unbound cart.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::{Cart, LineItem};
use crate::error::{CoreError, CoreResult};
use crate::pricing::{self, PriceBreakdown};
use crate::types::{CatalogProduct, Coupon, Customer, DiscountSpec, PaymentSelection, TaxRate};

// =============================================================================
// States
// =============================================================================

/// No customer selected yet (initial state).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoCustomer;

/// A customer is attached to the sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerBound {
    customer: Customer,
}

// =============================================================================
// Session
// =============================================================================

/// Everything the cashier has entered for the sale in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session<S> {
    cart: Cart,
    discount: Option<DiscountSpec>,
    coupon: Option<Coupon>,
    payment: PaymentSelection,
    state: S,
}

impl Default for Session<NoCustomer> {
    fn default() -> Self {
        Session::new()
    }
}

impl<S> Session<S> {
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn discount(&self) -> Option<&DiscountSpec> {
        self.discount.as_ref()
    }

    pub fn coupon(&self) -> Option<&Coupon> {
        self.coupon.as_ref()
    }

    pub fn payment(&self) -> &PaymentSelection {
        &self.payment
    }

    /// Removing a line never needs a customer.
    pub fn remove_item(&mut self, line_id: &str) -> Option<LineItem> {
        self.cart.remove_item(line_id)
    }

    /// Sets a manual discount. Ignored by pricing while a coupon is applied.
    pub fn set_discount(&mut self, discount: DiscountSpec) {
        self.discount = Some(discount);
    }

    pub fn clear_discount(&mut self) {
        self.discount = None;
    }

    /// Installs an already-validated coupon as the active discount source.
    pub fn apply_coupon(&mut self, coupon: Coupon) {
        self.coupon = Some(coupon);
    }

    pub fn remove_coupon(&mut self) -> Option<Coupon> {
        self.coupon.take()
    }

    pub fn select_payment(&mut self, payment: PaymentSelection) {
        self.payment = payment;
    }

    pub fn pricing(&self, rate: TaxRate) -> PriceBreakdown {
        pricing::calculate(
            self.cart.items(),
            self.discount.as_ref(),
            self.coupon.as_ref(),
            rate,
        )
    }

    fn with_state<T>(self, state: T) -> Session<T> {
        Session {
            cart: self.cart,
            discount: self.discount,
            coupon: self.coupon,
            payment: self.payment,
            state,
        }
    }
}

impl Session<NoCustomer> {
    pub fn new() -> Self {
        Session {
            cart: Cart::new(),
            discount: None,
            coupon: None,
            payment: PaymentSelection::default(),
            state: NoCustomer,
        }
    }

    /// Unbound → Bound. The cart and selections carry over.
    pub fn select_customer(self, customer: Customer) -> Session<CustomerBound> {
        self.with_state(CustomerBound { customer })
    }
}

impl Session<CustomerBound> {
    pub fn customer(&self) -> &Customer {
        &self.state.customer
    }

    /// Bound → Bound with a different customer.
    pub fn replace_customer(&mut self, customer: Customer) -> Customer {
        std::mem::replace(&mut self.state.customer, customer)
    }

    /// Bound → Unbound. Further adds are blocked until a customer is rebound.
    pub fn clear_customer(self) -> (Session<NoCustomer>, Customer) {
        let customer = self.state.customer.clone();
        (self.with_state(NoCustomer), customer)
    }

    pub fn add_item(&mut self, product: &CatalogProduct) -> CoreResult<&LineItem> {
        self.cart.add_item(product)
    }

    pub fn change_quantity(&mut self, line_id: &str, delta: i64) -> CoreResult<Option<i64>> {
        self.cart.change_quantity(line_id, delta)
    }

    /// Captures every field of the session for the hold store.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            cart: self.cart.clone(),
            customer: Some(self.state.customer.clone()),
            discount: self.discount,
            coupon: self.coupon.clone(),
            payment: self.payment,
        }
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// Serializable copy of a session, stored inside a held sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionSnapshot {
    pub cart: Cart,
    pub customer: Option<Customer>,
    pub discount: Option<DiscountSpec>,
    pub coupon: Option<Coupon>,
    pub payment: PaymentSelection,
}

// =============================================================================
// Runtime Wrapper
// =============================================================================

/// A session whose binding state is only known at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PosSession {
    Unbound(Session<NoCustomer>),
    Bound(Session<CustomerBound>),
}

impl Default for PosSession {
    fn default() -> Self {
        PosSession::Unbound(Session::new())
    }
}

macro_rules! each_state {
    ($self:expr, $s:ident => $body:expr) => {
        match $self {
            PosSession::Unbound($s) => $body,
            PosSession::Bound($s) => $body,
        }
    };
}

impl PosSession {
    pub fn is_bound(&self) -> bool {
        matches!(self, PosSession::Bound(_))
    }

    pub fn customer(&self) -> Option<&Customer> {
        match self {
            PosSession::Unbound(_) => None,
            PosSession::Bound(s) => Some(s.customer()),
        }
    }

    pub fn cart(&self) -> &Cart {
        each_state!(self, s => s.cart())
    }

    pub fn discount(&self) -> Option<&DiscountSpec> {
        each_state!(self, s => s.discount())
    }

    pub fn coupon(&self) -> Option<&Coupon> {
        each_state!(self, s => s.coupon())
    }

    pub fn payment(&self) -> &PaymentSelection {
        each_state!(self, s => s.payment())
    }

    pub fn pricing(&self, rate: TaxRate) -> PriceBreakdown {
        each_state!(self, s => s.pricing(rate))
    }

    /// Binds or replaces the customer (last write wins).
    pub fn select_customer(&mut self, customer: Customer) {
        match self {
            PosSession::Bound(s) => {
                s.replace_customer(customer);
            }
            PosSession::Unbound(_) => {
                if let PosSession::Unbound(s) = std::mem::take(self) {
                    *self = PosSession::Bound(s.select_customer(customer));
                }
            }
        }
    }

    /// Returns the customer that was unbound, if any.
    pub fn clear_customer(&mut self) -> Option<Customer> {
        match std::mem::take(self) {
            PosSession::Bound(s) => {
                let (unbound, customer) = s.clear_customer();
                *self = PosSession::Unbound(unbound);
                Some(customer)
            }
            unbound => {
                *self = unbound;
                None
            }
        }
    }

    /// The bound session, or `CustomerRequired` to trigger the selection prompt.
    pub fn ensure_bound(&mut self) -> CoreResult<&mut Session<CustomerBound>> {
        match self {
            PosSession::Bound(s) => Ok(s),
            PosSession::Unbound(_) => Err(CoreError::CustomerRequired),
        }
    }

    pub fn add_item(&mut self, product: &CatalogProduct) -> CoreResult<&LineItem> {
        self.ensure_bound()?.add_item(product)
    }

    pub fn change_quantity(&mut self, line_id: &str, delta: i64) -> CoreResult<Option<i64>> {
        self.ensure_bound()?.change_quantity(line_id, delta)
    }

    pub fn remove_item(&mut self, line_id: &str) -> Option<LineItem> {
        each_state!(self, s => s.remove_item(line_id))
    }

    pub fn set_discount(&mut self, discount: DiscountSpec) {
        each_state!(self, s => s.set_discount(discount))
    }

    pub fn clear_discount(&mut self) {
        each_state!(self, s => s.clear_discount())
    }

    pub fn apply_coupon(&mut self, coupon: Coupon) {
        each_state!(self, s => s.apply_coupon(coupon))
    }

    pub fn remove_coupon(&mut self) -> Option<Coupon> {
        each_state!(self, s => s.remove_coupon())
    }

    pub fn select_payment(&mut self, payment: PaymentSelection) {
        each_state!(self, s => s.select_payment(payment))
    }

    /// Snapshot for holding; requires a bound customer and a non-empty cart.
    pub fn snapshot_for_hold(&self) -> CoreResult<SessionSnapshot> {
        if self.cart().is_empty() {
            return Err(CoreError::EmptyCart);
        }
        match self {
            PosSession::Bound(s) => Ok(s.snapshot()),
            PosSession::Unbound(_) => Err(CoreError::CustomerRequired),
        }
    }

    /// Rebuilds a session from a snapshot, field for field.
    pub fn from_snapshot(snapshot: SessionSnapshot) -> Self {
        let base = Session {
            cart: snapshot.cart,
            discount: snapshot.discount,
            coupon: snapshot.coupon,
            payment: snapshot.payment,
            state: NoCustomer,
        };
        match snapshot.customer {
            Some(customer) => PosSession::Bound(base.select_customer(customer)),
            None => PosSession::Unbound(base),
        }
    }

    /// Back to empty defaults.
    pub fn reset(&mut self) {
        *self = PosSession::default();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
