//! # storefront-core: Pure Counter Logic for the Storefront POS
//!
//! Everything the point-of-sale terminal decides without touching a disk or
//! a network: cart rules, pricing, the customer-binding state machine, held
//! sale records and the rows a finished sale turns into.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Storefront POS Workspace                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               storefront-pos (terminal orchestration)           │   │
//! │  │   PosTerminal • held store • realtime • connectivity • config   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ storefront-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  cart   │ │ pricing │ │ session │ │  held   │ │  order  │  │   │
//! │  │   │ ledger  │ │ totals  │ │ binding │ │ records │ │ assembly│  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ types (sqlx feature)                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 storefront-db (SQLite layer)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer paise with GST rounding
//! - [`types`] - Catalog, customer, coupon, payment and delivery types
//! - [`cart`] - The cart ledger
//! - [`pricing`] - Subtotal → discount → tax → total
//! - [`session`] - Type-state customer binding
//! - [`held`] - Held sale records
//! - [`order`] - Finalized sale rows and receipts
//! - [`import`] - Product CSV parsing
//! - [`validation`] - Field rules for forms and imports
//!
//! ## Example
//!
//! ```rust
//! use storefront_core::{Money, TaxRate};
//!
//! let taxable = Money::from_rupees(1800);
//! let gst = taxable.calculate_tax(TaxRate::from_bps(1800));
//! assert_eq!(gst, Money::from_rupees(324));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod held;
pub mod import;
pub mod money;
pub mod order;
pub mod pricing;
pub mod session;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports
// =============================================================================

pub use cart::{Cart, LineItem};
pub use error::{CoreError, CoreResult, CouponError, ValidationError};
pub use held::{HeldSale, HeldSaleSummary};
pub use money::Money;
pub use order::{FinalizedSale, SaleDraft, SaleReceipt};
pub use pricing::{DiscountSource, PriceBreakdown};
pub use session::{PosSession, SessionSnapshot};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// GST applied when the store config does not override it (18%).
pub const DEFAULT_TAX_RATE_BPS: u32 = 1800;

/// Maximum distinct lines in one cart.
pub const MAX_CART_ITEMS: usize = 100;

/// A split tender must land within this many paise of the total.
///
/// With integer paise a tolerance of 1 means "exactly equal".
pub const SPLIT_TOLERANCE_PAISE: i64 = 1;

/// Default number of held sales kept on a terminal.
pub const DEFAULT_HELD_SALES_CAPACITY: usize = 20;
