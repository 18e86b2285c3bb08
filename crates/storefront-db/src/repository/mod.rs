//! # Repositories
//!
//! One repository per aggregate, each holding a clone of the pool.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  storefront-pos gateways                                                │
//! │       │  db.products().get_by_barcode("8901725181123")                  │
//! │       ▼                                                                 │
//! │  ProductRepository   catalog + inventory, import, stock adjustments     │
//! │  CustomerRepository  lookup by phone, insert                            │
//! │  CouponRepository    lookup by code, insert                             │
//! │  OrderRepository     record_sale (single transaction), read-back        │
//! │  PincodeRepository   serviceable delivery areas                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod coupon;
pub mod customer;
pub mod order;
pub mod pincode;
pub mod product;
