//! # storefront-db: SQLite Persistence for the Storefront POS
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  PosTerminal::complete()                                                │
//! │       │  OrderGateway::record_sale(&FinalizedSale)                      │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  storefront-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐    │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │    │   │
//! │  │   │   (pool.rs)   │◄───│ product       │    │  (embedded)  │    │   │
//! │  │   │  SqlitePool   │    │ customer      │    │ 001_initial  │    │   │
//! │  │   │  WAL, FKs on  │    │ coupon, order │    │ _schema.sql  │    │   │
//! │  │   │               │    │ pincode       │    │              │    │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file under the terminal's data directory                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use storefront_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("pos.db")).await?;
//! let rice = db.products().get_by_barcode("8901725181123").await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::coupon::CouponRepository;
pub use repository::customer::CustomerRepository;
pub use repository::order::OrderRepository;
pub use repository::pincode::PincodeRepository;
pub use repository::product::{ImportSummary, ProductRepository};
