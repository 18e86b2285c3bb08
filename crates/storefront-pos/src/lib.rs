//! # storefront-pos: The Counter Terminal
//!
//! Ties the pure rules in `storefront-core` to the database in
//! `storefront-db` and to device-local storage.
//!
//! ## Module Organization
//! ```text
//! storefront_pos/
//! ├── lib.rs           ◄─── You are here
//! ├── terminal.rs      ◄─── PosTerminal: cart, hold/resume, coupons, finalize
//! ├── gateway.rs       ◄─── Persistence traits + Database implementation
//! ├── held.rs          ◄─── Held-sale repository over the device store
//! ├── delivery.rs      ◄─── Selected delivery location
//! ├── storage.rs       ◄─── KeyValueStore: FileStore, MemoryStore
//! ├── realtime.rs      ◄─── Broadcast of pushed events
//! ├── connectivity.rs  ◄─── Online/offline banner
//! ├── config.rs        ◄─── PosConfig (pos.toml + STOREFRONT_* env)
//! ├── telemetry.rs     ◄─── tracing subscriber setup
//! └── error.rs         ◄─── PosError, ErrorCode, ErrorResponse
//! ```
//!
//! ## Startup
//! ```rust,ignore
//! use storefront_pos::{telemetry, PosConfig, PosTerminal};
//!
//! telemetry::init_tracing();
//! let config = PosConfig::load(None)?;
//! let mut terminal = PosTerminal::open(&config).await?;
//!
//! terminal.select_customer(customer);
//! terminal.scan_barcode("8901725181123").await?;
//! let receipt = terminal.complete(None).await?;
//! ```

pub mod config;
pub mod connectivity;
pub mod delivery;
pub mod error;
pub mod gateway;
pub mod held;
pub mod realtime;
pub mod storage;
pub mod telemetry;
pub mod terminal;

pub use config::PosConfig;
pub use connectivity::{Connectivity, ConnectivityMonitor};
pub use delivery::DeliveryLocationStore;
pub use error::{ErrorCode, ErrorResponse, PosError, PosResult};
pub use gateway::PosGateway;
pub use held::{HeldSaleRepository, KvHeldSaleRepository};
pub use realtime::{RealtimeChannel, RealtimeEvent, RealtimeSubscription};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use terminal::{PaymentPhase, PosTerminal};
