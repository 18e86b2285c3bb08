//! # Persistence Gateways
//!
//! The terminal never touches SQL. It asks for products, customers, coupons
//! and pincodes through these traits and submits a finished sale as one
//! [`FinalizedSale`].
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PosTerminal<G: PosGateway>                                             │
//! │       │                                                                 │
//! │       ├── CatalogGateway   product_by_barcode ──► ProductRepository     │
//! │       ├── CustomerGateway  by phone / create  ──► CustomerRepository    │
//! │       ├── CouponGateway    coupon_by_code     ──► CouponRepository      │
//! │       ├── OrderGateway     record_sale        ──► OrderRepository (tx)  │
//! │       └── PincodeGateway   serviceable_pincode ─► PincodeRepository     │
//! │                                                                         │
//! │  storefront_db::Database implements all five.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::future::Future;

use storefront_core::{CatalogProduct, Coupon, Customer, FinalizedSale, ServiceablePincode};
use storefront_db::Database;

use crate::error::PosResult;

pub trait CatalogGateway: Send + Sync {
    /// Active products only.
    fn product_by_barcode(
        &self,
        barcode: &str,
    ) -> impl Future<Output = PosResult<Option<CatalogProduct>>> + Send;

    fn product_by_id(&self, id: &str)
        -> impl Future<Output = PosResult<Option<CatalogProduct>>> + Send;
}

pub trait CustomerGateway: Send + Sync {
    /// `phone` is already normalized to 10 digits.
    fn customer_by_phone(
        &self,
        phone: &str,
    ) -> impl Future<Output = PosResult<Option<Customer>>> + Send;

    fn create_customer(&self, customer: &Customer) -> impl Future<Output = PosResult<()>> + Send;
}

pub trait CouponGateway: Send + Sync {
    /// Case-insensitive. Inactive and expired coupons are still returned.
    fn coupon_by_code(&self, code: &str) -> impl Future<Output = PosResult<Option<Coupon>>> + Send;
}

pub trait OrderGateway: Send + Sync {
    /// Writes every row of the sale or none of them.
    fn record_sale(&self, sale: &FinalizedSale) -> impl Future<Output = PosResult<()>> + Send;
}

pub trait PincodeGateway: Send + Sync {
    fn serviceable_pincode(
        &self,
        pincode: &str,
    ) -> impl Future<Output = PosResult<Option<ServiceablePincode>>> + Send;
}

/// Everything a terminal needs from the back office.
pub trait PosGateway:
    CatalogGateway + CustomerGateway + CouponGateway + OrderGateway + PincodeGateway
{
}

impl<T> PosGateway for T where
    T: CatalogGateway + CustomerGateway + CouponGateway + OrderGateway + PincodeGateway
{
}

// =============================================================================
// SQLite Implementation
// =============================================================================

impl CatalogGateway for Database {
    async fn product_by_barcode(&self, barcode: &str) -> PosResult<Option<CatalogProduct>> {
        Ok(self.products().get_by_barcode(barcode).await?)
    }

    async fn product_by_id(&self, id: &str) -> PosResult<Option<CatalogProduct>> {
        Ok(self.products().get_by_id(id).await?)
    }
}

impl CustomerGateway for Database {
    async fn customer_by_phone(&self, phone: &str) -> PosResult<Option<Customer>> {
        Ok(self.customers().get_by_phone(phone).await?)
    }

    async fn create_customer(&self, customer: &Customer) -> PosResult<()> {
        Ok(self.customers().insert(customer).await?)
    }
}

impl CouponGateway for Database {
    async fn coupon_by_code(&self, code: &str) -> PosResult<Option<Coupon>> {
        Ok(self.coupons().get_by_code(code).await?)
    }
}

impl OrderGateway for Database {
    async fn record_sale(&self, sale: &FinalizedSale) -> PosResult<()> {
        Ok(self.orders().record_sale(sale).await?)
    }
}

impl PincodeGateway for Database {
    async fn serviceable_pincode(&self, pincode: &str) -> PosResult<Option<ServiceablePincode>> {
        Ok(self.pincodes().get(pincode).await?)
    }
}
