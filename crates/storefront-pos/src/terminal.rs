//! # POS Terminal
//!
//! The live counter session: one cart, one (optional) customer, the held
//! list, and the payment finalizer.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  select_customer ──► add_product / scan_barcode ──► apply_coupon        │
//! │        │                      │                          │              │
//! │        │                      ▼                          ▼              │
//! │        │               hold(label) ──► held list ──► resume(id)         │
//! │        │                                                 │              │
//! │        ▼                                                 ▼              │
//! │  select_payment ──────────────────────────────────► complete()          │
//! │                                                          │              │
//! │                 Idle ──► Processing ──┬──► receipt, session reset, Idle │
//! │                                       └──► Failed(reason), session kept │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation either succeeds completely or leaves the session as it
//! was.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use storefront_core::pricing::validate_coupon;
use storefront_core::validation::{normalize_coupon_code, normalize_phone, validate_customer_contact};
use storefront_core::{
    CatalogProduct, CoreError, Coupon, CouponError, Customer, CustomerContact, DiscountSpec,
    FinalizedSale, HeldSale, HeldSaleSummary, LineItem, PaymentMethod, PaymentSelection,
    PosSession, PriceBreakdown, SaleDraft, SaleReceipt, SalesChannel, TaxRate, ValidationError,
};
use storefront_db::{Database, DbError};

use crate::config::PosConfig;
use crate::error::{PosError, PosResult};
use crate::gateway::PosGateway;
use crate::held::{HeldSaleRepository, KvHeldSaleRepository};
use crate::realtime::{RealtimeChannel, RealtimeEvent, RealtimeSubscription};
use crate::storage::{FileStore, KeyValueStore};

/// Name given to a walk-in customer who did not give one.
pub const WALK_IN_NAME: &str = "Walk-in Customer";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum PaymentPhase {
    #[default]
    Idle,
    Processing,
    Failed { reason: String },
}

pub struct PosTerminal<G> {
    gateway: G,
    held: Arc<dyn HeldSaleRepository>,
    session: PosSession,
    phase: PaymentPhase,
    tax_rate: TaxRate,
    channel: SalesChannel,
    /// Mirrors counter-side customer changes to paired displays.
    realtime: Option<RealtimeChannel>,
}

impl PosTerminal<Database> {
    /// Opens the configured database and device store.
    pub async fn open(config: &PosConfig) -> PosResult<Self> {
        let db = Database::new(config.db_config()?).await?;
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(config.device_store_dir())?);
        let held = Arc::new(KvHeldSaleRepository::new(store, config.held_sales.capacity));

        let realtime = RealtimeChannel::new(config.realtime.channel_capacity);

        info!(store = %config.store.name, "Terminal ready");
        Ok(PosTerminal::new(db, held, config).with_realtime(realtime))
    }
}

impl<G: PosGateway> PosTerminal<G> {
    pub fn new(gateway: G, held: Arc<dyn HeldSaleRepository>, config: &PosConfig) -> Self {
        PosTerminal {
            gateway,
            held,
            session: PosSession::default(),
            phase: PaymentPhase::Idle,
            tax_rate: config.tax_rate(),
            channel: SalesChannel::Pos,
            realtime: None,
        }
    }

    /// Publishes `CustomerSelected` / `CustomerCleared` on `channel` whenever
    /// the cashier changes the customer.
    pub fn with_realtime(mut self, channel: RealtimeChannel) -> Self {
        self.realtime = Some(channel);
        self
    }

    // =========================================================================
    // Read Access
    // =========================================================================

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn realtime(&self) -> Option<&RealtimeChannel> {
        self.realtime.as_ref()
    }

    pub fn session(&self) -> &PosSession {
        &self.session
    }

    pub fn customer(&self) -> Option<&Customer> {
        self.session.customer()
    }

    pub fn items(&self) -> &[LineItem] {
        self.session.cart().items()
    }

    pub fn phase(&self) -> &PaymentPhase {
        &self.phase
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    pub fn totals(&self) -> PriceBreakdown {
        self.session.pricing(self.tax_rate)
    }

    // =========================================================================
    // Customer
    // =========================================================================

    pub fn select_customer(&mut self, customer: Customer) {
        self.bind_customer(customer.clone());
        self.publish(RealtimeEvent::CustomerSelected { customer });
    }

    pub fn clear_customer(&mut self) -> Option<Customer> {
        let cleared = self.unbind_customer();
        if cleared.is_some() {
            self.publish(RealtimeEvent::CustomerCleared);
        }
        cleared
    }

    fn bind_customer(&mut self, customer: Customer) {
        info!(customer_id = %customer.id, "Customer selected");
        self.session.select_customer(customer);
    }

    fn unbind_customer(&mut self) -> Option<Customer> {
        let cleared = self.session.clear_customer();
        if let Some(ref c) = cleared {
            info!(customer_id = %c.id, "Customer cleared");
        }
        cleared
    }

    /// Starts an empty session, announcing the customer going away.
    fn reset_session(&mut self) {
        let was_bound = self.session.is_bound();
        self.session.reset();
        if was_bound {
            self.publish(RealtimeEvent::CustomerCleared);
        }
    }

    fn publish(&self, event: RealtimeEvent) {
        if let Some(channel) = &self.realtime {
            channel.publish(event);
        }
    }

    // =========================================================================
    // Cart
    // =========================================================================

    pub fn add_product(&mut self, product: &CatalogProduct) -> PosResult<LineItem> {
        let line = self.session.add_item(product)?.clone();
        debug!(product_id = %line.product_id, quantity = line.quantity, "Item added");
        Ok(line)
    }

    /// Looks the barcode up and adds one unit.
    pub async fn scan_barcode(&mut self, code: &str) -> PosResult<LineItem> {
        self.session.ensure_bound()?;

        let code = code.trim();
        let product = self
            .gateway
            .product_by_barcode(code)
            .await?
            .ok_or_else(|| PosError::UnknownBarcode(code.to_string()))?;

        self.add_product(&product)
    }

    /// Adds a product picked from the search grid, re-reading its stock.
    pub async fn add_by_id(&mut self, product_id: &str) -> PosResult<LineItem> {
        self.session.ensure_bound()?;

        let product = self
            .gateway
            .product_by_id(product_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| {
                PosError::Database(DbError::not_found("Product", product_id))
            })?;

        self.add_product(&product)
    }

    /// `Ok(None)` when the line dropped to zero and was removed.
    pub fn change_quantity(&mut self, line_id: &str, delta: i64) -> PosResult<Option<i64>> {
        Ok(self.session.change_quantity(line_id, delta)?)
    }

    pub fn remove_item(&mut self, line_id: &str) -> Option<LineItem> {
        self.session.remove_item(line_id)
    }

    // =========================================================================
    // Discounts & Coupons
    // =========================================================================

    /// Manual discount. An applied coupon still takes precedence.
    pub fn set_discount(&mut self, discount: DiscountSpec) -> PosResult<PriceBreakdown> {
        match discount {
            DiscountSpec::Percentage { bps } if bps > 10_000 => {
                return Err(ValidationError::OutOfRange {
                    field: "discount".into(),
                    min: 0,
                    max: 10_000,
                }
                .into());
            }
            DiscountSpec::FixedAmount { amount } if amount.is_negative() => {
                return Err(ValidationError::MustBePositive {
                    field: "discount".into(),
                }
                .into());
            }
            _ => {}
        }

        self.session.set_discount(discount);
        Ok(self.totals())
    }

    pub fn clear_discount(&mut self) {
        self.session.clear_discount();
    }

    /// Looks the code up and makes it the active discount.
    ///
    /// ## Errors
    /// - `CouponError::Invalid` for unknown or inactive codes
    /// - `CouponError::NotEligibleForChannel` for online-only codes
    /// - `CouponError::Expired`
    pub async fn apply_coupon(&mut self, code: &str) -> PosResult<Coupon> {
        let code = normalize_coupon_code(code)?;

        let coupon = self
            .gateway
            .coupon_by_code(&code)
            .await?
            .ok_or_else(|| CouponError::Invalid(code.clone()))?;

        validate_coupon(&coupon, self.channel, Utc::now())?;

        info!(code = %coupon.code, "Coupon applied");
        self.session.apply_coupon(coupon.clone());
        Ok(coupon)
    }

    pub fn remove_coupon(&mut self) -> Option<Coupon> {
        self.session.remove_coupon()
    }

    pub fn select_payment(&mut self, payment: PaymentSelection) {
        self.session.select_payment(payment);
    }

    // =========================================================================
    // Hold / Resume
    // =========================================================================

    /// Sets the current sale aside and starts a fresh one.
    pub fn hold(&mut self, label: Option<&str>) -> PosResult<HeldSaleSummary> {
        let snapshot = self.session.snapshot_for_hold()?;
        let sale = HeldSale::new(label, snapshot, Utc::now());
        let summary = sale.summary(self.tax_rate);

        self.held.put(sale)?;
        self.reset_session();
        self.phase = PaymentPhase::Idle;

        info!(id = %summary.id, label = %summary.label, "Sale held");
        Ok(summary)
    }

    /// Restores a held sale, replacing the active session. Absent ids are a no-op.
    pub fn resume(&mut self, id: &str) -> PosResult<Option<HeldSaleSummary>> {
        let Some(sale) = self.held.delete(id)? else {
            debug!(id = %id, "Nothing held under this id");
            return Ok(None);
        };

        if !self.session.cart().is_empty() {
            warn!(
                lines = self.session.cart().item_count(),
                "Resuming over a non-empty cart; active lines discarded"
            );
        }

        let summary = sale.summary(self.tax_rate);
        self.session = PosSession::from_snapshot(sale.snapshot);
        self.phase = PaymentPhase::Idle;
        match self.session.customer() {
            Some(customer) => self.publish(RealtimeEvent::CustomerSelected {
                customer: customer.clone(),
            }),
            None => self.publish(RealtimeEvent::CustomerCleared),
        }

        info!(id = %summary.id, label = %summary.label, "Sale resumed");
        Ok(Some(summary))
    }

    /// Returns false when nothing was held under `id`.
    pub fn delete_held(&mut self, id: &str) -> PosResult<bool> {
        Ok(self.held.delete(id)?.is_some())
    }

    /// Newest first.
    pub fn held_sales(&self) -> PosResult<Vec<HeldSaleSummary>> {
        Ok(self
            .held
            .list()?
            .iter()
            .map(|sale| sale.summary(self.tax_rate))
            .collect())
    }

    /// Drops the active sale without recording it.
    pub fn new_sale(&mut self) {
        self.reset_session();
        self.phase = PaymentPhase::Idle;
    }

    // =========================================================================
    // Payment
    // =========================================================================

    /// Finalizes the sale with the selected payment.
    ///
    /// `walk_in` is only read when no customer is bound.
    pub async fn complete(&mut self, walk_in: Option<CustomerContact>) -> PosResult<SaleReceipt> {
        self.phase = PaymentPhase::Processing;

        match self.finalize(walk_in.as_ref()).await {
            Ok(receipt) => {
                info!(
                    order_number = %receipt.order_number,
                    total = %receipt.totals.total,
                    "Sale completed"
                );
                self.reset_session();
                self.phase = PaymentPhase::Idle;
                Ok(receipt)
            }
            Err(e) => {
                warn!(error = %e, "Sale failed");
                self.phase = PaymentPhase::Failed {
                    reason: e.to_string(),
                };
                Err(e)
            }
        }
    }

    async fn finalize(&self, walk_in: Option<&CustomerContact>) -> PosResult<SaleReceipt> {
        let cart = self.session.cart();
        if cart.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        let totals = self.totals();
        let payment = *self.session.payment();

        // Checked before a walk-in customer is created
        if payment.method == PaymentMethod::Split {
            storefront_core::order::verify_split(&payment.split, totals.total)?;
        }

        let customer = match self.session.customer() {
            Some(c) => c.clone(),
            None => self.resolve_walk_in(walk_in).await?,
        };

        let sale = FinalizedSale::assemble(
            SaleDraft {
                items: cart.items(),
                customer_id: &customer.id,
                coupon: self.session.coupon(),
                payment: &payment,
                totals: &totals,
                channel: self.channel,
            },
            Utc::now(),
        )?;

        debug!(
            order_id = %sale.order.id,
            lines = sale.items.len(),
            payments = sale.payments.len(),
            "Submitting sale"
        );
        self.gateway.record_sale(&sale).await?;

        let coupon_code = sale
            .redemption
            .as_ref()
            .and(self.session.coupon())
            .map(|c| c.code.clone());

        Ok(SaleReceipt {
            order_id: sale.order.id,
            order_number: sale.order.order_number,
            customer_name: customer.name,
            items: sale.items,
            totals,
            payments: sale.payments,
            coupon_code,
        })
    }

    /// Finds the walk-in by phone, creating the record on first visit.
    async fn resolve_walk_in(&self, contact: Option<&CustomerContact>) -> PosResult<Customer> {
        let contact = contact
            .filter(|c| !c.phone.trim().is_empty())
            .ok_or_else(|| CoreError::MissingCustomerContact {
                field: "phone".into(),
            })?;

        let has_email = contact
            .email
            .as_deref()
            .is_some_and(|e| !e.trim().is_empty());
        if !has_email {
            return Err(CoreError::MissingCustomerContact {
                field: "email".into(),
            }
            .into());
        }

        validate_customer_contact(contact)?;
        let phone = normalize_phone(&contact.phone)?;

        if let Some(existing) = self.gateway.customer_by_phone(&phone).await? {
            debug!(customer_id = %existing.id, "Walk-in matched existing customer");
            return Ok(existing);
        }

        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: contact
                .name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .unwrap_or(WALK_IN_NAME)
                .to_string(),
            phone,
            email: contact.email.as_deref().map(|e| e.trim().to_string()),
            created_at: Utc::now(),
        };

        self.gateway.create_customer(&customer).await?;
        info!(customer_id = %customer.id, "Walk-in customer created");
        Ok(customer)
    }

    // =========================================================================
    // Realtime
    // =========================================================================

    /// Applies one pushed event. Customer events win over the local binding
    /// and are not published back out.
    pub async fn apply_realtime(&mut self, event: RealtimeEvent) -> PosResult<()> {
        match event {
            RealtimeEvent::CustomerSelected { customer } => self.bind_customer(customer),
            RealtimeEvent::CustomerCleared => {
                self.unbind_customer();
            }
            RealtimeEvent::BarcodeScanned { code } => {
                self.scan_barcode(&code).await?;
            }
        }
        Ok(())
    }

    /// Applies events until the channel closes. Failed events are logged and skipped.
    pub async fn follow_realtime(&mut self, mut subscription: RealtimeSubscription) {
        while let Some(event) = subscription.next().await {
            if let Err(e) = self.apply_realtime(event).await {
                warn!(error = %e, "Realtime event rejected");
            }
        }
        debug!("Realtime channel closed");
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{CatalogGateway, CouponGateway, CustomerGateway, OrderGateway, PincodeGateway};
    use crate::held::HELD_SALES_KEY;
    use crate::storage::MemoryStore;
    use chrono::Duration;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use storefront_core::{
        DiscountType, Money, ServiceablePincode, SplitAmounts, StockLevel, TenderMethod,
    };

    // =========================================================================
    // Stub Gateway
    // =========================================================================

    #[derive(Default)]
    struct StubGateway {
        products: Mutex<HashMap<String, CatalogProduct>>,
        customers: Mutex<Vec<Customer>>,
        coupons: Mutex<HashMap<String, Coupon>>,
        sales: Mutex<Vec<FinalizedSale>>,
        fail_record: AtomicBool,
    }

    impl StubGateway {
        fn sales(&self) -> Vec<FinalizedSale> {
            self.sales.lock().unwrap().clone()
        }

        fn customers(&self) -> Vec<Customer> {
            self.customers.lock().unwrap().clone()
        }
    }

    impl CatalogGateway for StubGateway {
        async fn product_by_barcode(&self, barcode: &str) -> PosResult<Option<CatalogProduct>> {
            Ok(self.products.lock().unwrap().get(barcode).cloned())
        }

        async fn product_by_id(&self, id: &str) -> PosResult<Option<CatalogProduct>> {
            Ok(self
                .products
                .lock()
                .unwrap()
                .values()
                .find(|p| p.id == id)
                .cloned())
        }
    }

    impl CustomerGateway for StubGateway {
        async fn customer_by_phone(&self, phone: &str) -> PosResult<Option<Customer>> {
            Ok(self
                .customers
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.phone == phone)
                .cloned())
        }

        async fn create_customer(&self, customer: &Customer) -> PosResult<()> {
            self.customers.lock().unwrap().push(customer.clone());
            Ok(())
        }
    }

    impl CouponGateway for StubGateway {
        async fn coupon_by_code(&self, code: &str) -> PosResult<Option<Coupon>> {
            Ok(self.coupons.lock().unwrap().get(&code.to_uppercase()).cloned())
        }
    }

    impl OrderGateway for StubGateway {
        async fn record_sale(&self, sale: &FinalizedSale) -> PosResult<()> {
            if self.fail_record.load(Ordering::SeqCst) {
                return Err(DbError::StockConflict {
                    product_id: sale.items[0].product_id.clone(),
                }
                .into());
            }
            self.sales.lock().unwrap().push(sale.clone());
            Ok(())
        }
    }

    impl PincodeGateway for StubGateway {
        async fn serviceable_pincode(&self, _pincode: &str) -> PosResult<Option<ServiceablePincode>> {
            Ok(None)
        }
    }

    // =========================================================================
    // Fixtures
    // =========================================================================

    fn product(id: &str, price_paise: i64, quantity: i64) -> CatalogProduct {
        CatalogProduct {
            id: id.to_string(),
            sku: format!("SKU-{}", id.to_uppercase()),
            barcode: Some(format!("8901{}", id)),
            name: format!("Item {}", id),
            price_paise,
            is_active: true,
            stock: StockLevel::new(quantity, 0),
        }
    }

    fn customer(name: &str, phone: &str) -> Customer {
        Customer {
            id: format!("cust-{}", phone),
            name: name.to_string(),
            phone: phone.to_string(),
            email: Some(format!("{}@example.in", name.to_lowercase())),
            created_at: Utc::now(),
        }
    }

    fn coupon(code: &str, bps: i64, pos: bool, active: bool) -> Coupon {
        Coupon {
            id: format!("coupon-{}", code.to_lowercase()),
            code: code.to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: bps,
            pos_eligible: pos,
            online_eligible: true,
            is_active: active,
            expires_at: None,
        }
    }

    fn terminal() -> (Arc<MemoryStore>, PosTerminal<StubGateway>) {
        let gateway = StubGateway::default();
        {
            let mut products = gateway.products.lock().unwrap();
            for p in [product("rice", 1000, 5), product("dal", 250, 1)] {
                products.insert(p.barcode.clone().unwrap(), p);
            }

            let mut coupons = gateway.coupons.lock().unwrap();
            coupons.insert("SAVE10".into(), coupon("SAVE10", 1000, true, true));
            coupons.insert("APPONLY".into(), coupon("APPONLY", 1500, false, true));
            coupons.insert("OLD".into(), coupon("OLD", 500, true, false));
            let mut expired = coupon("LAPSED", 500, true, true);
            expired.expires_at = Some(Utc::now() - Duration::days(1));
            coupons.insert("LAPSED".into(), expired);
        }

        let store = Arc::new(MemoryStore::new());
        let held = Arc::new(KvHeldSaleRepository::new(store.clone(), 20));
        let terminal = PosTerminal::new(gateway, held, &PosConfig::default());
        (store, terminal)
    }

    // =========================================================================
    // Cart & Customer
    // =========================================================================

    #[tokio::test]
    async fn test_cart_needs_a_customer() {
        let (_, mut t) = terminal();

        let err = t.scan_barcode("8901rice").await.unwrap_err();
        assert!(matches!(err, PosError::Core(CoreError::CustomerRequired)));
        assert!(t.items().is_empty());

        t.select_customer(customer("Asha", "9876543210"));
        t.scan_barcode("8901rice").await.unwrap();
        t.scan_barcode("8901rice").await.unwrap();

        assert_eq!(t.items().len(), 1);
        assert_eq!(t.items()[0].quantity, 2);

        let err = t.scan_barcode("0000").await.unwrap_err();
        assert!(matches!(err, PosError::UnknownBarcode(_)));

        t.add_by_id("dal").await.unwrap();
        assert_eq!(t.items().len(), 2);
        let err = t.add_by_id("missing").await.unwrap_err();
        assert!(matches!(err, PosError::Database(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_stock_ceiling_leaves_cart_unchanged() {
        let (_, mut t) = terminal();
        t.select_customer(customer("Asha", "9876543210"));

        let line = t.scan_barcode("8901dal").await.unwrap();
        let err = t.scan_barcode("8901dal").await.unwrap_err();
        assert!(matches!(
            err,
            PosError::Core(CoreError::InsufficientStock { available: 1, requested: 2, .. })
        ));

        assert!(t.change_quantity(&line.id, 1).is_err());
        assert_eq!(t.items()[0].quantity, 1);

        assert_eq!(t.change_quantity(&line.id, -1).unwrap(), None);
        assert!(t.items().is_empty());
    }

    #[tokio::test]
    async fn test_clearing_customer_keeps_cart() {
        let (_, mut t) = terminal();
        t.select_customer(customer("Asha", "9876543210"));
        t.scan_barcode("8901rice").await.unwrap();

        t.select_customer(customer("Ravi", "9123456780"));
        assert_eq!(t.customer().unwrap().name, "Ravi");

        assert_eq!(t.clear_customer().unwrap().name, "Ravi");
        assert_eq!(t.items().len(), 1);
        let line_id = t.items()[0].id.clone();
        assert!(matches!(
            t.change_quantity(&line_id, 1),
            Err(PosError::Core(CoreError::CustomerRequired))
        ));
    }

    // =========================================================================
    // Pricing & Coupons
    // =========================================================================

    #[tokio::test]
    async fn test_coupon_pricing_example() {
        let (_, mut t) = terminal();
        t.select_customer(customer("Asha", "9876543210"));
        t.scan_barcode("8901rice").await.unwrap();
        t.scan_barcode("8901rice").await.unwrap();

        t.set_discount(DiscountSpec::FixedAmount {
            amount: Money::from_paise(50),
        })
        .unwrap();
        t.apply_coupon(" save10 ").await.unwrap();

        let totals = t.totals();
        assert_eq!(totals.subtotal, Money::from_paise(2000));
        assert_eq!(totals.discount, Money::from_paise(200));
        assert_eq!(totals.tax, Money::from_paise(324));
        assert_eq!(totals.total, Money::from_paise(2124));

        t.remove_coupon();
        assert_eq!(t.totals().discount, Money::from_paise(50));
    }

    #[tokio::test]
    async fn test_rejected_coupons_leave_pricing_alone() {
        let (_, mut t) = terminal();
        t.select_customer(customer("Asha", "9876543210"));
        t.scan_barcode("8901rice").await.unwrap();
        let before = t.totals();

        let cases = [
            ("NOPE", "invalid"),
            ("OLD", "invalid"),
            ("APPONLY", "channel"),
            ("LAPSED", "expired"),
        ];
        for (code, kind) in cases {
            let err = t.apply_coupon(code).await.unwrap_err();
            let ok = match (kind, &err) {
                ("invalid", PosError::Core(CoreError::Coupon(CouponError::Invalid(_)))) => true,
                (
                    "channel",
                    PosError::Core(CoreError::Coupon(CouponError::NotEligibleForChannel { .. })),
                ) => true,
                ("expired", PosError::Core(CoreError::Coupon(CouponError::Expired(_)))) => true,
                _ => false,
            };
            assert!(ok, "{} gave {:?}", code, err);
        }

        assert_eq!(t.totals(), before);
        assert!(t.session().coupon().is_none());
    }

    #[test]
    fn test_manual_discount_bounds() {
        let (_, mut t) = terminal();
        assert!(t.set_discount(DiscountSpec::Percentage { bps: 10_001 }).is_err());
        assert!(t
            .set_discount(DiscountSpec::FixedAmount {
                amount: Money::from_paise(-1)
            })
            .is_err());
        assert!(t.session().discount().is_none());
    }

    // =========================================================================
    // Hold / Resume
    // =========================================================================

    #[tokio::test]
    async fn test_hold_then_resume_restores_session() {
        let (_, mut t) = terminal();
        t.select_customer(customer("Asha", "9876543210"));
        t.scan_barcode("8901rice").await.unwrap();
        t.scan_barcode("8901dal").await.unwrap();
        t.apply_coupon("SAVE10").await.unwrap();
        t.select_payment(PaymentSelection {
            method: PaymentMethod::Split,
            split: SplitAmounts {
                cash: Money::from_paise(500),
                other: Money::from_paise(1270),
                other_method: TenderMethod::Card,
            },
        });
        let before = t.session().clone();

        let summary = t.hold(None).unwrap();
        assert!(summary.label.starts_with("Sale "));
        assert!(t.items().is_empty());
        assert!(t.customer().is_none());

        let resumed = t.resume(&summary.id).unwrap().unwrap();
        assert_eq!(resumed.id, summary.id);
        assert_eq!(t.session(), &before);
        assert!(t.held_sales().unwrap().is_empty());

        assert!(t.resume(&summary.id).unwrap().is_none());
        assert_eq!(t.session(), &before);
    }

    #[tokio::test]
    async fn test_hold_rejections_leave_list_unchanged() {
        let (store, mut t) = terminal();

        let err = t.hold(Some("empty")).unwrap_err();
        assert!(matches!(err, PosError::Core(CoreError::EmptyCart)));

        t.select_customer(customer("Asha", "9876543210"));
        t.scan_barcode("8901rice").await.unwrap();
        t.clear_customer();

        let err = t.hold(Some("no customer")).unwrap_err();
        assert!(matches!(err, PosError::Core(CoreError::CustomerRequired)));

        assert!(t.held_sales().unwrap().is_empty());
        assert!(store.get(HELD_SALES_KEY).unwrap().is_none());
        assert_eq!(t.items().len(), 1);
    }

    #[tokio::test]
    async fn test_held_list_shows_newest_first_then_delete() {
        let (_, mut t) = terminal();

        t.select_customer(customer("Ravi", "9123456780"));
        t.scan_barcode("8901dal").await.unwrap();
        t.hold(Some("Earlier")).unwrap();

        t.select_customer(customer("Asha", "9876543210"));
        t.scan_barcode("8901rice").await.unwrap();
        t.scan_barcode("8901rice").await.unwrap();
        let held = t.hold(Some("Test")).unwrap();

        let list = t.held_sales().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].label, "Test");
        assert_eq!(list[0].item_count, 2);
        assert_eq!(list[0].total, Money::from_paise(2360));
        assert_eq!(list[0].customer_name.as_deref(), Some("Asha"));

        assert!(t.delete_held(&held.id).unwrap());
        assert!(!t.delete_held(&held.id).unwrap());

        let list = t.held_sales().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].label, "Earlier");
    }

    // =========================================================================
    // Payment Finalizer
    // =========================================================================

    #[tokio::test]
    async fn test_complete_cash_sale_resets_session() {
        let (_, mut t) = terminal();
        t.select_customer(customer("Asha", "9876543210"));
        t.scan_barcode("8901rice").await.unwrap();
        t.scan_barcode("8901rice").await.unwrap();
        t.apply_coupon("SAVE10").await.unwrap();

        let receipt = t.complete(None).await.unwrap();

        assert!(receipt.order_number.starts_with("POS-"));
        assert_eq!(receipt.customer_name, "Asha");
        assert_eq!(receipt.totals.total, Money::from_paise(2124));
        assert_eq!(receipt.coupon_code.as_deref(), Some("SAVE10"));
        assert_eq!(receipt.payments.len(), 1);

        let sales = t.gateway().sales();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].movements[0].quantity_delta, -2);
        assert!(sales[0].redemption.is_some());

        assert_eq!(t.phase(), &PaymentPhase::Idle);
        assert!(t.items().is_empty());
        assert!(t.customer().is_none());
        assert!(t.session().coupon().is_none());
        assert_eq!(t.session().payment(), &PaymentSelection::default());
    }

    #[tokio::test]
    async fn test_split_must_match_total() {
        let (_, mut t) = terminal();
        t.select_customer(customer("Asha", "9876543210"));
        t.scan_barcode("8901rice").await.unwrap();
        let total = t.totals().total;
        assert_eq!(total, Money::from_paise(1180));

        t.select_payment(PaymentSelection {
            method: PaymentMethod::Split,
            split: SplitAmounts {
                cash: Money::from_paise(500),
                other: Money::from_paise(600),
                other_method: TenderMethod::Upi,
            },
        });
        let before = t.session().clone();

        let err = t.complete(None).await.unwrap_err();
        assert!(matches!(err, PosError::Core(CoreError::SplitMismatch { .. })));
        assert!(matches!(t.phase(), PaymentPhase::Failed { .. }));
        assert_eq!(t.session(), &before);
        assert!(t.gateway().sales().is_empty());

        t.select_payment(PaymentSelection {
            method: PaymentMethod::Split,
            split: SplitAmounts {
                cash: Money::from_paise(500),
                other: Money::from_paise(680),
                other_method: TenderMethod::Upi,
            },
        });
        let receipt = t.complete(None).await.unwrap();

        let tenders: Vec<(TenderMethod, i64)> = receipt
            .payments
            .iter()
            .map(|p| (p.method, p.amount_paise))
            .collect();
        assert_eq!(tenders, vec![(TenderMethod::Cash, 500), (TenderMethod::Upi, 680)]);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_session() {
        let (_, mut t) = terminal();
        t.select_customer(customer("Asha", "9876543210"));
        t.scan_barcode("8901rice").await.unwrap();
        let before = t.session().clone();

        t.gateway().fail_record.store(true, Ordering::SeqCst);
        let err = t.complete(None).await.unwrap_err();

        assert!(matches!(err, PosError::Database(DbError::StockConflict { .. })));
        match t.phase() {
            PaymentPhase::Failed { reason } => assert!(reason.contains("rice")),
            other => panic!("unexpected phase {:?}", other),
        }
        assert_eq!(t.session(), &before);

        t.gateway().fail_record.store(false, Ordering::SeqCst);
        t.complete(None).await.unwrap();
        assert_eq!(t.phase(), &PaymentPhase::Idle);
    }

    #[tokio::test]
    async fn test_empty_cart_cannot_complete() {
        let (_, mut t) = terminal();
        let err = t.complete(None).await.unwrap_err();
        assert!(matches!(err, PosError::Core(CoreError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_walk_in_customer_is_created_once() {
        let (_, mut t) = terminal();

        t.select_customer(customer("Asha", "9876543210"));
        t.scan_barcode("8901rice").await.unwrap();
        t.clear_customer();

        let err = t.complete(None).await.unwrap_err();
        assert!(matches!(
            err,
            PosError::Core(CoreError::MissingCustomerContact { ref field }) if field == "phone"
        ));

        let no_email = CustomerContact {
            name: None,
            phone: "98765 43210".into(),
            email: Some("  ".into()),
        };
        let err = t.complete(Some(no_email)).await.unwrap_err();
        assert!(matches!(
            err,
            PosError::Core(CoreError::MissingCustomerContact { ref field }) if field == "email"
        ));
        assert!(t.gateway().customers().is_empty());

        let contact = CustomerContact {
            name: None,
            phone: "+91 98765 43210".into(),
            email: Some("walkin@example.in".into()),
        };
        let receipt = t.complete(Some(contact.clone())).await.unwrap();
        assert_eq!(receipt.customer_name, WALK_IN_NAME);

        let created = t.gateway().customers();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].phone, "9876543210");

        // Same phone on the next visit reuses the record
        t.select_customer(customer("Asha", "9876543210"));
        t.scan_barcode("8901rice").await.unwrap();
        t.clear_customer();
        t.complete(Some(contact)).await.unwrap();

        assert_eq!(t.gateway().customers().len(), 1);
        let sales = t.gateway().sales();
        assert_eq!(sales[0].order.customer_id, sales[1].order.customer_id);
    }

    // =========================================================================
    // Realtime
    // =========================================================================

    #[tokio::test]
    async fn test_realtime_events_drive_the_session() {
        let (_, mut t) = terminal();
        let channel = RealtimeChannel::new(8);
        let subscription = channel.subscribe();

        channel.publish(RealtimeEvent::BarcodeScanned {
            code: "8901rice".into(),
        });
        channel.publish(RealtimeEvent::CustomerSelected {
            customer: customer("Asha", "9876543210"),
        });
        channel.publish(RealtimeEvent::BarcodeScanned {
            code: "8901rice".into(),
        });
        channel.publish(RealtimeEvent::CustomerSelected {
            customer: customer("Ravi", "9123456780"),
        });
        drop(channel);

        t.follow_realtime(subscription).await;

        // The first scan arrived before any customer and was rejected
        assert_eq!(t.items().len(), 1);
        assert_eq!(t.items()[0].quantity, 1);
        assert_eq!(t.customer().unwrap().name, "Ravi");

        t.apply_realtime(RealtimeEvent::CustomerCleared).await.unwrap();
        assert!(t.customer().is_none());
    }

    #[tokio::test]
    async fn test_counter_customer_changes_are_published() {
        let (_, t) = terminal();
        let channel = RealtimeChannel::new(8);
        let mut display = channel.subscribe();
        let mut t = t.with_realtime(channel.clone());

        let asha = customer("Asha", "9876543210");
        t.select_customer(asha.clone());
        t.clear_customer();
        // Nothing bound, nothing to announce
        t.clear_customer();
        // Pushed events are applied but not echoed
        t.apply_realtime(RealtimeEvent::CustomerSelected {
            customer: customer("Ravi", "9123456780"),
        })
        .await
        .unwrap();
        assert_eq!(t.customer().unwrap().name, "Ravi");

        drop(t);
        drop(channel);

        assert_eq!(
            display.next().await,
            Some(RealtimeEvent::CustomerSelected { customer: asha })
        );
        assert_eq!(display.next().await, Some(RealtimeEvent::CustomerCleared));
        assert_eq!(display.next().await, None);
    }

    #[tokio::test]
    async fn test_hold_and_resume_announce_the_customer() {
        let (_, t) = terminal();
        let channel = RealtimeChannel::new(8);
        let mut display = channel.subscribe();
        let mut t = t.with_realtime(channel.clone());

        let asha = customer("Asha", "9876543210");
        t.select_customer(asha.clone());
        t.scan_barcode("8901rice").await.unwrap();
        let held = t.hold(None).unwrap();
        t.resume(&held.id).unwrap().unwrap();

        drop(t);
        drop(channel);

        let mut events = Vec::new();
        while let Some(event) = display.next().await {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                RealtimeEvent::CustomerSelected {
                    customer: asha.clone()
                },
                RealtimeEvent::CustomerCleared,
                RealtimeEvent::CustomerSelected { customer: asha },
            ]
        );
    }
}
