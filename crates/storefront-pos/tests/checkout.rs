//! End-to-end counter flow against an in-memory SQLite database.

use std::sync::Arc;

use chrono::Utc;
use storefront_core::import::parse_products;
use storefront_core::{
    CoreError, Coupon, Customer, CustomerContact, DiscountType, Money, PaymentMethod,
    PaymentSelection, ServiceablePincode, SplitAmounts, TenderMethod,
};
use storefront_db::{Database, DbConfig, DbError};
use storefront_pos::{
    DeliveryLocationStore, KvHeldSaleRepository, MemoryStore, PaymentPhase, PosConfig, PosError,
    PosTerminal,
};

const CATALOG: &str = "\
sku,name,price,barcode,quantity
STAPLE-BR-1KG,Basmati Rice 1kg,10.00,8901000000011,5
DAIRY-PN-200G,Paneer 200g,2.50,8901000000028,3
BAD SKU,Broken Row,abc,,1
";

async fn setup() -> (Database, PosTerminal<Database>) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    let report = parse_products(CATALOG.as_bytes());
    assert_eq!(report.accepted.len(), 2);
    assert_eq!(report.rejected.len(), 1);
    db.products().import(&report.accepted).await.unwrap();

    db.coupons()
        .insert(&Coupon {
            id: "coupon-save10".into(),
            code: "SAVE10".into(),
            discount_type: DiscountType::Percentage,
            discount_value: 1_000,
            pos_eligible: true,
            online_eligible: true,
            is_active: true,
            expires_at: None,
        })
        .await
        .unwrap();

    let held = Arc::new(KvHeldSaleRepository::new(Arc::new(MemoryStore::new()), 20));
    let terminal = PosTerminal::new(db.clone(), held, &PosConfig::default());
    (db, terminal)
}

async fn registered_customer(db: &Database) -> Customer {
    let customer = Customer {
        id: "cust-asha".into(),
        name: "Asha".into(),
        phone: "9876543210".into(),
        email: Some("asha@example.in".into()),
        created_at: Utc::now(),
    };
    db.customers().insert(&customer).await.unwrap();
    customer
}

#[tokio::test]
async fn test_full_sale_writes_order_and_decrements_stock() {
    let (db, mut terminal) = setup().await;
    terminal.select_customer(registered_customer(&db).await);

    terminal.scan_barcode("8901000000011").await.unwrap();
    terminal.scan_barcode("8901000000011").await.unwrap();
    terminal.apply_coupon("save10").await.unwrap();

    // Park it and bring it back before paying
    let held = terminal.hold(Some("Asha - rice")).unwrap();
    assert!(terminal.items().is_empty());
    terminal.resume(&held.id).unwrap().unwrap();

    terminal.select_payment(PaymentSelection {
        method: PaymentMethod::Split,
        split: SplitAmounts {
            cash: Money::from_paise(1_000),
            other: Money::from_paise(1_124),
            other_method: TenderMethod::Upi,
        },
    });

    let receipt = terminal.complete(None).await.unwrap();
    assert_eq!(receipt.totals.subtotal, Money::from_paise(2_000));
    assert_eq!(receipt.totals.discount, Money::from_paise(200));
    assert_eq!(receipt.totals.tax, Money::from_paise(324));
    assert_eq!(receipt.totals.total, Money::from_paise(2_124));
    assert_eq!(terminal.phase(), &PaymentPhase::Idle);
    assert!(terminal.items().is_empty());

    let order = db.orders().get_by_id(&receipt.order_id).await.unwrap().unwrap();
    assert_eq!(order.total_paise, 2_124);
    assert_eq!(order.coupon_id.as_deref(), Some("coupon-save10"));
    assert_eq!(db.orders().get_items(&order.id).await.unwrap().len(), 1);
    assert_eq!(db.orders().get_payments(&order.id).await.unwrap().len(), 2);
    assert_eq!(db.orders().count_redemptions("coupon-save10").await.unwrap(), 1);

    let rice = db
        .products()
        .get_by_barcode("8901000000011")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(rice.stock.quantity, 3);
}

#[tokio::test]
async fn test_stock_moved_underneath_the_cart_rolls_back() {
    let (db, mut terminal) = setup().await;
    terminal.select_customer(registered_customer(&db).await);

    let line = terminal.scan_barcode("8901000000028").await.unwrap();
    terminal.change_quantity(&line.id, 2).unwrap();

    // Someone else sold two paneer since it was scanned
    db.products().adjust_stock(&line.product_id, -2).await.unwrap();

    let err = terminal.complete(None).await.unwrap_err();
    assert!(matches!(err, PosError::Database(DbError::StockConflict { .. })));
    assert!(matches!(terminal.phase(), PaymentPhase::Failed { .. }));
    assert_eq!(terminal.items()[0].quantity, 3);

    assert_eq!(db.orders().count().await.unwrap(), 0);
    let paneer = db.products().get_by_id(&line.product_id).await.unwrap().unwrap();
    assert_eq!(paneer.stock.quantity, 1);
}

#[tokio::test]
async fn test_walk_in_sale_creates_customer() {
    let (db, mut terminal) = setup().await;
    terminal.select_customer(registered_customer(&db).await);
    terminal.scan_barcode("8901000000028").await.unwrap();
    terminal.clear_customer();

    let err = terminal
        .complete(Some(CustomerContact {
            name: Some("Meera".into()),
            phone: "9000000001".into(),
            email: None,
        }))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PosError::Core(CoreError::MissingCustomerContact { .. })
    ));

    let receipt = terminal
        .complete(Some(CustomerContact {
            name: Some("Meera".into()),
            phone: "9000000001".into(),
            email: Some("meera@example.in".into()),
        }))
        .await
        .unwrap();
    assert_eq!(receipt.customer_name, "Meera");

    let meera = db.customers().get_by_phone("9000000001").await.unwrap().unwrap();
    let order = db.orders().get_by_id(&receipt.order_id).await.unwrap().unwrap();
    assert_eq!(order.customer_id, meera.id);
}

#[tokio::test]
async fn test_delivery_location_uses_serviceable_pincodes() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    db.pincodes()
        .upsert(&ServiceablePincode {
            pincode: "560034".into(),
            city: "Bengaluru".into(),
            state: "Karnataka".into(),
            delivery_days: 1,
            is_active: true,
        })
        .await
        .unwrap();

    let locations = DeliveryLocationStore::new(db, Arc::new(MemoryStore::new()));

    let location = locations.select("560034").await.unwrap();
    assert_eq!(location.city, "Bengaluru");

    let err = locations.select("110001").await.unwrap_err();
    assert!(matches!(err, PosError::NotServiceable(_)));
    assert_eq!(locations.current().unwrap().unwrap().pincode, "560034");
}
