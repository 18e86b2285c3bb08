//! # Demo Data Seeder
//!
//! Fills a development database with a grocery catalog, a few coupons and
//! the serviceable pincodes.
//!
//! ## Usage
//! ```bash
//! cargo run -p storefront-db --bin seed
//! cargo run -p storefront-db --bin seed -- --db ./data/pos.db --count 200
//! ```
//!
//! SKUs are `{CATEGORY}-{ITEM}-{SIZE}`; prices are derived from the item
//! index so repeated runs produce the same catalog.

use chrono::{Duration, Utc};
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use storefront_core::import::ProductImportRow;
use storefront_core::{Coupon, DiscountType, ServiceablePincode};
use storefront_db::{Database, DbConfig};

const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "STAPLE",
        &[
            "Basmati Rice",
            "Sona Masoori Rice",
            "Whole Wheat Atta",
            "Toor Dal",
            "Moong Dal",
            "Chana Dal",
            "Besan",
            "Sugar",
            "Iodised Salt",
            "Poha",
        ],
    ),
    (
        "DAIRY",
        &["Toned Milk", "Curd", "Paneer", "Butter", "Ghee", "Cheese Slices"],
    ),
    (
        "SNACK",
        &[
            "Masala Chips",
            "Aloo Bhujia",
            "Marie Biscuits",
            "Cream Biscuits",
            "Roasted Peanuts",
            "Instant Noodles",
        ],
    ),
    (
        "BEV",
        &["Assam Tea", "Filter Coffee", "Mango Drink", "Lemon Soda", "Coconut Water"],
    ),
];

/// Size label and price multiplier in percent.
const SIZES: &[(&str, i64)] = &[("500G", 100), ("1KG", 190), ("5KG", 900)];

const PINCODES: &[(&str, &str, &str, i64)] = &[
    ("560001", "Bengaluru", "Karnataka", 1),
    ("560034", "Bengaluru", "Karnataka", 1),
    ("400001", "Mumbai", "Maharashtra", 2),
    ("110001", "New Delhi", "Delhi", 3),
    ("600001", "Chennai", "Tamil Nadu", 2),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,storefront=debug,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut count: usize = usize::MAX;
    let mut db_path = String::from("./storefront_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if let Some(value) = args.get(i + 1) {
                    count = value.parse().unwrap_or(count);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if let Some(value) = args.get(i + 1) {
                    db_path = value.clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Maximum products to generate (default: all)");
                println!("  -d, --db <PATH>    Database file path (default: ./storefront_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(argument = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let db = Database::new(DbConfig::new(&db_path)).await?;
    info!(path = %db_path, "Connected, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has products; delete the file to regenerate");
        return Ok(());
    }

    let rows = catalog(count);
    let summary = db.products().import(&rows).await?;
    info!(inserted = summary.inserted, "Catalog seeded");

    for coupon in coupons() {
        db.coupons().insert(&coupon).await?;
    }
    info!("Coupons seeded");

    for (pincode, city, state, days) in PINCODES {
        db.pincodes()
            .upsert(&ServiceablePincode {
                pincode: pincode.to_string(),
                city: city.to_string(),
                state: state.to_string(),
                delivery_days: *days,
                is_active: true,
            })
            .await?;
    }
    info!(count = PINCODES.len(), "Serviceable pincodes seeded");

    let sample = db.products().search("rice", 5).await?;
    info!(matches = sample.len(), "Search 'rice' check");

    Ok(())
}

fn catalog(limit: usize) -> Vec<ProductImportRow> {
    let mut rows = Vec::new();

    for (category_idx, (category, items)) in CATEGORIES.iter().enumerate() {
        for (item_idx, item) in items.iter().enumerate() {
            for (size, multiplier) in SIZES {
                if rows.len() >= limit {
                    return rows;
                }

                let seed = category_idx * 100 + item_idx;
                // ₹25.00 to ₹124.00 for the base size
                let base_paise = 2_500 + ((seed * 37) % 100) as i64 * 100;
                let code: String = item
                    .split_whitespace()
                    .filter_map(|w| w.chars().next())
                    .collect::<String>()
                    .to_uppercase();

                rows.push(ProductImportRow {
                    sku: format!("{}-{}{:02}-{}", category, code, item_idx, size),
                    name: format!("{} {}", item, size.to_lowercase()),
                    price_paise: base_paise * multiplier / 100,
                    barcode: Some(format!("890{:010}", seed * 10 + rows.len())),
                    quantity: ((seed * 13) % 60) as i64,
                });
            }
        }
    }

    rows
}

fn coupons() -> Vec<Coupon> {
    vec![
        Coupon {
            id: uuid::Uuid::new_v4().to_string(),
            code: "WELCOME10".into(),
            discount_type: DiscountType::Percentage,
            discount_value: 1_000,
            pos_eligible: true,
            online_eligible: true,
            is_active: true,
            expires_at: None,
        },
        Coupon {
            id: uuid::Uuid::new_v4().to_string(),
            code: "COUNTER50".into(),
            discount_type: DiscountType::FixedAmount,
            discount_value: 5_000,
            pos_eligible: true,
            online_eligible: false,
            is_active: true,
            expires_at: Some(Utc::now() + Duration::days(30)),
        },
        Coupon {
            id: uuid::Uuid::new_v4().to_string(),
            code: "APPONLY".into(),
            discount_type: DiscountType::Percentage,
            discount_value: 1_500,
            pos_eligible: false,
            online_eligible: true,
            is_active: true,
            expires_at: None,
        },
    ]
}
