//! # Catalog Import
//!
//! Parses a product CSV into rows ready for the product repository.
//!
//! ```text
//! sku,name,price,barcode,quantity
//! ATTA-5KG,Aashirvaad Atta 5kg,289.00,8901725181123,40
//! DAL-1KG,Toor Dal 1kg,165.5,,25
//! ```
//!
//! `price` is in rupees with up to two decimals and is converted to paise
//! without touching floating point. Blank `barcode` means none; blank
//! `quantity` means zero. Every row is validated independently so one bad
//! line does not sink the file.

use serde::{Deserialize, Serialize};
use std::io::Read;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::validation::{validate_price_paise, validate_product_name, validate_sku, validate_stock_quantity};

#[derive(Debug, Deserialize)]
struct CsvRow {
    sku: String,
    name: String,
    price: String,
    #[serde(default)]
    barcode: String,
    #[serde(default)]
    quantity: String,
}

/// A validated product row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductImportRow {
    pub sku: String,
    pub name: String,
    pub price_paise: i64,
    pub barcode: Option<String>,
    pub quantity: i64,
}

/// Why a line was skipped. `line` is 1-based and counts the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RowError {
    pub line: u64,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ImportReport {
    pub accepted: Vec<ProductImportRow>,
    pub rejected: Vec<RowError>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Reads a product CSV. Malformed lines land in `rejected`; this never fails
/// as a whole.
pub fn parse_products<R: Read>(reader: R) -> ImportReport {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut report = ImportReport::default();

    for (idx, result) in csv_reader.deserialize::<CsvRow>().enumerate() {
        let line = idx as u64 + 2;
        match result {
            Ok(raw) => match validate_row(raw) {
                Ok(row) => report.accepted.push(row),
                Err(errors) => report.rejected.push(RowError { line, errors }),
            },
            Err(e) => report.rejected.push(RowError {
                line: e.position().map_or(line, |p| p.line()),
                errors: vec![e.to_string()],
            }),
        }
    }

    report
}

fn validate_row(raw: CsvRow) -> Result<ProductImportRow, Vec<String>> {
    let mut errors = Vec::new();

    if let Err(e) = validate_sku(&raw.sku) {
        errors.push(e.to_string());
    }
    if let Err(e) = validate_product_name(&raw.name) {
        errors.push(e.to_string());
    }

    let price_paise = match parse_rupees(&raw.price) {
        Ok(paise) => {
            if let Err(e) = validate_price_paise(paise) {
                errors.push(e.to_string());
            }
            paise
        }
        Err(e) => {
            errors.push(e.to_string());
            0
        }
    };

    let quantity = if raw.quantity.is_empty() {
        0
    } else {
        match raw.quantity.parse::<i64>() {
            Ok(q) => {
                if let Err(e) = validate_stock_quantity(q) {
                    errors.push(e.to_string());
                }
                q
            }
            Err(_) => {
                errors.push(
                    ValidationError::invalid_format("quantity", "must be a whole number").to_string(),
                );
                0
            }
        }
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ProductImportRow {
        sku: raw.sku,
        name: raw.name,
        price_paise,
        barcode: Some(raw.barcode).filter(|b| !b.is_empty()),
        quantity,
    })
}

/// `"165.5"` → 16550. At most two decimal places.
fn parse_rupees(value: &str) -> Result<i64, ValidationError> {
    let value = value.trim().trim_start_matches('₹');
    if value.is_empty() {
        return Err(ValidationError::required("price"));
    }

    let (negative, value) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };

    let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
    let malformed = || ValidationError::invalid_format("price", "must look like 123 or 123.45");

    if whole.is_empty() || fraction.len() > 2 {
        return Err(malformed());
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(malformed());
    }

    let rupees: i64 = whole.parse().map_err(|_| malformed())?;
    let paise: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().map_err(|_| malformed())? * 10,
        _ => fraction.parse().map_err(|_| malformed())?,
    };

    let total = rupees
        .checked_mul(100)
        .and_then(|r| r.checked_add(paise))
        .ok_or_else(malformed)?;

    Ok(if negative { -total } else { total })
}
