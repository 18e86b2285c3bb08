//! # Validation Module
//!
//! Input validation for the counter forms and the catalog importer.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: Storefront UI      → immediate inline feedback               │
//! │  Layer 2: THIS MODULE        → business rules (phone, email, SKU...)   │
//! │  Layer 3: SQLite constraints → NOT NULL, UNIQUE, FOREIGN KEY           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ```rust
//! use storefront_core::validation::{validate_phone, validate_pincode};
//!
//! assert!(validate_phone("98765 43210").is_ok());
//! assert!(validate_pincode("560001").is_ok());
//! ```

use crate::error::ValidationError;
use crate::types::CustomerContact;

pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Catalog
// =============================================================================

/// Validates a SKU: 1-50 characters of letters, digits, hyphens, underscores.
///
/// ```rust
/// use storefront_core::validation::validate_sku;
///
/// assert!(validate_sku("ATTA-5KG").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::required("sku"));
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::invalid_format(
            "sku",
            "must contain only letters, numbers, hyphens, and underscores",
        ));
    }

    Ok(())
}

pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Zero is allowed (free samples); negative prices are not.
pub fn validate_price_paise(paise: i64) -> ValidationResult<()> {
    if paise < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

pub fn validate_stock_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity < 0 {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Customers
// =============================================================================

/// Normalizes an Indian mobile number to its 10 digits.
///
/// Accepts spaces, dashes and a `+91` / `0` prefix.
///
/// ```rust
/// use storefront_core::validation::normalize_phone;
///
/// assert_eq!(normalize_phone("+91 98765-43210").unwrap(), "9876543210");
/// assert!(normalize_phone("12345").is_err());
/// ```
pub fn normalize_phone(phone: &str) -> ValidationResult<String> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.is_empty() {
        return Err(ValidationError::required("phone"));
    }

    let digits = match digits.len() {
        12 if digits.starts_with("91") => digits[2..].to_string(),
        11 if digits.starts_with('0') => digits[1..].to_string(),
        _ => digits,
    };

    if digits.len() != 10 {
        return Err(ValidationError::invalid_format("phone", "must have 10 digits"));
    }

    Ok(digits)
}

pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    normalize_phone(phone).map(|_| ())
}

/// Minimal structural check: one `@`, non-empty local part, dotted domain.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::invalid_format("email", "must look like name@example.com"));
    }

    Ok(())
}

/// Checks a walk-in contact is complete enough to create a customer.
///
/// Email is mandatory: it links the counter sale to the online account.
pub fn validate_customer_contact(contact: &CustomerContact) -> ValidationResult<()> {
    validate_phone(&contact.phone)?;

    match contact.email.as_deref().map(str::trim) {
        None | Some("") => Err(ValidationError::required("email")),
        Some(email) => validate_email(email),
    }
}

// =============================================================================
// Delivery & Coupons
// =============================================================================

/// Indian PIN codes are six digits and never start with 0.
pub fn validate_pincode(pincode: &str) -> ValidationResult<()> {
    let pincode = pincode.trim();

    if pincode.is_empty() {
        return Err(ValidationError::required("pincode"));
    }

    if pincode.len() != 6
        || !pincode.chars().all(|c| c.is_ascii_digit())
        || pincode.starts_with('0')
    {
        return Err(ValidationError::invalid_format("pincode", "must be 6 digits"));
    }

    Ok(())
}

/// Coupon codes are matched case-insensitively; returns the canonical form.
pub fn normalize_coupon_code(code: &str) -> ValidationResult<String> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::required("coupon code"));
    }

    if code.len() > 32 {
        return Err(ValidationError::TooLong {
            field: "coupon code".to_string(),
            max: 32,
        });
    }

    Ok(code.to_uppercase())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("ATTA-5KG").is_ok());
        assert!(validate_sku("ghee_1l").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(60)).is_err());
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("9876543210").unwrap(), "9876543210");
        assert_eq!(normalize_phone("+91 98765 43210").unwrap(), "9876543210");
        assert_eq!(normalize_phone("09876543210").unwrap(), "9876543210");
        assert_eq!(normalize_phone(""), Err(ValidationError::required("phone")));
        assert!(normalize_phone("98765").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("asha@example.in").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("asha").is_err());
        assert!(validate_email("asha@localhost").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@b@example.com").is_err());
    }

    #[test]
    fn test_customer_contact_requires_email() {
        let mut contact = CustomerContact {
            name: Some("Asha".into()),
            phone: "9876543210".into(),
            email: None,
        };
        assert_eq!(
            validate_customer_contact(&contact),
            Err(ValidationError::required("email"))
        );

        contact.email = Some("asha@example.in".into());
        assert!(validate_customer_contact(&contact).is_ok());
    }

    #[test]
    fn test_validate_pincode() {
        assert!(validate_pincode("560001").is_ok());
        assert!(validate_pincode("056000").is_err());
        assert!(validate_pincode("5600").is_err());
        assert!(validate_pincode("56000A").is_err());
    }

    #[test]
    fn test_normalize_coupon_code() {
        assert_eq!(normalize_coupon_code(" diwali10 ").unwrap(), "DIWALI10");
        assert!(normalize_coupon_code("  ").is_err());
    }
}
