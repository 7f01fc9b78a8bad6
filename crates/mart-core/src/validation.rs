//! # Validation Module
//!
//! Input validation utilities for the commerce core.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Transport (external)                                         │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── Immediate caller feedback                                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints (stock >= 0, quantity >= 1)          │
//! │  ├── UNIQUE constraints (sku, order_number, one active cart)           │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{ValidationError, ValidationResult};
use crate::{COUPON_MAX_LEN, COUPON_MIN_LEN};

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity against the configured per-item cap.
///
/// ## Rules
/// - Must be positive (> 0); quantity 0 is expressed as a removal upstream
/// - Must not exceed the cap
pub fn validate_quantity(qty: i64, max: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > max {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max,
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a shipping cost against the configured ceiling.
pub fn validate_shipping_cents(cents: i64, ceiling: i64) -> ValidationResult<()> {
    if cents < 0 || cents > ceiling {
        return Err(ValidationError::OutOfRange {
            field: "shipping_cost".to_string(),
            min: 0,
            max: ceiling,
        });
    }

    Ok(())
}

/// Validates a discount amount in cents.
///
/// An oversized discount is legal input (the totals computation clamps the
/// taxable base); a negative one is not.
pub fn validate_discount_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Normalizes and validates a coupon code.
///
/// ## Rules
/// - Trimmed, then uppercased - `" summer10 "` and `"SUMMER10"` are the
///   same coupon
/// - Alphanumeric only
/// - Between [`COUPON_MIN_LEN`] and [`COUPON_MAX_LEN`] characters
///
/// ## Returns
/// The normalized code.
///
/// ## Example
/// ```rust
/// use mart_core::validation::normalize_coupon_code;
///
/// assert_eq!(normalize_coupon_code(" summer10 ").unwrap(), "SUMMER10");
/// assert!(normalize_coupon_code("no spaces allowed").is_err());
/// assert!(normalize_coupon_code("ab").is_err());
/// ```
pub fn normalize_coupon_code(code: &str) -> ValidationResult<String> {
    let code = code.trim().to_uppercase();

    if code.len() < COUPON_MIN_LEN {
        return Err(ValidationError::TooShort {
            field: "coupon_code".to_string(),
            min: COUPON_MIN_LEN,
        });
    }

    if code.len() > COUPON_MAX_LEN {
        return Err(ValidationError::TooLong {
            field: "coupon_code".to_string(),
            max: COUPON_MAX_LEN,
        });
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "coupon_code".to_string(),
            reason: "must contain only letters and numbers".to_string(),
        });
    }

    Ok(code)
}

/// Validates a non-empty user identifier.
pub fn validate_user_id(user_id: &str) -> ValidationResult<()> {
    if user_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "user_id".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Rules
/// - Must be a valid UUID format
/// - 36 characters with hyphens: xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1, 99).is_ok());
        assert!(validate_quantity(99, 99).is_ok());

        assert!(validate_quantity(0, 99).is_err());
        assert!(validate_quantity(-1, 99).is_err());
        assert!(validate_quantity(100, 99).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(-100).is_err());
    }

    #[test]
    fn test_validate_shipping_cents() {
        assert!(validate_shipping_cents(0, 50_000).is_ok());
        assert!(validate_shipping_cents(500, 50_000).is_ok());
        assert!(validate_shipping_cents(50_000, 50_000).is_ok());

        assert!(validate_shipping_cents(-1, 50_000).is_err());
        assert!(validate_shipping_cents(50_001, 50_000).is_err());
    }

    #[test]
    fn test_validate_discount_cents() {
        assert!(validate_discount_cents(0).is_ok());
        // Oversized is fine - the totals computation clamps
        assert!(validate_discount_cents(1_000_000).is_ok());
        assert!(validate_discount_cents(-1).is_err());
    }

    #[test]
    fn test_validate_tax_rate_bps() {
        assert!(validate_tax_rate_bps(0).is_ok());
        assert!(validate_tax_rate_bps(825).is_ok());
        assert!(validate_tax_rate_bps(10000).is_ok());
        assert!(validate_tax_rate_bps(10001).is_err());
    }

    #[test]
    fn test_normalize_coupon_code() {
        assert_eq!(normalize_coupon_code("SUMMER10").unwrap(), "SUMMER10");
        assert_eq!(normalize_coupon_code("  summer10  ").unwrap(), "SUMMER10");
        assert_eq!(normalize_coupon_code("weLcOmE").unwrap(), "WELCOME");

        assert!(normalize_coupon_code("").is_err());
        assert!(normalize_coupon_code("ab").is_err());
        assert!(normalize_coupon_code("SAVE 10").is_err());
        assert!(normalize_coupon_code("SAVE-10").is_err());
        assert!(normalize_coupon_code(&"A".repeat(21)).is_err());
    }

    #[test]
    fn test_validate_user_id() {
        assert!(validate_user_id("user-1").is_ok());
        assert!(validate_user_id("").is_err());
        assert!(validate_user_id("   ").is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
        assert!(validate_uuid("123").is_err());
    }
}
