//! # Stock Check Rules
//!
//! Pure validation rules for the inventory guard.
//!
//! ## Two-Tier Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ADD TO CART (advisory)              CHECKOUT (authoritative)           │
//! │  ──────────────────────              ────────────────────────           │
//! │                                                                         │
//! │  check_variant_stock()               checkout_report()                  │
//! │    reject only what is                 re-check EVERY line against      │
//! │    impossible right now                current inventory, collect       │
//! │    (browsing shouldn't be              ALL issues at once               │
//! │    falsely rejected)                        │                           │
//! │                                             ▼                           │
//! │                                      atomic conditional decrement       │
//! │                                      (db layer) - the only writer       │
//! │                                      that can reserve stock             │
//! │                                                                         │
//! │  Validation alone is never enough: between the check and the commit    │
//! │  another cart can take the same units. The decrement re-checks         │
//! │  `stock >= qty` at write time.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This module owns the pure half: given already-fetched product/variant
//! records, decide. Fetching and the atomic write live in the db layer.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{CartLine, Product, ProductVariant};

// =============================================================================
// Check Results
// =============================================================================

/// Warning raised when a variant is purchasable but nearly out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockWarning {
    pub variant_id: String,
    pub sku: String,
    /// Units remaining at check time.
    pub remaining: i64,
}

/// Machine-readable reason a checkout line failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckoutIssueCode {
    ProductNotFound,
    ProductInactive,
    VariantNotFound,
    InsufficientStock,
    EmptyCart,
    DegenerateTotal,
}

/// One failed validation on a checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutIssue {
    /// Cart line the issue belongs to; empty for cart-level issues.
    pub line_id: String,
    pub sku: String,
    pub code: CheckoutIssueCode,
    pub message: String,
    /// Units available right now, for insufficient-stock issues.
    pub available: Option<i64>,
}

/// The complete result of checkout validation.
///
/// All issues are collected (not fail-fast) so the caller can present one
/// remediation list instead of a whack-a-mole loop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutReport {
    pub issues: Vec<CheckoutIssue>,
    pub warnings: Vec<LowStockWarning>,
}

impl CheckoutReport {
    /// The cart may proceed to the atomic reservation step.
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// A sibling variant offered when the requested one is unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantAlternative {
    pub variant_id: String,
    pub size: String,
    pub color: String,
    pub stock: i64,
}

// =============================================================================
// Checks
// =============================================================================

/// Validates a requested quantity against a resolved product + variant.
///
/// Returns a low-stock warning when the request fits but would leave the
/// shelf nearly empty (`0 < stock <= threshold`).
///
/// ## Errors
/// - `ProductInactive` - product was deactivated after the variant resolved
/// - `InsufficientStock` - fewer than `requested` units on hand (carries
///   the available count)
///
/// Missing product/variant records are rejected by the caller before this
/// runs; this function only judges records that exist.
pub fn check_variant_stock(
    product: &Product,
    variant: &ProductVariant,
    requested: i64,
    low_stock_threshold: i64,
) -> Result<Option<LowStockWarning>, CoreError> {
    if !product.is_active {
        return Err(CoreError::ProductInactive(product.id.clone()));
    }

    if !variant.can_fulfill(requested) {
        return Err(CoreError::InsufficientStock {
            sku: variant.sku.clone(),
            available: variant.stock,
            requested,
        });
    }

    if variant.stock > 0 && variant.stock <= low_stock_threshold {
        return Ok(Some(LowStockWarning {
            variant_id: variant.id.clone(),
            sku: variant.sku.clone(),
            remaining: variant.stock,
        }));
    }

    Ok(None)
}

/// The resolved inventory records for one cart line, as fetched at
/// checkout-validation time. `None` marks records that no longer resolve.
#[derive(Debug)]
pub struct LineInventory<'a> {
    pub line: &'a CartLine,
    pub product: Option<&'a Product>,
    pub variant: Option<&'a ProductVariant>,
}

/// Re-validates every cart line against current inventory and checks the
/// computed total, collecting ALL issues and warnings.
///
/// ## Cart-Level Rules
/// - an empty cart cannot check out
/// - a non-positive total on a non-empty cart is degenerate (a pricing bug
///   or an oversized manual discount) and is rejected rather than charged
pub fn checkout_report(
    lines: &[LineInventory<'_>],
    total_cents: i64,
    low_stock_threshold: i64,
) -> CheckoutReport {
    let mut report = CheckoutReport::default();

    if lines.is_empty() {
        report.issues.push(CheckoutIssue {
            line_id: String::new(),
            sku: String::new(),
            code: CheckoutIssueCode::EmptyCart,
            message: "Cart is empty".to_string(),
            available: None,
        });
        return report;
    }

    for entry in lines {
        let line = entry.line;

        let product = match entry.product {
            Some(p) => p,
            None => {
                report.issues.push(CheckoutIssue {
                    line_id: line.id.clone(),
                    sku: line.sku.clone(),
                    code: CheckoutIssueCode::ProductNotFound,
                    message: format!("Product {} no longer exists", line.product_id),
                    available: None,
                });
                continue;
            }
        };

        let variant = match entry.variant {
            Some(v) => v,
            None => {
                report.issues.push(CheckoutIssue {
                    line_id: line.id.clone(),
                    sku: line.sku.clone(),
                    code: CheckoutIssueCode::VariantNotFound,
                    message: format!("Variant {} no longer exists", line.variant_id),
                    available: None,
                });
                continue;
            }
        };

        match check_variant_stock(product, variant, line.quantity, low_stock_threshold) {
            Ok(Some(warning)) => report.warnings.push(warning),
            Ok(None) => {}
            Err(CoreError::ProductInactive(_)) => report.issues.push(CheckoutIssue {
                line_id: line.id.clone(),
                sku: line.sku.clone(),
                code: CheckoutIssueCode::ProductInactive,
                message: format!("Product {} is no longer available", product.name),
                available: None,
            }),
            Err(CoreError::InsufficientStock {
                available,
                requested,
                ..
            }) => report.issues.push(CheckoutIssue {
                line_id: line.id.clone(),
                sku: line.sku.clone(),
                code: CheckoutIssueCode::InsufficientStock,
                message: format!(
                    "Only {} of {} in stock ({} requested)",
                    available, line.sku, requested
                ),
                available: Some(available),
            }),
            // check_variant_stock raises no other variants
            Err(_) => {}
        }
    }

    if total_cents <= 0 {
        report.issues.push(CheckoutIssue {
            line_id: String::new(),
            sku: String::new(),
            code: CheckoutIssueCode::DegenerateTotal,
            message: format!("Cart total {} is not chargeable", total_cents),
            available: None,
        });
    }

    report
}

/// Lists sibling variants with stock, excluding the requested one.
///
/// Used when a requested size is unavailable: "M is out, but L and XL are
/// in stock".
pub fn suggest_alternatives(
    variants: &[ProductVariant],
    excluded_variant_id: &str,
) -> Vec<VariantAlternative> {
    variants
        .iter()
        .filter(|v| v.id != excluded_variant_id && v.stock > 0)
        .map(|v| VariantAlternative {
            variant_id: v.id.clone(),
            size: v.size.clone(),
            color: v.color.clone(),
            stock: v.stock,
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_product(id: &str, active: bool) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            base_price_cents: 5000,
            is_active: active,
            created_at: now,
            updated_at: now,
        }
    }

    fn test_variant(id: &str, product_id: &str, stock: i64) -> ProductVariant {
        let now = Utc::now();
        ProductVariant {
            id: id.to_string(),
            product_id: product_id.to_string(),
            size: "M".to_string(),
            color: "black".to_string(),
            sku: format!("SKU-{}", id),
            stock,
            price_cents: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn test_line(id: &str, product_id: &str, variant_id: &str, qty: i64) -> CartLine {
        CartLine {
            id: id.to_string(),
            cart_id: "c1".to_string(),
            product_id: product_id.to_string(),
            variant_id: variant_id.to_string(),
            size: "M".to_string(),
            color: "black".to_string(),
            sku: format!("SKU-{}", variant_id),
            quantity: qty,
            unit_price_cents: 5000,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_check_ok_no_warning() {
        let product = test_product("p1", true);
        let variant = test_variant("v1", "p1", 100);

        let result = check_variant_stock(&product, &variant, 2, 5).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_check_low_stock_warning() {
        let product = test_product("p1", true);
        let variant = test_variant("v1", "p1", 4);

        let warning = check_variant_stock(&product, &variant, 2, 5)
            .unwrap()
            .unwrap();
        assert_eq!(warning.remaining, 4);
        assert_eq!(warning.sku, "SKU-v1");
    }

    #[test]
    fn test_check_insufficient_stock_reports_available() {
        let product = test_product("p1", true);
        let variant = test_variant("v1", "p1", 3);

        let err = check_variant_stock(&product, &variant, 5, 5).unwrap_err();
        match err {
            CoreError::InsufficientStock {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, 3);
                assert_eq!(requested, 5);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_check_inactive_product() {
        let product = test_product("p1", false);
        let variant = test_variant("v1", "p1", 100);

        let err = check_variant_stock(&product, &variant, 1, 5).unwrap_err();
        assert!(matches!(err, CoreError::ProductInactive(_)));
    }

    #[test]
    fn test_exact_stock_is_sufficient() {
        let product = test_product("p1", true);
        let variant = test_variant("v1", "p1", 2);

        // Requesting exactly what's on hand succeeds (with a warning)
        let warning = check_variant_stock(&product, &variant, 2, 5).unwrap();
        assert!(warning.is_some());
    }

    #[test]
    fn test_checkout_report_collects_all_issues() {
        let product = test_product("p1", true);
        let inactive = test_product("p2", false);
        let v1 = test_variant("v1", "p1", 1); // too little for qty 2
        let v2 = test_variant("v2", "p2", 50);

        let l1 = test_line("l1", "p1", "v1", 2);
        let l2 = test_line("l2", "p2", "v2", 1);
        let l3 = test_line("l3", "p3", "v3", 1); // product gone

        let lines = [
            LineInventory {
                line: &l1,
                product: Some(&product),
                variant: Some(&v1),
            },
            LineInventory {
                line: &l2,
                product: Some(&inactive),
                variant: Some(&v2),
            },
            LineInventory {
                line: &l3,
                product: None,
                variant: None,
            },
        ];

        let report = checkout_report(&lines, 20000, 5);

        assert!(!report.is_valid());
        assert_eq!(report.issues.len(), 3);
        let codes: Vec<_> = report.issues.iter().map(|i| i.code).collect();
        assert!(codes.contains(&CheckoutIssueCode::InsufficientStock));
        assert!(codes.contains(&CheckoutIssueCode::ProductInactive));
        assert!(codes.contains(&CheckoutIssueCode::ProductNotFound));
    }

    #[test]
    fn test_checkout_report_empty_cart() {
        let report = checkout_report(&[], 0, 5);
        assert!(!report.is_valid());
        assert_eq!(report.issues[0].code, CheckoutIssueCode::EmptyCart);
    }

    #[test]
    fn test_checkout_report_degenerate_total() {
        let product = test_product("p1", true);
        let variant = test_variant("v1", "p1", 10);
        let line = test_line("l1", "p1", "v1", 1);

        let lines = [LineInventory {
            line: &line,
            product: Some(&product),
            variant: Some(&variant),
        }];

        let report = checkout_report(&lines, 0, 5);
        assert!(!report.is_valid());
        assert_eq!(report.issues[0].code, CheckoutIssueCode::DegenerateTotal);
    }

    #[test]
    fn test_checkout_report_valid_with_warnings() {
        let product = test_product("p1", true);
        let variant = test_variant("v1", "p1", 3);
        let line = test_line("l1", "p1", "v1", 2);

        let lines = [LineInventory {
            line: &line,
            product: Some(&product),
            variant: Some(&variant),
        }];

        let report = checkout_report(&lines, 10500, 5);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].remaining, 3);
    }

    #[test]
    fn test_suggest_alternatives_filters() {
        let variants = [
            test_variant("v1", "p1", 0),  // out of stock
            test_variant("v2", "p1", 4),
            test_variant("v3", "p1", 9),
            test_variant("v4", "p1", 2),  // the excluded one
        ];

        let alternatives = suggest_alternatives(&variants, "v4");

        let ids: Vec<_> = alternatives.iter().map(|a| a.variant_id.as_str()).collect();
        assert_eq!(ids, vec!["v2", "v3"]);
    }
}
