//! # Inventory Guard
//!
//! The two-tier stock policy: advisory at add-to-cart, authoritative at
//! checkout.
//!
//! ## Why Two Tiers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ADD TO CART                                                            │
//! │    check_stock() - rejects only what cannot be satisfied right now.    │
//! │    Stock dropping AFTER the add is tolerated: browsing must not be     │
//! │    falsely rejected because someone else is faster at checkout.        │
//! │                                                                         │
//! │  CHECKOUT                                                               │
//! │    check_cart_for_checkout() - re-validates EVERY line against         │
//! │    current inventory and the computed total, returning all issues at   │
//! │    once. Then the db layer's conditional decrement re-checks at the    │
//! │    moment of the write - the validation is advice, the decrement is    │
//! │    the law.                                                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pure decisions live in `mart_core::stock`; this service fetches the
//! records and applies them.

use tracing::debug;

use mart_core::stock::{
    check_variant_stock, checkout_report, suggest_alternatives, CheckoutReport, LineInventory,
    LowStockWarning, VariantAlternative,
};
use mart_core::{validation, Cart, CartLine, CoreError, Product, ProductVariant};
use mart_db::Database;

use crate::config::CommerceConfig;
use crate::error::CommerceResult;

/// Stock validation service.
#[derive(Debug, Clone)]
pub struct InventoryGuard {
    db: Database,
    config: CommerceConfig,
}

impl InventoryGuard {
    /// Creates a new guard.
    pub fn new(db: Database, config: CommerceConfig) -> Self {
        InventoryGuard { db, config }
    }

    /// Resolves a (product, variant) pair and checks a requested quantity.
    ///
    /// Used by the cart service, which also needs the resolved records for
    /// the line snapshot.
    ///
    /// ## Errors
    /// - `NotFound` - product or variant id doesn't resolve, or the variant
    ///   belongs to a different product
    /// - `Conflict` - product inactive, or insufficient stock (with the
    ///   available count in the details)
    pub async fn resolve_and_check(
        &self,
        product_id: &str,
        variant_id: &str,
        requested: i64,
    ) -> CommerceResult<(Product, ProductVariant, Option<LowStockWarning>)> {
        let product = self
            .db
            .products()
            .get_product(product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        let variant = self
            .db
            .products()
            .get_variant(variant_id)
            .await?
            .filter(|v| v.product_id == product.id)
            .ok_or_else(|| CoreError::VariantNotFound(variant_id.to_string()))?;

        let warning =
            check_variant_stock(&product, &variant, requested, self.config.low_stock_threshold)?;

        Ok((product, variant, warning))
    }

    /// Advisory stock check for a requested quantity.
    pub async fn check_stock(
        &self,
        product_id: &str,
        variant_id: &str,
        requested: i64,
    ) -> CommerceResult<Option<LowStockWarning>> {
        validation::validate_quantity(requested, self.config.max_item_quantity)?;

        let (_, _, warning) = self
            .resolve_and_check(product_id, variant_id, requested)
            .await?;

        Ok(warning)
    }

    /// Authoritative checkout validation.
    ///
    /// Re-fetches every line's product and variant (inventory may have
    /// changed since the items were added) and validates the cart's computed
    /// total. All issues come back at once so the caller can present a
    /// complete remediation list.
    pub async fn check_cart_for_checkout(
        &self,
        cart: &Cart,
        lines: &[CartLine],
    ) -> CommerceResult<CheckoutReport> {
        // Fetch current records; lines whose references vanished keep None
        // and turn into issues in the report.
        let mut fetched: Vec<(Option<Product>, Option<ProductVariant>)> =
            Vec::with_capacity(lines.len());

        for line in lines {
            let product = self.db.products().get_product(&line.product_id).await?;
            let variant = self
                .db
                .products()
                .get_variant(&line.variant_id)
                .await?
                .filter(|v| v.product_id == line.product_id);
            fetched.push((product, variant));
        }

        let inventory: Vec<LineInventory<'_>> = lines
            .iter()
            .zip(fetched.iter())
            .map(|(line, (product, variant))| LineInventory {
                line,
                product: product.as_ref(),
                variant: variant.as_ref(),
            })
            .collect();

        let report = checkout_report(
            &inventory,
            cart.total_cents,
            self.config.low_stock_threshold,
        );

        debug!(
            cart_id = %cart.id,
            issues = report.issues.len(),
            warnings = report.warnings.len(),
            "Checkout validation"
        );

        Ok(report)
    }

    /// Suggests in-stock sibling variants when a requested one is
    /// unavailable.
    pub async fn suggest_alternatives(
        &self,
        product_id: &str,
        excluded_variant_id: &str,
    ) -> CommerceResult<Vec<VariantAlternative>> {
        // The product must exist even when it has no purchasable variants
        self.db
            .products()
            .get_product(product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        let variants = self.db.products().get_variants(product_id).await?;

        Ok(suggest_alternatives(&variants, excluded_variant_id))
    }
}
