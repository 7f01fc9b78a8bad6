//! # Cart Service
//!
//! The cart aggregate: a per-user mutable collection of lines whose totals
//! are Money Engine outputs, never caller input.
//!
//! ## Mutation Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Every mutation ends the same way                           │
//! │                                                                         │
//! │  add_item / update_item_quantity / remove_item / clear /               │
//! │  apply_coupon / remove_coupon / set_shipping                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  mutate the lines / coupon / shipping in storage                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  refresh():                                                            │
//! │    1. re-read the CURRENT persisted line list  ← never a caller total  │
//! │    2. compute_totals()                                                 │
//! │    3. slide expires_at forward by the TTL                              │
//! │    4. write back, guarded by status = 'active'                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CartView { cart, lines }                                              │
//! │                                                                         │
//! │  Two tabs mutating one cart are last-write-wins on the document, but   │
//! │  step 1 makes the persisted totals honest either way.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use mart_core::{
    compute_totals, validation, Cart, CartLine, CartStatus, CartView, CoreError, LineAmount,
};
use mart_db::{Database, DbError};

use crate::clock::Clock;
use crate::config::CommerceConfig;
use crate::error::{CommerceError, CommerceResult};
use crate::guard::InventoryGuard;

/// Cart aggregate service.
#[derive(Debug, Clone)]
pub struct CartService {
    db: Database,
    guard: InventoryGuard,
    config: CommerceConfig,
    clock: Arc<dyn Clock>,
}

impl CartService {
    /// Creates a new cart service.
    pub fn new(db: Database, config: CommerceConfig, clock: Arc<dyn Clock>) -> Self {
        let guard = InventoryGuard::new(db.clone(), config.clone());
        CartService {
            db,
            guard,
            config,
            clock,
        }
    }

    // =========================================================================
    // Public Operations
    // =========================================================================

    /// Returns the user's single active cart, creating an empty one lazily.
    pub async fn get_or_create_active(&self, user_id: &str) -> CommerceResult<CartView> {
        let cart = self.load_or_create(user_id).await?;
        self.refresh(cart).await
    }

    /// Adds a variant to the cart, merging into an existing line for the
    /// same (product, variant) pair.
    ///
    /// Requires the inventory guard to pass for the merged quantity; stock
    /// dropping later is tolerated until checkout. The distinct-line cap is
    /// only checked when the line is new.
    pub async fn add_item(
        &self,
        user_id: &str,
        product_id: &str,
        variant_id: &str,
        quantity: i64,
    ) -> CommerceResult<CartView> {
        validation::validate_quantity(quantity, self.config.max_item_quantity)?;

        let cart = self.load_or_create(user_id).await?;

        let existing = self
            .db
            .carts()
            .find_line(&cart.id, product_id, variant_id)
            .await?;

        // The guard judges the merged quantity, not just the increment
        let prospective = existing.as_ref().map_or(quantity, |l| l.quantity + quantity);
        validation::validate_quantity(prospective, self.config.max_item_quantity)?;

        let (product, variant, warning) = self
            .guard
            .resolve_and_check(product_id, variant_id, prospective)
            .await?;

        if let Some(w) = &warning {
            warn!(sku = %w.sku, remaining = w.remaining, "Low stock at add-to-cart");
        }

        match existing {
            Some(line) => {
                debug!(cart_id = %cart.id, sku = %line.sku, quantity = prospective, "Merging cart line");
                self.db
                    .carts()
                    .set_line_quantity(&line.id, prospective)
                    .await?;
            }
            None => {
                let count = self.db.carts().line_count(&cart.id).await?;
                if count as usize >= self.config.max_cart_lines {
                    return Err(CoreError::CartFull {
                        max: self.config.max_cart_lines,
                    }
                    .into());
                }

                let line = CartLine {
                    id: Uuid::new_v4().to_string(),
                    cart_id: cart.id.clone(),
                    product_id: product.id.clone(),
                    variant_id: variant.id.clone(),
                    size: variant.size.clone(),
                    color: variant.color.clone(),
                    sku: variant.sku.clone(),
                    quantity,
                    unit_price_cents: variant.effective_price_cents(&product),
                    created_at: self.clock.now(),
                };

                debug!(cart_id = %cart.id, sku = %line.sku, quantity, "Appending cart line");
                self.db.carts().insert_line(&line).await?;
            }
        }

        self.refresh(cart).await
    }

    /// Sets a line's quantity. Quantity 0 removes the line; anything else
    /// is re-validated against current stock before applying.
    pub async fn update_item_quantity(
        &self,
        user_id: &str,
        line_id: &str,
        quantity: i64,
    ) -> CommerceResult<CartView> {
        let cart = self.load_or_create(user_id).await?;
        let line = self.owned_line(&cart, line_id).await?;

        if quantity == 0 {
            self.db.carts().delete_line(&line.id).await?;
            return self.refresh(cart).await;
        }

        validation::validate_quantity(quantity, self.config.max_item_quantity)?;
        self.guard
            .resolve_and_check(&line.product_id, &line.variant_id, quantity)
            .await?;

        self.db.carts().set_line_quantity(&line.id, quantity).await?;
        self.refresh(cart).await
    }

    /// Removes a line.
    pub async fn remove_item(&self, user_id: &str, line_id: &str) -> CommerceResult<CartView> {
        let cart = self.load_or_create(user_id).await?;
        let line = self.owned_line(&cart, line_id).await?;

        self.db.carts().delete_line(&line.id).await?;
        self.refresh(cart).await
    }

    /// Removes every line.
    pub async fn clear(&self, user_id: &str) -> CommerceResult<CartView> {
        let cart = self.load_or_create(user_id).await?;

        self.db.carts().clear_lines(&cart.id).await?;
        self.refresh(cart).await
    }

    /// Applies a coupon.
    ///
    /// The code is normalized (trimmed, uppercased) and stored; the discount
    /// amount was resolved by the external coupon collaborator and is taken
    /// as-is. Re-applying the currently applied code is a conflict.
    pub async fn apply_coupon(
        &self,
        user_id: &str,
        code: &str,
        discount_cents: i64,
    ) -> CommerceResult<CartView> {
        let normalized = validation::normalize_coupon_code(code)?;
        validation::validate_discount_cents(discount_cents)?;

        let mut cart = self.load_or_create(user_id).await?;

        if cart.coupon_code.as_deref() == Some(normalized.as_str()) {
            return Err(CoreError::CouponAlreadyApplied { code: normalized }.into());
        }

        info!(cart_id = %cart.id, code = %normalized, discount_cents, "Applying coupon");
        cart.coupon_code = Some(normalized);
        cart.discount_cents = discount_cents;

        self.refresh(cart).await
    }

    /// Removes the applied coupon (and its discount).
    pub async fn remove_coupon(&self, user_id: &str) -> CommerceResult<CartView> {
        let mut cart = self.load_or_create(user_id).await?;

        cart.coupon_code = None;
        cart.discount_cents = 0;

        self.refresh(cart).await
    }

    /// Sets the shipping cost.
    pub async fn set_shipping(&self, user_id: &str, cents: i64) -> CommerceResult<CartView> {
        validation::validate_shipping_cents(cents, self.config.max_shipping_cents)?;

        let mut cart = self.load_or_create(user_id).await?;
        cart.shipping_cents = cents;

        self.refresh(cart).await
    }

    /// Marks the user's active cart abandoned.
    pub async fn abandon(&self, user_id: &str) -> CommerceResult<()> {
        validation::validate_user_id(user_id)?;

        let cart = self
            .db
            .carts()
            .find_active_by_user(user_id)
            .await?
            .ok_or_else(|| CoreError::CartNotFound(user_id.to_string()))?;

        if !self
            .db
            .carts()
            .mark_abandoned(&cart.id, self.clock.now())
            .await?
        {
            return Err(CommerceError::concurrency("cart left active state first"));
        }

        info!(cart_id = %cart.id, "Cart abandoned");
        Ok(())
    }

    /// Deletes active carts whose idle window lapsed. Returns the count.
    ///
    /// Run periodically by the (excluded) scheduler.
    pub async fn purge_expired(&self) -> CommerceResult<u64> {
        let purged = self.db.carts().purge_expired(self.clock.now()).await?;
        if purged > 0 {
            info!(purged, "Expired carts purged");
        }
        Ok(purged)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Loads the active cart, creating one on first access.
    ///
    /// Concurrent first access: both requests INSERT, the unique index on
    /// (user, active) picks one winner, the loser refetches it.
    async fn load_or_create(&self, user_id: &str) -> CommerceResult<Cart> {
        validation::validate_user_id(user_id)?;

        if let Some(cart) = self.db.carts().find_active_by_user(user_id).await? {
            return Ok(cart);
        }

        let now = self.clock.now();
        let cart = Cart {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            status: CartStatus::Active,
            coupon_code: None,
            discount_cents: 0,
            shipping_cents: 0,
            tax_rate_bps: self.config.default_tax_rate_bps,
            subtotal_cents: 0,
            tax_cents: 0,
            total_cents: 0,
            item_count: 0,
            expires_at: now + self.config.cart_ttl,
            created_at: now,
            updated_at: now,
        };

        match self.db.carts().insert(&cart).await {
            Ok(()) => {
                info!(cart_id = %cart.id, user_id = %user_id, "Cart created");
                Ok(cart)
            }
            Err(DbError::UniqueViolation { .. }) => {
                debug!(user_id = %user_id, "Lost cart-creation race, refetching winner");
                self.db
                    .carts()
                    .find_active_by_user(user_id)
                    .await?
                    .ok_or_else(|| {
                        CommerceError::concurrency("active cart vanished during creation")
                    })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Fetches a line and verifies it belongs to the given cart.
    async fn owned_line(&self, cart: &Cart, line_id: &str) -> CommerceResult<CartLine> {
        self.db
            .carts()
            .get_line(line_id)
            .await?
            .filter(|line| line.cart_id == cart.id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()).into())
    }

    /// Recomputes totals from the current persisted lines, slides the
    /// expiry window, and writes the cart back.
    async fn refresh(&self, mut cart: Cart) -> CommerceResult<CartView> {
        let lines = self.db.carts().lines(&cart.id).await?;

        let amounts: Vec<LineAmount> = lines.iter().map(LineAmount::from).collect();
        let totals = compute_totals(
            &amounts,
            cart.discount_cents,
            cart.shipping_cents,
            cart.tax_rate(),
        );

        cart.subtotal_cents = totals.subtotal_cents;
        cart.tax_cents = totals.tax_cents;
        cart.total_cents = totals.total_cents;
        cart.item_count = totals.item_count;

        let now = self.clock.now();
        cart.expires_at = now + self.config.cart_ttl;
        cart.updated_at = now;

        self.db.carts().save_active(&cart).await?;

        Ok(CartView { cart, lines })
    }
}
