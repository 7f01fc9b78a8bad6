//! # Checkout
//!
//! The one place a cart becomes an order.
//!
//! ## The Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  OUTSIDE the transaction (reads only):                                  │
//! │    load cart + lines ──► recompute totals ──► guard validation          │
//! │    (all issues reported at once)                                        │
//! │                                                                         │
//! │  ONE transaction:                                                       │
//! │    1. conditional decrement per line  ← all lines or none               │
//! │    2. counter increment for the year  ← rolls back with the order       │
//! │    3. INSERT order + lines + first timeline entry                       │
//! │    4. cart → 'converted'              ← frees the user's active slot    │
//! │    COMMIT                                                               │
//! │                                                                         │
//! │  Stock reservation is tied to THIS commit, never to a later payment     │
//! │  confirmation - a hung gateway cannot strand reserved inventory.        │
//! │                                                                         │
//! │  Retry: order-number collisions and guarded-update losses are races,    │
//! │  retried up to the configured budget. A failed stock condition is NOT   │
//! │  a race to retry - it is the answer.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Datelike;
use tracing::{info, warn};
use uuid::Uuid;

use mart_core::order_number::format_order_number;
use mart_core::{
    compute_totals, validation, CoreError, GatewayRefs, LineAmount, Order, OrderLine, OrderStatus,
    OrderView, PaymentStatus, ShippingAddress, TimelineEntry,
};
use mart_db::{Database, DbError};

use crate::clock::Clock;
use crate::config::CommerceConfig;
use crate::error::{CommerceError, CommerceResult};
use crate::guard::InventoryGuard;

/// Checkout orchestration service.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    db: Database,
    guard: InventoryGuard,
    config: CommerceConfig,
    clock: Arc<dyn Clock>,
}

impl CheckoutService {
    /// Creates a new checkout service.
    pub fn new(db: Database, config: CommerceConfig, clock: Arc<dyn Clock>) -> Self {
        let guard = InventoryGuard::new(db.clone(), config.clone());
        CheckoutService {
            db,
            guard,
            config,
            clock,
        }
    }

    /// Converts the user's active cart into an order.
    ///
    /// Retries the whole attempt on lost write races (order-number
    /// collision, concurrent conversion) up to the configured budget; every
    /// retry re-reads the cart and re-validates.
    pub async fn checkout(
        &self,
        user_id: &str,
        shipping_address: ShippingAddress,
    ) -> CommerceResult<OrderView> {
        validation::validate_user_id(user_id)?;

        let mut attempt = 0u32;
        loop {
            attempt += 1;

            match self.try_checkout(user_id, &shipping_address).await {
                Ok(view) => return Ok(view),
                Err(err) if err.is_retryable() && attempt <= self.config.checkout_retries => {
                    warn!(attempt, error = %err, "Checkout lost a write race, retrying");
                }
                Err(err) if err.is_retryable() => {
                    // Budget exhausted: the caller sees a conflict, not the
                    // internal race
                    return Err(CommerceError::conflict(
                        "Checkout kept losing to concurrent orders, try again",
                    ));
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// One checkout attempt.
    async fn try_checkout(
        &self,
        user_id: &str,
        shipping_address: &ShippingAddress,
    ) -> CommerceResult<OrderView> {
        let carts = self.db.carts();
        let orders = self.db.orders();
        let products = self.db.products();

        let mut cart = carts
            .find_active_by_user(user_id)
            .await?
            .ok_or_else(|| CoreError::CartNotFound(user_id.to_string()))?;
        let lines = carts.lines(&cart.id).await?;

        // Totals come from the persisted lines, with the same rounding the
        // cart used all along - not from the stored columns, and certainly
        // not from the caller
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

        // Authoritative validation: every line against current inventory,
        // plus the cart-level rules, all issues at once
        let report = self.guard.check_cart_for_checkout(&cart, &lines).await?;
        if !report.is_valid() {
            return Err(CommerceError::conflict("Checkout validation failed")
                .with_details(serde_json::json!({
                    "issues": report.issues,
                    "warnings": report.warnings,
                })));
        }

        // Product name snapshots for the order lines, fetched before the
        // transaction starts
        let mut product_names: HashMap<String, String> = HashMap::new();
        for line in &lines {
            if !product_names.contains_key(&line.product_id) {
                let product = products
                    .get_product(&line.product_id)
                    .await?
                    .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;
                product_names.insert(line.product_id.clone(), product.name);
            }
        }

        let now = self.clock.now();
        let mut tx = self.db.begin().await?;

        // 1. Reserve stock: conditional decrement per line, all or none.
        //    A failed condition is authoritative - validation passed a
        //    moment ago, so a concurrent checkout took the units.
        for line in &lines {
            let reserved = products
                .decrement_stock(&mut *tx, &line.variant_id, line.quantity, now)
                .await?;

            if !reserved {
                tx.rollback().await?;

                let available = products
                    .get_variant(&line.variant_id)
                    .await?
                    .map_or(0, |v| v.stock);

                return Err(CoreError::InsufficientStock {
                    sku: line.sku.clone(),
                    available,
                    requested: line.quantity,
                }
                .into());
            }
        }

        // 2. Issue the order number inside the same transaction: a failed
        //    order write rolls the counter back, so no identifier is ever
        //    burned or surfaced without its order
        let year = now.year();
        let sequence = self.db.sequences().next_sequence(&mut *tx, year).await?;
        let order_number = format_order_number(&self.config.order_prefix, year, sequence);

        // 3. Write the order snapshot
        let order = Order {
            id: Uuid::new_v4().to_string(),
            order_number: order_number.clone(),
            user_id: user_id.to_string(),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            subtotal_cents: totals.subtotal_cents,
            discount_cents: cart.discount_cents,
            tax_cents: totals.tax_cents,
            shipping_cents: cart.shipping_cents,
            total_cents: totals.total_cents,
            coupon_code: cart.coupon_code.clone(),
            shipping_address: shipping_address.clone(),
            gateway: GatewayRefs::default(),
            estimated_delivery: None,
            actual_delivery: None,
            created_at: now,
            updated_at: now,
        };

        match orders.insert_order(&mut *tx, &order).await {
            Ok(()) => {}
            Err(DbError::UniqueViolation { .. }) => {
                // The uniqueness constraint on order_number is the
                // sequencer's backstop collision detector
                tx.rollback().await?;
                return Err(CommerceError::concurrency("order number collision"));
            }
            Err(e) => {
                tx.rollback().await?;
                return Err(e.into());
            }
        }

        let order_lines: Vec<OrderLine> = lines
            .iter()
            .map(|line| OrderLine {
                id: Uuid::new_v4().to_string(),
                order_id: order.id.clone(),
                product_id: line.product_id.clone(),
                variant_id: line.variant_id.clone(),
                product_name: product_names
                    .get(&line.product_id)
                    .cloned()
                    .unwrap_or_default(),
                size: line.size.clone(),
                color: line.color.clone(),
                sku: line.sku.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                line_total_cents: line.line_total_cents(),
            })
            .collect();

        for order_line in &order_lines {
            orders.insert_line(&mut *tx, order_line).await?;
        }

        let placed = TimelineEntry {
            id: Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            status: OrderStatus::Pending,
            note: Some("Order placed".to_string()),
            created_at: now,
        };
        orders.append_timeline(&mut *tx, &placed).await?;

        // 4. Convert the cart; a concurrent checkout that won first makes
        //    this a race loss and the whole unit rolls back
        let converted = carts.mark_converted(&mut *tx, &cart.id, now).await?;
        if !converted {
            tx.rollback().await?;
            return Err(CommerceError::concurrency(
                "cart was converted by a concurrent checkout",
            ));
        }

        tx.commit().await?;

        info!(
            order_number = %order_number,
            user_id = %user_id,
            total_cents = order.total_cents,
            lines = order_lines.len(),
            "Order created"
        );

        Ok(OrderView {
            order,
            lines: order_lines,
            timeline: vec![placed],
        })
    }
}
