//! # Service Configuration
//!
//! Limits and knobs for the commerce services, with defaults from
//! mart-core's crate-level constants. One instance is built at startup and
//! handed to the services - no globals, no env reads here.

use chrono::Duration;

use mart_core::{
    DEFAULT_ORDER_PREFIX, LOW_STOCK_THRESHOLD, MAX_CART_LINES, MAX_ITEM_QUANTITY,
    MAX_SHIPPING_CENTS,
};

/// Configuration for the cart/checkout/order services.
///
/// ## Example
/// ```rust
/// use chrono::Duration;
/// use mart_orders::config::CommerceConfig;
///
/// let config = CommerceConfig::default()
///     .order_prefix("MA")
///     .cart_ttl(Duration::days(3))
///     .checkout_retries(5);
/// assert_eq!(config.order_prefix, "MA");
/// ```
#[derive(Debug, Clone)]
pub struct CommerceConfig {
    /// Prefix for order numbers (`MA` → `MA-2025-001`).
    pub order_prefix: String,

    /// Maximum distinct lines per cart.
    pub max_cart_lines: usize,

    /// Maximum quantity per line.
    pub max_item_quantity: i64,

    /// Stock level at or below which low-stock warnings are raised.
    pub low_stock_threshold: i64,

    /// Ceiling for the shipping cost, in cents.
    pub max_shipping_cents: i64,

    /// Tax rate captured onto newly created carts, in basis points.
    pub default_tax_rate_bps: u32,

    /// Idle window before an active cart expires. Slides on every mutation.
    pub cart_ttl: Duration,

    /// Offset added to the ship time for `estimated_delivery`.
    pub delivery_offset: Duration,

    /// How many times checkout retries after losing a write race.
    pub checkout_retries: u32,
}

impl Default for CommerceConfig {
    fn default() -> Self {
        CommerceConfig {
            order_prefix: DEFAULT_ORDER_PREFIX.to_string(),
            max_cart_lines: MAX_CART_LINES,
            max_item_quantity: MAX_ITEM_QUANTITY,
            low_stock_threshold: LOW_STOCK_THRESHOLD,
            max_shipping_cents: MAX_SHIPPING_CENTS,
            default_tax_rate_bps: 800, // 8.00%
            cart_ttl: Duration::days(7),
            delivery_offset: Duration::days(5),
            checkout_retries: 3,
        }
    }
}

impl CommerceConfig {
    /// Sets the order number prefix.
    pub fn order_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.order_prefix = prefix.into();
        self
    }

    /// Sets the distinct-line cap.
    pub fn max_cart_lines(mut self, max: usize) -> Self {
        self.max_cart_lines = max;
        self
    }

    /// Sets the per-line quantity cap.
    pub fn max_item_quantity(mut self, max: i64) -> Self {
        self.max_item_quantity = max;
        self
    }

    /// Sets the low-stock warning threshold.
    pub fn low_stock_threshold(mut self, threshold: i64) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    /// Sets the shipping cost ceiling.
    pub fn max_shipping_cents(mut self, ceiling: i64) -> Self {
        self.max_shipping_cents = ceiling;
        self
    }

    /// Sets the tax rate captured onto new carts.
    pub fn default_tax_rate_bps(mut self, bps: u32) -> Self {
        self.default_tax_rate_bps = bps;
        self
    }

    /// Sets the cart idle TTL.
    pub fn cart_ttl(mut self, ttl: Duration) -> Self {
        self.cart_ttl = ttl;
        self
    }

    /// Sets the delivery estimate offset.
    pub fn delivery_offset(mut self, offset: Duration) -> Self {
        self.delivery_offset = offset;
        self
    }

    /// Sets the checkout retry budget.
    pub fn checkout_retries(mut self, retries: u32) -> Self {
        self.checkout_retries = retries;
        self
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
