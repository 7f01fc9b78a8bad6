//! # Domain Types
//!
//! Core domain types for the Mart commerce core.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Cart       │   │     Order       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  base_price     │   │  user_id        │   │  order_number   │       │
//! │  │  is_active      │   │  status         │   │  status         │       │
//! │  │       │         │   │  totals         │   │  payment_status │       │
//! │  │       ▼         │   │       │         │   │       │         │       │
//! │  │ ProductVariant  │   │       ▼         │   │       ▼         │       │
//! │  │  sku / stock    │   │    CartLine     │   │   OrderLine     │       │
//! │  │  size / color   │   │  (snapshots)    │   │  TimelineEntry  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Cart lines and order lines carry frozen copies of variant display fields
//! (size/color/sku) and the unit price captured at add-time. Later product
//! edits never alter a cart line's pricing or a historical order.
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists: (sku, order_number) - human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 800 bps = 8.00%; 825 bps = 8.25%
///
/// The rate is captured on the cart at creation time, so a mid-session rate
/// change never reprices an open cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Product & Variant
// =============================================================================

/// A product in the catalog.
///
/// Carts and orders reference products by id and keep their own snapshots of
/// display fields; the product record itself stays mutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown in carts and on order lines.
    pub name: String,

    /// Base price in cents; variants may override it.
    pub base_price_cents: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the base price as a Money type.
    #[inline]
    pub fn base_price(&self) -> Money {
        Money::from_cents(self.base_price_cents)
    }
}

/// A purchasable configuration (size/color) of a product.
///
/// The variant is the unit at which stock is tracked. `stock` is never
/// written directly: the checkout path uses a conditional decrement, the
/// restock path an explicit delta adjustment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductVariant {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owning product.
    pub product_id: String,

    /// Size label (e.g., "M", "42").
    pub size: String,

    /// Color label (e.g., "black").
    pub color: String,

    /// Stock Keeping Unit - business identifier, unique across the catalog.
    pub sku: String,

    /// Units on hand. Invariant: never negative.
    pub stock: i64,

    /// Price override in cents; `None` falls back to the product base price.
    pub price_cents: Option<i64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductVariant {
    /// Resolves the effective unit price: variant override, else base price.
    #[inline]
    pub fn effective_price_cents(&self, product: &Product) -> i64 {
        self.price_cents.unwrap_or(product.base_price_cents)
    }

    /// Checks whether the variant can satisfy a requested quantity.
    #[inline]
    pub fn can_fulfill(&self, requested: i64) -> bool {
        self.stock >= requested
    }
}

// =============================================================================
// Cart Status
// =============================================================================

/// The lifecycle status of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum CartStatus {
    /// Cart is open for mutation. At most one per user.
    Active,
    /// Cart was explicitly abandoned.
    Abandoned,
    /// Cart was converted into an order at checkout.
    Converted,
}

impl Default for CartStatus {
    fn default() -> Self {
        CartStatus::Active
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A per-user collection of prospective purchase lines.
///
/// ## Invariants
/// - One ACTIVE cart per user (partial unique index in the schema)
/// - `subtotal/tax/total/item_count` are Money Engine outputs recomputed
///   from the persisted lines on every mutation, never trusted from callers
/// - `expires_at` slides forward on every mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Cart {
    pub id: String,
    pub user_id: String,
    pub status: CartStatus,
    /// Normalized coupon code currently applied, if any.
    pub coupon_code: Option<String>,
    /// Discount resolved by the coupon collaborator, in cents.
    pub discount_cents: i64,
    /// Shipping cost in cents.
    pub shipping_cents: i64,
    /// Tax rate in basis points, captured at cart creation.
    pub tax_rate_bps: u32,
    /// Derived: Σ(line unit price × quantity).
    pub subtotal_cents: i64,
    /// Derived: tax on the clamped taxable base.
    pub tax_cents: i64,
    /// Derived: clamped grand total.
    pub total_cents: i64,
    /// Derived: Σ(line quantity).
    pub item_count: i64,
    /// Sliding idle-expiry deadline.
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Returns the tax rate.
    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    /// Checks if the cart has passed its idle-expiry deadline.
    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// A line in a cart.
/// Uses the snapshot pattern to freeze variant data at add-time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CartLine {
    pub id: String,
    pub cart_id: String,
    pub product_id: String,
    pub variant_id: String,
    /// Size at add-time (frozen).
    pub size: String,
    /// Color at add-time (frozen).
    pub color: String,
    /// SKU at add-time (frozen).
    pub sku: String,
    /// Quantity in cart (1 ≤ quantity ≤ configured cap).
    pub quantity: i64,
    /// Unit price in cents at add-time (frozen).
    pub unit_price_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl CartLine {
    /// Calculates the line total (unit price × quantity).
    #[inline]
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }

    /// Checks whether this line holds the given (product, variant) pair.
    ///
    /// Line identity within a cart: an add for an existing pair merges by
    /// incrementing quantity instead of appending a duplicate.
    #[inline]
    pub fn matches(&self, product_id: &str, variant_id: &str) -> bool {
        self.product_id == product_id && self.variant_id == variant_id
    }
}

/// Cart plus its lines - the success payload for cart operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartView {
    pub cart: Cart,
    pub lines: Vec<CartLine>,
}

// =============================================================================
// Order Status
// =============================================================================

/// The fulfillment status of an order.
///
/// Legal transitions are defined in [`crate::lifecycle`]; everything else
/// fails without touching the order or its timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// Stable lowercase name, matching the persisted representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

/// The payment status of an order - a separate sub-state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Stable lowercase name, matching the persisted representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

// =============================================================================
// Order
// =============================================================================

/// Shipping address snapshot stored on the order.
///
/// A snapshot, not a live reference: later address-book edits must not
/// rewrite where a historical order was sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ShippingAddress {
    #[cfg_attr(feature = "sqlx", sqlx(rename = "ship_name"))]
    pub name: String,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "ship_street"))]
    pub street: String,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "ship_city"))]
    pub city: String,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "ship_postal_code"))]
    pub postal_code: String,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "ship_country"))]
    pub country: String,
}

/// External payment-gateway correlation identifiers.
///
/// Written by the `paid` payment transition for audit and dispute handling;
/// overwritten only by a subsequent explicit payment update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct GatewayRefs {
    #[cfg_attr(feature = "sqlx", sqlx(rename = "gateway_order_id"))]
    pub order_id: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "gateway_payment_id"))]
    pub payment_id: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "gateway_signature"))]
    pub signature: Option<String>,
}

/// An immutable-once-created record of a committed purchase.
///
/// ## Invariants
/// - `total_cents == max(subtotal - discount, 0) + tax + shipping`,
///   computed once at checkout with the cart's rounding rule
/// - Monetary fields never change after insert
/// - Status changes only through the transition table, each appending a
///   timeline entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: String,
    /// Human-readable unique identifier, e.g. `MA-2025-042`.
    pub order_number: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub shipping_cents: i64,
    pub total_cents: i64,
    /// Coupon code snapshot from the source cart.
    pub coupon_code: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub shipping_address: ShippingAddress,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub gateway: GatewayRefs,
    /// Set by the `shipped` transition (creation time + configured offset).
    pub estimated_delivery: Option<DateTime<Utc>>,
    /// Stamped by the `delivered` transition.
    pub actual_delivery: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Derived: whether the order has been delivered.
    #[inline]
    pub fn is_delivered(&self) -> bool {
        self.status == OrderStatus::Delivered
    }

    /// Derived: whether the order has been paid.
    #[inline]
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }

    /// Derived: whole days elapsed since the order was placed.
    #[inline]
    pub fn days_since(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_days()
    }
}

/// A line in an order - a deep copy frozen at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub variant_id: String,
    /// Product name at checkout (frozen).
    pub product_name: String,
    pub size: String,
    pub color: String,
    pub sku: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// unit price × quantity, frozen at checkout.
    pub line_total_cents: i64,
}

/// An append-only record of one status transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TimelineEntry {
    pub id: String,
    pub order_id: String,
    pub status: OrderStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Order plus its lines and timeline - the success payload for order reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub timeline: Vec<TimelineEntry>,
}

impl OrderView {
    /// Derived: total units across all lines.
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(825);
        assert_eq!(rate.bps(), 825);
        assert!((rate.percentage() - 8.25).abs() < 0.001);
    }

    #[test]
    fn test_tax_rate_from_percentage() {
        let rate = TaxRate::from_percentage(8.25);
        assert_eq!(rate.bps(), 825);
    }

    #[test]
    fn test_effective_price_override() {
        let now = Utc::now();
        let product = Product {
            id: "p1".to_string(),
            name: "Tee".to_string(),
            base_price_cents: 1999,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let mut variant = ProductVariant {
            id: "v1".to_string(),
            product_id: "p1".to_string(),
            size: "M".to_string(),
            color: "black".to_string(),
            sku: "TEE-M-BLK".to_string(),
            stock: 10,
            price_cents: None,
            created_at: now,
            updated_at: now,
        };

        assert_eq!(variant.effective_price_cents(&product), 1999);

        variant.price_cents = Some(2499);
        assert_eq!(variant.effective_price_cents(&product), 2499);
    }

    #[test]
    fn test_status_defaults() {
        assert_eq!(CartStatus::default(), CartStatus::Active);
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
    }

    #[test]
    fn test_status_as_str_roundtrip() {
        assert_eq!(OrderStatus::Shipped.as_str(), "shipped");
        assert_eq!(PaymentStatus::Paid.as_str(), "paid");
    }
}
