//! # mart-core: Pure Business Logic for the Mart Commerce Core
//!
//! This crate is the **heart** of the Mart order/cart core. It contains all
//! business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mart Architecture                                │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 HTTP / Transport Layer (external)               │   │
//! │  │      add_to_cart, apply_coupon, checkout, update_status         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  mart-orders (services)                         │   │
//! │  │    CartService ── InventoryGuard ── Checkout ── OrderService    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                ★ mart-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  totals   │  │   stock   │  │   │
//! │  │   │ Cart/Order│  │   Money   │  │ CartTotals│  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                 │   │
//! │  │   │ lifecycle │  │order_number│ │ validation│                 │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                 │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    mart-db (Database Layer)                     │   │
//! │  │            SQLite queries, migrations, repositories             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, ProductVariant, Cart, Order, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`totals`] - Cart totals computation (subtotal/tax/total/item count)
//! - [`stock`] - Stock check rules and checkout validation reports
//! - [`lifecycle`] - Order status and payment status state machines
//! - [`order_number`] - Order identifier formatting and parsing
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod lifecycle;
pub mod money;
pub mod order_number;
pub mod stock;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use mart_core::Money` instead of
// `use mart_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use order_number::OrderNumber;
pub use totals::{compute_totals, CartTotals, LineAmount};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================
// Default limits for the commerce core. The service layer exposes them on its
// config struct so a deployment can tighten or relax them per store.

/// Default prefix for human-readable order numbers (`MA-2025-001`).
pub const DEFAULT_ORDER_PREFIX: &str = "MA";

/// Maximum number of distinct lines in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts and keeps checkout validation bounded.
pub const MAX_CART_LINES: usize = 50;

/// Maximum quantity of a single line in a cart.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 100 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 99;

/// Stock level at or below which a low-stock warning is raised.
pub const LOW_STOCK_THRESHOLD: i64 = 5;

/// Ceiling for a cart's shipping cost, in cents.
pub const MAX_SHIPPING_CENTS: i64 = 50_000;

/// Coupon code length bounds (after trimming).
pub const COUPON_MIN_LEN: usize = 3;
pub const COUPON_MAX_LEN: usize = 20;
