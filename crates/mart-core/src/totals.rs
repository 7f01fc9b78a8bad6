//! # Cart Totals Computation
//!
//! The one place monetary totals are computed.
//!
//! ## Computation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      compute_totals()                                   │
//! │                                                                         │
//! │  lines: [{unit_price, quantity}, ...]                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  subtotal = Σ(unit_price × quantity)        item_count = Σ(quantity)   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  taxable = max(subtotal − discount, 0)   ← oversized discounts clamp   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  tax = taxable × rate                    ← single rounding rule        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  total = max(taxable + tax + shipping, 0)                              │
//! │                                                                         │
//! │  Pure and total: no I/O, no errors, no hidden state. Called on EVERY   │
//! │  cart mutation so persisted totals never derive from stale inputs.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{CartLine, TaxRate};

// =============================================================================
// Inputs & Outputs
// =============================================================================

/// The monetary slice of a cart line: what the totals computation needs,
/// nothing more.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAmount {
    /// Unit price in cents (captured at add-time).
    pub unit_price_cents: i64,
    /// Quantity of units.
    pub quantity: i64,
}

impl LineAmount {
    /// Creates a line amount.
    #[inline]
    pub const fn new(unit_price_cents: i64, quantity: i64) -> Self {
        LineAmount {
            unit_price_cents,
            quantity,
        }
    }

    /// unit price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

impl From<&CartLine> for LineAmount {
    fn from(line: &CartLine) -> Self {
        LineAmount::new(line.unit_price_cents, line.quantity)
    }
}

/// Computed cart totals.
///
/// Persisted onto the cart after every mutation and copied onto the order at
/// checkout; never edited by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub item_count: i64,
}

// =============================================================================
// Computation
// =============================================================================

/// Computes subtotal, tax, total, and item count from line amounts.
///
/// ## Rules
/// - `subtotal = Σ(unit_price × quantity)`
/// - `taxable = max(subtotal − discount, 0)`
/// - `tax = taxable × rate` (the shared rounding rule in [`Money::apply_rate`])
/// - `total = max(taxable + tax + shipping, 0)`
/// - `item_count = Σ(quantity)`
///
/// ## Example
/// ```rust
/// use mart_core::totals::{compute_totals, LineAmount};
/// use mart_core::types::TaxRate;
///
/// // qty 2 @ $50.00 plus qty 1 @ $30.00, $10 off, $5 shipping, 8% tax
/// let lines = [LineAmount::new(5000, 2), LineAmount::new(3000, 1)];
/// let totals = compute_totals(&lines, 1000, 500, TaxRate::from_bps(800));
///
/// assert_eq!(totals.subtotal_cents, 13000); // $130.00
/// assert_eq!(totals.tax_cents, 960);        // 8% of $120.00
/// assert_eq!(totals.total_cents, 13460);    // $134.60
/// assert_eq!(totals.item_count, 3);
/// ```
pub fn compute_totals(
    lines: &[LineAmount],
    discount_cents: i64,
    shipping_cents: i64,
    tax_rate: TaxRate,
) -> CartTotals {
    let subtotal = lines
        .iter()
        .fold(Money::zero(), |acc, line| acc + line.line_total());

    let item_count: i64 = lines.iter().map(|line| line.quantity).sum();

    // Discount applies to the subtotal; the taxable base never goes negative
    let taxable = (subtotal - Money::from_cents(discount_cents)).clamp_non_negative();

    let tax = taxable.apply_rate(tax_rate);

    // Clamped as well: a zero-priced cart with zero shipping totals zero
    let total = (taxable + tax + Money::from_cents(shipping_cents)).clamp_non_negative();

    CartTotals {
        subtotal_cents: subtotal.cents(),
        tax_cents: tax.cents(),
        total_cents: total.cents(),
        item_count,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
