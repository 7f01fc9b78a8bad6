//! # mart-orders: Aggregate Services for the Mart Commerce Core
//!
//! The orchestration layer between the pure rules in `mart-core` and the
//! repositories in `mart-db`. The excluded HTTP layer calls these services
//! and maps [`CommerceError`] codes onto status codes.
//!
//! ## Service Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   CartService                  CheckoutService        OrderService      │
//! │   ───────────                  ───────────────        ────────────      │
//! │   get_or_create_active         checkout:              transition        │
//! │   add_item ──────┐               validate (guard)     mark_paid         │
//! │   update_item    │               ┌─ one transaction ─┐mark_payment_     │
//! │   remove_item    │ every         │ CAS decrements    │  failed          │
//! │   clear          │ mutation:     │ counter += 1      │refund_payment    │
//! │   apply_coupon   ├─ recompute    │ order + lines     │get               │
//! │   remove_coupon  │  totals,      │ timeline entry    │                  │
//! │   set_shipping   │  slide        │ cart → converted  │                  │
//! │   abandon        │  expiry       └───────────────────┘                  │
//! │   purge_expired ─┘                                                      │
//! │          │                            │                    │            │
//! │          └──────────┬─────────────────┴────────────────────┘            │
//! │                     ▼                                                   │
//! │              InventoryGuard (advisory at add, authoritative at          │
//! │              checkout) + injected Clock + CommerceConfig                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency Model
//!
//! Many independent callers may hit the same user's cart or the same
//! variant's stock at once; there is no serialization point above this
//! crate. Correctness comes from the database primitives underneath:
//! conditional stock decrements, the atomic order counter, status-guarded
//! updates, and unique constraints - with a bounded retry in checkout for
//! the races those primitives surface.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod clock;
pub mod config;
pub mod error;
pub mod guard;
pub mod order;

// =============================================================================
// Re-exports
// =============================================================================

pub use cart::CartService;
pub use checkout::CheckoutService;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::CommerceConfig;
pub use error::{CommerceError, CommerceResult, ErrorCode};
pub use guard::InventoryGuard;
pub use order::OrderService;
