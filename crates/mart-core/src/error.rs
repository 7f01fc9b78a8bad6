//! # Error Types
//!
//! Domain-specific error types for mart-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  mart-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  mart-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  mart-orders errors (service layer)                                    │
//! │  └── CommerceError    - code + message + details for the transport     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → CommerceError → caller  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (SKU, ID, availability)
//! 3. Errors are enum variants, never String
//! 4. The core never formats user-facing copy - that is the transport's job

use thiserror::Error;

use crate::types::{OrderStatus, PaymentStatus};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent business rule violations. The service layer translates
/// them into its structured `{code, message, details}` failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product id doesn't resolve.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product exists but was deactivated.
    #[error("Product is inactive: {0}")]
    ProductInactive(String),

    /// Variant id doesn't resolve under the product.
    #[error("Variant not found: {0}")]
    VariantNotFound(String),

    /// Requested quantity exceeds what the variant has on hand.
    ///
    /// Carries the available count so the caller can present a complete
    /// remediation message ("only 3 left").
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Cart not found.
    #[error("Cart not found: {0}")]
    CartNotFound(String),

    /// Cart line not found.
    #[error("Cart line not found: {0}")]
    LineNotFound(String),

    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Cart has reached the distinct-line cap.
    #[error("Cart cannot have more than {max} distinct lines")]
    CartFull { max: usize },

    /// Checkout attempted on a cart with no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// The same coupon code is already applied to this cart.
    #[error("Coupon '{code}' is already applied")]
    CouponAlreadyApplied { code: String },

    /// Requested status change is not in the transition table.
    ///
    /// The order and its timeline are left untouched when this is raised.
    #[error("Invalid status transition: {from:?} -> {to:?}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Requested payment-status change is not in the transition table.
    #[error("Invalid payment transition: {from:?} -> {to:?}")]
    InvalidPaymentTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, malformed order number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================
