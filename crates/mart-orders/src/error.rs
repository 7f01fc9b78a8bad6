//! # Service Error Type
//!
//! The structured failure every service operation returns.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow                                           │
//! │                                                                         │
//! │  CoreError (business rule)  ──┐                                         │
//! │                               ├──► CommerceError { code, message,      │
//! │  DbError (storage)          ──┘                    details? }           │
//! │                                        │                                │
//! │                                        ▼                                │
//! │             Transport layer maps code → HTTP status                     │
//! │             VALIDATION_ERROR → 400    NOT_FOUND → 404                   │
//! │             CONFLICT → 409            CONCURRENCY → 409 (after retry)   │
//! │             INTERNAL → 500                                              │
//! │                                                                         │
//! │  CONCURRENCY is mostly consumed INSIDE this crate: checkout retries    │
//! │  a bounded number of times before letting it out.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;

use mart_core::{CoreError, ValidationError};
use mart_db::DbError;

/// Machine-readable error category for the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed input: bad id format, out-of-range quantity/cost/discount.
    ValidationError,

    /// Cart/order/product/variant absent.
    NotFound,

    /// Business conflict: insufficient stock, cart full, duplicate coupon,
    /// illegal state transition.
    Conflict,

    /// An atomic conditional write lost its race. Retried internally;
    /// surfaces only when the retry budget is exhausted.
    Concurrency,

    /// Storage unavailable or unexpected failure.
    Internal,
}

/// Structured failure returned by every service operation.
///
/// ## Serialization
/// ```json
/// {
///   "code": "CONFLICT",
///   "message": "Insufficient stock for TEE-M-BLK: available 1, requested 2",
///   "details": { "sku": "TEE-M-BLK", "available": 1, "requested": 2 }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct CommerceError {
    /// Machine-readable error code for programmatic handling.
    pub code: ErrorCode,

    /// Human-readable error message.
    pub message: String,

    /// Optional structured context (checkout issues, stock availability).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl CommerceError {
    /// Creates a new error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CommerceError {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attaches structured details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        CommerceError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        CommerceError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        CommerceError::new(ErrorCode::Conflict, message)
    }

    /// Creates a concurrency error (a lost write race).
    pub fn concurrency(message: impl Into<String>) -> Self {
        CommerceError::new(ErrorCode::Concurrency, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        CommerceError::new(ErrorCode::Internal, message)
    }

    /// Whether checkout's retry loop may try again after this error.
    pub fn is_retryable(&self) -> bool {
        self.code == ErrorCode::Concurrency
    }
}

/// Converts core business errors to service errors.
impl From<CoreError> for CommerceError {
    fn from(err: CoreError) -> Self {
        match &err {
            CoreError::ProductNotFound(id) => CommerceError::not_found("Product", id),
            CoreError::VariantNotFound(id) => CommerceError::not_found("Variant", id),
            CoreError::CartNotFound(id) => CommerceError::not_found("Cart", id),
            CoreError::LineNotFound(id) => CommerceError::not_found("Cart line", id),
            CoreError::OrderNotFound(id) => CommerceError::not_found("Order", id),

            CoreError::InsufficientStock {
                sku,
                available,
                requested,
            } => CommerceError::conflict(err.to_string()).with_details(serde_json::json!({
                "sku": sku,
                "available": available,
                "requested": requested,
            })),

            CoreError::ProductInactive(_)
            | CoreError::CartFull { .. }
            | CoreError::EmptyCart
            | CoreError::CouponAlreadyApplied { .. }
            | CoreError::InvalidTransition { .. }
            | CoreError::InvalidPaymentTransition { .. } => {
                CommerceError::conflict(err.to_string())
            }

            CoreError::Validation(v) => CommerceError::validation(v.to_string()),
        }
    }
}

/// Converts validation errors directly (skipping the CoreError wrapper).
impl From<ValidationError> for CommerceError {
    fn from(err: ValidationError) -> Self {
        CommerceError::validation(err.to_string())
    }
}

/// Converts database errors to service errors.
///
/// Race-specific handling (the active-cart creation conflict, the
/// order_number collision) is done at the call sites that expect those
/// races; this is the fallback mapping.
impl From<DbError> for CommerceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => CommerceError::not_found(&entity, &id),

            DbError::UniqueViolation { field, .. } => {
                CommerceError::conflict(format!("Duplicate value for {}", field))
            }

            DbError::RaceLost(context) => CommerceError::concurrency(context),

            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                CommerceError::validation("Invalid reference")
            }

            DbError::ConnectionFailed(_) | DbError::PoolExhausted => {
                CommerceError::internal("Storage unavailable")
            }

            DbError::MigrationFailed(e) | DbError::QueryFailed(e) | DbError::Internal(e) => {
                tracing::error!("Database failure: {}", e);
                CommerceError::internal("Storage operation failed")
            }
        }
    }
}

/// Converts raw sqlx errors (e.g. from `tx.commit()`/`tx.rollback()`) to
/// service errors via the same `DbError` mapping used everywhere else.
impl From<sqlx::Error> for CommerceError {
    fn from(err: sqlx::Error) -> Self {
        DbError::from(err).into()
    }
}

impl std::fmt::Display for CommerceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for CommerceError {}

/// Result type for service operations.
pub type CommerceResult<T> = Result<T, CommerceError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_carries_details() {
        let err: CommerceError = CoreError::InsufficientStock {
            sku: "TEE-M-BLK".to_string(),
            available: 1,
            requested: 2,
        }
        .into();

        assert_eq!(err.code, ErrorCode::Conflict);
        let details = err.details.unwrap();
        assert_eq!(details["available"], 1);
        assert_eq!(details["requested"], 2);
    }

    #[test]
    fn test_race_lost_is_retryable() {
        let err: CommerceError = DbError::race_lost("cart c1 is not active").into();
        assert_eq!(err.code, ErrorCode::Concurrency);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_not_found_mapping() {
        let err: CommerceError = CoreError::OrderNotFound("o1".to_string()).into();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_serialized_shape() {
        let err = CommerceError::validation("quantity must be positive");
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert!(json.get("details").is_none());
    }
}
