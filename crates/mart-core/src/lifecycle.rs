//! # Order Lifecycle State Machines
//!
//! Transition tables for order status and payment status.
//!
//! ## Status Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   pending ──► processing ──► shipped ──► delivered                     │
//! │      │             │            │             │                         │
//! │      │             │            └──────┬──────┘                         │
//! │      ▼             ▼                   ▼                                │
//! │  cancelled     cancelled           refunded                             │
//! │                    │                                                    │
//! │                    └──────────────► refunded                            │
//! │                                                                         │
//! │  Every legal transition appends one timeline entry. Illegal            │
//! │  transitions fail and leave status AND timeline untouched.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Payment Machine (separate sub-state)
//! ```text
//!   pending ──► paid ──► refunded
//!      │
//!      └─────► failed
//! ```
//!
//! Both tables live here as pure functions so the service layer, the
//! persistence guards, and the tests all share one source of truth.

use crate::types::{OrderStatus, PaymentStatus};

impl OrderStatus {
    /// Checks whether `self → next` is a legal status transition.
    ///
    /// ## Example
    /// ```rust
    /// use mart_core::types::OrderStatus;
    ///
    /// assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Processing));
    /// assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Processing));
    /// ```
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            // Forward fulfillment path
            (Pending, Processing) | (Processing, Shipped) | (Shipped, Delivered)
            // Cancellation window closes once the order ships
            | (Pending, Cancelled) | (Processing, Cancelled)
            // Refunds from any post-payment state
            | (Processing, Refunded) | (Shipped, Refunded) | (Delivered, Refunded)
        )
    }

    /// States with no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Refunded)
    }
}

impl PaymentStatus {
    /// Checks whether `self → next` is a legal payment transition.
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Paid) | (Pending, Failed) | (Paid, Refunded)
        )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATUSES: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Refunded,
    ];

    const ALL_PAYMENT: [PaymentStatus; 4] = [
        PaymentStatus::Pending,
        PaymentStatus::Paid,
        PaymentStatus::Failed,
        PaymentStatus::Refunded,
    ];

    #[test]
    fn test_forward_path_is_legal() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn test_cancellation_window() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn test_refund_reachability() {
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Refunded));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Refunded));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Refunded));
        assert!(OrderStatus::Delivered.can_transition_to(OrderStatus::Refunded));
    }

    /// Every (from, to) pair NOT in the table must be rejected.
    /// Enumerates the full complement instead of spot-checking.
    #[test]
    fn test_transition_table_complement_rejected() {
        let legal = [
            (OrderStatus::Pending, OrderStatus::Processing),
            (OrderStatus::Processing, OrderStatus::Shipped),
            (OrderStatus::Shipped, OrderStatus::Delivered),
            (OrderStatus::Pending, OrderStatus::Cancelled),
            (OrderStatus::Processing, OrderStatus::Cancelled),
            (OrderStatus::Processing, OrderStatus::Refunded),
            (OrderStatus::Shipped, OrderStatus::Refunded),
            (OrderStatus::Delivered, OrderStatus::Refunded),
        ];

        for from in ALL_STATUSES {
            for to in ALL_STATUSES {
                let expected = legal.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "transition {:?} -> {:?}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in [OrderStatus::Cancelled, OrderStatus::Refunded] {
            assert!(from.is_terminal());
            for to in ALL_STATUSES {
                assert!(!from.can_transition_to(to));
            }
        }
    }

    #[test]
    fn test_payment_transition_table() {
        let legal = [
            (PaymentStatus::Pending, PaymentStatus::Paid),
            (PaymentStatus::Pending, PaymentStatus::Failed),
            (PaymentStatus::Paid, PaymentStatus::Refunded),
        ];

        for from in ALL_PAYMENT {
            for to in ALL_PAYMENT {
                assert_eq!(
                    from.can_transition_to(to),
                    legal.contains(&(from, to)),
                    "payment transition {:?} -> {:?}",
                    from,
                    to
                );
            }
        }
    }
}
