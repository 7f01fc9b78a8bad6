//! # Order Service
//!
//! Drives the order status and payment status state machines defined in
//! `mart_core::lifecycle`.
//!
//! ## Transition Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  transition(order, next):                                               │
//! │    1. table check            ← illegal transition fails here, nothing  │
//! │    2. one transaction:          has been written                        │
//! │       UPDATE ... WHERE status = current   ← guard against races        │
//! │       INSERT timeline entry                                             │
//! │    3. shipped  → estimated_delivery stamped (if unset)                  │
//! │       delivered→ actual_delivery stamped                                │
//! │                                                                         │
//! │  A failed guard rolls back, so the timeline never records a            │
//! │  transition that didn't happen.                                        │
//! │                                                                         │
//! │  Payment transitions are a separate machine on the same row; `paid`    │
//! │  stores the gateway correlation triple for audit and disputes.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use mart_core::{
    CoreError, GatewayRefs, Order, OrderStatus, OrderView, PaymentStatus, TimelineEntry,
    ValidationError,
};
use mart_db::Database;

use crate::clock::Clock;
use crate::config::CommerceConfig;
use crate::error::{CommerceError, CommerceResult};

/// Order aggregate service.
#[derive(Debug, Clone)]
pub struct OrderService {
    db: Database,
    config: CommerceConfig,
    clock: Arc<dyn Clock>,
}

impl OrderService {
    /// Creates a new order service.
    pub fn new(db: Database, config: CommerceConfig, clock: Arc<dyn Clock>) -> Self {
        OrderService { db, config, clock }
    }

    /// Loads an order with its lines and timeline.
    pub async fn get(&self, order_id: &str) -> CommerceResult<OrderView> {
        let order = self.load(order_id).await?;
        let lines = self.db.orders().lines(order_id).await?;
        let timeline = self.db.orders().timeline(order_id).await?;

        Ok(OrderView {
            order,
            lines,
            timeline,
        })
    }

    /// Applies a status transition, appending a timeline entry.
    ///
    /// - `shipped` computes and stores `estimated_delivery` (transition time
    ///   plus the configured offset) unless already set
    /// - `delivered` stamps `actual_delivery` with the transition time
    ///
    /// ## Errors
    /// - `Conflict` (`InvalidTransition`) when the move is not in the table;
    ///   neither status nor timeline changes
    /// - `Concurrency` when a concurrent request moved the order first
    pub async fn transition(
        &self,
        order_id: &str,
        next: OrderStatus,
        note: Option<String>,
    ) -> CommerceResult<OrderView> {
        let order = self.load(order_id).await?;

        if !order.status.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                from: order.status,
                to: next,
            }
            .into());
        }

        let now = self.clock.now();
        let estimated_delivery =
            (next == OrderStatus::Shipped).then(|| now + self.config.delivery_offset);
        let actual_delivery = (next == OrderStatus::Delivered).then_some(now);

        let mut tx = self.db.begin().await?;

        let moved = self
            .db
            .orders()
            .update_status(
                &mut *tx,
                &order.id,
                order.status,
                next,
                estimated_delivery,
                actual_delivery,
                now,
            )
            .await?;

        if !moved {
            // Someone else transitioned first; roll back so the timeline
            // stays exactly as it was
            tx.rollback().await?;
            return Err(CommerceError::concurrency(
                "order status changed concurrently",
            ));
        }

        let entry = TimelineEntry {
            id: Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            status: next,
            note,
            created_at: now,
        };
        self.db.orders().append_timeline(&mut *tx, &entry).await?;

        tx.commit().await?;

        info!(
            order_number = %order.order_number,
            from = order.status.as_str(),
            to = next.as_str(),
            "Order status transition"
        );

        self.get(order_id).await
    }

    /// Marks the order paid, storing the gateway correlation triple.
    ///
    /// All three identifiers are required - they are the audit trail for
    /// disputes. They are overwritten only by a subsequent explicit payment
    /// update, never silently.
    pub async fn mark_paid(
        &self,
        order_id: &str,
        gateway: GatewayRefs,
    ) -> CommerceResult<OrderView> {
        for (field, value) in [
            ("gateway_order_id", &gateway.order_id),
            ("gateway_payment_id", &gateway.payment_id),
            ("gateway_signature", &gateway.signature),
        ] {
            if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
                return Err(ValidationError::Required {
                    field: field.to_string(),
                }
                .into());
            }
        }

        self.update_payment(order_id, PaymentStatus::Paid, Some(gateway))
            .await
    }

    /// Marks the payment failed.
    pub async fn mark_payment_failed(&self, order_id: &str) -> CommerceResult<OrderView> {
        self.update_payment(order_id, PaymentStatus::Failed, None)
            .await
    }

    /// Marks a paid order's payment refunded.
    pub async fn refund_payment(&self, order_id: &str) -> CommerceResult<OrderView> {
        self.update_payment(order_id, PaymentStatus::Refunded, None)
            .await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn load(&self, order_id: &str) -> CommerceResult<Order> {
        self.db
            .orders()
            .get(order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()).into())
    }

    async fn update_payment(
        &self,
        order_id: &str,
        next: PaymentStatus,
        gateway: Option<GatewayRefs>,
    ) -> CommerceResult<OrderView> {
        let order = self.load(order_id).await?;

        if !order.payment_status.can_transition_to(next) {
            return Err(CoreError::InvalidPaymentTransition {
                from: order.payment_status,
                to: next,
            }
            .into());
        }

        let moved = self
            .db
            .orders()
            .update_payment(
                &order.id,
                order.payment_status,
                next,
                gateway.as_ref(),
                self.clock.now(),
            )
            .await?;

        if !moved {
            return Err(CommerceError::concurrency(
                "payment status changed concurrently",
            ));
        }

        info!(
            order_number = %order.order_number,
            from = order.payment_status.as_str(),
            to = next.as_str(),
            "Payment status transition"
        );

        self.get(order_id).await
    }
}
