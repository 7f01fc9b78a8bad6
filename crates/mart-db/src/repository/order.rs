//! # Order Repository
//!
//! Database operations for orders, order lines, and the status timeline.
//!
//! ## Write Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  INSERT order + lines + first timeline entry                           │
//! │    → only inside the checkout transaction (caller-owned connection)   │
//! │                                                                         │
//! │  UPDATE status ... WHERE id = ? AND status = ?expected                 │
//! │    → guarded: a concurrent transition makes rows_affected == 0 and    │
//! │      neither status nor timeline changes                               │
//! │                                                                         │
//! │  order_timeline: INSERT only. No UPDATE or DELETE statements exist     │
//! │  for it in this crate.                                                 │
//! │                                                                         │
//! │  Monetary columns are written once at insert and never referenced by   │
//! │  any UPDATE here.                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use mart_core::{GatewayRefs, Order, OrderLine, OrderStatus, PaymentStatus, TimelineEntry};

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    const ORDER_COLUMNS: &'static str = r#"
        id, order_number, user_id, status, payment_status,
        subtotal_cents, discount_cents, tax_cents, shipping_cents, total_cents,
        coupon_code,
        ship_name, ship_street, ship_city, ship_postal_code, ship_country,
        gateway_order_id, gateway_payment_id, gateway_signature,
        estimated_delivery, actual_delivery, created_at, updated_at
    "#;

    /// Inserts an order. Part of the checkout transaction.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` on a duplicate order_number - the
    /// sequencer backstop; the caller treats it as a retryable race.
    pub async fn insert_order(
        &self,
        conn: &mut SqliteConnection,
        order: &Order,
    ) -> DbResult<()> {
        debug!(id = %order.id, order_number = %order.order_number, "Inserting order");

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, user_id, status, payment_status,
                subtotal_cents, discount_cents, tax_cents, shipping_cents, total_cents,
                coupon_code,
                ship_name, ship_street, ship_city, ship_postal_code, ship_country,
                gateway_order_id, gateway_payment_id, gateway_signature,
                estimated_delivery, actual_delivery, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9, ?10,
                ?11,
                ?12, ?13, ?14, ?15, ?16,
                ?17, ?18, ?19,
                ?20, ?21, ?22, ?23
            )
            "#,
        )
        .bind(&order.id)
        .bind(&order.order_number)
        .bind(&order.user_id)
        .bind(order.status)
        .bind(order.payment_status)
        .bind(order.subtotal_cents)
        .bind(order.discount_cents)
        .bind(order.tax_cents)
        .bind(order.shipping_cents)
        .bind(order.total_cents)
        .bind(&order.coupon_code)
        .bind(&order.shipping_address.name)
        .bind(&order.shipping_address.street)
        .bind(&order.shipping_address.city)
        .bind(&order.shipping_address.postal_code)
        .bind(&order.shipping_address.country)
        .bind(&order.gateway.order_id)
        .bind(&order.gateway.payment_id)
        .bind(&order.gateway.signature)
        .bind(order.estimated_delivery)
        .bind(order.actual_delivery)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts an order line. Part of the checkout transaction.
    pub async fn insert_line(
        &self,
        conn: &mut SqliteConnection,
        line: &OrderLine,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO order_items (
                id, order_id, product_id, variant_id, product_name,
                size, color, sku, quantity, unit_price_cents, line_total_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&line.id)
        .bind(&line.order_id)
        .bind(&line.product_id)
        .bind(&line.variant_id)
        .bind(&line.product_name)
        .bind(&line.size)
        .bind(&line.color)
        .bind(&line.sku)
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .bind(line.line_total_cents)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Appends a timeline entry. Append-only: there is no update or delete
    /// counterpart to this method.
    pub async fn append_timeline(
        &self,
        conn: &mut SqliteConnection,
        entry: &TimelineEntry,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO order_timeline (id, order_id, status, note, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.order_id)
        .bind(entry.status)
        .bind(&entry.note)
        .bind(entry.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Gets an order by its ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {} FROM orders WHERE id = ?1", Self::ORDER_COLUMNS);

        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    /// Gets an order by its human-readable order number.
    pub async fn get_by_number(&self, order_number: &str) -> DbResult<Option<Order>> {
        let sql = format!(
            "SELECT {} FROM orders WHERE order_number = ?1",
            Self::ORDER_COLUMNS
        );

        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(order_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    /// Gets all lines of an order.
    pub async fn lines(&self, order_id: &str) -> DbResult<Vec<OrderLine>> {
        let lines = sqlx::query_as::<_, OrderLine>(
            r#"
            SELECT id, order_id, product_id, variant_id, product_name,
                   size, color, sku, quantity, unit_price_cents, line_total_cents
            FROM order_items
            WHERE order_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Gets the timeline of an order in append order.
    pub async fn timeline(&self, order_id: &str) -> DbResult<Vec<TimelineEntry>> {
        let entries = sqlx::query_as::<_, TimelineEntry>(
            r#"
            SELECT id, order_id, status, note, created_at
            FROM order_timeline
            WHERE order_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Applies a guarded status transition.
    ///
    /// The `WHERE status = ?expected` guard makes the transition atomic:
    /// if a concurrent request moved the order first, zero rows change and
    /// the caller rolls back (so the timeline stays untouched too).
    ///
    /// Delivery stamps ride along with the transition:
    /// - `estimated_delivery` is only filled if still NULL (set-once)
    /// - `actual_delivery` is set when a value is passed
    ///
    /// ## Returns
    /// `true` when the guard held and the row moved.
    pub async fn update_status(
        &self,
        conn: &mut SqliteConnection,
        order_id: &str,
        expected: OrderStatus,
        next: OrderStatus,
        estimated_delivery: Option<DateTime<Utc>>,
        actual_delivery: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(
            order_id = %order_id,
            from = expected.as_str(),
            to = next.as_str(),
            "Order status transition"
        );

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = ?3,
                estimated_delivery = COALESCE(estimated_delivery, ?4),
                actual_delivery = COALESCE(?5, actual_delivery),
                updated_at = ?6
            WHERE id = ?1 AND status = ?2
            "#,
        )
        .bind(order_id)
        .bind(expected)
        .bind(next)
        .bind(estimated_delivery)
        .bind(actual_delivery)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Applies a guarded payment-status transition.
    ///
    /// Gateway correlation ids are written when provided; an explicit later
    /// payment update may overwrite them, nothing else does.
    ///
    /// ## Returns
    /// `true` when the guard held and the row moved.
    pub async fn update_payment(
        &self,
        order_id: &str,
        expected: PaymentStatus,
        next: PaymentStatus,
        gateway: Option<&GatewayRefs>,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(
            order_id = %order_id,
            from = expected.as_str(),
            to = next.as_str(),
            "Payment status transition"
        );

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                payment_status = ?3,
                gateway_order_id = COALESCE(?4, gateway_order_id),
                gateway_payment_id = COALESCE(?5, gateway_payment_id),
                gateway_signature = COALESCE(?6, gateway_signature),
                updated_at = ?7
            WHERE id = ?1 AND payment_status = ?2
            "#,
        )
        .bind(order_id)
        .bind(expected)
        .bind(next)
        .bind(gateway.and_then(|g| g.order_id.clone()))
        .bind(gateway.and_then(|g| g.payment_id.clone()))
        .bind(gateway.and_then(|g| g.signature.clone()))
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
