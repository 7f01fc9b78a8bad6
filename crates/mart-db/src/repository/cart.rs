//! # Cart Repository
//!
//! Database operations for carts and their lines.
//!
//! ## Cart Lifecycle in the Schema
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  first access ──► INSERT (status 'active')                             │
//! │       │             │                                                   │
//! │       │             │ UNIQUE INDEX carts(user_id) WHERE status='active'│
//! │       │             ▼                                                   │
//! │       │      concurrent loser gets UniqueViolation ──► refetch winner  │
//! │       │                                                                 │
//! │  mutations ──► UPDATE ... WHERE status = 'active'                      │
//! │       │        (a converted/abandoned cart silently stops accepting    │
//! │       │         writes; rows_affected == 0 surfaces the race)          │
//! │       ▼                                                                 │
//! │  checkout ──► status 'converted' (inside the checkout transaction)     │
//! │  idle TTL ──► DELETE (cascade removes lines)                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use mart_core::{Cart, CartLine};

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    const CART_COLUMNS: &'static str = r#"
        id, user_id, status, coupon_code, discount_cents, shipping_cents,
        tax_rate_bps, subtotal_cents, tax_cents, total_cents, item_count,
        expires_at, created_at, updated_at
    "#;

    /// Finds the single active cart for a user, if any.
    pub async fn find_active_by_user(&self, user_id: &str) -> DbResult<Option<Cart>> {
        let sql = format!(
            "SELECT {} FROM carts WHERE user_id = ?1 AND status = 'active'",
            Self::CART_COLUMNS
        );

        let cart = sqlx::query_as::<_, Cart>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(cart)
    }

    /// Gets a cart by its ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Cart>> {
        let sql = format!("SELECT {} FROM carts WHERE id = ?1", Self::CART_COLUMNS);

        let cart = sqlx::query_as::<_, Cart>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(cart)
    }

    /// Inserts a new cart.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` when the user already has an active cart -
    /// the caller tolerates this by refetching the winner.
    pub async fn insert(&self, cart: &Cart) -> DbResult<()> {
        debug!(id = %cart.id, user_id = %cart.user_id, "Inserting cart");

        sqlx::query(
            r#"
            INSERT INTO carts (
                id, user_id, status, coupon_code, discount_cents, shipping_cents,
                tax_rate_bps, subtotal_cents, tax_cents, total_cents, item_count,
                expires_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&cart.id)
        .bind(&cart.user_id)
        .bind(cart.status)
        .bind(&cart.coupon_code)
        .bind(cart.discount_cents)
        .bind(cart.shipping_cents)
        .bind(cart.tax_rate_bps)
        .bind(cart.subtotal_cents)
        .bind(cart.tax_cents)
        .bind(cart.total_cents)
        .bind(cart.item_count)
        .bind(cart.expires_at)
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Writes back the mutable slice of an active cart: coupon, discount,
    /// shipping, recomputed totals, and the slid expiry window.
    ///
    /// Guarded by `status = 'active'`: a cart converted or abandoned by a
    /// concurrent request stops accepting writes.
    ///
    /// ## Errors
    /// `DbError::RaceLost` when the guard fails.
    pub async fn save_active(&self, cart: &Cart) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE carts SET
                coupon_code = ?2,
                discount_cents = ?3,
                shipping_cents = ?4,
                subtotal_cents = ?5,
                tax_cents = ?6,
                total_cents = ?7,
                item_count = ?8,
                expires_at = ?9,
                updated_at = ?10
            WHERE id = ?1 AND status = 'active'
            "#,
        )
        .bind(&cart.id)
        .bind(&cart.coupon_code)
        .bind(cart.discount_cents)
        .bind(cart.shipping_cents)
        .bind(cart.subtotal_cents)
        .bind(cart.tax_cents)
        .bind(cart.total_cents)
        .bind(cart.item_count)
        .bind(cart.expires_at)
        .bind(cart.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::race_lost(format!("cart {} is not active", cart.id)));
        }

        Ok(())
    }

    /// Gets all lines of a cart in insertion order (display order).
    pub async fn lines(&self, cart_id: &str) -> DbResult<Vec<CartLine>> {
        let lines = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT id, cart_id, product_id, variant_id, size, color, sku,
                   quantity, unit_price_cents, created_at
            FROM cart_items
            WHERE cart_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(cart_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Gets a single line by its ID.
    pub async fn get_line(&self, line_id: &str) -> DbResult<Option<CartLine>> {
        let line = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT id, cart_id, product_id, variant_id, size, color, sku,
                   quantity, unit_price_cents, created_at
            FROM cart_items
            WHERE id = ?1
            "#,
        )
        .bind(line_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(line)
    }

    /// Finds the line holding a (product, variant) pair, if present.
    ///
    /// Line identity within a cart: an add for an existing pair merges into
    /// this line instead of appending a duplicate.
    pub async fn find_line(
        &self,
        cart_id: &str,
        product_id: &str,
        variant_id: &str,
    ) -> DbResult<Option<CartLine>> {
        let line = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT id, cart_id, product_id, variant_id, size, color, sku,
                   quantity, unit_price_cents, created_at
            FROM cart_items
            WHERE cart_id = ?1 AND product_id = ?2 AND variant_id = ?3
            "#,
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(variant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(line)
    }

    /// Counts distinct lines in a cart (for the cart-full check).
    pub async fn line_count(&self, cart_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM cart_items WHERE cart_id = ?1")
                .bind(cart_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Inserts a new line.
    ///
    /// Snapshot pattern: size/color/sku and the unit price are frozen copies
    /// taken at add-time.
    pub async fn insert_line(&self, line: &CartLine) -> DbResult<()> {
        debug!(cart_id = %line.cart_id, sku = %line.sku, "Inserting cart line");

        sqlx::query(
            r#"
            INSERT INTO cart_items (
                id, cart_id, product_id, variant_id, size, color, sku,
                quantity, unit_price_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&line.id)
        .bind(&line.cart_id)
        .bind(&line.product_id)
        .bind(&line.variant_id)
        .bind(&line.size)
        .bind(&line.color)
        .bind(&line.sku)
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .bind(line.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Sets a line's quantity.
    pub async fn set_line_quantity(&self, line_id: &str, quantity: i64) -> DbResult<()> {
        let result = sqlx::query("UPDATE cart_items SET quantity = ?2 WHERE id = ?1")
            .bind(line_id)
            .bind(quantity)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart line", line_id));
        }

        Ok(())
    }

    /// Deletes a line.
    pub async fn delete_line(&self, line_id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = ?1")
            .bind(line_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart line", line_id));
        }

        Ok(())
    }

    /// Deletes all lines of a cart.
    pub async fn clear_lines(&self, cart_id: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1")
            .bind(cart_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Marks an active cart converted. Part of the checkout transaction.
    ///
    /// ## Returns
    /// `false` when the cart was not active anymore (a concurrent checkout
    /// won); the caller rolls the transaction back.
    pub async fn mark_converted(
        &self,
        conn: &mut SqliteConnection,
        cart_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE carts SET status = 'converted', updated_at = ?2
            WHERE id = ?1 AND status = 'active'
            "#,
        )
        .bind(cart_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Marks an active cart abandoned.
    pub async fn mark_abandoned(&self, cart_id: &str, now: DateTime<Utc>) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE carts SET status = 'abandoned', updated_at = ?2
            WHERE id = ?1 AND status = 'active'
            "#,
        )
        .bind(cart_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes active carts whose idle window lapsed.
    ///
    /// Lines go with them via cascade. Converted carts are history and are
    /// never purged here.
    ///
    /// ## Returns
    /// Number of carts removed.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM carts WHERE status = 'active' AND expires_at < ?1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(purged = result.rows_affected(), "Purged expired carts");
        Ok(result.rows_affected())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
