//! # Product Repository
//!
//! Database operations for products and their variants.
//!
//! ## Stock Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Write Paths                                    │
//! │                                                                         │
//! │  ❌ FORBIDDEN: unconditional absolute write                            │
//! │     UPDATE product_variants SET stock = 7 WHERE id = ?                 │
//! │     (loses every race; two checkouts can both "succeed")               │
//! │                                                                         │
//! │  ✅ CHECKOUT: conditional decrement (the ONLY sale-side writer)        │
//! │     UPDATE product_variants                                            │
//! │     SET stock = stock - ?qty                                           │
//! │     WHERE id = ? AND stock >= ?qty                                     │
//! │                                                                         │
//! │     rows_affected == 0  →  the check failed AT WRITE TIME.             │
//! │     Validation beforehand is advisory only: between check and commit   │
//! │     another cart can take the same units.                              │
//! │                                                                         │
//! │  ✅ RESTOCK/ADMIN: delta adjustment (exempt from the condition)        │
//! │     UPDATE product_variants SET stock = stock + ?delta WHERE id = ?    │
//! │     (the schema CHECK still refuses to go below zero)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use mart_core::{Product, ProductVariant};

/// Repository for product and variant database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    pub async fn get_product(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, base_price_cents, is_active, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a variant by its ID.
    pub async fn get_variant(&self, id: &str) -> DbResult<Option<ProductVariant>> {
        let variant = sqlx::query_as::<_, ProductVariant>(
            r#"
            SELECT id, product_id, size, color, sku, stock, price_cents,
                   created_at, updated_at
            FROM product_variants
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(variant)
    }

    /// Gets all variants of a product, ordered by SKU for stable display.
    pub async fn get_variants(&self, product_id: &str) -> DbResult<Vec<ProductVariant>> {
        let variants = sqlx::query_as::<_, ProductVariant>(
            r#"
            SELECT id, product_id, size, color, sku, stock, price_cents,
                   created_at, updated_at
            FROM product_variants
            WHERE product_id = ?1
            ORDER BY sku
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(variants)
    }

    /// Inserts a new product.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` if the id already exists.
    pub async fn insert_product(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (id, name, base_price_cents, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.base_price_cents)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a new variant.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` if the SKU already exists.
    pub async fn insert_variant(&self, variant: &ProductVariant) -> DbResult<()> {
        debug!(id = %variant.id, sku = %variant.sku, "Inserting variant");

        sqlx::query(
            r#"
            INSERT INTO product_variants (
                id, product_id, size, color, sku, stock, price_cents,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&variant.id)
        .bind(&variant.product_id)
        .bind(&variant.size)
        .bind(&variant.color)
        .bind(&variant.sku)
        .bind(variant.stock)
        .bind(variant.price_cents)
        .bind(variant.created_at)
        .bind(variant.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates product display fields.
    ///
    /// Cart lines and historical orders are unaffected: they carry their own
    /// snapshots.
    pub async fn update_product(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = ?2, base_price_cents = ?3, is_active = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.base_price_cents)
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Soft-deactivates a product.
    ///
    /// ## Why Soft Delete?
    /// Historical orders still reference this product.
    pub async fn deactivate_product(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deactivating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Conditionally decrements a variant's stock.
    ///
    /// The decrement succeeds only if `stock >= quantity` at the moment of
    /// the write; on failure zero rows change. Runs on a caller-owned
    /// connection so a multi-line checkout can roll all decrements back
    /// together.
    ///
    /// ## Returns
    /// - `Ok(true)` - stock reserved
    /// - `Ok(false)` - the condition failed (insufficient stock right now,
    ///   or the variant vanished); nothing changed
    pub async fn decrement_stock(
        &self,
        conn: &mut SqliteConnection,
        variant_id: &str,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(variant_id = %variant_id, quantity = %quantity, "Conditional stock decrement");

        let result = sqlx::query(
            r#"
            UPDATE product_variants
            SET stock = stock - ?2, updated_at = ?3
            WHERE id = ?1 AND stock >= ?2
            "#,
        )
        .bind(variant_id)
        .bind(quantity)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Adjusts a variant's stock by a delta (restock/admin path).
    ///
    /// Exempt from the conditional check; the schema still refuses to take
    /// stock below zero.
    pub async fn adjust_stock(&self, variant_id: &str, delta: i64) -> DbResult<()> {
        debug!(variant_id = %variant_id, delta = %delta, "Adjusting stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE product_variants
            SET stock = stock + ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(variant_id)
        .bind(delta)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Variant", variant_id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
