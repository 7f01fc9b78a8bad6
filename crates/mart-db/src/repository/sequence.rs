//! # Order Number Sequence Repository
//!
//! The atomic per-year counter behind order numbers.
//!
//! ## Why a Counter Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ❌ THE MAX-SCAN RACE                                                  │
//! │     A: SELECT MAX(seq) → 41          B: SELECT MAX(seq) → 41           │
//! │     A: INSERT order 42               B: INSERT order 42  ← DUPLICATE   │
//! │                                                                         │
//! │  ✅ ATOMIC INCREMENT-AND-READ                                          │
//! │     INSERT INTO order_counters(year, last_seq) VALUES (?, 1)           │
//! │     ON CONFLICT(year) DO UPDATE SET last_seq = last_seq + 1            │
//! │     RETURNING last_seq                                                 │
//! │                                                                         │
//! │     One statement reads and advances the counter; two concurrent       │
//! │     callers can never observe the same value. The counter row is the   │
//! │     source of truth, never a derived scan over orders.                 │
//! │                                                                         │
//! │  Run on the checkout transaction's connection: if the order INSERT     │
//! │  fails afterwards, the increment rolls back with it and no            │
//! │  partially-issued identifier escapes.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;

/// Repository for the yearly order-number counter.
#[derive(Debug, Clone)]
pub struct SequenceRepository {
    pool: SqlitePool,
}

impl SequenceRepository {
    /// Creates a new SequenceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SequenceRepository { pool }
    }

    /// Atomically advances and returns the sequence for a year.
    ///
    /// The first call of a year creates the row at 1; every later call
    /// increments. Takes the checkout transaction's connection so the
    /// increment commits or rolls back with the order insert.
    pub async fn next_sequence(
        &self,
        conn: &mut SqliteConnection,
        year: i32,
    ) -> DbResult<u32> {
        let seq: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO order_counters (year, last_seq) VALUES (?1, 1)
            ON CONFLICT(year) DO UPDATE SET last_seq = last_seq + 1
            RETURNING last_seq
            "#,
        )
        .bind(year)
        .fetch_one(&mut *conn)
        .await?;

        debug!(year = year, seq = seq, "Issued order sequence");
        Ok(seq as u32)
    }

    /// Reads the last issued sequence for a year (diagnostics only).
    pub async fn current(&self, year: i32) -> DbResult<Option<u32>> {
        let seq: Option<i64> =
            sqlx::query_scalar("SELECT last_seq FROM order_counters WHERE year = ?1")
                .bind(year)
                .fetch_optional(&self.pool)
                .await?;

        Ok(seq.map(|s| s as u32))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
