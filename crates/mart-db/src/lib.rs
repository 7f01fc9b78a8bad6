//! # mart-db: Database Layer for the Mart Commerce Core
//!
//! This crate provides database access for the commerce core.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Mart Data Flow                                  │
//! │                                                                         │
//! │  Service call (add_item, checkout, ...)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      mart-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  product.rs   │    │  (embedded)  │  │   │
//! │  │   │               │    │  cart.rs      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│  order.rs     │    │ 001_init.sql │  │   │
//! │  │   │ Transactions  │    │  sequence.rs  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │                        SQLite Database (WAL)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (product, cart, order, sequence)
//!
//! ## Transactions
//!
//! Repository methods that must participate in a multi-statement atomic unit
//! (the checkout path: stock decrement + counter increment + order insert +
//! cart conversion) take `&mut SqliteConnection` so the caller owns the
//! transaction boundary. Pool-scoped convenience methods cover everything
//! else.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mart_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("mart.db")).await?;
//! let cart = db.carts().find_active_by_user("user-1").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::cart::CartRepository;
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
pub use repository::sequence::SequenceRepository;
