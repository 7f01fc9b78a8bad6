//! # Repository Implementations
//!
//! One repository per aggregate root, each a thin struct over the pool.
//!
//! Methods that must run inside a caller-owned transaction (the checkout
//! unit) take `&mut SqliteConnection`; everything else executes directly on
//! the pool.

pub mod cart;
pub mod order;
pub mod product;
pub mod sequence;
