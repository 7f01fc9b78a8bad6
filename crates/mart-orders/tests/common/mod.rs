//! Shared fixtures for the service integration tests.
//!
//! Every test gets an isolated in-memory database and a frozen clock
//! (2025-03-15T12:00:00Z) it can advance deterministically.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use mart_core::{Product, ProductVariant, ShippingAddress};
use mart_db::{Database, DbConfig};
use mart_orders::{
    CartService, CheckoutService, Clock, CommerceConfig, FixedClock, OrderService,
};

pub struct Harness {
    pub db: Database,
    pub clock: FixedClock,
    pub config: CommerceConfig,
    pub carts: CartService,
    pub checkout: CheckoutService,
    pub orders: OrderService,
}

pub async fn harness() -> Harness {
    harness_with(CommerceConfig::default()).await
}

pub async fn harness_with(config: CommerceConfig) -> Harness {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap());
    let shared: Arc<dyn Clock> = Arc::new(clock.clone());

    Harness {
        carts: CartService::new(db.clone(), config.clone(), shared.clone()),
        checkout: CheckoutService::new(db.clone(), config.clone(), shared.clone()),
        orders: OrderService::new(db.clone(), config.clone(), shared),
        db,
        clock,
        config,
    }
}

/// Seeds a product with one variant and returns both.
pub async fn seed_variant(
    db: &Database,
    name: &str,
    price_cents: i64,
    stock: i64,
) -> (Product, ProductVariant) {
    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        base_price_cents: price_cents,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    let variant = ProductVariant {
        id: Uuid::new_v4().to_string(),
        product_id: product.id.clone(),
        size: "M".to_string(),
        color: "black".to_string(),
        sku: format!("{}-M-BLK", &product.id[..8].to_uppercase()),
        stock,
        price_cents: None,
        created_at: now,
        updated_at: now,
    };

    db.products().insert_product(&product).await.unwrap();
    db.products().insert_variant(&variant).await.unwrap();
    (product, variant)
}

/// Adds a sibling variant to an existing product.
pub async fn seed_sibling(
    db: &Database,
    product: &Product,
    size: &str,
    stock: i64,
) -> ProductVariant {
    let now = Utc::now();
    let variant = ProductVariant {
        id: Uuid::new_v4().to_string(),
        product_id: product.id.clone(),
        size: size.to_string(),
        color: "black".to_string(),
        sku: format!("{}-{}-BLK", &product.id[..8].to_uppercase(), size),
        stock,
        price_cents: None,
        created_at: now,
        updated_at: now,
    };

    db.products().insert_variant(&variant).await.unwrap();
    variant
}

pub fn address() -> ShippingAddress {
    ShippingAddress {
        name: "Ada Lovelace".to_string(),
        street: "12 Analytical Way".to_string(),
        city: "London".to_string(),
        postal_code: "N1 9GU".to_string(),
        country: "GB".to_string(),
    }
}
