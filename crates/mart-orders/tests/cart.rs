//! Cart service behavior: merge semantics, caps, coupons, shipping,
//! totals recomputation, and the sliding expiry window.

mod common;

use chrono::Duration;
use mart_orders::{Clock, CommerceConfig, ErrorCode};

use common::{harness, harness_with, seed_variant};

#[tokio::test]
async fn totals_recompute_on_every_mutation() {
    let h = harness().await;
    let (product_a, variant_a) = seed_variant(&h.db, "Hoodie", 5000, 100).await;
    let (product_b, variant_b) = seed_variant(&h.db, "Cap", 3000, 100).await;

    // qty 2 @ $50.00 + qty 1 @ $30.00
    h.carts
        .add_item("user-1", &product_a.id, &variant_a.id, 2)
        .await
        .unwrap();
    let view = h
        .carts
        .add_item("user-1", &product_b.id, &variant_b.id, 1)
        .await
        .unwrap();
    assert_eq!(view.cart.subtotal_cents, 13000);
    assert_eq!(view.cart.item_count, 3);

    // $10 coupon + $5 shipping at the default 8% rate
    h.carts
        .apply_coupon("user-1", "SAVE10", 1000)
        .await
        .unwrap();
    let view = h.carts.set_shipping("user-1", 500).await.unwrap();

    assert_eq!(view.cart.subtotal_cents, 13000);
    assert_eq!(view.cart.tax_cents, 960); // 8% of the $120 taxable base
    assert_eq!(view.cart.total_cents, 13460);
    assert_eq!(view.cart.item_count, 3);
}

#[tokio::test]
async fn oversized_discount_clamps_to_shipping_only() {
    let h = harness().await;
    let (product_a, variant_a) = seed_variant(&h.db, "Hoodie", 5000, 100).await;
    let (product_b, variant_b) = seed_variant(&h.db, "Cap", 3000, 100).await;

    h.carts
        .add_item("user-1", &product_a.id, &variant_a.id, 2)
        .await
        .unwrap();
    h.carts
        .add_item("user-1", &product_b.id, &variant_b.id, 1)
        .await
        .unwrap();
    h.carts.set_shipping("user-1", 500).await.unwrap();

    // $200 discount against a $130 subtotal
    let view = h
        .carts
        .apply_coupon("user-1", "BIGSPENDER", 20000)
        .await
        .unwrap();

    assert_eq!(view.cart.tax_cents, 0);
    assert_eq!(view.cart.total_cents, 500); // shipping only, never negative
}

#[tokio::test]
async fn add_merges_same_pair_instead_of_duplicating() {
    let h = harness().await;
    let (product, variant) = seed_variant(&h.db, "Tee", 1999, 100).await;

    h.carts
        .add_item("user-1", &product.id, &variant.id, 2)
        .await
        .unwrap();
    let view = h
        .carts
        .add_item("user-1", &product.id, &variant.id, 3)
        .await
        .unwrap();

    assert_eq!(view.lines.len(), 1);
    assert_eq!(view.lines[0].quantity, 5);
    assert_eq!(view.cart.item_count, 5);
}

#[tokio::test]
async fn add_rejects_insufficient_stock_with_availability() {
    let h = harness().await;
    let (product, variant) = seed_variant(&h.db, "Tee", 1999, 1).await;

    let err = h
        .carts
        .add_item("user-1", &product.id, &variant.id, 2)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::Conflict);
    let details = err.details.unwrap();
    assert_eq!(details["available"], 1);
    assert_eq!(details["requested"], 2);
}

#[tokio::test]
async fn merged_quantity_is_checked_against_stock() {
    let h = harness().await;
    let (product, variant) = seed_variant(&h.db, "Tee", 1999, 3).await;

    h.carts
        .add_item("user-1", &product.id, &variant.id, 2)
        .await
        .unwrap();

    // 2 already in the cart; 2 more would need 4 of the 3 on hand
    let err = h
        .carts
        .add_item("user-1", &product.id, &variant.id, 2)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Conflict);
}

#[tokio::test]
async fn low_stock_is_a_warning_not_a_block() {
    let h = harness().await;
    let (product, variant) = seed_variant(&h.db, "Tee", 1999, 4).await;

    // 4 on hand is at or below the default threshold of 5 - still sellable
    let view = h
        .carts
        .add_item("user-1", &product.id, &variant.id, 2)
        .await
        .unwrap();
    assert_eq!(view.lines[0].quantity, 2);
}

#[tokio::test]
async fn distinct_line_cap_only_applies_to_new_lines() {
    let h = harness_with(CommerceConfig::default().max_cart_lines(1)).await;
    let (product_a, variant_a) = seed_variant(&h.db, "Hoodie", 5000, 100).await;
    let (product_b, variant_b) = seed_variant(&h.db, "Cap", 3000, 100).await;

    h.carts
        .add_item("user-1", &product_a.id, &variant_a.id, 1)
        .await
        .unwrap();

    // A second distinct line exceeds the cap
    let err = h
        .carts
        .add_item("user-1", &product_b.id, &variant_b.id, 1)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Conflict);

    // Merging into the existing line is still allowed
    let view = h
        .carts
        .add_item("user-1", &product_a.id, &variant_a.id, 1)
        .await
        .unwrap();
    assert_eq!(view.lines.len(), 1);
    assert_eq!(view.lines[0].quantity, 2);
}

#[tokio::test]
async fn quantity_cap_applies_to_the_merged_quantity() {
    let h = harness_with(CommerceConfig::default().max_item_quantity(5)).await;
    let (product, variant) = seed_variant(&h.db, "Tee", 1999, 100).await;

    let err = h
        .carts
        .add_item("user-1", &product.id, &variant.id, 6)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    h.carts
        .add_item("user-1", &product.id, &variant.id, 3)
        .await
        .unwrap();
    let err = h
        .carts
        .add_item("user-1", &product.id, &variant.id, 3)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
}

#[tokio::test]
async fn quantity_zero_removes_the_line() {
    let h = harness().await;
    let (product, variant) = seed_variant(&h.db, "Tee", 1999, 100).await;

    let view = h
        .carts
        .add_item("user-1", &product.id, &variant.id, 2)
        .await
        .unwrap();
    let line_id = view.lines[0].id.clone();

    let view = h
        .carts
        .update_item_quantity("user-1", &line_id, 0)
        .await
        .unwrap();

    assert!(view.lines.is_empty());
    assert_eq!(view.cart.subtotal_cents, 0);
    assert_eq!(view.cart.item_count, 0);
}

#[tokio::test]
async fn update_revalidates_against_current_stock() {
    let h = harness().await;
    let (product, variant) = seed_variant(&h.db, "Tee", 1999, 10).await;

    let view = h
        .carts
        .add_item("user-1", &product.id, &variant.id, 2)
        .await
        .unwrap();
    let line_id = view.lines[0].id.clone();

    let err = h
        .carts
        .update_item_quantity("user-1", &line_id, 50)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Conflict);

    // The line kept its old quantity
    let view = h.carts.get_or_create_active("user-1").await.unwrap();
    assert_eq!(view.lines[0].quantity, 2);
}

#[tokio::test]
async fn remove_and_clear() {
    let h = harness().await;
    let (product_a, variant_a) = seed_variant(&h.db, "Hoodie", 5000, 100).await;
    let (product_b, variant_b) = seed_variant(&h.db, "Cap", 3000, 100).await;

    let view = h
        .carts
        .add_item("user-1", &product_a.id, &variant_a.id, 1)
        .await
        .unwrap();
    let line_a = view.lines[0].id.clone();
    h.carts
        .add_item("user-1", &product_b.id, &variant_b.id, 1)
        .await
        .unwrap();

    let view = h.carts.remove_item("user-1", &line_a).await.unwrap();
    assert_eq!(view.lines.len(), 1);
    assert_eq!(view.cart.subtotal_cents, 3000);

    let view = h.carts.clear("user-1").await.unwrap();
    assert!(view.lines.is_empty());
    assert_eq!(view.cart.total_cents, 0);
}

#[tokio::test]
async fn removing_a_foreign_line_is_not_found() {
    let h = harness().await;
    let (product, variant) = seed_variant(&h.db, "Tee", 1999, 100).await;

    let view = h
        .carts
        .add_item("user-1", &product.id, &variant.id, 1)
        .await
        .unwrap();
    let line_id = view.lines[0].id.clone();

    // user-2 cannot touch user-1's line
    let err = h.carts.remove_item("user-2", &line_id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn coupon_is_normalized_and_duplicate_application_conflicts() {
    let h = harness().await;
    let (product, variant) = seed_variant(&h.db, "Tee", 1999, 100).await;
    h.carts
        .add_item("user-1", &product.id, &variant.id, 1)
        .await
        .unwrap();

    let view = h
        .carts
        .apply_coupon("user-1", "  save10 ", 200)
        .await
        .unwrap();
    assert_eq!(view.cart.coupon_code.as_deref(), Some("SAVE10"));
    assert_eq!(view.cart.discount_cents, 200);

    // Same code again (differently cased) is a duplicate
    let err = h
        .carts
        .apply_coupon("user-1", "Save10", 200)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Conflict);

    // A different code replaces the old one
    let view = h
        .carts
        .apply_coupon("user-1", "WELCOME", 300)
        .await
        .unwrap();
    assert_eq!(view.cart.coupon_code.as_deref(), Some("WELCOME"));
    assert_eq!(view.cart.discount_cents, 300);

    let view = h.carts.remove_coupon("user-1").await.unwrap();
    assert!(view.cart.coupon_code.is_none());
    assert_eq!(view.cart.discount_cents, 0);
}

#[tokio::test]
async fn malformed_coupons_are_rejected() {
    let h = harness().await;

    for bad in ["", "ab", "HAS SPACE", "BAD-CODE", "X123456789012345678901"] {
        let err = h.carts.apply_coupon("user-1", bad, 100).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError, "coupon {:?}", bad);
    }
}

#[tokio::test]
async fn shipping_cost_bounds() {
    let h = harness().await;

    let view = h.carts.set_shipping("user-1", 0).await.unwrap();
    assert_eq!(view.cart.shipping_cents, 0);

    let err = h.carts.set_shipping("user-1", -1).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    let err = h.carts.set_shipping("user-1", 50_001).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
}

#[tokio::test]
async fn get_or_create_returns_the_same_cart() {
    let h = harness().await;

    let first = h.carts.get_or_create_active("user-1").await.unwrap();
    let second = h.carts.get_or_create_active("user-1").await.unwrap();

    assert_eq!(first.cart.id, second.cart.id);

    // Different users get different carts
    let other = h.carts.get_or_create_active("user-2").await.unwrap();
    assert_ne!(first.cart.id, other.cart.id);
}

#[tokio::test]
async fn repeated_recompute_is_drift_free() {
    let h = harness().await;
    let (product, variant) = seed_variant(&h.db, "Tee", 1357, 100).await;

    h.carts
        .add_item("user-1", &product.id, &variant.id, 7)
        .await
        .unwrap();
    h.carts.apply_coupon("user-1", "SAVE10", 999).await.unwrap();

    let first = h.carts.get_or_create_active("user-1").await.unwrap();
    let second = h.carts.get_or_create_active("user-1").await.unwrap();

    assert_eq!(first.cart.subtotal_cents, second.cart.subtotal_cents);
    assert_eq!(first.cart.tax_cents, second.cart.tax_cents);
    assert_eq!(first.cart.total_cents, second.cart.total_cents);
    assert_eq!(first.cart.item_count, second.cart.item_count);
}

#[tokio::test]
async fn every_mutation_slides_the_expiry_window() {
    let h = harness().await;
    let (product, variant) = seed_variant(&h.db, "Tee", 1999, 100).await;

    let view = h.carts.get_or_create_active("user-1").await.unwrap();
    let initial_expiry = view.cart.expires_at;

    h.clock.advance(Duration::days(2));

    let view = h
        .carts
        .add_item("user-1", &product.id, &variant.id, 1)
        .await
        .unwrap();

    assert_eq!(view.cart.expires_at, initial_expiry + Duration::days(2));
    assert_eq!(view.cart.expires_at, h.clock.now() + h.config.cart_ttl);
}

#[tokio::test]
async fn idle_carts_expire_and_are_purged() {
    let h = harness().await;
    let (product, variant) = seed_variant(&h.db, "Tee", 1999, 100).await;

    let view = h
        .carts
        .add_item("user-1", &product.id, &variant.id, 1)
        .await
        .unwrap();
    let old_id = view.cart.id.clone();

    // Just short of the TTL: still alive
    h.clock.advance(h.config.cart_ttl - Duration::hours(1));
    assert_eq!(h.carts.purge_expired().await.unwrap(), 0);

    // Past it: gone
    h.clock.advance(Duration::hours(2));
    assert_eq!(h.carts.purge_expired().await.unwrap(), 1);

    // The next access creates a fresh, empty cart
    let view = h.carts.get_or_create_active("user-1").await.unwrap();
    assert_ne!(view.cart.id, old_id);
    assert!(view.lines.is_empty());
}

#[tokio::test]
async fn abandoned_cart_frees_the_active_slot() {
    let h = harness().await;

    let view = h.carts.get_or_create_active("user-1").await.unwrap();
    h.carts.abandon("user-1").await.unwrap();

    // Abandoning again: no active cart anymore
    let err = h.carts.abandon("user-1").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);

    let fresh = h.carts.get_or_create_active("user-1").await.unwrap();
    assert_ne!(fresh.cart.id, view.cart.id);
}

#[tokio::test]
async fn blank_user_id_is_rejected() {
    let h = harness().await;

    let err = h.carts.get_or_create_active("  ").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
}
