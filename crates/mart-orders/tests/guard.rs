//! Inventory guard: advisory stock checks, failure reasons, and
//! alternative-variant suggestions.

mod common;

use mart_orders::{ErrorCode, InventoryGuard};

use common::{harness, seed_sibling, seed_variant};

#[tokio::test]
async fn check_stock_passes_and_warns_near_empty() {
    let h = harness().await;
    let guard = InventoryGuard::new(h.db.clone(), h.config.clone());
    let (product, variant) = seed_variant(&h.db, "Tee", 1999, 100).await;

    // Plenty on hand: no warning
    let warning = guard.check_stock(&product.id, &variant.id, 2).await.unwrap();
    assert!(warning.is_none());

    // Down to the threshold: sellable, but flagged
    h.db.products().adjust_stock(&variant.id, -96).await.unwrap();
    let warning = guard
        .check_stock(&product.id, &variant.id, 2)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(warning.remaining, 4);
    assert_eq!(warning.sku, variant.sku);
}

#[tokio::test]
async fn check_stock_failure_reasons() {
    let h = harness().await;
    let guard = InventoryGuard::new(h.db.clone(), h.config.clone());
    let (product, variant) = seed_variant(&h.db, "Tee", 1999, 3).await;

    // Unknown product
    let err = guard
        .check_stock("missing-product", &variant.id, 1)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);

    // Unknown variant
    let err = guard
        .check_stock(&product.id, "missing-variant", 1)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);

    // A variant of a DIFFERENT product does not resolve under this one
    let (_, foreign_variant) = seed_variant(&h.db, "Cap", 3000, 5).await;
    let err = guard
        .check_stock(&product.id, &foreign_variant.id, 1)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);

    // Deactivated product
    h.db.products().deactivate_product(&product.id).await.unwrap();
    let err = guard
        .check_stock(&product.id, &variant.id, 1)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Conflict);
}

#[tokio::test]
async fn check_stock_reports_available_count() {
    let h = harness().await;
    let guard = InventoryGuard::new(h.db.clone(), h.config.clone());
    let (product, variant) = seed_variant(&h.db, "Tee", 1999, 3).await;

    let err = guard
        .check_stock(&product.id, &variant.id, 5)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::Conflict);
    let details = err.details.unwrap();
    assert_eq!(details["available"], 3);
    assert_eq!(details["requested"], 5);
}

#[tokio::test]
async fn suggest_alternatives_lists_in_stock_siblings() {
    let h = harness().await;
    let guard = InventoryGuard::new(h.db.clone(), h.config.clone());

    // "M" is requested but empty; "L" has stock, "S" is empty too
    let (product, requested) = seed_variant(&h.db, "Tee", 1999, 0).await;
    let in_stock = seed_sibling(&h.db, &product, "L", 7).await;
    seed_sibling(&h.db, &product, "S", 0).await;

    let alternatives = guard
        .suggest_alternatives(&product.id, &requested.id)
        .await
        .unwrap();

    assert_eq!(alternatives.len(), 1);
    assert_eq!(alternatives[0].variant_id, in_stock.id);
    assert_eq!(alternatives[0].size, "L");
    assert_eq!(alternatives[0].stock, 7);

    // Unknown product is an error, not an empty list
    let err = guard
        .suggest_alternatives("missing-product", &requested.id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}
