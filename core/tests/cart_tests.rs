// tests/cart_tests.rs
mod common;

use chrono::Duration;
use common::*;
use serde_json::json;
use voyage::model::{format_cents, NewCartItem};
use voyage::store::collections::CART_ITEMS;
use voyage::{DocumentStore, VoyageError};

#[tokio::test]
async fn totals_sum_item_prices_before_discount() {
  let w = world();
  let (lisbon, lisbon_dep) = w.seed_package("Lisbon", 89_900, 10).await;
  let (rome, rome_dep) = w.seed_package("Rome", 115_000, 10).await;

  w.voyage
    .carts
    .add_item_to_cart("u1", NewCartItem::new(&lisbon, &lisbon_dep, 2))
    .await
    .unwrap();
  w.voyage
    .carts
    .add_item_to_cart("u1", NewCartItem::new(&rome, &rome_dep, 1))
    .await
    .unwrap();

  let cart = w.voyage.carts.active_cart("u1").await.unwrap().unwrap();
  assert_eq!(cart.item_ids.len(), 2);
  assert_eq!(cart.total_cents, 294_800);
  assert_eq!(format_cents(cart.total_cents), "2948.00");
  assert_eq!(cart.final_cents, cart.total_cents);
}

#[tokio::test]
async fn item_price_follows_traveler_type_and_count() {
  let w = world();
  let (pkg, dep) = w.seed_package("Porto", 40_000, 10).await;
  let mut child = NewCartItem::new(&pkg, &dep, 3);
  child.traveler_type = "child".to_string();

  let item = w.voyage.carts.add_item_to_cart("u1", child).await.unwrap();
  assert_eq!(item.base_price_cents, 20_000);
  assert_eq!(item.total_price_cents, 60_000);
  assert_eq!(item.expires_at - item.added_at, Duration::days(7));

  let updated = w.voyage.carts.update_traveler_count("u1", &item.id, 1).await.unwrap();
  assert_eq!(updated.total_price_cents, 20_000);
  let cart = w.voyage.carts.active_cart("u1").await.unwrap().unwrap();
  assert_eq!(cart.total_cents, 20_000);
}

#[tokio::test]
async fn invalid_additions_are_rejected_before_writing() {
  let w = world();
  let (pkg, dep) = w.seed_package("Faro", 10_000, 2).await;

  let err = w
    .voyage
    .carts
    .add_item_to_cart("u1", NewCartItem::new(&pkg, &dep, 0))
    .await
    .unwrap_err();
  assert!(matches!(err, VoyageError::Validation(ref e) if e.get("travelerCount").is_some()));

  let mut unknown_type = NewCartItem::new(&pkg, &dep, 1);
  unknown_type.traveler_type = "senior".to_string();
  assert!(matches!(
    w.voyage.carts.add_item_to_cart("u1", unknown_type).await,
    Err(VoyageError::Validation(_))
  ));

  match w.voyage.carts.add_item_to_cart("u1", NewCartItem::new(&pkg, &dep, 3)).await {
    Err(VoyageError::CapacityExceeded {
      departure_id,
      available,
      requested,
    }) => {
      assert_eq!(departure_id, dep);
      assert_eq!((available, requested), (2, 3));
    }
    other => panic!("expected CapacityExceeded, got {:?}", other),
  }
  assert!(w.voyage.carts.active_cart("u1").await.unwrap().is_none());
}

#[tokio::test]
async fn remove_and_clear_keep_totals_consistent() {
  let w = world();
  let (pkg, dep) = w.seed_package("Madeira", 50_000, 10).await;
  let first = w
    .voyage
    .carts
    .add_item_to_cart("u1", NewCartItem::new(&pkg, &dep, 1))
    .await
    .unwrap();
  w.voyage
    .carts
    .add_item_to_cart("u1", NewCartItem::new(&pkg, &dep, 2))
    .await
    .unwrap();

  let cart = w.voyage.carts.remove_item_from_cart("u1", &first.id).await.unwrap();
  assert_eq!(cart.item_ids.len(), 1);
  assert_eq!(cart.total_cents, 100_000);
  assert!(w.memory.inner().len(CART_ITEMS) == 1);

  let cleared = w.voyage.carts.clear_cart("u1").await.unwrap().unwrap();
  assert!(cleared.item_ids.is_empty());
  assert_eq!((cleared.total_cents, cleared.final_cents), (0, 0));
  assert!(cleared.is_valid);
  assert!(w.memory.inner().is_empty(CART_ITEMS));
}

#[tokio::test]
async fn expired_items_do_not_count() {
  let w = world();
  let (pkg, dep) = w.seed_package("Azores", 30_000, 10).await;
  w.voyage
    .carts
    .add_item_to_cart("u1", NewCartItem::new(&pkg, &dep, 1))
    .await
    .unwrap();

  w.clock.advance(Duration::days(8));
  w.voyage
    .carts
    .add_item_to_cart("u1", NewCartItem::new(&pkg, &dep, 2))
    .await
    .unwrap();

  let cart = w.voyage.carts.active_cart("u1").await.unwrap().unwrap();
  assert_eq!(cart.item_ids.len(), 2);
  assert_eq!(cart.total_cents, 60_000);
  assert_eq!(w.voyage.carts.live_items(&cart).await.len(), 1);
}

#[tokio::test]
async fn partial_item_reads_are_dropped() {
  let w = world();
  let (pkg, dep) = w.seed_package("Sintra", 10_000, 10).await;
  let item = w
    .voyage
    .carts
    .add_item_to_cart("u1", NewCartItem::new(&pkg, &dep, 1))
    .await
    .unwrap();
  w.memory.set(CART_ITEMS, "garbled", json!({"cartId": 7})).await.unwrap();

  let ids = vec![item.id.clone(), "garbled".to_string(), "missing".to_string()];
  let items = w.voyage.carts.get_cart_items_for_cart(&ids).await;
  assert!(items.len() <= ids.len());
  assert_eq!(items.len(), 1);
  assert_eq!(items[0].id, item.id);
}

#[tokio::test]
async fn store_outage_surfaces_as_store_error() {
  let w = world();
  w.memory.inner().set_unavailable(true);
  let err = w.voyage.carts.get_or_create_cart("u1").await.unwrap_err();
  assert!(matches!(err, VoyageError::Store(_)));
}
