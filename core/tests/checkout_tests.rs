// tests/checkout_tests.rs
mod common;

use chrono::Duration;
use common::*;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use voyage::booking::pricing::{FlatDiscount, TaxPolicy};
use voyage::model::{Cents, GatewayOutcome, NewCartItem, PaymentMethod, PaymentStatus};
use voyage::{BookingStatus, VoyageError, VoyageSettings};

#[tokio::test]
async fn checkout_confirms_bookings_and_invalidates_cart() {
  let w = world();
  let (lisbon, lisbon_dep) = w.seed_package("Lisbon", 89_900, 10).await;
  let (rome, rome_dep) = w.seed_package("Rome", 115_000, 10).await;
  let carts = &w.voyage.carts;
  carts.add_item_to_cart("u1", NewCartItem::new(&lisbon, &lisbon_dep, 2)).await.unwrap();
  carts.add_item_to_cart("u1", NewCartItem::new(&rome, &rome_dep, 1)).await.unwrap();
  let cart = carts.active_cart("u1").await.unwrap().unwrap();

  let receipt = w.voyage.checkout.checkout("u1", PaymentMethod::Card).await.unwrap();

  assert_eq!(receipt.bookings.len(), 2);
  assert_eq!(receipt.payment.status, PaymentStatus::Pending);
  assert_eq!(receipt.payment.amount_cents, 294_800);
  assert_eq!(receipt.transaction_id, "txn_1");
  for booking in &receipt.bookings {
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(booking.payment_id.as_deref(), Some(receipt.payment.id.as_str()));
    assert!(booking.amounts_balance());
  }

  let stored_cart = carts.get_cart(&cart.id).await.unwrap().unwrap();
  assert!(!stored_cart.is_valid);
  assert!(carts.active_cart("u1").await.unwrap().is_none());

  let departure = w.voyage.packages.get_departure(&lisbon_dep).await.unwrap().unwrap();
  assert_eq!(departure.booked_count, 2);

  let inbox = w.voyage.notifications.notifications_for_user("u1").await.unwrap();
  assert_eq!(inbox.len(), 1);
}

#[tokio::test]
async fn empty_or_expired_cart_cannot_be_checked_out() {
  let w = world();
  assert!(matches!(
    w.voyage.checkout.checkout("u1", PaymentMethod::Card).await,
    Err(VoyageError::Validation(_))
  ));

  let (pkg, dep) = w.seed_package("Porto", 10_000, 10).await;
  w.voyage
    .carts
    .add_item_to_cart("u1", NewCartItem::new(&pkg, &dep, 1))
    .await
    .unwrap();
  w.clock.advance(Duration::days(8));
  assert!(matches!(
    w.voyage.checkout.checkout("u1", PaymentMethod::Card).await,
    Err(VoyageError::Validation(_))
  ));
  assert_eq!(w.gateway.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn declined_payment_rolls_everything_back() {
  let w = world();
  let (pkg, dep) = w.seed_package("Rome", 115_000, 4).await;
  w.voyage
    .carts
    .add_item_to_cart("u1", NewCartItem::new(&pkg, &dep, 2))
    .await
    .unwrap();
  w.gateway.fail.store(true, Ordering::SeqCst);

  let err = w.voyage.checkout.checkout("u1", PaymentMethod::Card).await.unwrap_err();
  assert!(matches!(err, VoyageError::Payment(_)));

  let departure = w.voyage.packages.get_departure(&dep).await.unwrap().unwrap();
  assert_eq!(departure.booked_count, 0);
  let bookings = w.voyage.bookings.bookings_for_user("u1").await.unwrap();
  assert_eq!(bookings.len(), 1);
  assert_eq!(bookings[0].status, BookingStatus::Cancelled);
  let payments = w.voyage.payments.payments_for_user("u1").await.unwrap();
  assert_eq!(payments[0].status, PaymentStatus::Failed);
  // The cart survives for another attempt.
  assert!(w.voyage.carts.active_cart("u1").await.unwrap().is_some());
}

#[tokio::test]
async fn full_departure_fails_checkout_without_overbooking() {
  let w = world();
  let (pkg, dep) = w.seed_package("Faro", 10_000, 2).await;
  w.voyage
    .carts
    .add_item_to_cart("u1", NewCartItem::new(&pkg, &dep, 2))
    .await
    .unwrap();
  w.voyage
    .carts
    .add_item_to_cart("u2", NewCartItem::new(&pkg, &dep, 2))
    .await
    .unwrap();

  w.voyage.checkout.checkout("u1", PaymentMethod::Wallet).await.unwrap();
  let err = w.voyage.checkout.checkout("u2", PaymentMethod::Wallet).await.unwrap_err();
  assert!(matches!(err, VoyageError::CapacityExceeded { .. }));

  let departure = w.voyage.packages.get_departure(&dep).await.unwrap().unwrap();
  assert_eq!(departure.booked_count, departure.capacity);
  assert!(w.voyage.bookings.bookings_for_user("u2").await.unwrap().is_empty());
}

#[tokio::test]
async fn gateway_callbacks_drive_booking_status() {
  let w = world();
  let (pkg, dep) = w.seed_package("Madeira", 50_000, 10).await;
  w.voyage
    .carts
    .add_item_to_cart("u1", NewCartItem::new(&pkg, &dep, 2))
    .await
    .unwrap();
  let receipt = w.voyage.checkout.checkout("u1", PaymentMethod::Card).await.unwrap();

  let payment = w
    .voyage
    .payments
    .apply_gateway_callback(&receipt.transaction_id, GatewayOutcome::Succeeded)
    .await
    .unwrap();
  assert_eq!(payment.status, PaymentStatus::Succeeded);
  let bookings = w.voyage.bookings.bookings_for_payment(&payment.id).await.unwrap();
  assert!(bookings.iter().all(|b| b.status == BookingStatus::Paid));
  assert_eq!(w.voyage.payments.revenue_cents().await.unwrap(), 100_000);

  // A repeated callback changes nothing.
  w.voyage
    .payments
    .apply_gateway_callback(&receipt.transaction_id, GatewayOutcome::Succeeded)
    .await
    .unwrap();

  w.voyage
    .payments
    .apply_gateway_callback(&receipt.transaction_id, GatewayOutcome::Refunded)
    .await
    .unwrap();
  let bookings = w.voyage.bookings.bookings_for_payment(&payment.id).await.unwrap();
  assert!(bookings.iter().all(|b| b.status == BookingStatus::Refunded));
  let departure = w.voyage.packages.get_departure(&dep).await.unwrap().unwrap();
  assert_eq!(departure.booked_count, 0);
}

#[tokio::test]
async fn failed_gateway_callback_cancels_and_frees_seats() {
  let w = world();
  let (pkg, dep) = w.seed_package("Azores", 30_000, 3).await;
  w.voyage
    .carts
    .add_item_to_cart("u1", NewCartItem::new(&pkg, &dep, 3))
    .await
    .unwrap();
  let receipt = w.voyage.checkout.checkout("u1", PaymentMethod::BankTransfer).await.unwrap();
  let package = w.voyage.packages.get_package(&pkg).await.unwrap().unwrap();
  assert!(!package.is_available());

  w.voyage
    .payments
    .apply_gateway_callback(&receipt.transaction_id, GatewayOutcome::Failed)
    .await
    .unwrap();
  let booking = w.voyage.bookings.get_booking(&receipt.bookings[0].id).await.unwrap().unwrap();
  assert_eq!(booking.status, BookingStatus::Cancelled);
  let package = w.voyage.packages.get_package(&pkg).await.unwrap().unwrap();
  assert!(package.is_available());
}

#[tokio::test]
async fn cart_discount_is_charged_once_at_checkout() {
  let w = world_with(
    VoyageSettings {
      discount: Arc::new(FlatDiscount { cents: 5_000 }),
      tax: TaxPolicy::new(825),
      ..VoyageSettings::default()
    },
    None,
  );
  let (lisbon, lisbon_dep) = w.seed_package("Lisbon", 89_900, 10).await;
  let (rome, rome_dep) = w.seed_package("Rome", 115_000, 10).await;
  let carts = &w.voyage.carts;
  carts.add_item_to_cart("u1", NewCartItem::new(&lisbon, &lisbon_dep, 2)).await.unwrap();
  carts.add_item_to_cart("u1", NewCartItem::new(&rome, &rome_dep, 1)).await.unwrap();
  let cart = carts.active_cart("u1").await.unwrap().unwrap();
  assert_eq!((cart.total_cents, cart.final_cents), (294_800, 289_800));

  let receipt = w.voyage.checkout.checkout("u1", PaymentMethod::Card).await.unwrap();

  let discount: Cents = receipt.bookings.iter().map(|b| b.discount_cents).sum();
  let tax: Cents = receipt.bookings.iter().map(|b| b.tax_cents).sum();
  assert_eq!(discount, 5_000);
  assert_eq!(receipt.payment.amount_cents, cart.final_cents + tax);
  assert!(receipt.bookings.iter().all(|b| b.amounts_balance()));
}

#[tokio::test]
async fn failed_callback_is_final_for_the_payment() {
  let w = world();
  let (pkg, dep) = w.seed_package("Sintra", 30_000, 4).await;
  w.voyage
    .carts
    .add_item_to_cart("u1", NewCartItem::new(&pkg, &dep, 1))
    .await
    .unwrap();
  let receipt = w.voyage.checkout.checkout("u1", PaymentMethod::Card).await.unwrap();
  let payments = &w.voyage.payments;

  payments
    .apply_gateway_callback(&receipt.transaction_id, GatewayOutcome::Failed)
    .await
    .unwrap();
  let payment = payments
    .apply_gateway_callback(&receipt.transaction_id, GatewayOutcome::Succeeded)
    .await
    .unwrap();

  assert_eq!(payment.status, PaymentStatus::Failed);
  let stored = payments.get_payment(&payment.id).await.unwrap().unwrap();
  assert_eq!(stored.status, PaymentStatus::Failed);
  let booking = w.voyage.bookings.get_booking(&receipt.bookings[0].id).await.unwrap().unwrap();
  assert_eq!(booking.status, BookingStatus::Cancelled);
  assert_eq!(payments.revenue_cents().await.unwrap(), 0);
}

#[tokio::test]
async fn refund_of_an_unpaid_payment_is_ignored() {
  let w = world();
  let (pkg, dep) = w.seed_package("Evora", 40_000, 4).await;
  w.voyage
    .carts
    .add_item_to_cart("u1", NewCartItem::new(&pkg, &dep, 2))
    .await
    .unwrap();
  let receipt = w.voyage.checkout.checkout("u1", PaymentMethod::Card).await.unwrap();

  let payment = w
    .voyage
    .payments
    .apply_gateway_callback(&receipt.transaction_id, GatewayOutcome::Refunded)
    .await
    .unwrap();
  assert_eq!(payment.status, PaymentStatus::Pending);
  let booking = w.voyage.bookings.get_booking(&receipt.bookings[0].id).await.unwrap().unwrap();
  assert_eq!(booking.status, BookingStatus::Confirmed);
  let departure = w.voyage.packages.get_departure(&dep).await.unwrap().unwrap();
  assert_eq!(departure.booked_count, 2);
}

#[tokio::test]
async fn rollback_after_charge_voids_the_transaction() {
  let w = world();
  let (pkg, dep) = w.seed_package("Braga", 20_000, 4).await;
  w.voyage
    .carts
    .add_item_to_cart("u1", NewCartItem::new(&pkg, &dep, 2))
    .await
    .unwrap();
  *w.gateway.drop_carts_in.lock() = Some(w.memory.clone());

  let err = w.voyage.checkout.checkout("u1", PaymentMethod::Card).await.unwrap_err();
  assert!(matches!(err, VoyageError::MissingDocument { .. }));

  assert_eq!(*w.gateway.voided.lock(), vec!["txn_1".to_string()]);
  let payments = w.voyage.payments.payments_for_user("u1").await.unwrap();
  assert_eq!(payments[0].status, PaymentStatus::Failed);
  let departure = w.voyage.packages.get_departure(&dep).await.unwrap().unwrap();
  assert_eq!(departure.booked_count, 0);
}

#[tokio::test]
async fn unvoidable_transaction_leaves_payment_pending() {
  let w = world();
  let (pkg, dep) = w.seed_package("Tavira", 20_000, 4).await;
  w.voyage
    .carts
    .add_item_to_cart("u1", NewCartItem::new(&pkg, &dep, 1))
    .await
    .unwrap();
  *w.gateway.drop_carts_in.lock() = Some(w.memory.clone());
  w.gateway.fail_void.store(true, Ordering::SeqCst);

  assert!(w.voyage.checkout.checkout("u1", PaymentMethod::Card).await.is_err());
  let payments = w.voyage.payments.payments_for_user("u1").await.unwrap();
  assert_eq!(payments[0].status, PaymentStatus::Pending);
  assert_eq!(payments[0].gateway_transaction_id.as_deref(), Some("txn_1"));
}
