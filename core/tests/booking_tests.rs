// tests/booking_tests.rs
mod common;

use chrono::Duration;
use common::*;
use std::sync::atomic::Ordering;
use voyage::booking::pricing::{BookingQuote, NoDiscount, PercentageDiscount, TaxPolicy};
use voyage::model::{CartItem, NewCartItem};
use voyage::{BookingStatus, VoyageError};

async fn cart_item(w: &TestWorld, travelers: u32, capacity: u32) -> CartItem {
  let (pkg, dep) = w.seed_package("Lisbon", 89_900, capacity).await;
  w.voyage
    .carts
    .add_item_to_cart("u1", NewCartItem::new(&pkg, &dep, travelers))
    .await
    .unwrap()
}

#[tokio::test]
async fn created_booking_amounts_balance() {
  let w = world();
  let item = cart_item(&w, 2, 10).await;
  let quote = BookingQuote::compute(
    item.expected_total(),
    &PercentageDiscount { basis_points: 1_500 },
    TaxPolicy::new(700),
  );

  let booking = w
    .voyage
    .bookings
    .create_booking("u1", &item.cart_id, &item, quote)
    .await
    .unwrap();
  assert_eq!(booking.status, BookingStatus::Pending);
  assert_eq!(
    booking.total_cents,
    booking.subtotal_cents - booking.discount_cents + booking.tax_cents
  );
  let stored = w.voyage.bookings.get_booking(&booking.id).await.unwrap().unwrap();
  assert!(stored.amounts_balance());
  assert_eq!(stored.travel_start_date, item.departure_date);
}

#[tokio::test]
async fn illegal_transitions_are_rejected_and_leave_status_alone() {
  let w = world();
  let item = cart_item(&w, 1, 10).await;
  let quote = BookingQuote::compute(item.expected_total(), &NoDiscount, TaxPolicy::default());
  let booking = w.voyage.bookings.create_booking("u1", "c", &item, quote).await.unwrap();

  let err = w
    .voyage
    .bookings
    .update_booking_status(&booking.id, BookingStatus::Paid)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    VoyageError::InvalidTransition {
      from: BookingStatus::Pending,
      to: BookingStatus::Paid
    }
  ));
  let stored = w.voyage.bookings.get_booking(&booking.id).await.unwrap().unwrap();
  assert_eq!(stored.status, BookingStatus::Pending);

  for next in [BookingStatus::Confirmed, BookingStatus::Paid, BookingStatus::Completed] {
    w.voyage.bookings.update_booking_status(&booking.id, next).await.unwrap();
  }
  assert!(w.voyage.bookings.cancel_booking(&booking.id).await.is_err());
}

#[tokio::test]
async fn override_bypasses_the_graph() {
  let w = world();
  let item = cart_item(&w, 1, 10).await;
  let quote = BookingQuote::compute(item.expected_total(), &NoDiscount, TaxPolicy::default());
  let booking = w.voyage.bookings.create_booking("u1", "c", &item, quote).await.unwrap();

  let forced = w
    .voyage
    .bookings
    .override_booking_status(&booking.id, BookingStatus::Paid)
    .await
    .unwrap();
  assert_eq!(forced.status, BookingStatus::Paid);
}

#[tokio::test]
async fn cancelling_gives_seats_back() {
  let w = world();
  let item = cart_item(&w, 3, 3).await;
  w.voyage
    .packages
    .reserve_seats(&item.departure_id, item.traveler_count)
    .await
    .unwrap();
  let quote = BookingQuote::compute(item.expected_total(), &NoDiscount, TaxPolicy::default());
  let booking = w.voyage.bookings.create_booking("u1", "c", &item, quote).await.unwrap();

  let departure = w.voyage.packages.get_departure(&item.departure_id).await.unwrap().unwrap();
  assert_eq!(departure.booked_count, 3);
  assert!(departure.booked_count <= departure.capacity);

  w.voyage.bookings.cancel_booking(&booking.id).await.unwrap();
  let departure = w.voyage.packages.get_departure(&item.departure_id).await.unwrap().unwrap();
  assert_eq!(departure.booked_count, 0);
}

#[tokio::test]
async fn failed_cancel_keeps_the_seats_booked() {
  let w = world();
  let item = cart_item(&w, 2, 4).await;
  w.voyage
    .packages
    .reserve_seats(&item.departure_id, item.traveler_count)
    .await
    .unwrap();
  let quote = BookingQuote::compute(item.expected_total(), &NoDiscount, TaxPolicy::default());
  let booking = w.voyage.bookings.create_booking("u1", "c", &item, quote).await.unwrap();

  w.booking_writes_fail.store(true, Ordering::SeqCst);
  let err = w.voyage.bookings.cancel_booking(&booking.id).await.unwrap_err();
  assert!(matches!(err, VoyageError::Store(_)));
  w.booking_writes_fail.store(false, Ordering::SeqCst);

  let stored = w.voyage.bookings.get_booking(&booking.id).await.unwrap().unwrap();
  assert_eq!(stored.status, BookingStatus::Pending);
  let departure = w.voyage.packages.get_departure(&item.departure_id).await.unwrap().unwrap();
  assert_eq!(departure.booked_count, 2);
}

#[tokio::test]
async fn failed_revival_returns_the_seats() {
  let w = world();
  let item = cart_item(&w, 2, 4).await;
  w.voyage
    .packages
    .reserve_seats(&item.departure_id, item.traveler_count)
    .await
    .unwrap();
  let quote = BookingQuote::compute(item.expected_total(), &NoDiscount, TaxPolicy::default());
  let booking = w.voyage.bookings.create_booking("u1", "c", &item, quote).await.unwrap();
  w.voyage.bookings.cancel_booking(&booking.id).await.unwrap();

  w.booking_writes_fail.store(true, Ordering::SeqCst);
  assert!(w
    .voyage
    .bookings
    .override_booking_status(&booking.id, BookingStatus::Confirmed)
    .await
    .is_err());
  w.booking_writes_fail.store(false, Ordering::SeqCst);

  let stored = w.voyage.bookings.get_booking(&booking.id).await.unwrap().unwrap();
  assert_eq!(stored.status, BookingStatus::Cancelled);
  let departure = w.voyage.packages.get_departure(&item.departure_id).await.unwrap().unwrap();
  assert_eq!(departure.booked_count, 0);
}

#[tokio::test]
async fn sweep_completes_only_paid_bookings_that_ended() {
  let w = world();
  let item = cart_item(&w, 1, 20).await;
  let quote = BookingQuote::compute(item.expected_total(), &NoDiscount, TaxPolicy::default());

  let mut ids = Vec::new();
  for _ in 0..3 {
    ids.push(w.voyage.bookings.create_booking("u1", "c", &item, quote).await.unwrap().id);
  }
  let (paid, confirmed, pending) = (&ids[0], &ids[1], &ids[2]);
  for id in [paid, confirmed] {
    w.voyage.bookings.update_booking_status(id, BookingStatus::Confirmed).await.unwrap();
  }
  w.voyage.bookings.update_booking_status(paid, BookingStatus::Paid).await.unwrap();

  // Before the trip ends nothing moves.
  let none = w.voyage.bookings.complete_past_bookings(w.clock_now()).await.unwrap();
  assert!(none.is_empty());

  w.clock.advance(Duration::days(40));
  let completed = w.voyage.bookings.complete_past_bookings(w.clock_now()).await.unwrap();
  assert_eq!(completed, vec![paid.clone()]);

  let status = |id: &String| {
    let bookings = w.voyage.bookings.clone();
    let id = id.clone();
    async move { bookings.get_booking(&id).await.unwrap().unwrap().status }
  };
  assert_eq!(status(paid).await, BookingStatus::Completed);
  assert_eq!(status(confirmed).await, BookingStatus::Confirmed);
  assert_eq!(status(pending).await, BookingStatus::Pending);
}

#[tokio::test]
async fn bookings_are_listed_newest_first() {
  let w = world();
  let item = cart_item(&w, 1, 20).await;
  let quote = BookingQuote::compute(item.expected_total(), &NoDiscount, TaxPolicy::default());
  let older = w.voyage.bookings.create_booking("u1", "c", &item, quote).await.unwrap();
  w.clock.advance(Duration::minutes(5));
  let newer = w.voyage.bookings.create_booking("u1", "c", &item, quote).await.unwrap();
  w.voyage.bookings.create_booking("u2", "c", &item, quote).await.unwrap();

  let listed: Vec<String> = w
    .voyage
    .bookings
    .bookings_for_user("u1")
    .await
    .unwrap()
    .into_iter()
    .map(|b| b.id)
    .collect();
  assert_eq!(listed, vec![newer.id, older.id]);
  assert_eq!(w.voyage.bookings.all_bookings().await.unwrap().len(), 3);
}
