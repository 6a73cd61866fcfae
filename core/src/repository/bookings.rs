// voyage/src/repository/bookings.rs

//! Bookings and their status transitions.

use super::packages::PackageRepository;
use super::{load, load_all, load_required, save};
use crate::booking::pricing::BookingQuote;
use crate::booking::status::BookingStatus;
use crate::clock::Clock;
use crate::error::{VoyageError, VoyageResult};
use crate::model::{Booking, CartItem};
use crate::store::collections::BOOKINGS;
use crate::store::{patch, watch, Direction, DocumentStore, FilterOp, Query, Subscription};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

#[derive(Clone)]
pub struct BookingRepository {
  store: Arc<dyn DocumentStore>,
  clock: Arc<dyn Clock>,
  packages: PackageRepository,
}

impl BookingRepository {
  pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>, packages: PackageRepository) -> Self {
    Self { store, clock, packages }
  }

  /// Stores one PENDING booking for `item`, priced by `quote`.
  #[instrument(name = "BookingRepository::create_booking", skip(self, item, quote), fields(item_id = %item.id), err(Display))]
  pub async fn create_booking(
    &self,
    user_id: &str,
    cart_id: &str,
    item: &CartItem,
    quote: BookingQuote,
  ) -> VoyageResult<Booking> {
    let now = self.clock.now();
    let mut booking = Booking {
      id: String::new(),
      user_id: user_id.to_string(),
      package_id: item.package_id.clone(),
      cart_id: cart_id.to_string(),
      cart_item_id: item.id.clone(),
      payment_id: None,
      departure_id: item.departure_id.clone(),
      travel_start_date: item.departure_date,
      travel_end_date: item.end_date,
      traveler_count: item.traveler_count,
      subtotal_cents: quote.subtotal_cents,
      discount_cents: quote.discount_cents,
      tax_cents: quote.tax_cents,
      total_cents: quote.total_cents,
      booking_date: now,
      status: BookingStatus::Pending,
      updated_at: now,
    };
    booking.id = save(self.store.as_ref(), BOOKINGS, "", &booking).await?;
    info!(booking_id = %booking.id, total = booking.total_cents, "booking created");
    Ok(booking)
  }

  /// One booking per quoted item, in order.
  pub async fn create_bookings(
    &self,
    user_id: &str,
    cart_id: &str,
    quoted: &[(CartItem, BookingQuote)],
  ) -> VoyageResult<Vec<Booking>> {
    let mut bookings = Vec::with_capacity(quoted.len());
    for (item, quote) in quoted {
      bookings.push(self.create_booking(user_id, cart_id, item, *quote).await?);
    }
    Ok(bookings)
  }

  pub async fn get_booking(&self, id: &str) -> VoyageResult<Option<Booking>> {
    load(self.store.as_ref(), BOOKINGS, id).await
  }

  /// The user's bookings, most recent first.
  pub async fn bookings_for_user(&self, user_id: &str) -> VoyageResult<Vec<Booking>> {
    let query = Query::all()
      .where_eq("userId", user_id)
      .order_by("bookingDate", Direction::Descending);
    load_all(self.store.as_ref(), BOOKINGS, &query).await
  }

  pub async fn bookings_for_payment(&self, payment_id: &str) -> VoyageResult<Vec<Booking>> {
    load_all(self.store.as_ref(), BOOKINGS, &Query::all().where_eq("paymentId", payment_id)).await
  }

  pub async fn all_bookings(&self) -> VoyageResult<Vec<Booking>> {
    let query = Query::all().order_by("bookingDate", Direction::Descending);
    load_all(self.store.as_ref(), BOOKINGS, &query).await
  }

  pub async fn count(&self) -> VoyageResult<u64> {
    Ok(self.store.count(BOOKINGS, &Query::all()).await?)
  }

  pub async fn count_with_status(&self, status: BookingStatus) -> VoyageResult<u64> {
    Ok(self.store.count(BOOKINGS, &Query::all().where_eq("status", status.as_str())).await?)
  }

  /// Links the bookings to the payment that covers them.
  pub async fn assign_payment(&self, booking_ids: &[String], payment_id: &str) -> VoyageResult<()> {
    for id in booking_ids {
      let fields = patch([
        ("paymentId", json!(payment_id)),
        ("updatedAt", json!(self.clock.now().timestamp_millis())),
      ]);
      if !self.store.update(BOOKINGS, id, fields).await? {
        return Err(VoyageError::missing(BOOKINGS, id));
      }
    }
    Ok(())
  }

  /// Moves a booking along the status graph. Illegal edges fail with
  /// `InvalidTransition` and leave the booking untouched.
  #[instrument(name = "BookingRepository::update_booking_status", skip(self), err(Display))]
  pub async fn update_booking_status(&self, id: &str, status: BookingStatus) -> VoyageResult<Booking> {
    let booking: Booking = load_required(self.store.as_ref(), BOOKINGS, id).await?;
    if !booking.status.can_transition_to(status) {
      return Err(VoyageError::InvalidTransition {
        from: booking.status,
        to: status,
      });
    }
    if booking.status == status {
      return Ok(booking);
    }
    self.write_status(booking, status).await
  }

  /// Administrative correction: writes any status regardless of the graph.
  #[instrument(name = "BookingRepository::override_booking_status", skip(self), err(Display))]
  pub async fn override_booking_status(&self, id: &str, status: BookingStatus) -> VoyageResult<Booking> {
    let booking: Booking = load_required(self.store.as_ref(), BOOKINGS, id).await?;
    if !booking.status.can_transition_to(status) {
      warn!(from = %booking.status, to = %status, "booking status overridden outside the status graph");
    }
    if booking.status == status {
      return Ok(booking);
    }
    self.write_status(booking, status).await
  }

  /// Cancels and gives the seats back to the departure.
  pub async fn cancel_booking(&self, id: &str) -> VoyageResult<Booking> {
    self.update_booking_status(id, BookingStatus::Cancelled).await
  }

  pub async fn complete_booking(&self, id: &str) -> VoyageResult<Booking> {
    self.update_booking_status(id, BookingStatus::Completed).await
  }

  /// Completes every PAID booking whose travel ended before `now`.
  /// Returns the ids that were transitioned.
  #[instrument(name = "BookingRepository::complete_past_bookings", skip(self), err(Display))]
  pub async fn complete_past_bookings(&self, now: DateTime<Utc>) -> VoyageResult<Vec<String>> {
    let query = Query::all()
      .where_eq("status", BookingStatus::Paid.as_str())
      .filter("travelEndDate", FilterOp::Lt, now.timestamp_millis());
    let due: Vec<Booking> = load_all(self.store.as_ref(), BOOKINGS, &query).await?;

    let mut completed = Vec::with_capacity(due.len());
    for booking in due {
      let id = booking.id.clone();
      self.write_status(booking, BookingStatus::Completed).await?;
      completed.push(id);
    }
    if !completed.is_empty() {
      info!(count = completed.len(), "past bookings completed");
    }
    Ok(completed)
  }

  /// Live view of the user's bookings, most recent first.
  pub fn watch_user_bookings(&self, user_id: &str) -> Subscription<Vec<Booking>> {
    let repo = self.clone();
    let user_id = user_id.to_string();
    watch(self.store.clone(), vec![BOOKINGS.to_string()], move || {
      let repo = repo.clone();
      let user_id = user_id.clone();
      async move { repo.bookings_for_user(&user_id).await }
    })
  }

  async fn write_status(&self, mut booking: Booking, status: BookingStatus) -> VoyageResult<Booking> {
    let from = booking.status;
    // Seats follow the booking: taken back when it stops holding them, taken
    // again if an override revives it. A failed status write leaves seat
    // counts unchanged.
    let reviving = !from.holds_seats() && status.holds_seats();
    if reviving {
      self.packages.reserve_seats(&booking.departure_id, booking.traveler_count).await?;
    }

    booking.status = status;
    booking.updated_at = self.clock.now();
    let fields = patch([
      ("status", json!(status)),
      ("updatedAt", json!(booking.updated_at.timestamp_millis())),
    ]);
    let written = match self.store.update(BOOKINGS, &booking.id, fields).await {
      Ok(true) => Ok(()),
      Ok(false) => Err(VoyageError::missing(BOOKINGS, &booking.id)),
      Err(e) => Err(VoyageError::from(e)),
    };
    if let Err(e) = written {
      if reviving {
        if let Err(undo) = self.packages.release_seats(&booking.departure_id, booking.traveler_count).await {
          error!(booking_id = %booking.id, error = %undo, "failed to return seats after a failed status write");
        }
      }
      return Err(e);
    }

    if from.holds_seats() && !status.holds_seats() {
      self.packages.release_seats(&booking.departure_id, booking.traveler_count).await?;
    }
    info!(booking_id = %booking.id, %from, to = %status, "booking status changed");
    Ok(booking)
  }
}
