// voyage/src/model/booking.rs

use super::{BookingStatus, Cents};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A confirmed-intent record tying a user, a package departure and a payment together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
  #[serde(default)]
  pub id: String,
  pub user_id: String,
  pub package_id: String,
  pub cart_id: String,
  pub cart_item_id: String,
  #[serde(default)]
  pub payment_id: Option<String>,
  pub departure_id: String,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub travel_start_date: DateTime<Utc>,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub travel_end_date: DateTime<Utc>,
  pub traveler_count: u32,
  pub subtotal_cents: Cents,
  pub discount_cents: Cents,
  pub tax_cents: Cents,
  /// `subtotal_cents - discount_cents + tax_cents`.
  pub total_cents: Cents,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub booking_date: DateTime<Utc>,
  pub status: BookingStatus,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub updated_at: DateTime<Utc>,
}

impl Booking {
  pub fn amounts_balance(&self) -> bool {
    self.total_cents == self.subtotal_cents - self.discount_cents + self.tax_cents
  }
}
