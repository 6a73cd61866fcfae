// voyage/src/model/mod.rs

//! Records stored in the document store. Plain data, serialized camelCase,
//! timestamps as epoch milliseconds, money as integer cents.

pub mod activity;
pub mod booking;
pub mod cart;
pub mod notification;
pub mod package;
pub mod payment;
pub mod user;

pub use crate::booking::status::BookingStatus;
pub use activity::ActivityEntry;
pub use booking::Booking;
pub use cart::{Cart, CartItem, NewCartItem};
pub use notification::{Audience, Notification, NotificationKind, ScheduleStatus, ScheduledNotification};
pub use package::{
  DepartureAndEndTime, ItineraryDay, PackageImage, PackageStatus, PackageWithImages, TravelPackage, Trip,
};
pub use payment::{GatewayOutcome, Payment, PaymentMethod, PaymentStatus};
pub use user::{User, UserType};

/// Money in minor units (cents).
pub type Cents = i64;

/// Formats cents as `1234.50`.
pub fn format_cents(cents: Cents) -> String {
  let sign = if cents < 0 { "-" } else { "" };
  let abs = cents.unsigned_abs();
  format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
  use super::format_cents;

  #[test]
  fn formats_minor_units() {
    assert_eq!(format_cents(294_800), "2948.00");
    assert_eq!(format_cents(5), "0.05");
    assert_eq!(format_cents(-1_050), "-10.50");
  }
}
