// voyage/src/booking/status.rs

//! The booking status graph.
//!
//! ```text
//! PENDING -> CONFIRMED -> PAID -> COMPLETED
//!    \            \          \
//!     +------------+----------+--> CANCELLED | REFUNDED
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
  Pending,
  Confirmed,
  Paid,
  Completed,
  Cancelled,
  Refunded,
}

impl BookingStatus {
  pub const ALL: [BookingStatus; 6] = [
    BookingStatus::Pending,
    BookingStatus::Confirmed,
    BookingStatus::Paid,
    BookingStatus::Completed,
    BookingStatus::Cancelled,
    BookingStatus::Refunded,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      BookingStatus::Pending => "PENDING",
      BookingStatus::Confirmed => "CONFIRMED",
      BookingStatus::Paid => "PAID",
      BookingStatus::Completed => "COMPLETED",
      BookingStatus::Cancelled => "CANCELLED",
      BookingStatus::Refunded => "REFUNDED",
    }
  }

  pub fn is_terminal(self) -> bool {
    matches!(
      self,
      BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::Refunded
    )
  }

  /// Whether `self -> next` is an edge of the status graph. Re-writing the
  /// current status is always allowed.
  pub fn can_transition_to(self, next: BookingStatus) -> bool {
    use BookingStatus::*;
    if self == next {
      return true;
    }
    match (self, next) {
      (Pending, Confirmed) | (Confirmed, Paid) | (Paid, Completed) => true,
      (from, Cancelled | Refunded) => !from.is_terminal(),
      _ => false,
    }
  }

  /// Whether the booking still holds seats on its departure.
  pub fn holds_seats(self) -> bool {
    !matches!(self, BookingStatus::Cancelled | BookingStatus::Refunded)
  }
}

impl fmt::Display for BookingStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for BookingStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    BookingStatus::ALL
      .into_iter()
      .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| format!("unknown booking status '{}'", s))
  }
}

#[cfg(test)]
mod tests {
  use super::BookingStatus::{self, *};

  #[test]
  fn forward_path_is_legal() {
    assert!(Pending.can_transition_to(Confirmed));
    assert!(Confirmed.can_transition_to(Paid));
    assert!(Paid.can_transition_to(Completed));
  }

  #[test]
  fn skipping_or_reversing_is_illegal() {
    assert!(!Pending.can_transition_to(Paid));
    assert!(!Pending.can_transition_to(Completed));
    assert!(!Paid.can_transition_to(Confirmed));
    assert!(!Completed.can_transition_to(Pending));
  }

  #[test]
  fn side_exits_only_before_completion() {
    for from in [Pending, Confirmed, Paid] {
      assert!(from.can_transition_to(Cancelled), "{from} -> CANCELLED");
      assert!(from.can_transition_to(Refunded), "{from} -> REFUNDED");
    }
    assert!(!Completed.can_transition_to(Cancelled));
    assert!(!Cancelled.can_transition_to(Refunded));
    assert!(!Refunded.can_transition_to(Cancelled));
  }

  #[test]
  fn terminal_states_only_allow_themselves() {
    for from in BookingStatus::ALL.into_iter().filter(|s| s.is_terminal()) {
      for to in BookingStatus::ALL {
        assert_eq!(from.can_transition_to(to), from == to, "{from} -> {to}");
      }
    }
  }

  #[test]
  fn parses_case_insensitively_and_matches_serde() {
    assert_eq!("paid".parse::<BookingStatus>().unwrap(), Paid);
    assert!("shipped".parse::<BookingStatus>().is_err());
    assert_eq!(serde_json::to_value(Cancelled).unwrap(), serde_json::json!("CANCELLED"));
  }
}
