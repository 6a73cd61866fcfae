// voyage/src/model/payment.rs

use super::Cents;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
  Card,
  Wallet,
  BankTransfer,
  PayAtCounter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
  Pending,
  Succeeded,
  Failed,
  Refunded,
}

impl PaymentStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      PaymentStatus::Pending => "PENDING",
      PaymentStatus::Succeeded => "SUCCEEDED",
      PaymentStatus::Failed => "FAILED",
      PaymentStatus::Refunded => "REFUNDED",
    }
  }

  /// FAILED and REFUNDED are settled for good.
  pub fn is_final(self) -> bool {
    matches!(self, PaymentStatus::Failed | PaymentStatus::Refunded)
  }

  /// PENDING settles to SUCCEEDED or FAILED; only a SUCCEEDED payment can
  /// be REFUNDED. Re-writing the current status is always allowed.
  pub fn can_transition_to(self, next: PaymentStatus) -> bool {
    use PaymentStatus::*;
    self == next || matches!((self, next), (Pending, Succeeded | Failed) | (Succeeded, Refunded))
  }
}

/// One payment, possibly covering several bookings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
  #[serde(default)]
  pub id: String,
  pub user_id: String,
  pub booking_ids: Vec<String>,
  pub amount_cents: Cents,
  pub method: PaymentMethod,
  pub status: PaymentStatus,
  #[serde(default)]
  pub gateway_transaction_id: Option<String>,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub created_at: DateTime<Utc>,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub updated_at: DateTime<Utc>,
}

/// Final word from the payment gateway about a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayOutcome {
  Succeeded,
  Failed,
  Refunded,
}

impl GatewayOutcome {
  pub fn payment_status(self) -> PaymentStatus {
    match self {
      GatewayOutcome::Succeeded => PaymentStatus::Succeeded,
      GatewayOutcome::Failed => PaymentStatus::Failed,
      GatewayOutcome::Refunded => PaymentStatus::Refunded,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::PaymentStatus::{self, *};

  #[test]
  fn settled_payments_do_not_move() {
    for from in [Failed, Refunded] {
      assert!(from.is_final());
      for to in [Pending, Succeeded, Failed, Refunded] {
        assert_eq!(from.can_transition_to(to), from == to, "{:?} -> {:?}", from, to);
      }
    }
  }

  #[test]
  fn refund_only_after_success() {
    assert!(Succeeded.can_transition_to(Refunded));
    assert!(!Pending.can_transition_to(Refunded));
    assert!(!Succeeded.can_transition_to(Failed));
    assert!(Pending.can_transition_to(Failed));
    assert!(!PaymentStatus::Succeeded.can_transition_to(Pending));
  }
}
