// voyage/src/repository/payments.rs

use super::bookings::BookingRepository;
use super::{load, load_all, save};
use crate::booking::status::BookingStatus;
use crate::clock::Clock;
use crate::error::{VoyageError, VoyageResult};
use crate::model::{Cents, GatewayOutcome, Payment, PaymentMethod, PaymentStatus};
use crate::store::collections::PAYMENTS;
use crate::store::{patch, Direction, DocumentStore, Query};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Clone)]
pub struct PaymentRepository {
  store: Arc<dyn DocumentStore>,
  clock: Arc<dyn Clock>,
  bookings: BookingRepository,
}

impl PaymentRepository {
  pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>, bookings: BookingRepository) -> Self {
    Self { store, clock, bookings }
  }

  #[instrument(name = "PaymentRepository::create_payment", skip(self, booking_ids), err(Display))]
  pub async fn create_payment(
    &self,
    user_id: &str,
    booking_ids: &[String],
    amount_cents: Cents,
    method: PaymentMethod,
  ) -> VoyageResult<Payment> {
    if amount_cents <= 0 {
      return Err(VoyageError::invalid("amountCents", "Payment amount must be positive."));
    }
    let now = self.clock.now();
    let mut payment = Payment {
      id: String::new(),
      user_id: user_id.to_string(),
      booking_ids: booking_ids.to_vec(),
      amount_cents,
      method,
      status: PaymentStatus::Pending,
      gateway_transaction_id: None,
      created_at: now,
      updated_at: now,
    };
    payment.id = save(self.store.as_ref(), PAYMENTS, "", &payment).await?;
    Ok(payment)
  }

  pub async fn get_payment(&self, id: &str) -> VoyageResult<Option<Payment>> {
    load(self.store.as_ref(), PAYMENTS, id).await
  }

  pub async fn payments_for_user(&self, user_id: &str) -> VoyageResult<Vec<Payment>> {
    let query = Query::all()
      .where_eq("userId", user_id)
      .order_by("createdAt", Direction::Descending);
    load_all(self.store.as_ref(), PAYMENTS, &query).await
  }

  pub async fn find_by_transaction(&self, transaction_id: &str) -> VoyageResult<Option<Payment>> {
    let query = Query::all().where_eq("gatewayTransactionId", transaction_id).limit(1);
    Ok(load_all(self.store.as_ref(), PAYMENTS, &query).await?.into_iter().next())
  }

  pub async fn set_gateway_transaction(&self, payment_id: &str, transaction_id: &str) -> VoyageResult<()> {
    self
      .patch_payment(payment_id, [("gatewayTransactionId", json!(transaction_id))])
      .await
  }

  pub async fn set_status(&self, payment_id: &str, status: PaymentStatus) -> VoyageResult<()> {
    self.patch_payment(payment_id, [("status", json!(status))]).await
  }

  /// Sum of all succeeded payments.
  pub async fn revenue_cents(&self) -> VoyageResult<Cents> {
    let query = Query::all().where_eq("status", PaymentStatus::Succeeded.as_str());
    let payments: Vec<Payment> = load_all(self.store.as_ref(), PAYMENTS, &query).await?;
    Ok(payments.iter().map(|p| p.amount_cents).sum())
  }

  /// Applies a gateway verdict to the payment and to every booking it covers:
  /// SUCCEEDED pays them, FAILED cancels them, REFUNDED refunds them.
  /// Verdicts the payment can no longer take (see
  /// [`PaymentStatus::can_transition_to`]) are logged and ignored, as are
  /// bookings that can no longer take the matching edge.
  #[instrument(name = "PaymentRepository::apply_gateway_callback", skip(self), err(Display))]
  pub async fn apply_gateway_callback(&self, transaction_id: &str, outcome: GatewayOutcome) -> VoyageResult<Payment> {
    let mut payment = self
      .find_by_transaction(transaction_id)
      .await?
      .ok_or_else(|| VoyageError::missing(PAYMENTS, transaction_id))?;
    let status = outcome.payment_status();
    if payment.status == status {
      info!(payment_id = %payment.id, "gateway callback already applied");
      return Ok(payment);
    }
    if !payment.status.can_transition_to(status) {
      warn!(
        payment_id = %payment.id,
        from = payment.status.as_str(),
        to = status.as_str(),
        "gateway callback ignored; payment cannot take that status"
      );
      return Ok(payment);
    }
    self.set_status(&payment.id, status).await?;
    payment.status = status;
    payment.updated_at = self.clock.now();

    let target = match outcome {
      GatewayOutcome::Succeeded => BookingStatus::Paid,
      GatewayOutcome::Failed => BookingStatus::Cancelled,
      GatewayOutcome::Refunded => BookingStatus::Refunded,
    };
    for booking_id in &payment.booking_ids {
      match self.bookings.update_booking_status(booking_id, target).await {
        Ok(_) => {}
        Err(VoyageError::InvalidTransition { from, to }) => {
          warn!(%booking_id, %from, %to, "booking skipped by gateway callback");
        }
        Err(e) => return Err(e),
      }
    }
    info!(payment_id = %payment.id, status = status.as_str(), "gateway callback applied");
    Ok(payment)
  }

  async fn patch_payment<const N: usize>(
    &self,
    payment_id: &str,
    fields: [(&str, serde_json::Value); N],
  ) -> VoyageResult<()> {
    let mut fields = patch(fields);
    fields.insert("updatedAt".to_string(), json!(self.clock.now().timestamp_millis()));
    if self.store.update(PAYMENTS, payment_id, fields).await? {
      Ok(())
    } else {
      Err(VoyageError::missing(PAYMENTS, payment_id))
    }
  }
}
