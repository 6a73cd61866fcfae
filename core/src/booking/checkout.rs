// voyage/src/booking/checkout.rs

//! Turning a cart into bookings and a payment.
//!
//! Checkout runs as a `Pipeline` over [`CheckoutState`]:
//! `load_cart -> price_items -> reserve_seats -> create_bookings ->
//! initiate_payment -> confirm_bookings -> invalidate_cart -> notify_user`.
//! When a step fails after seats were taken, the run is compensated: bookings
//! created so far are cancelled (which frees their seats), seats not yet owned
//! by a booking are released and a created payment is marked FAILED. A
//! transaction the gateway already opened is voided first; if that fails the
//! payment stays PENDING and the gateway's callback settles it.

use super::pricing::{quote_items, BookingQuote};
use super::status::BookingStatus;
use crate::clock::Clock;
use crate::error::{VoyageError, VoyageResult, WorkflowError};
use crate::model::{Booking, Cart, CartItem, Cents, Notification, NotificationKind, Payment, PaymentMethod, PaymentStatus};
use crate::repository::{BookingRepository, CartRepository, NotificationRepository, PackageRepository, PaymentRepository};
use crate::settings::VoyageSettings;
use crate::workflow::{ContextData, Pipeline, PipelineControl};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// What the gateway needs to open a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
  pub payment_id: String,
  pub user_id: String,
  pub amount_cents: Cents,
  pub method: PaymentMethod,
}

/// External payment processor. The final outcome arrives later through
/// `PaymentRepository::apply_gateway_callback`.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
  /// Opens a transaction and returns its id.
  async fn initiate(&self, request: &PaymentRequest) -> VoyageResult<String>;

  /// Cancels a transaction opened by `initiate` that checkout could not finish.
  async fn void(&self, transaction_id: &str) -> VoyageResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
  pub payment: Payment,
  pub bookings: Vec<Booking>,
  pub transaction_id: String,
}

/// Context threaded through the checkout steps.
#[derive(Debug, Clone)]
pub struct CheckoutState {
  pub user_id: String,
  pub method: PaymentMethod,
  pub cart: Option<Cart>,
  pub quoted: Vec<(CartItem, BookingQuote)>,
  /// Seats taken but not yet owned by a booking: `(departure id, seats)`.
  pub reserved: Vec<(String, u32)>,
  pub bookings: Vec<Booking>,
  pub payment: Option<Payment>,
  pub transaction_id: Option<String>,
}

impl CheckoutState {
  fn new(user_id: &str, method: PaymentMethod) -> Self {
    Self {
      user_id: user_id.to_string(),
      method,
      cart: None,
      quoted: Vec::new(),
      reserved: Vec::new(),
      bookings: Vec::new(),
      payment: None,
      transaction_id: None,
    }
  }
}

fn required<T>(value: Option<T>, step: &str, field: &'static str) -> VoyageResult<T> {
  value.ok_or_else(|| {
    VoyageError::from(WorkflowError::MissingContext {
      step_name: step.to_string(),
      field,
    })
  })
}

#[derive(Clone)]
pub struct CheckoutService {
  bookings: BookingRepository,
  packages: PackageRepository,
  payments: PaymentRepository,
  gateway: Arc<dyn PaymentGateway>,
  pipeline: Arc<Pipeline<CheckoutState, VoyageError>>,
}

impl CheckoutService {
  pub fn new(
    carts: CartRepository,
    packages: PackageRepository,
    bookings: BookingRepository,
    payments: PaymentRepository,
    notifications: NotificationRepository,
    gateway: Arc<dyn PaymentGateway>,
    clock: Arc<dyn Clock>,
    settings: VoyageSettings,
  ) -> Self {
    let mut p = Pipeline::<CheckoutState, VoyageError>::new(
      "checkout",
      &[
        ("load_cart", false, None),
        ("price_items", false, None),
        ("reserve_seats", false, None),
        ("create_bookings", false, None),
        ("initiate_payment", false, None),
        ("confirm_bookings", false, None),
        ("invalidate_cart", false, None),
        ("notify_user", true, None),
      ],
    );

    let carts_for_load = carts.clone();
    p.on_step("load_cart", move |ctx: ContextData<CheckoutState>| {
      let carts = carts_for_load.clone();
      async move {
        let user_id = ctx.read().user_id.clone();
        let Some(cart) = carts.active_cart(&user_id).await? else {
          return Err(VoyageError::invalid("cart", "Your cart is empty."));
        };
        let items = carts.live_items(&cart).await;
        if items.is_empty() {
          return Err(VoyageError::invalid("cart", "Your cart has no items that can be booked."));
        }
        if items.len() < cart.item_ids.len() {
          info!(
            skipped = cart.item_ids.len() - items.len(),
            "expired or unreadable cart items left out of checkout"
          );
        }
        let mut state = ctx.write();
        state.quoted = items.into_iter().map(|item| (item, BookingQuote::default())).collect();
        state.cart = Some(cart);
        Ok::<_, VoyageError>(PipelineControl::Continue)
      }
    });

    let pricing = settings.clone();
    p.on_step("price_items", move |ctx: ContextData<CheckoutState>| {
      let settings = pricing.clone();
      async move {
        let mut state = ctx.write();
        let items: Vec<CartItem> = state.quoted.iter().map(|(item, _)| item.clone()).collect();
        let quotes = quote_items(&items, settings.discount.as_ref(), settings.tax);
        for ((_, quote), priced) in state.quoted.iter_mut().zip(quotes) {
          *quote = priced;
        }
        Ok::<_, VoyageError>(PipelineControl::Continue)
      }
    });

    let seat_packages = packages.clone();
    p.on_step("reserve_seats", move |ctx: ContextData<CheckoutState>| {
      let packages = seat_packages.clone();
      async move {
        let wanted: Vec<(String, u32)> = ctx.with(|state| {
          state
            .quoted
            .iter()
            .map(|(item, _)| (item.departure_id.clone(), item.traveler_count))
            .collect()
        });
        for (departure_id, seats) in wanted {
          packages.reserve_seats(&departure_id, seats).await?;
          ctx.write().reserved.push((departure_id, seats));
        }
        Ok::<_, VoyageError>(PipelineControl::Continue)
      }
    });

    let booking_repo = bookings.clone();
    p.on_step("create_bookings", move |ctx: ContextData<CheckoutState>| {
      let bookings = booking_repo.clone();
      async move {
        let (user_id, cart_id, quoted) = {
          let state = ctx.read();
          let cart = required(state.cart.as_ref(), "create_bookings", "cart")?;
          (state.user_id.clone(), cart.id.clone(), state.quoted.clone())
        };
        for (item, quote) in &quoted {
          let booking = bookings.create_booking(&user_id, &cart_id, item, *quote).await?;
          // The booking now owns these seats.
          let mut state = ctx.write();
          if let Some(pos) = state
            .reserved
            .iter()
            .position(|(dep, seats)| *dep == item.departure_id && *seats == item.traveler_count)
          {
            state.reserved.remove(pos);
          }
          state.bookings.push(booking);
        }
        Ok::<_, VoyageError>(PipelineControl::Continue)
      }
    });

    let payment_repo = payments.clone();
    let payment_bookings = bookings.clone();
    let payment_gateway = gateway.clone();
    p.on_step("initiate_payment", move |ctx: ContextData<CheckoutState>| {
      let payments = payment_repo.clone();
      let bookings = payment_bookings.clone();
      let gateway = payment_gateway.clone();
      async move {
        let (user_id, method, booking_ids, amount) = ctx.with(|state| {
          (
            state.user_id.clone(),
            state.method,
            state.bookings.iter().map(|b| b.id.clone()).collect::<Vec<_>>(),
            state.bookings.iter().map(|b| b.total_cents).sum::<Cents>(),
          )
        });
        let mut payment = payments.create_payment(&user_id, &booking_ids, amount, method).await?;
        ctx.write().payment = Some(payment.clone());
        bookings.assign_payment(&booking_ids, &payment.id).await?;

        let request = PaymentRequest {
          payment_id: payment.id.clone(),
          user_id,
          amount_cents: amount,
          method,
        };
        let transaction_id = gateway.initiate(&request).await?;
        ctx.write().transaction_id = Some(transaction_id.clone());
        payments.set_gateway_transaction(&payment.id, &transaction_id).await?;
        payment.gateway_transaction_id = Some(transaction_id.clone());

        let mut state = ctx.write();
        for booking in state.bookings.iter_mut() {
          booking.payment_id = Some(payment.id.clone());
        }
        state.payment = Some(payment);
        Ok::<_, VoyageError>(PipelineControl::Continue)
      }
    });

    let confirm_repo = bookings.clone();
    p.on_step("confirm_bookings", move |ctx: ContextData<CheckoutState>| {
      let bookings = confirm_repo.clone();
      async move {
        let ids: Vec<String> = ctx.with(|state| state.bookings.iter().map(|b| b.id.clone()).collect());
        let mut confirmed = Vec::with_capacity(ids.len());
        for id in ids {
          confirmed.push(bookings.update_booking_status(&id, BookingStatus::Confirmed).await?);
        }
        ctx.write().bookings = confirmed;
        Ok::<_, VoyageError>(PipelineControl::Continue)
      }
    });

    p.on_step("invalidate_cart", move |ctx: ContextData<CheckoutState>| {
      let carts = carts.clone();
      async move {
        let cart_id = {
          let state = ctx.read();
          required(state.cart.as_ref(), "invalidate_cart", "cart")?.id.clone()
        };
        carts.invalidate_cart(&cart_id).await?;
        Ok::<_, VoyageError>(PipelineControl::Continue)
      }
    });

    p.on_step("notify_user", move |ctx: ContextData<CheckoutState>| {
      let notifications = notifications.clone();
      let clock = clock.clone();
      async move {
        let (user_id, count) = ctx.with(|state| (state.user_id.clone(), state.bookings.len()));
        let notification = Notification {
          id: String::new(),
          user_id,
          title: "Booking confirmed".to_string(),
          message: format!("{} booking(s) confirmed. Payment is being processed.", count),
          kind: NotificationKind::Booking,
          is_read: false,
          created_at: clock.now(),
          scheduled_notification_id: None,
        };
        notifications.create_notification(&notification).await?;
        Ok::<_, VoyageError>(PipelineControl::Continue)
      }
    });

    Self {
      bookings,
      packages,
      payments,
      gateway,
      pipeline: Arc::new(p),
    }
  }

  /// Checks out the user's active cart. On success the payment is PENDING
  /// (awaiting the gateway callback), the bookings are CONFIRMED and the cart
  /// is no longer valid.
  #[instrument(name = "CheckoutService::checkout", skip(self), err(Display))]
  pub async fn checkout(&self, user_id: &str, method: PaymentMethod) -> VoyageResult<CheckoutReceipt> {
    let ctx = ContextData::new(CheckoutState::new(user_id, method));
    if let Err(e) = self.pipeline.run(ctx.clone()).await {
      self.compensate(&ctx).await;
      return Err(e);
    }

    let state = ctx.snapshot();
    let receipt = CheckoutReceipt {
      payment: required(state.payment, "checkout", "payment")?,
      bookings: state.bookings,
      transaction_id: required(state.transaction_id, "checkout", "transaction_id")?,
    };
    info!(
      payment_id = %receipt.payment.id,
      bookings = receipt.bookings.len(),
      amount = receipt.payment.amount_cents,
      "checkout completed"
    );
    Ok(receipt)
  }

  /// Best effort: every undo is attempted, failures are logged.
  async fn compensate(&self, ctx: &ContextData<CheckoutState>) {
    let state = ctx.snapshot();
    for booking in &state.bookings {
      if let Err(e) = self.bookings.cancel_booking(&booking.id).await {
        error!(booking_id = %booking.id, error = %e, "failed to cancel booking during checkout rollback");
      }
    }
    for (departure_id, seats) in &state.reserved {
      if let Err(e) = self.packages.release_seats(departure_id, *seats).await {
        error!(%departure_id, error = %e, "failed to release seats during checkout rollback");
      }
    }
    if let Some(payment) = &state.payment {
      let voided = match &state.transaction_id {
        None => true,
        Some(transaction_id) => match self.gateway.void(transaction_id).await {
          Ok(()) => true,
          Err(e) => {
            error!(
              payment_id = %payment.id,
              %transaction_id,
              error = %e,
              "failed to void gateway transaction; payment left pending for the gateway callback"
            );
            false
          }
        },
      };
      if voided {
        if let Err(e) = self.payments.set_status(&payment.id, PaymentStatus::Failed).await {
          error!(payment_id = %payment.id, error = %e, "failed to mark payment failed during checkout rollback");
        }
      }
    }
    if !state.bookings.is_empty() || !state.reserved.is_empty() {
      warn!(
        bookings = state.bookings.len(),
        seats_released = state.reserved.len(),
        "checkout rolled back"
      );
    }
  }
}
