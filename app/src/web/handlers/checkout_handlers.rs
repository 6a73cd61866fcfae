// voyage_app/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extract::AuthenticatedUser;
use voyage::model::{Booking, PaymentMethod};

#[derive(Deserialize, Debug)]
pub struct CheckoutPayload {
  pub method: PaymentMethod,
}

#[instrument(
  name = "handler::checkout",
  skip(app_state, auth_user, req_payload),
  fields(user_id = %auth_user.user_id, method = ?req_payload.method)
)]
pub async fn start_checkout_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<CheckoutPayload>,
) -> Result<HttpResponse, AppError> {
  match app_state
    .voyage
    .checkout
    .checkout(&auth_user.user_id, req_payload.method)
    .await
  {
    Ok(receipt) => {
      info!(payment_id = %receipt.payment.id, "Checkout accepted, awaiting payment confirmation.");
      Ok(HttpResponse::Accepted().json(receipt))
    }
    Err(e) => {
      warn!(error = %e, "Checkout failed.");
      Err(e.into())
    }
  }
}

pub async fn list_bookings_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let bookings = app_state.voyage.bookings.bookings_for_user(&auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(bookings))
}

async fn owned_booking(app_state: &AppState, user_id: &str, booking_id: &str) -> Result<Booking, AppError> {
  match app_state.voyage.bookings.get_booking(booking_id).await? {
    Some(booking) if booking.user_id == user_id => Ok(booking),
    _ => Err(AppError::NotFound(format!("booking '{}'", booking_id))),
  }
}

pub async fn get_booking_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  booking_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let booking = owned_booking(&app_state, &auth_user.user_id, &booking_id).await?;
  Ok(HttpResponse::Ok().json(booking))
}

#[instrument(name = "handler::cancel_booking", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn cancel_booking_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  booking_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  owned_booking(&app_state, &auth_user.user_id, &booking_id).await?;
  let booking = app_state.voyage.bookings.cancel_booking(&booking_id).await?;
  Ok(HttpResponse::Ok().json(booking))
}
