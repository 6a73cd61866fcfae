// voyage_app/src/web/handlers/admin_handlers.rs

//! Administrator-only catalog, booking and notification management.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extract::AuthenticatedUser;
use voyage::model::{Cents, DepartureAndEndTime, PackageImage, PackageStatus, TravelPackage, Trip};
use voyage::{BookingStatus, ScheduleRequest};

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewPackagePayload {
  pub name: String,
  #[serde(default)]
  pub description: String,
  pub location: String,
  pub pricing: BTreeMap<String, Cents>,
  pub duration_days: u32,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewDeparturePayload {
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub start_date: DateTime<Utc>,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub end_date: DateTime<Utc>,
  pub capacity: u32,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewTripPayload {
  pub day: u32,
  pub title: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub location: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewImagePayload {
  pub url: String,
  #[serde(default)]
  pub is_primary: bool,
  #[serde(default)]
  pub position: u32,
}

#[derive(Deserialize, Debug)]
pub struct StatusPayload {
  pub status: BookingStatus,
}

pub async fn dashboard_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  app_state.require_admin(&auth_user.user_id).await?;
  let stats = app_state.voyage.dashboard.stats().await?;
  Ok(HttpResponse::Ok().json(stats))
}

pub async fn list_users_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  app_state.require_admin(&auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(app_state.voyage.users.all_users().await?))
}

pub async fn list_all_bookings_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  app_state.require_admin(&auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(app_state.voyage.bookings.all_bookings().await?))
}

/// Runs the PAID -> COMPLETED sweep now.
#[instrument(name = "handler::completion_sweep", skip_all, fields(admin = %auth_user.user_id))]
pub async fn completion_sweep_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  app_state.require_admin(&auth_user.user_id).await?;
  let voyage = &app_state.voyage;
  let completed = voyage.bookings.complete_past_bookings(voyage.clock.now()).await?;
  info!(completed = completed.len(), "Manual completion sweep finished.");
  Ok(HttpResponse::Ok().json(json!({ "completed": completed })))
}

/// Sets a booking status without checking the status graph.
#[instrument(name = "handler::override_booking_status", skip_all, fields(admin = %auth_user.user_id, booking_id = %booking_id))]
pub async fn override_booking_status_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  booking_id: web::Path<String>,
  req_payload: web::Json<StatusPayload>,
) -> Result<HttpResponse, AppError> {
  app_state.require_admin(&auth_user.user_id).await?;
  warn!(status = %req_payload.status, "Administrator overriding booking status.");
  let booking = app_state
    .voyage
    .bookings
    .override_booking_status(&booking_id, req_payload.status)
    .await?;
  Ok(HttpResponse::Ok().json(booking))
}

pub async fn create_package_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<NewPackagePayload>,
) -> Result<HttpResponse, AppError> {
  app_state.require_admin(&auth_user.user_id).await?;
  let payload = req_payload.into_inner();
  let mut package = TravelPackage {
    id: String::new(),
    name: payload.name,
    description: payload.description,
    location: payload.location,
    pricing: payload.pricing,
    duration_days: payload.duration_days,
    trip_ids: Vec::new(),
    status: PackageStatus::Available,
    created_at: app_state.voyage.clock.now(),
  };
  package.id = app_state.voyage.packages.create_package(&package).await?;
  Ok(HttpResponse::Created().json(package))
}

pub async fn delete_package_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  package_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  app_state.require_admin(&auth_user.user_id).await?;
  if app_state.voyage.packages.delete_package(&package_id).await? {
    Ok(HttpResponse::NoContent().finish())
  } else {
    Err(AppError::NotFound(format!("package '{}'", package_id)))
  }
}

pub async fn add_departure_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  package_id: web::Path<String>,
  req_payload: web::Json<NewDeparturePayload>,
) -> Result<HttpResponse, AppError> {
  app_state.require_admin(&auth_user.user_id).await?;
  let mut departure = DepartureAndEndTime {
    id: String::new(),
    package_id: package_id.into_inner(),
    start_date: req_payload.start_date,
    end_date: req_payload.end_date,
    capacity: req_payload.capacity,
    booked_count: 0,
  };
  departure.id = app_state.voyage.packages.add_departure(&departure).await?;
  Ok(HttpResponse::Created().json(departure))
}

/// Creates a trip and appends it to the package's itinerary.
pub async fn add_trip_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  package_id: web::Path<String>,
  req_payload: web::Json<NewTripPayload>,
) -> Result<HttpResponse, AppError> {
  app_state.require_admin(&auth_user.user_id).await?;
  let voyage = &app_state.voyage;
  let mut package = voyage
    .packages
    .get_package(&package_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("package '{}'", package_id)))?;
  let payload = req_payload.into_inner();
  let mut trip = Trip {
    id: String::new(),
    package_id: package.id.clone(),
    day: payload.day,
    title: payload.title,
    description: payload.description,
    location: payload.location,
  };
  trip.id = voyage.trips.create_trip(&trip).await?;
  package.trip_ids.push(trip.id.clone());
  voyage.packages.update_package(&package).await?;
  Ok(HttpResponse::Created().json(trip))
}

pub async fn add_image_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  package_id: web::Path<String>,
  req_payload: web::Json<NewImagePayload>,
) -> Result<HttpResponse, AppError> {
  app_state.require_admin(&auth_user.user_id).await?;
  let mut image = PackageImage {
    id: String::new(),
    package_id: package_id.into_inner(),
    url: req_payload.url.clone(),
    is_primary: req_payload.is_primary,
    position: req_payload.position,
  };
  image.id = app_state.voyage.packages.add_image(&image).await?;
  Ok(HttpResponse::Created().json(image))
}

#[instrument(name = "handler::schedule_notification", skip_all, fields(admin = %auth_user.user_id))]
pub async fn schedule_notification_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<ScheduleRequest>,
) -> Result<HttpResponse, AppError> {
  let admin = app_state.require_admin(&auth_user.user_id).await?;
  let mut request = req_payload.into_inner();
  request.created_by = admin.id;
  let record = app_state.voyage.scheduler.schedule(request).await?;
  Ok(HttpResponse::Created().json(record))
}

pub async fn list_scheduled_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  app_state.require_admin(&auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(app_state.voyage.notifications.list_scheduled().await?))
}

pub async fn cancel_scheduled_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  scheduled_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  app_state.require_admin(&auth_user.user_id).await?;
  if app_state.voyage.scheduler.cancel(&scheduled_id).await? {
    Ok(HttpResponse::NoContent().finish())
  } else {
    Err(AppError::Conflict(format!(
      "scheduled notification '{}' is not pending",
      scheduled_id
    )))
  }
}
