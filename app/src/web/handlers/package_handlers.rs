// voyage_app/src/web/handlers/package_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{instrument, warn};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extract::AuthenticatedUser;

#[instrument(name = "handler::list_packages", skip(app_state))]
pub async fn list_packages_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let packages = app_state.voyage.packages.packages_with_images().await?;
  Ok(HttpResponse::Ok().json(packages))
}

/// Package detail: images, departures and the day-by-day itinerary. Viewing
/// while signed in records the package in the recently-viewed list.
#[instrument(name = "handler::get_package", skip(app_state, auth_user), fields(package_id = %package_id))]
pub async fn get_package_handler(
  app_state: web::Data<AppState>,
  package_id: web::Path<String>,
  auth_user: Option<AuthenticatedUser>,
) -> Result<HttpResponse, AppError> {
  let voyage = &app_state.voyage;
  let package_id = package_id.into_inner();
  let package = voyage
    .packages
    .package_with_images(&package_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("package '{}'", package_id)))?;
  let (departures, itinerary) = tokio::try_join!(
    voyage.packages.departures_for_package(&package_id),
    voyage.trips.itinerary(&package_id),
  )?;

  if let Some(user) = auth_user {
    if let Err(e) = voyage.recently_viewed.record(&user.user_id, &package_id).await {
      warn!(error = %e, "Could not record recently viewed package.");
    }
  }

  Ok(HttpResponse::Ok().json(json!({
    "package": package,
    "departures": departures,
    "itinerary": itinerary,
  })))
}
