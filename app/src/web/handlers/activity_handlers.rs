// voyage_app/src/web/handlers/activity_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extract::AuthenticatedUser;
use voyage::repository::ActivityList;

fn list_from_path(raw: &str) -> Result<ActivityList, AppError> {
  match raw {
    "recently-viewed" => Ok(ActivityList::RecentlyViewed),
    "wishlist" => Ok(ActivityList::Wishlist),
    other => Err(AppError::NotFound(format!("list '{}'", other))),
  }
}

pub async fn list_activity_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  list: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let repo = app_state.voyage.activity(list_from_path(&list)?);
  Ok(HttpResponse::Ok().json(repo.list(&auth_user.user_id).await?))
}

pub async fn add_activity_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
  let (list, package_id) = path.into_inner();
  let voyage = &app_state.voyage;
  if voyage.packages.get_package(&package_id).await?.is_none() {
    return Err(AppError::NotFound(format!("package '{}'", package_id)));
  }
  let entry = voyage
    .activity(list_from_path(&list)?)
    .record(&auth_user.user_id, &package_id)
    .await?;
  Ok(HttpResponse::Ok().json(entry))
}

pub async fn remove_activity_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
  let (list, package_id) = path.into_inner();
  let removed = app_state
    .voyage
    .activity(list_from_path(&list)?)
    .remove(&auth_user.user_id, &package_id)
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "removed": removed })))
}

pub async fn clear_activity_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  list: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let cleared = app_state
    .voyage
    .activity(list_from_path(&list)?)
    .clear(&auth_user.user_id)
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "cleared": cleared })))
}
