// voyage_app/src/web/handlers/notification_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::instrument;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extract::AuthenticatedUser;
use voyage::messaging::IncomingMessage;

pub async fn list_notifications_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let notifications = &app_state.voyage.notifications;
  let (items, unread) = tokio::try_join!(
    notifications.notifications_for_user(&auth_user.user_id),
    notifications.unread_count(&auth_user.user_id),
  )?;
  Ok(HttpResponse::Ok().json(json!({ "notifications": items, "unread": unread })))
}

async fn ensure_owned(app_state: &AppState, user_id: &str, notification_id: &str) -> Result<(), AppError> {
  let owned = app_state
    .voyage
    .notifications
    .notifications_for_user(user_id)
    .await?
    .iter()
    .any(|n| n.id == notification_id);
  if owned {
    Ok(())
  } else {
    Err(AppError::NotFound(format!("notification '{}'", notification_id)))
  }
}

pub async fn mark_read_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  notification_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  ensure_owned(&app_state, &auth_user.user_id, &notification_id).await?;
  app_state.voyage.notifications.mark_read(&notification_id).await?;
  Ok(HttpResponse::NoContent().finish())
}

pub async fn mark_all_read_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let marked = app_state.voyage.notifications.mark_all_read(&auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(json!({ "marked": marked })))
}

pub async fn delete_notification_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  notification_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  ensure_owned(&app_state, &auth_user.user_id, &notification_id).await?;
  app_state.voyage.notifications.delete_notification(&notification_id).await?;
  Ok(HttpResponse::NoContent().finish())
}

/// A push message handed over by the device. Raised locally and kept in the
/// signed-in user's notification list.
#[instrument(name = "handler::incoming_push", skip_all, fields(title = %req_payload.title))]
pub async fn incoming_push_handler(
  app_state: web::Data<AppState>,
  auth_user: Option<AuthenticatedUser>,
  req_payload: web::Json<IncomingMessage>,
) -> Result<HttpResponse, AppError> {
  let stored = app_state
    .voyage
    .messaging
    .receive_incoming(auth_user.as_ref().map(|u| u.user_id.as_str()), req_payload.into_inner())
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "stored": stored })))
}
