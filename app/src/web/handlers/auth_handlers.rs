// voyage_app/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extract::AuthenticatedUser;
use voyage::auth::SignUpRequest;

#[derive(Deserialize, Debug)]
pub struct SigninRequestPayload {
  pub email: String,
  pub password: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordPayload {
  pub current_password: String,
  pub new_password: String,
}

#[derive(Deserialize, Debug)]
pub struct PushTokenPayload {
  pub token: String,
}

#[instrument(name = "handler::signup", skip(app_state, req_payload), fields(req_email = %req_payload.email))]
pub async fn signup_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<SignUpRequest>,
) -> Result<HttpResponse, AppError> {
  let signed_in = app_state.voyage.accounts.sign_up(req_payload.into_inner()).await?;
  info!(user_id = %signed_in.user.id, "Signup successful.");
  Ok(HttpResponse::Created().json(signed_in))
}

#[instrument(name = "handler::signin", skip(app_state, req_payload), fields(req_email = %req_payload.email))]
pub async fn signin_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<SigninRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let signed_in = app_state
    .voyage
    .accounts
    .sign_in(&req_payload.email, &req_payload.password)
    .await?;
  Ok(HttpResponse::Ok().json(signed_in))
}

pub async fn signout_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  app_state.voyage.accounts.sign_out(&auth_user.token).await?;
  Ok(HttpResponse::NoContent().finish())
}

pub async fn me_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let user = app_state
    .voyage
    .accounts
    .current_user(&auth_user.token)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("profile of user '{}'", auth_user.user_id)))?;
  Ok(HttpResponse::Ok().json(user))
}

#[instrument(name = "handler::change_password", skip_all, fields(user_id = %auth_user.user_id))]
pub async fn change_password_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<ChangePasswordPayload>,
) -> Result<HttpResponse, AppError> {
  app_state
    .voyage
    .accounts
    .change_password(&auth_user.token, &req_payload.current_password, &req_payload.new_password)
    .await?;
  Ok(HttpResponse::Ok().json(json!({"message": "Password updated."})))
}

pub async fn register_push_token_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<PushTokenPayload>,
) -> Result<HttpResponse, AppError> {
  if req_payload.token.trim().is_empty() {
    return Err(AppError::Validation(voyage::FieldErrors::single("token", "Push token is required.")));
  }
  app_state
    .voyage
    .messaging
    .register_push_token(&auth_user.user_id, req_payload.token.trim())
    .await?;
  Ok(HttpResponse::NoContent().finish())
}
