// voyage_app/src/web/extract.rs

use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

/// The signed-in user behind an `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
  pub user_id: String,
  pub token: String,
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
  req
    .headers()
    .get(actix_web::http::header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|token| !token.is_empty())
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
      return ready(Err(AppError::Internal("Application state is not configured.".to_string())));
    };
    let Some(token) = bearer_token(req) else {
      return ready(Err(AppError::Auth("You need to be signed in.".to_string())));
    };
    match state.voyage.accounts.require_user(token) {
      Ok(user_id) => ready(Ok(AuthenticatedUser {
        user_id,
        token: token.to_string(),
      })),
      Err(e) => {
        warn!("Rejected request with an unknown session token.");
        ready(Err(e.into()))
      }
    }
  }
}
