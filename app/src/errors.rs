// voyage_app/src/errors.rs

use actix_web::{HttpResponse, ResponseError};
use serde_json::{json, Map, Value};
use thiserror::Error;
use voyage::{FieldErrors, StoreError, VoyageError};

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(FieldErrors),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Payment Processing Error: {0}")]
  Payment(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Store Unavailable: {0}")]
  Unavailable(String),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<VoyageError> for AppError {
  fn from(err: VoyageError) -> Self {
    match err {
      VoyageError::Validation(fields) => AppError::Validation(fields),
      VoyageError::Auth(failure) => AppError::Auth(failure.user_message().to_string()),
      VoyageError::MissingDocument { collection, id } => AppError::NotFound(format!("{} '{}'", collection, id)),
      e @ (VoyageError::InvalidTransition { .. } | VoyageError::CapacityExceeded { .. }) => {
        AppError::Conflict(e.to_string())
      }
      VoyageError::Payment(m) => AppError::Payment(m),
      VoyageError::Store(StoreError::Unavailable(m)) => AppError::Unavailable(m),
      other => AppError::Internal(other.to_string()),
    }
  }
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
      Err(other) => AppError::Internal(other.to_string()),
    }
  }
}

fn field_map(fields: &FieldErrors) -> Map<String, Value> {
  fields
    .iter()
    .map(|(field, message)| (field.to_string(), Value::String(message.to_string())))
    .collect()
}

impl ResponseError for AppError {
  fn error_response(&self) -> HttpResponse {
    tracing::error!(application_error = %self, "Responding with error");
    match self {
      AppError::Validation(fields) => {
        HttpResponse::BadRequest().json(json!({"error": "Validation failed", "fields": field_map(fields)}))
      }
      AppError::Auth(m) => HttpResponse::Unauthorized().json(json!({"error": m})),
      AppError::Forbidden(m) => HttpResponse::Forbidden().json(json!({"error": m})),
      AppError::NotFound(m) => HttpResponse::NotFound().json(json!({"error": m})),
      AppError::Conflict(m) => HttpResponse::Conflict().json(json!({"error": m})),
      AppError::Payment(m) => HttpResponse::PaymentRequired().json(json!({"error": m})),
      AppError::Config(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "Configuration issue", "detail": m}))
      }
      AppError::Sqlx(_) => HttpResponse::InternalServerError().json(json!({"error": "Database operation failed"})),
      AppError::Unavailable(m) => {
        HttpResponse::ServiceUnavailable().json(json!({"error": "Storage is unavailable", "detail": m}))
      }
      AppError::Internal(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "An internal error occurred", "detail": m}))
      }
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::http::StatusCode;
  use voyage::{AuthFailure, BookingStatus};

  #[test]
  fn core_errors_map_to_status_codes() {
    let cases = [
      (VoyageError::Auth(AuthFailure::NotSignedIn), StatusCode::UNAUTHORIZED),
      (
        VoyageError::InvalidTransition {
          from: BookingStatus::Completed,
          to: BookingStatus::Pending,
        },
        StatusCode::CONFLICT,
      ),
      (
        VoyageError::MissingDocument {
          collection: "bookings".into(),
          id: "b1".into(),
        },
        StatusCode::NOT_FOUND,
      ),
      (
        VoyageError::Validation(FieldErrors::single("email", "Email is required.")),
        StatusCode::BAD_REQUEST,
      ),
      (
        VoyageError::Store(StoreError::Unavailable("down".into())),
        StatusCode::SERVICE_UNAVAILABLE,
      ),
    ];
    for (err, status) in cases {
      assert_eq!(AppError::from(err).error_response().status(), status);
    }
  }
}
