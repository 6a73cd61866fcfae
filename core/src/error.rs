// voyage/src/error.rs
use crate::model::BookingStatus;
use anyhow::Error as AnyhowError;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Failures raised by a `DocumentStore` backend.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("Document store unavailable: {0}")]
  Unavailable(String),

  #[error("Document (de)serialization failed in '{collection}'. Source: {source}")]
  Serialization {
    collection: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("Document store backend error. Source: {source}")]
  Backend {
    #[source]
    source: AnyhowError,
  },
}

impl From<AnyhowError> for StoreError {
  fn from(err: AnyhowError) -> Self {
    StoreError::Backend { source: err }
  }
}

/// Framework-level failures of the step pipeline engine.
#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Context value '{field}' was not populated before step '{step_name}'")]
  MissingContext { step_name: String, field: &'static str },
}

/// Field-level validation messages, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn single(field: &str, message: impl Into<String>) -> Self {
    let mut errors = Self::new();
    errors.add(field, message);
    errors
  }

  /// Records a message for `field`. The first message per field wins.
  pub fn add(&mut self, field: &str, message: impl Into<String>) {
    self.0.entry(field.to_string()).or_insert_with(|| message.into());
  }

  pub fn get(&self, field: &str) -> Option<&str> {
    self.0.get(field).map(String::as_str)
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  /// `Ok(())` when nothing was recorded, otherwise the collected errors.
  pub fn into_result(self) -> Result<(), VoyageError> {
    if self.is_empty() {
      Ok(())
    } else {
      Err(VoyageError::Validation(self))
    }
  }
}

impl fmt::Display for FieldErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (field, message) in &self.0 {
      if !first {
        f.write_str("; ")?;
      }
      write!(f, "{}: {}", field, message)?;
      first = false;
    }
    Ok(())
  }
}

/// Authentication failures reported by an `AuthProvider`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFailure {
  #[error("invalid credentials")]
  InvalidCredentials,
  #[error("email already registered")]
  EmailInUse,
  #[error("no account for this email")]
  UserNotFound,
  #[error("recent sign-in required")]
  ReauthenticationRequired,
  #[error("no signed-in user")]
  NotSignedIn,
  #[error("auth provider error: {0}")]
  Provider(String),
}

impl AuthFailure {
  /// Message suitable for showing to the person signing in.
  pub fn user_message(&self) -> &'static str {
    match self {
      AuthFailure::InvalidCredentials => "The email or password is incorrect.",
      AuthFailure::EmailInUse => "An account with this email already exists.",
      AuthFailure::UserNotFound => "No account was found for this email.",
      AuthFailure::ReauthenticationRequired => "Please sign in again to continue.",
      AuthFailure::NotSignedIn => "You need to be signed in.",
      AuthFailure::Provider(_) => "Authentication is unavailable right now. Please try again.",
    }
  }
}

#[derive(Debug, Error)]
pub enum VoyageError {
  #[error("Store Error: {0}")]
  Store(#[from] StoreError),

  #[error("Validation Error: {0}")]
  Validation(FieldErrors),

  #[error("Authentication Failed: {0}")]
  Auth(#[from] AuthFailure),

  #[error("Illegal booking status transition {from} -> {to}")]
  InvalidTransition { from: BookingStatus, to: BookingStatus },

  #[error("Departure '{departure_id}' has {available} seats left, {requested} requested")]
  CapacityExceeded {
    departure_id: String,
    available: u32,
    requested: u32,
  },

  #[error("Document '{id}' not found in '{collection}'")]
  MissingDocument { collection: String, id: String },

  #[error("Payment Processing Error: {0}")]
  Payment(String),

  #[error("Notification Delivery Error: {0}")]
  Delivery(String),

  #[error("Workflow Error: {0}")]
  Workflow(#[from] WorkflowError),
}

impl VoyageError {
  pub(crate) fn missing(collection: &str, id: &str) -> Self {
    VoyageError::MissingDocument {
      collection: collection.to_string(),
      id: id.to_string(),
    }
  }

  pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
    VoyageError::Validation(FieldErrors::single(field, message))
  }
}

pub type VoyageResult<T, E = VoyageError> = std::result::Result<T, E>;
