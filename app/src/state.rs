// voyage_app/src/state.rs

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::services::{MockPaymentGateway, MockPushTransport};
use std::sync::Arc;
use voyage::auth::MemoryAuthProvider;
use voyage::messaging::LogNotifier;
use voyage::model::{User, UserType};
use voyage::services::Collaborators;
use voyage::{DocumentStore, SystemClock, Voyage};

#[derive(Clone)]
pub struct AppState {
  pub voyage: Voyage,
  pub config: Arc<AppConfig>,
}

impl AppState {
  /// Wires the booking core over `store` with the mock gateway and push transport.
  pub fn build(config: Arc<AppConfig>, store: Arc<dyn DocumentStore>) -> Self {
    let collaborators = Collaborators {
      auth: Arc::new(MemoryAuthProvider::new()),
      gateway: Arc::new(MockPaymentGateway::new(config.mock_payment_account_id.clone())),
      push: Arc::new(MockPushTransport),
      notifier: Arc::new(LogNotifier),
    };
    let voyage = Voyage::new(store, Arc::new(SystemClock), config.voyage_settings(), collaborators);
    Self { voyage, config }
  }

  /// Loads the profile behind `user_id` and checks it is an administrator.
  pub async fn require_admin(&self, user_id: &str) -> Result<User> {
    match self.voyage.users.get_user(user_id).await? {
      Some(user) if user.user_type == UserType::Admin => Ok(user),
      Some(_) => Err(AppError::Forbidden("Administrator access required.".to_string())),
      None => Err(AppError::Auth("Unknown user.".to_string())),
    }
  }
}
