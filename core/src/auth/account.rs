// voyage/src/auth/account.rs

use super::validation::{check_password, validate_sign_in, validate_sign_up};
use super::AuthProvider;
use crate::clock::Clock;
use crate::error::{AuthFailure, FieldErrors, VoyageError, VoyageResult};
use crate::model::{User, UserType};
use crate::repository::UserRepository;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
  pub name: String,
  pub email: String,
  pub password: String,
  #[serde(default)]
  pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedIn {
  pub token: String,
  pub user: User,
}

/// Signed-in sessions: opaque token to uid. Written only by [`AccountService`].
#[derive(Debug, Default)]
pub struct AuthSession {
  tokens: RwLock<HashMap<String, String>>,
}

impl AuthSession {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn current_user_id(&self, token: &str) -> Option<String> {
    self.tokens.read().get(token).cloned()
  }

  pub fn active_sessions(&self) -> usize {
    self.tokens.read().len()
  }

  fn start(&self, user_id: &str) -> String {
    let token = uuid::Uuid::new_v4().simple().to_string();
    self.tokens.write().insert(token.clone(), user_id.to_string());
    token
  }

  fn end(&self, token: &str) -> Option<String> {
    self.tokens.write().remove(token)
  }
}

#[derive(Clone)]
pub struct AccountService {
  provider: Arc<dyn AuthProvider>,
  users: UserRepository,
  session: Arc<AuthSession>,
  clock: Arc<dyn Clock>,
}

impl AccountService {
  pub fn new(
    provider: Arc<dyn AuthProvider>,
    users: UserRepository,
    session: Arc<AuthSession>,
    clock: Arc<dyn Clock>,
  ) -> Self {
    Self {
      provider,
      users,
      session,
      clock,
    }
  }

  /// Validates locally, registers the credential, stores a CUSTOMER profile
  /// and signs the new user in.
  #[instrument(name = "AccountService::sign_up", skip_all, fields(email = %request.email), err(Display))]
  pub async fn sign_up(&self, request: SignUpRequest) -> VoyageResult<SignedIn> {
    validate_sign_up(&request.name, &request.email, &request.password, &request.phone).into_result()?;
    let email = request.email.trim().to_ascii_lowercase();

    let user_id = self.provider.create_account(&email, &request.password).await?;
    let user = User {
      id: user_id.clone(),
      name: request.name.trim().to_string(),
      email,
      phone: request.phone.trim().to_string(),
      user_type: UserType::Customer,
      push_token: None,
      created_at: self.clock.now(),
    };
    if let Err(e) = self.users.create_user(&user).await {
      error!(%user_id, error = %e, "profile write failed; removing the new credential");
      if let Err(cleanup) = self.provider.delete_account(&user_id).await {
        warn!(%user_id, error = %cleanup, "credential cleanup failed");
      }
      return Err(e);
    }

    let token = self.session.start(&user_id);
    info!(%user_id, "account created");
    Ok(SignedIn { token, user })
  }

  #[instrument(name = "AccountService::sign_in", skip_all, fields(email = %email), err(Display))]
  pub async fn sign_in(&self, email: &str, password: &str) -> VoyageResult<SignedIn> {
    validate_sign_in(email, password).into_result()?;
    let user_id = self.provider.sign_in(email, password).await?;
    let user = self
      .users
      .get_user(&user_id)
      .await?
      .ok_or_else(|| VoyageError::Auth(AuthFailure::UserNotFound))?;
    let token = self.session.start(&user_id);
    info!(%user_id, "signed in");
    Ok(SignedIn { token, user })
  }

  /// Re-verifies the current password, then sets the new one.
  #[instrument(name = "AccountService::change_password", skip_all, err(Display))]
  pub async fn change_password(&self, token: &str, current: &str, new_password: &str) -> VoyageResult<()> {
    let user_id = self.require_user(token)?;
    let mut errors = FieldErrors::new();
    if current.is_empty() {
      errors.add("currentPassword", "Current password is required.");
    }
    check_password(&mut errors, "newPassword", new_password);
    if !current.is_empty() && current == new_password {
      errors.add("newPassword", "New password must differ from the current one.");
    }
    errors.into_result()?;

    self.provider.reauthenticate(&user_id, current).await?;
    self.provider.change_password(&user_id, new_password).await?;
    info!(%user_id, "password changed");
    Ok(())
  }

  /// Ends the session. Unknown tokens are ignored.
  pub async fn sign_out(&self, token: &str) -> VoyageResult<()> {
    if let Some(user_id) = self.session.end(token) {
      self.provider.sign_out(&user_id).await?;
      info!(%user_id, "signed out");
    }
    Ok(())
  }

  pub fn current_user_id(&self, token: &str) -> Option<String> {
    self.session.current_user_id(token)
  }

  pub fn require_user(&self, token: &str) -> VoyageResult<String> {
    self
      .current_user_id(token)
      .ok_or(VoyageError::Auth(AuthFailure::NotSignedIn))
  }

  /// The signed-in user's profile.
  pub async fn current_user(&self, token: &str) -> VoyageResult<Option<User>> {
    match self.current_user_id(token) {
      Some(user_id) => self.users.get_user(&user_id).await,
      None => Ok(None),
    }
  }
}
