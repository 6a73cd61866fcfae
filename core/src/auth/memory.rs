// voyage/src/auth/memory.rs

//! In-process `AuthProvider` holding Argon2 password hashes.

use super::AuthProvider;
use crate::error::AuthFailure;
use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use tracing::{debug, error, instrument};

#[derive(Debug)]
struct Credential {
  user_id: String,
  password_hash: String,
}

#[derive(Debug, Default)]
pub struct MemoryAuthProvider {
  /// Keyed by normalized email.
  credentials: RwLock<HashMap<String, Credential>>,
  /// Accounts that confirmed their password and may change it once.
  reauthenticated: RwLock<HashSet<String>>,
}

impl MemoryAuthProvider {
  pub fn new() -> Self {
    Self::default()
  }

  fn email_of(&self, user_id: &str) -> Option<String> {
    self
      .credentials
      .read()
      .iter()
      .find(|(_, c)| c.user_id == user_id)
      .map(|(email, _)| email.clone())
  }

  fn check_password(&self, email: &str, password: &str) -> Result<String, AuthFailure> {
    let (user_id, stored) = {
      let credentials = self.credentials.read();
      let credential = credentials.get(email).ok_or(AuthFailure::UserNotFound)?;
      (credential.user_id.clone(), credential.password_hash.clone())
    };
    if verify_password(&stored, password)? {
      Ok(user_id)
    } else {
      Err(AuthFailure::InvalidCredentials)
    }
  }
}

fn normalize(email: &str) -> String {
  email.trim().to_ascii_lowercase()
}

#[instrument(name = "auth::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> Result<String, AuthFailure> {
  if password.is_empty() {
    return Err(AuthFailure::InvalidCredentials);
  }
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| {
      error!(error = %e, "Argon2 password hashing failed.");
      AuthFailure::Provider(format!("password hashing failed: {}", e))
    })
}

/// `Ok(false)` on a mismatch; `Err` only when the stored hash is unusable.
#[instrument(name = "auth::verify_password", skip_all, err(Display))]
pub fn verify_password(stored_hash: &str, provided: &str) -> Result<bool, AuthFailure> {
  if provided.is_empty() {
    return Ok(false);
  }
  let parsed = PasswordHash::new(stored_hash).map_err(|e| {
    error!(error = %e, "Stored password hash is malformed.");
    AuthFailure::Provider(format!("invalid stored hash: {}", e))
  })?;
  match Argon2::default().verify_password(provided.as_bytes(), &parsed) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => Ok(false),
    Err(e) => Err(AuthFailure::Provider(format!("password verification failed: {}", e))),
  }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
  async fn create_account(&self, email: &str, password: &str) -> Result<String, AuthFailure> {
    let email = normalize(email);
    if self.credentials.read().contains_key(&email) {
      return Err(AuthFailure::EmailInUse);
    }
    let password_hash = hash_password(password)?;
    let user_id = uuid::Uuid::new_v4().simple().to_string();

    let mut credentials = self.credentials.write();
    if credentials.contains_key(&email) {
      return Err(AuthFailure::EmailInUse);
    }
    credentials.insert(
      email,
      Credential {
        user_id: user_id.clone(),
        password_hash,
      },
    );
    debug!(%user_id, "account created");
    Ok(user_id)
  }

  async fn sign_in(&self, email: &str, password: &str) -> Result<String, AuthFailure> {
    self.check_password(&normalize(email), password)
  }

  async fn reauthenticate(&self, user_id: &str, password: &str) -> Result<(), AuthFailure> {
    let email = self.email_of(user_id).ok_or(AuthFailure::UserNotFound)?;
    self.check_password(&email, password)?;
    self.reauthenticated.write().insert(user_id.to_string());
    Ok(())
  }

  async fn change_password(&self, user_id: &str, new_password: &str) -> Result<(), AuthFailure> {
    if !self.reauthenticated.write().remove(user_id) {
      return Err(AuthFailure::ReauthenticationRequired);
    }
    let email = self.email_of(user_id).ok_or(AuthFailure::UserNotFound)?;
    let password_hash = hash_password(new_password)?;
    if let Some(credential) = self.credentials.write().get_mut(&email) {
      credential.password_hash = password_hash;
    }
    Ok(())
  }

  async fn sign_out(&self, user_id: &str) -> Result<(), AuthFailure> {
    self.reauthenticated.write().remove(user_id);
    Ok(())
  }

  async fn delete_account(&self, user_id: &str) -> Result<(), AuthFailure> {
    self.reauthenticated.write().remove(user_id);
    self.credentials.write().retain(|_, c| c.user_id != user_id);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn credentials_round() {
    let provider = MemoryAuthProvider::new();
    let uid = provider.create_account("Ana@Example.com", "secret1").await.unwrap();
    assert_eq!(
      provider.create_account("ana@example.com", "other12").await,
      Err(AuthFailure::EmailInUse)
    );
    assert_eq!(provider.sign_in("ana@example.com", "secret1").await.unwrap(), uid);
    assert_eq!(
      provider.sign_in("ana@example.com", "wrong!").await,
      Err(AuthFailure::InvalidCredentials)
    );
    assert_eq!(
      provider.sign_in("bob@example.com", "secret1").await,
      Err(AuthFailure::UserNotFound)
    );
  }

  #[tokio::test]
  async fn password_change_needs_fresh_reauthentication() {
    let provider = MemoryAuthProvider::new();
    let uid = provider.create_account("ana@example.com", "secret1").await.unwrap();
    assert_eq!(
      provider.change_password(&uid, "secret2").await,
      Err(AuthFailure::ReauthenticationRequired)
    );
    provider.reauthenticate(&uid, "secret1").await.unwrap();
    provider.change_password(&uid, "secret2").await.unwrap();
    assert_eq!(
      provider.change_password(&uid, "secret3").await,
      Err(AuthFailure::ReauthenticationRequired)
    );
    assert!(provider.sign_in("ana@example.com", "secret2").await.is_ok());
  }
}
