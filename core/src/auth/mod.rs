// voyage/src/auth/mod.rs

//! Authentication boundary.
//!
//! Credentials belong to an [`AuthProvider`]; the document store only ever
//! sees the profile. [`AccountService`] validates input locally, talks to the
//! provider and keeps the signed-in sessions.

pub mod account;
pub mod memory;
pub mod validation;

pub use account::{AccountService, AuthSession, SignUpRequest, SignedIn};
pub use memory::MemoryAuthProvider;

use crate::error::AuthFailure;
use async_trait::async_trait;

#[async_trait]
pub trait AuthProvider: Send + Sync {
  /// Registers a new credential and returns the account's uid.
  async fn create_account(&self, email: &str, password: &str) -> Result<String, AuthFailure>;

  /// Verifies credentials and returns the uid.
  async fn sign_in(&self, email: &str, password: &str) -> Result<String, AuthFailure>;

  /// Confirms the password of an already signed-in account. Sensitive
  /// operations require this to have happened first.
  async fn reauthenticate(&self, user_id: &str, password: &str) -> Result<(), AuthFailure>;

  async fn change_password(&self, user_id: &str, new_password: &str) -> Result<(), AuthFailure>;

  async fn sign_out(&self, user_id: &str) -> Result<(), AuthFailure>;

  /// Removes the credential; used to undo a sign-up whose profile write failed.
  async fn delete_account(&self, user_id: &str) -> Result<(), AuthFailure>;
}
