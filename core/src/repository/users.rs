// voyage/src/repository/users.rs

use super::{load, load_all, save};
use crate::error::{VoyageError, VoyageResult};
use crate::model::{User, UserType};
use crate::store::{collections::USERS, encode, patch, DocumentStore, Query};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct UserRepository {
  store: Arc<dyn DocumentStore>,
}

impl UserRepository {
  pub fn new(store: Arc<dyn DocumentStore>) -> Self {
    Self { store }
  }

  /// Stores the profile under `user.id` (the auth provider's uid).
  #[instrument(name = "UserRepository::create_user", skip_all, fields(user_id = %user.id), err(Display))]
  pub async fn create_user(&self, user: &User) -> VoyageResult<String> {
    let id = save(self.store.as_ref(), USERS, &user.id, user).await?;
    debug!(%id, "user profile stored");
    Ok(id)
  }

  pub async fn get_user(&self, id: &str) -> VoyageResult<Option<User>> {
    load(self.store.as_ref(), USERS, id).await
  }

  /// Replaces the editable profile fields. Fails if the user does not exist.
  #[instrument(name = "UserRepository::update_user", skip_all, fields(user_id = %user.id), err(Display))]
  pub async fn update_user(&self, user: &User) -> VoyageResult<()> {
    let Value::Object(fields) = encode(USERS, user)? else {
      return Err(VoyageError::invalid("user", "Profile must be an object."));
    };
    if self.store.update(USERS, &user.id, fields).await? {
      Ok(())
    } else {
      Err(VoyageError::missing(USERS, &user.id))
    }
  }

  pub async fn delete_user(&self, id: &str) -> VoyageResult<bool> {
    Ok(self.store.delete(USERS, id).await?)
  }

  pub async fn find_by_email(&self, email: &str) -> VoyageResult<Option<User>> {
    let query = Query::all().where_eq("email", email.trim().to_ascii_lowercase()).limit(1);
    Ok(load_all(self.store.as_ref(), USERS, &query).await?.into_iter().next())
  }

  pub async fn list_by_type(&self, user_type: UserType) -> VoyageResult<Vec<User>> {
    load_all(self.store.as_ref(), USERS, &Query::all().where_eq("type", user_type.as_str())).await
  }

  pub async fn all_users(&self) -> VoyageResult<Vec<User>> {
    load_all(self.store.as_ref(), USERS, &Query::all()).await
  }

  /// Returns `false` if the user does not exist.
  pub async fn set_push_token(&self, id: &str, token: Option<&str>) -> VoyageResult<bool> {
    Ok(self.store.update(USERS, id, patch([("pushToken", json!(token))])).await?)
  }

  pub async fn count(&self) -> VoyageResult<u64> {
    Ok(self.store.count(USERS, &Query::all()).await?)
  }
}
