// voyage/src/model/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserType {
  Customer,
  Admin,
}

impl UserType {
  pub fn as_str(self) -> &'static str {
    match self {
      UserType::Customer => "CUSTOMER",
      UserType::Admin => "ADMIN",
    }
  }
}

/// Profile record. Credentials live with the auth provider, never here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  #[serde(default)]
  pub id: String,
  pub name: String,
  pub email: String,
  pub phone: String,
  #[serde(rename = "type")]
  pub user_type: UserType,
  #[serde(default)]
  pub push_token: Option<String>,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub created_at: DateTime<Utc>,
}
