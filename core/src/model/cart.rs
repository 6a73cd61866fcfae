// voyage/src/model/cart.rs

use super::Cents;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's in-progress, not yet paid selection of packages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
  #[serde(default)]
  pub id: String,
  pub user_id: String,
  pub item_ids: Vec<String>,
  pub total_cents: Cents,
  /// Total after discount; never above `total_cents`.
  pub final_cents: Cents,
  pub is_valid: bool,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub created_at: DateTime<Utc>,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub updated_at: DateTime<Utc>,
}

impl Cart {
  pub fn empty(user_id: &str, now: DateTime<Utc>) -> Self {
    Self {
      id: String::new(),
      user_id: user_id.to_string(),
      item_ids: Vec::new(),
      total_cents: 0,
      final_cents: 0,
      is_valid: true,
      created_at: now,
      updated_at: now,
    }
  }
}

/// One selected package departure awaiting checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
  #[serde(default)]
  pub id: String,
  pub cart_id: String,
  pub user_id: String,
  pub package_id: String,
  pub departure_id: String,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub departure_date: DateTime<Utc>,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub end_date: DateTime<Utc>,
  pub traveler_type: String,
  pub base_price_cents: Cents,
  pub total_price_cents: Cents,
  pub traveler_count: u32,
  pub duration_days: u32,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub added_at: DateTime<Utc>,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub expires_at: DateTime<Utc>,
}

impl CartItem {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
    self.expires_at <= now
  }

  /// `base_price_cents * traveler_count`.
  pub fn expected_total(&self) -> Cents {
    self.base_price_cents * Cents::from(self.traveler_count)
  }

  pub fn set_traveler_count(&mut self, traveler_count: u32) {
    self.traveler_count = traveler_count;
    self.total_price_cents = self.expected_total();
  }
}

/// Input for adding a package departure to a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartItem {
  pub package_id: String,
  pub departure_id: String,
  #[serde(default = "NewCartItem::default_traveler_type")]
  pub traveler_type: String,
  pub traveler_count: u32,
}

impl NewCartItem {
  pub const DEFAULT_TRAVELER_TYPE: &'static str = "adult";

  fn default_traveler_type() -> String {
    Self::DEFAULT_TRAVELER_TYPE.to_string()
  }

  pub fn new(package_id: &str, departure_id: &str, traveler_count: u32) -> Self {
    Self {
      package_id: package_id.to_string(),
      departure_id: departure_id.to_string(),
      traveler_type: Self::default_traveler_type(),
      traveler_count,
    }
  }
}
