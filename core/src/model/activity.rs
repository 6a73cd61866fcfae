// voyage/src/model/activity.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An entry of a per-user recently-viewed or wishlist list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
  #[serde(default)]
  pub id: String,
  pub package_id: String,
  /// Insertion order within the list; higher is newer.
  #[serde(default)]
  pub seq: u64,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub at: DateTime<Utc>,
}
