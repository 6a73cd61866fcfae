// voyage/src/store/mod.rs

//! The document-store boundary.
//!
//! Collections hold schema-less JSON documents keyed by string ids. Per-user
//! subcollections are addressed by path, e.g. `users/{uid}/recently_viewed`.
//! Backends implement [`DocumentStore`]; [`ObservedStore`] adds a change feed
//! on top of any backend so repositories can offer live subscriptions.

pub mod feed;
pub mod memory;
pub mod query;

pub use feed::{watch, ChangeEvent, ChangeKind, ObservedStore, Subscription};
pub use memory::MemoryStore;
pub use query::{Direction, Filter, FilterOp, Query};

use crate::error::StoreError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::broadcast;

/// Top-level collection names.
pub mod collections {
  pub const USERS: &str = "users";
  pub const TRIPS: &str = "trips";
  pub const PACKAGES: &str = "packages";
  pub const PACKAGE_IMAGES: &str = "packageImages";
  pub const DEPARTURES: &str = "departures";
  pub const BOOKINGS: &str = "bookings";
  pub const CARTS: &str = "carts";
  pub const CART_ITEMS: &str = "cartItems";
  pub const PAYMENTS: &str = "payments";
  pub const NOTIFICATIONS: &str = "notifications";
  pub const SCHEDULED_NOTIFICATIONS: &str = "scheduledNotifications";

  pub const RECENTLY_VIEWED: &str = "recently_viewed";
  pub const USER_WISHLISTS: &str = "user_wishlists";

  /// Path of a per-user subcollection.
  pub fn user_subcollection(user_id: &str, name: &str) -> String {
    format!("{}/{}/{}", USERS, user_id, name)
  }
}

/// A stored document: its id plus the JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
  pub id: String,
  pub data: Value,
}

impl Document {
  /// Decodes into `T`, exposing the document id as the `id` field.
  pub fn decode<T: DeserializeOwned>(self, collection: &str) -> Result<T, StoreError> {
    let mut data = self.data;
    if let Value::Object(fields) = &mut data {
      fields.insert("id".to_string(), Value::String(self.id));
    }
    serde_json::from_value(data).map_err(|source| StoreError::Serialization {
      collection: collection.to_string(),
      source,
    })
  }
}

/// Serializes a record into a document body. The `id` field is not stored in the body.
pub fn encode<T: Serialize>(collection: &str, record: &T) -> Result<Value, StoreError> {
  let mut value = serde_json::to_value(record).map_err(|source| StoreError::Serialization {
    collection: collection.to_string(),
    source,
  })?;
  if let Value::Object(fields) = &mut value {
    fields.remove("id");
  }
  Ok(value)
}

/// Builds a field patch for [`DocumentStore::update`].
pub fn patch<const N: usize>(fields: [(&str, Value); N]) -> Map<String, Value> {
  fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

pub fn new_document_id() -> String {
  uuid::Uuid::new_v4().simple().to_string()
}

/// A schema-less document database.
///
/// Reads of absent documents are `Ok(None)`, never errors. Writes are
/// remote-first: nothing is cached by callers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
  async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

  /// Creates or fully replaces the document `id`.
  async fn set(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError>;

  /// Creates a document under a server-generated id and returns that id.
  async fn add(&self, collection: &str, data: Value) -> Result<String, StoreError> {
    let id = new_document_id();
    self.set(collection, &id, data).await?;
    Ok(id)
  }

  /// Merges `patch` into an existing document. Returns `false` if it does not exist.
  async fn update(&self, collection: &str, id: &str, patch: Map<String, Value>) -> Result<bool, StoreError>;

  /// Returns `false` if there was nothing to delete.
  async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError>;

  async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError>;

  async fn count(&self, collection: &str, query: &Query) -> Result<u64, StoreError> {
    Ok(self.query(collection, query).await?.len() as u64)
  }

  /// Change feed, when the store publishes one.
  fn changes(&self) -> Option<broadcast::Receiver<ChangeEvent>> {
    None
  }
}
