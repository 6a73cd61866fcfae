// voyage/src/repository/mod.rs

//! One repository per entity over an `Arc<dyn DocumentStore>`.
//!
//! Repositories never cache: every read goes to the store and every write is
//! sent before the call returns. They are cheap to clone and share.

pub mod activity;
pub mod bookings;
pub mod carts;
pub mod dashboard;
pub mod notifications;
pub mod packages;
pub mod payments;
pub mod trips;
pub mod users;

pub use activity::{ActivityList, ActivityRepository};
pub use bookings::BookingRepository;
pub use carts::CartRepository;
pub use dashboard::{DashboardRepository, DashboardStats};
pub use notifications::NotificationRepository;
pub use packages::PackageRepository;
pub use payments::PaymentRepository;
pub use trips::TripRepository;
pub use users::UserRepository;

use crate::error::{VoyageError, VoyageResult};
use crate::store::{encode, DocumentStore, Query};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub(crate) async fn load<T: DeserializeOwned>(
  store: &dyn DocumentStore,
  collection: &str,
  id: &str,
) -> VoyageResult<Option<T>> {
  match store.get(collection, id).await? {
    Some(doc) => Ok(Some(doc.decode(collection)?)),
    None => Ok(None),
  }
}

pub(crate) async fn load_required<T: DeserializeOwned>(
  store: &dyn DocumentStore,
  collection: &str,
  id: &str,
) -> VoyageResult<T> {
  load(store, collection, id)
    .await?
    .ok_or_else(|| VoyageError::missing(collection, id))
}

pub(crate) async fn load_all<T: DeserializeOwned>(
  store: &dyn DocumentStore,
  collection: &str,
  query: &Query,
) -> VoyageResult<Vec<T>> {
  store
    .query(collection, query)
    .await?
    .into_iter()
    .map(|doc| doc.decode(collection).map_err(VoyageError::from))
    .collect()
}

/// Writes `record` under its own id when it has one, otherwise under a fresh id.
/// Returns the id used.
pub(crate) async fn save<T: Serialize>(
  store: &dyn DocumentStore,
  collection: &str,
  id: &str,
  record: &T,
) -> VoyageResult<String> {
  let body = encode(collection, record)?;
  if id.is_empty() {
    Ok(store.add(collection, body).await?)
  } else {
    store.set(collection, id, body).await?;
    Ok(id.to_string())
  }
}
