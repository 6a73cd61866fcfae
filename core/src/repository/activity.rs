// voyage/src/repository/activity.rs

//! Per-user "recently viewed" and wishlist lists.
//!
//! Each list lives in a user subcollection, holds at most one entry per
//! package, is read newest first and is trimmed to a fixed cap on insert.

use super::load_all;
use crate::clock::Clock;
use crate::error::VoyageResult;
use crate::model::ActivityEntry;
use crate::store::collections::{user_subcollection, RECENTLY_VIEWED, USER_WISHLISTS};
use crate::store::{encode, Direction, DocumentStore, Query};
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityList {
  RecentlyViewed,
  Wishlist,
}

impl ActivityList {
  pub fn collection_name(self) -> &'static str {
    match self {
      ActivityList::RecentlyViewed => RECENTLY_VIEWED,
      ActivityList::Wishlist => USER_WISHLISTS,
    }
  }
}

#[derive(Clone)]
pub struct ActivityRepository {
  store: Arc<dyn DocumentStore>,
  clock: Arc<dyn Clock>,
  list: ActivityList,
  cap: usize,
}

impl ActivityRepository {
  pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>, list: ActivityList, cap: usize) -> Self {
    Self {
      store,
      clock,
      list,
      cap,
    }
  }

  pub fn list_kind(&self) -> ActivityList {
    self.list
  }

  fn path(&self, user_id: &str) -> String {
    user_subcollection(user_id, self.list.collection_name())
  }

  /// Moves `package_id` to the front of the list, then trims it to the cap.
  #[instrument(name = "ActivityRepository::record", skip(self), fields(list = ?self.list), err(Display))]
  pub async fn record(&self, user_id: &str, package_id: &str) -> VoyageResult<ActivityEntry> {
    let path = self.path(user_id);
    self.remove(user_id, package_id).await?;

    let existing = self.list(user_id).await?;
    let mut entry = ActivityEntry {
      id: String::new(),
      package_id: package_id.to_string(),
      seq: existing.first().map_or(1, |newest| newest.seq + 1),
      at: self.clock.now(),
    };
    entry.id = self.store.add(&path, encode(&path, &entry)?).await?;

    for stale in existing.iter().skip(self.cap.saturating_sub(1)) {
      self.store.delete(&path, &stale.id).await?;
      debug!(package_id = %stale.package_id, "evicted from list");
    }
    Ok(entry)
  }

  /// Entries newest first.
  pub async fn list(&self, user_id: &str) -> VoyageResult<Vec<ActivityEntry>> {
    let path = self.path(user_id);
    load_all(self.store.as_ref(), &path, &Query::all().order_by("seq", Direction::Descending)).await
  }

  /// Removes every entry for `package_id`. Returns whether anything was removed.
  pub async fn remove(&self, user_id: &str, package_id: &str) -> VoyageResult<bool> {
    let path = self.path(user_id);
    let existing = self
      .store
      .query(&path, &Query::all().where_eq("packageId", package_id))
      .await?;
    let mut removed = false;
    for doc in existing {
      removed |= self.store.delete(&path, &doc.id).await?;
    }
    Ok(removed)
  }

  pub async fn contains(&self, user_id: &str, package_id: &str) -> VoyageResult<bool> {
    let path = self.path(user_id);
    let query = Query::all().where_eq("packageId", package_id).limit(1);
    Ok(self.store.count(&path, &query).await? > 0)
  }

  /// Empties the list. Returns the number of entries removed.
  pub async fn clear(&self, user_id: &str) -> VoyageResult<usize> {
    let path = self.path(user_id);
    let docs = self.store.query(&path, &Query::all()).await?;
    let mut removed = 0;
    for doc in docs {
      if self.store.delete(&path, &doc.id).await? {
        removed += 1;
      }
    }
    Ok(removed)
  }
}
