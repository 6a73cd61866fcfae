// voyage/src/store/feed.rs

//! Publish/subscribe over store writes.
//!
//! [`ObservedStore`] publishes a [`ChangeEvent`] after every successful write.
//! [`watch`] turns that feed into a [`Subscription`]: a fresh snapshot is
//! loaded whenever one of the watched collections changes. The subscription
//! lives exactly as long as its handle.

use super::{Document, DocumentStore, Query};
use crate::error::{StoreError, VoyageResult};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
  Written,
  Updated,
  Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
  pub collection: String,
  pub id: String,
  pub kind: ChangeKind,
}

/// Wraps any store and publishes its writes.
#[derive(Debug)]
pub struct ObservedStore<S> {
  inner: S,
  feed: broadcast::Sender<ChangeEvent>,
}

impl<S: DocumentStore> ObservedStore<S> {
  pub fn new(inner: S) -> Self {
    let (feed, _) = broadcast::channel(FEED_CAPACITY);
    Self { inner, feed }
  }

  pub fn inner(&self) -> &S {
    &self.inner
  }

  fn publish(&self, collection: &str, id: &str, kind: ChangeKind) {
    // No receivers is fine: nobody is watching right now.
    let _ = self.feed.send(ChangeEvent {
      collection: collection.to_string(),
      id: id.to_string(),
      kind,
    });
  }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for ObservedStore<S> {
  async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
    self.inner.get(collection, id).await
  }

  async fn set(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError> {
    self.inner.set(collection, id, data).await?;
    self.publish(collection, id, ChangeKind::Written);
    Ok(())
  }

  async fn update(&self, collection: &str, id: &str, patch: Map<String, Value>) -> Result<bool, StoreError> {
    let updated = self.inner.update(collection, id, patch).await?;
    if updated {
      self.publish(collection, id, ChangeKind::Updated);
    }
    Ok(updated)
  }

  async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
    let deleted = self.inner.delete(collection, id).await?;
    if deleted {
      self.publish(collection, id, ChangeKind::Deleted);
    }
    Ok(deleted)
  }

  async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
    self.inner.query(collection, query).await
  }

  async fn count(&self, collection: &str, query: &Query) -> Result<u64, StoreError> {
    self.inner.count(collection, query).await
  }

  fn changes(&self) -> Option<broadcast::Receiver<ChangeEvent>> {
    Some(self.feed.subscribe())
  }
}

/// Receiving end of a live query. Dropping it stops the background watcher.
#[derive(Debug)]
pub struct Subscription<T> {
  snapshots: mpsc::Receiver<VoyageResult<T>>,
  cancel: CancellationToken,
}

impl<T> Subscription<T> {
  /// Next snapshot, or `None` once the watcher has stopped.
  pub async fn next(&mut self) -> Option<VoyageResult<T>> {
    self.snapshots.recv().await
  }

  /// A snapshot that has already arrived, if any.
  pub fn try_next(&mut self) -> Option<VoyageResult<T>> {
    self.snapshots.try_recv().ok()
  }

  pub fn cancel(&self) {
    self.cancel.cancel();
  }

  pub fn is_cancelled(&self) -> bool {
    self.cancel.is_cancelled()
  }
}

impl<T> Drop for Subscription<T> {
  fn drop(&mut self) {
    self.cancel.cancel();
  }
}

/// Watches `collections` on `store` and pushes `load()` results to the returned
/// subscription: once immediately, then after every relevant change.
///
/// Stores without a change feed yield the initial snapshot only.
/// Must be called from within a tokio runtime.
pub fn watch<T, F, Fut>(store: Arc<dyn DocumentStore>, collections: Vec<String>, load: F) -> Subscription<T>
where
  T: Send + 'static,
  F: Fn() -> Fut + Send + Sync + 'static,
  Fut: Future<Output = VoyageResult<T>> + Send + 'static,
{
  let (tx, rx) = mpsc::channel(16);
  let cancel = CancellationToken::new();
  let task_cancel = cancel.clone();

  // Subscribe before the first load so no write can slip between them.
  let feed = store.changes();

  tokio::spawn(async move {
    if tx.send(load().await).await.is_err() {
      return;
    }
    let Some(mut feed) = feed else {
      debug!(?collections, "store has no change feed; subscription is one-shot");
      return;
    };

    loop {
      tokio::select! {
        _ = task_cancel.cancelled() => break,
        received = feed.recv() => {
          match received {
            Ok(event) if collections.iter().any(|c| *c == event.collection) => {}
            Ok(_) => continue,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
              warn!(skipped, "change feed lagged; reloading snapshot");
            }
            Err(broadcast::error::RecvError::Closed) => break,
          }
          if tx.send(load().await).await.is_err() {
            break;
          }
        }
      }
    }
    debug!(?collections, "subscription watcher stopped");
  });

  Subscription { snapshots: rx, cancel }
}
