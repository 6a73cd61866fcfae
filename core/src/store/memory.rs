// voyage/src/store/memory.rs

//! An in-process `DocumentStore`, used for tests, demos and as the app's
//! fallback when no database is configured.

use super::{Document, DocumentStore, Query};
use crate::error::StoreError;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::trace;

#[derive(Debug, Default)]
pub struct MemoryStore {
  collections: RwLock<HashMap<String, BTreeMap<String, Value>>>,
  unavailable: AtomicBool,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Makes every subsequent call fail with `StoreError::Unavailable` until reset.
  pub fn set_unavailable(&self, unavailable: bool) {
    self.unavailable.store(unavailable, Ordering::SeqCst);
  }

  /// Number of documents in `collection`.
  pub fn len(&self, collection: &str) -> usize {
    self.collections.read().get(collection).map_or(0, BTreeMap::len)
  }

  pub fn is_empty(&self, collection: &str) -> bool {
    self.len(collection) == 0
  }

  fn check_available(&self) -> Result<(), StoreError> {
    if self.unavailable.load(Ordering::SeqCst) {
      return Err(StoreError::Unavailable("memory store switched off".to_string()));
    }
    Ok(())
  }
}

#[async_trait]
impl DocumentStore for MemoryStore {
  async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
    self.check_available()?;
    let guard = self.collections.read();
    Ok(guard.get(collection).and_then(|docs| docs.get(id)).map(|data| Document {
      id: id.to_string(),
      data: data.clone(),
    }))
  }

  async fn set(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError> {
    self.check_available()?;
    trace!(collection, id, "memory store set");
    self
      .collections
      .write()
      .entry(collection.to_string())
      .or_default()
      .insert(id.to_string(), data);
    Ok(())
  }

  async fn update(&self, collection: &str, id: &str, patch: Map<String, Value>) -> Result<bool, StoreError> {
    self.check_available()?;
    let mut guard = self.collections.write();
    let Some(existing) = guard.get_mut(collection).and_then(|docs| docs.get_mut(id)) else {
      return Ok(false);
    };
    match existing {
      Value::Object(fields) => fields.extend(patch),
      other => *other = Value::Object(patch),
    }
    Ok(true)
  }

  async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
    self.check_available()?;
    Ok(
      self
        .collections
        .write()
        .get_mut(collection)
        .is_some_and(|docs| docs.remove(id).is_some()),
    )
  }

  async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
    self.check_available()?;
    let docs: Vec<Document> = {
      let guard = self.collections.read();
      match guard.get(collection) {
        Some(docs) => docs
          .iter()
          .map(|(id, data)| Document {
            id: id.clone(),
            data: data.clone(),
          })
          .collect(),
        None => Vec::new(),
      }
    };
    Ok(query.apply(docs))
  }
}
