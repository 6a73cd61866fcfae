// voyage/src/view.rs

//! Screen-facing state: a three-way load status and a live query that keeps
//! it current from a store subscription.

use crate::error::VoyageResult;
use crate::store::Subscription;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadState<T> {
  Loading,
  Success(T),
  Error(String),
}

impl<T> LoadState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, LoadState::Loading)
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      LoadState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> LoadState<U> {
    match self {
      LoadState::Loading => LoadState::Loading,
      LoadState::Success(data) => LoadState::Success(f(data)),
      LoadState::Error(message) => LoadState::Error(message),
    }
  }
}

impl<T> From<VoyageResult<T>> for LoadState<T> {
  fn from(result: VoyageResult<T>) -> Self {
    match result {
      Ok(data) => LoadState::Success(data),
      Err(e) => LoadState::Error(e.to_string()),
    }
  }
}

/// Owns a subscription and the latest state it produced. Dropping the live
/// query ends the subscription.
#[derive(Debug)]
pub struct LiveQuery<T> {
  subscription: Subscription<T>,
  state: LoadState<T>,
}

impl<T> LiveQuery<T> {
  pub fn new(subscription: Subscription<T>) -> Self {
    Self {
      subscription,
      state: LoadState::Loading,
    }
  }

  pub fn state(&self) -> &LoadState<T> {
    &self.state
  }

  /// Waits for the next snapshot. Returns `false` once the subscription has ended.
  pub async fn changed(&mut self) -> bool {
    match self.subscription.next().await {
      Some(result) => {
        self.state = result.into();
        true
      }
      None => false,
    }
  }

  /// Applies every snapshot already delivered, without waiting.
  pub fn refresh(&mut self) -> &LoadState<T> {
    while let Some(result) = self.subscription.try_next() {
      self.state = result.into();
    }
    &self.state
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::VoyageError;

  #[test]
  fn results_map_to_states() {
    let ok: LoadState<u8> = Ok(3).into();
    assert_eq!(ok.data(), Some(&3));
    let err: LoadState<u8> = Err(VoyageError::Payment("declined".into())).into();
    assert_eq!(err, LoadState::Error("Payment Processing Error: declined".into()));
    assert!(LoadState::<u8>::Loading.is_loading());
  }

  #[test]
  fn serializes_tagged() {
    let state = LoadState::Success(vec![1, 2]);
    assert_eq!(
      serde_json::to_value(&state).unwrap(),
      serde_json::json!({"state": "SUCCESS", "data": [1, 2]})
    );
  }
}
