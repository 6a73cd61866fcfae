// voyage/src/scheduler/tasks.rs

//! Deferred one-shot tasks on the tokio runtime, cancellable by tag.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, Instrument};

#[derive(Debug, Default)]
struct Registry {
  /// tag -> task ids
  tags: HashMap<String, Vec<u64>>,
  tokens: HashMap<u64, CancellationToken>,
}

impl Registry {
  fn forget(&mut self, task_id: u64) {
    self.tokens.remove(&task_id);
    self.tags.retain(|_, ids| {
      ids.retain(|id| *id != task_id);
      !ids.is_empty()
    });
  }
}

/// Runs futures after a delay, detached from the caller. Each task is
/// registered under one or more tags; cancelling a tag stops every task
/// under it that has not started running yet.
#[derive(Debug, Clone, Default)]
pub struct TaskScheduler {
  registry: Arc<Mutex<Registry>>,
  next_id: Arc<AtomicU64>,
}

impl TaskScheduler {
  pub fn new() -> Self {
    Self::default()
  }

  /// Must be called from within a tokio runtime.
  pub fn enqueue<F>(&self, delay: Duration, tags: &[&str], task: F) -> u64
  where
    F: Future<Output = ()> + Send + 'static,
  {
    let task_id = self.next_id.fetch_add(1, Ordering::Relaxed);
    let token = CancellationToken::new();
    {
      let mut registry = self.registry.lock();
      registry.tokens.insert(task_id, token.clone());
      for tag in tags {
        registry.tags.entry((*tag).to_string()).or_default().push(task_id);
      }
    }

    let registry = self.registry.clone();
    let span = tracing::debug_span!("scheduled_task", task_id, delay_ms = delay.as_millis() as u64);
    tokio::spawn(
      async move {
        tokio::select! {
          _ = token.cancelled() => debug!("task cancelled before it ran"),
          _ = tokio::time::sleep(delay) => {
            registry.lock().forget(task_id);
            task.await;
          }
        }
        registry.lock().forget(task_id);
      }
      .instrument(span),
    );
    task_id
  }

  /// Cancels every waiting task under `tag`. Returns how many were cancelled.
  pub fn cancel_by_tag(&self, tag: &str) -> usize {
    let mut registry = self.registry.lock();
    let ids = registry.tags.remove(tag).unwrap_or_default();
    let mut cancelled = 0;
    for id in ids {
      if let Some(token) = registry.tokens.get(&id) {
        token.cancel();
        cancelled += 1;
      }
      registry.forget(id);
    }
    cancelled
  }

  /// Number of tasks under `tag` still waiting for their delay.
  pub fn pending(&self, tag: &str) -> usize {
    self.registry.lock().tags.get(tag).map_or(0, Vec::len)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::AtomicUsize;

  #[tokio::test(start_paused = true)]
  async fn runs_after_delay_unless_cancelled() {
    let scheduler = TaskScheduler::new();
    let ran = Arc::new(AtomicUsize::new(0));

    for tag in ["a", "b"] {
      let ran = ran.clone();
      scheduler.enqueue(Duration::from_secs(60), &[tag, "all"], async move {
        ran.fetch_add(1, Ordering::SeqCst);
      });
    }
    assert_eq!(scheduler.pending("all"), 2);
    assert_eq!(scheduler.cancel_by_tag("a"), 1);
    assert_eq!(scheduler.pending("all"), 1);

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(ran.load(Ordering::SeqCst), 1);
    assert_eq!(scheduler.pending("all"), 0);
    assert_eq!(scheduler.cancel_by_tag("b"), 0);
  }
}
