// voyage/src/repository/notifications.rs

use super::{load, load_all, save};
use crate::error::{VoyageError, VoyageResult};
use crate::model::{Notification, ScheduleStatus, ScheduledNotification};
use crate::store::collections::{NOTIFICATIONS, SCHEDULED_NOTIFICATIONS};
use crate::store::{patch, watch, Direction, DocumentStore, Query, Subscription};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::instrument;

#[derive(Clone)]
pub struct NotificationRepository {
  store: Arc<dyn DocumentStore>,
}

impl NotificationRepository {
  pub fn new(store: Arc<dyn DocumentStore>) -> Self {
    Self { store }
  }

  pub async fn create_notification(&self, notification: &Notification) -> VoyageResult<String> {
    save(self.store.as_ref(), NOTIFICATIONS, &notification.id, notification).await
  }

  /// The user's notifications, newest first.
  pub async fn notifications_for_user(&self, user_id: &str) -> VoyageResult<Vec<Notification>> {
    let query = Query::all()
      .where_eq("userId", user_id)
      .order_by("createdAt", Direction::Descending);
    load_all(self.store.as_ref(), NOTIFICATIONS, &query).await
  }

  pub async fn notifications_for_schedule(&self, scheduled_id: &str) -> VoyageResult<Vec<Notification>> {
    let query = Query::all().where_eq("scheduledNotificationId", scheduled_id);
    load_all(self.store.as_ref(), NOTIFICATIONS, &query).await
  }

  pub async fn unread_count(&self, user_id: &str) -> VoyageResult<u64> {
    let query = Query::all().where_eq("userId", user_id).where_eq("isRead", false);
    Ok(self.store.count(NOTIFICATIONS, &query).await?)
  }

  /// Returns `false` if the notification does not exist.
  pub async fn mark_read(&self, id: &str) -> VoyageResult<bool> {
    Ok(self.store.update(NOTIFICATIONS, id, patch([("isRead", json!(true))])).await?)
  }

  pub async fn mark_all_read(&self, user_id: &str) -> VoyageResult<usize> {
    let query = Query::all().where_eq("userId", user_id).where_eq("isRead", false);
    let unread = self.store.query(NOTIFICATIONS, &query).await?;
    let mut marked = 0;
    for doc in unread {
      if self.mark_read(&doc.id).await? {
        marked += 1;
      }
    }
    Ok(marked)
  }

  pub async fn delete_notification(&self, id: &str) -> VoyageResult<bool> {
    Ok(self.store.delete(NOTIFICATIONS, id).await?)
  }

  pub fn watch_user_notifications(&self, user_id: &str) -> Subscription<Vec<Notification>> {
    let repo = self.clone();
    let user_id = user_id.to_string();
    watch(self.store.clone(), vec![NOTIFICATIONS.to_string()], move || {
      let repo = repo.clone();
      let user_id = user_id.clone();
      async move { repo.notifications_for_user(&user_id).await }
    })
  }

  #[instrument(name = "NotificationRepository::create_scheduled", skip_all, fields(title = %scheduled.title), err(Display))]
  pub async fn create_scheduled(&self, scheduled: &ScheduledNotification) -> VoyageResult<String> {
    save(self.store.as_ref(), SCHEDULED_NOTIFICATIONS, &scheduled.id, scheduled).await
  }

  pub async fn get_scheduled(&self, id: &str) -> VoyageResult<Option<ScheduledNotification>> {
    load(self.store.as_ref(), SCHEDULED_NOTIFICATIONS, id).await
  }

  /// All scheduled notifications, soonest first.
  pub async fn list_scheduled(&self) -> VoyageResult<Vec<ScheduledNotification>> {
    let query = Query::all().order_by("scheduledTime", Direction::Ascending);
    load_all(self.store.as_ref(), SCHEDULED_NOTIFICATIONS, &query).await
  }

  pub async fn pending_scheduled(&self) -> VoyageResult<Vec<ScheduledNotification>> {
    let query = Query::all()
      .where_eq("status", ScheduleStatus::Pending.as_str())
      .order_by("scheduledTime", Direction::Ascending);
    load_all(self.store.as_ref(), SCHEDULED_NOTIFICATIONS, &query).await
  }

  pub async fn mark_scheduled_sent(&self, id: &str, sent_at: DateTime<Utc>) -> VoyageResult<()> {
    self
      .patch_scheduled(
        id,
        patch([
          ("status", json!(ScheduleStatus::Sent)),
          ("sentAt", json!(sent_at.timestamp_millis())),
        ]),
      )
      .await
  }

  pub async fn mark_scheduled_cancelled(&self, id: &str) -> VoyageResult<()> {
    self
      .patch_scheduled(id, patch([("status", json!(ScheduleStatus::Cancelled))]))
      .await
  }

  async fn patch_scheduled(&self, id: &str, fields: serde_json::Map<String, serde_json::Value>) -> VoyageResult<()> {
    if self.store.update(SCHEDULED_NOTIFICATIONS, id, fields).await? {
      Ok(())
    } else {
      Err(VoyageError::missing(SCHEDULED_NOTIFICATIONS, id))
    }
  }
}
