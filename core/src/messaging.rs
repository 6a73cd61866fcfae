// voyage/src/messaging.rs

//! Push delivery and on-device notification surfaces.

use crate::clock::Clock;
use crate::error::VoyageResult;
use crate::model::{Notification, NotificationKind};
use crate::repository::{NotificationRepository, UserRepository};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
  pub title: String,
  pub message: String,
  pub kind: NotificationKind,
}

/// A push payload as received from the transport. `kind` is free text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IncomingMessage {
  pub title: String,
  pub message: String,
  #[serde(default)]
  pub kind: String,
}

/// Remote push delivery to a device token.
#[async_trait]
pub trait PushTransport: Send + Sync {
  async fn send_to_token(&self, token: &str, message: &PushMessage) -> VoyageResult<()>;
}

/// Raises a notification on the local surface (a tray, a log, a test probe).
pub trait LocalNotifier: Send + Sync {
  fn notify(&self, title: &str, message: &str, kind: NotificationKind);
}

/// Emits local notifications as log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl LocalNotifier for LogNotifier {
  fn notify(&self, title: &str, message: &str, kind: NotificationKind) {
    info!(?kind, title, message, "local notification");
  }
}

/// Keeps every local notification it is given.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
  raised: Mutex<Vec<PushMessage>>,
}

impl RecordingNotifier {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn raised(&self) -> Vec<PushMessage> {
    self.raised.lock().clone()
  }
}

impl LocalNotifier for RecordingNotifier {
  fn notify(&self, title: &str, message: &str, kind: NotificationKind) {
    self.raised.lock().push(PushMessage {
      title: title.to_string(),
      message: message.to_string(),
      kind,
    });
  }
}

/// A transport that records deliveries instead of sending them.
#[derive(Debug, Default)]
pub struct RecordingPushTransport {
  sent: Mutex<Vec<(String, PushMessage)>>,
}

impl RecordingPushTransport {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn sent(&self) -> Vec<(String, PushMessage)> {
    self.sent.lock().clone()
  }
}

#[async_trait]
impl PushTransport for RecordingPushTransport {
  async fn send_to_token(&self, token: &str, message: &PushMessage) -> VoyageResult<()> {
    self.sent.lock().push((token.to_string(), message.clone()));
    Ok(())
  }
}

#[derive(Clone)]
pub struct MessagingService {
  users: UserRepository,
  notifications: NotificationRepository,
  notifier: Arc<dyn LocalNotifier>,
  clock: Arc<dyn Clock>,
}

impl MessagingService {
  pub fn new(
    users: UserRepository,
    notifications: NotificationRepository,
    notifier: Arc<dyn LocalNotifier>,
    clock: Arc<dyn Clock>,
  ) -> Self {
    Self {
      users,
      notifications,
      notifier,
      clock,
    }
  }

  /// Stores the device token the transport handed out for this user.
  pub async fn register_push_token(&self, user_id: &str, token: &str) -> VoyageResult<bool> {
    self.users.set_push_token(user_id, Some(token)).await
  }

  /// Handles a pushed message: raises it locally and, when the recipient is
  /// known, keeps it in their notification list.
  #[instrument(name = "MessagingService::receive_incoming", skip(self, incoming), fields(title = %incoming.title), err(Display))]
  pub async fn receive_incoming(&self, user_id: Option<&str>, incoming: IncomingMessage) -> VoyageResult<Option<Notification>> {
    let kind = NotificationKind::parse_lenient(&incoming.kind);
    self.notifier.notify(&incoming.title, &incoming.message, kind);

    let Some(user_id) = user_id else {
      return Ok(None);
    };
    let mut notification = Notification {
      id: String::new(),
      user_id: user_id.to_string(),
      title: incoming.title,
      message: incoming.message,
      kind,
      is_read: false,
      created_at: self.clock.now(),
      scheduled_notification_id: None,
    };
    notification.id = self.notifications.create_notification(&notification).await?;
    Ok(Some(notification))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::clock::SystemClock;
  use crate::store::{DocumentStore, MemoryStore};

  #[tokio::test]
  async fn incoming_message_is_raised_and_stored() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let service = MessagingService::new(
      UserRepository::new(store.clone()),
      NotificationRepository::new(store.clone()),
      notifier.clone(),
      Arc::new(SystemClock),
    );
    let incoming = IncomingMessage {
      title: "Gate change".into(),
      message: "Now boarding at B12".into(),
      kind: "whatever".into(),
    };

    let stored = service.receive_incoming(Some("u1"), incoming.clone()).await.unwrap().unwrap();
    assert_eq!(stored.kind, NotificationKind::System);
    assert!(service.receive_incoming(None, incoming).await.unwrap().is_none());
    assert_eq!(notifier.raised().len(), 2);
    let listed = NotificationRepository::new(store).notifications_for_user("u1").await.unwrap();
    assert_eq!(listed.len(), 1);
  }
}
