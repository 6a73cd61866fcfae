// voyage/src/model/notification.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
  Booking,
  Promotion,
  Reminder,
  System,
}

impl NotificationKind {
  /// Lenient parse used for incoming push payloads; unknown kinds become `System`.
  pub fn parse_lenient(raw: &str) -> Self {
    match raw.trim().to_ascii_uppercase().as_str() {
      "BOOKING" => NotificationKind::Booking,
      "PROMOTION" => NotificationKind::Promotion,
      "REMINDER" => NotificationKind::Reminder,
      _ => NotificationKind::System,
    }
  }
}

/// A delivered, per-user notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
  #[serde(default)]
  pub id: String,
  pub user_id: String,
  pub title: String,
  pub message: String,
  pub kind: NotificationKind,
  pub is_read: bool,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub scheduled_notification_id: Option<String>,
}

/// Who a scheduled notification is delivered to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Audience {
  /// Every customer account.
  AllUsers,
  User {
    #[serde(rename = "userId")]
    user_id: String,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
  Pending,
  Sent,
  Cancelled,
}

impl ScheduleStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      ScheduleStatus::Pending => "PENDING",
      ScheduleStatus::Sent => "SENT",
      ScheduleStatus::Cancelled => "CANCELLED",
    }
  }
}

/// A deferred instruction to produce and deliver a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledNotification {
  #[serde(default)]
  pub id: String,
  pub title: String,
  pub message: String,
  pub kind: NotificationKind,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub scheduled_time: DateTime<Utc>,
  pub audience: Audience,
  pub status: ScheduleStatus,
  pub created_by: String,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub created_at: DateTime<Utc>,
  #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
  pub sent_at: Option<DateTime<Utc>>,
}
