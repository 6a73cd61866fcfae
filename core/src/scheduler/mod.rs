// voyage/src/scheduler/mod.rs

//! Scheduled notifications: persistence, deferred dispatch and recovery.
//!
//! A scheduled notification is written PENDING, then a one-shot task is
//! queued for its time (immediately if that time has passed). Dispatch runs
//! the `notification_dispatch` pipeline:
//! `load_record -> build_notification -> resolve_recipients ->
//! write_notifications -> push_delivery -> local_notify -> mark_sent`.
//! Push delivery is optional: a failing transport never stops the run.

pub mod tasks;

pub use tasks::TaskScheduler;

use crate::clock::Clock;
use crate::error::{VoyageError, VoyageResult, WorkflowError};
use crate::messaging::{LocalNotifier, PushMessage, PushTransport};
use crate::model::{Audience, Notification, NotificationKind, ScheduleStatus, ScheduledNotification, User, UserType};
use crate::repository::{NotificationRepository, UserRepository};
use crate::store::collections::SCHEDULED_NOTIFICATIONS;
use crate::workflow::{ContextData, Pipeline, PipelineControl, PipelineResult};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

/// Tag carried by every scheduled-notification task.
pub const BLANKET_TAG: &str = "scheduled_notifications";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
  pub title: String,
  pub message: String,
  pub kind: NotificationKind,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub scheduled_time: DateTime<Utc>,
  pub audience: Audience,
  #[serde(default)]
  pub created_by: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
  pub dispatched: usize,
  pub requeued: usize,
}

/// Wait before dispatching a notification due at `scheduled_time`: zero when it is already due.
pub fn delay_for(scheduled_time: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
  (scheduled_time - now).to_std().unwrap_or(Duration::ZERO)
}

#[derive(Debug, Clone)]
pub struct DispatchState {
  pub scheduled_id: String,
  pub record: Option<ScheduledNotification>,
  pub template: Option<Notification>,
  pub recipients: Vec<User>,
  pub delivered: Vec<Notification>,
}

#[derive(Clone)]
pub struct NotificationScheduler {
  notifications: NotificationRepository,
  tasks: TaskScheduler,
  clock: Arc<dyn Clock>,
  dispatch: Arc<Pipeline<DispatchState, VoyageError>>,
}

impl NotificationScheduler {
  pub fn new(
    notifications: NotificationRepository,
    users: UserRepository,
    push: Arc<dyn PushTransport>,
    notifier: Arc<dyn LocalNotifier>,
    clock: Arc<dyn Clock>,
  ) -> Self {
    let dispatch = dispatch_pipeline(notifications.clone(), users, push, notifier, clock.clone());
    Self {
      notifications,
      tasks: TaskScheduler::new(),
      clock,
      dispatch: Arc::new(dispatch),
    }
  }

  pub fn tasks(&self) -> &TaskScheduler {
    &self.tasks
  }

  /// Persists a PENDING record and queues its dispatch.
  #[instrument(name = "NotificationScheduler::schedule", skip_all, fields(title = %request.title), err(Display))]
  pub async fn schedule(&self, request: ScheduleRequest) -> VoyageResult<ScheduledNotification> {
    let mut errors = crate::error::FieldErrors::new();
    if request.title.trim().is_empty() {
      errors.add("title", "Title is required.");
    }
    if request.message.trim().is_empty() {
      errors.add("message", "Message is required.");
    }
    if let Audience::User { user_id } = &request.audience {
      if user_id.trim().is_empty() {
        errors.add("audience", "Choose a recipient.");
      }
    }
    errors.into_result()?;

    let now = self.clock.now();
    let mut record = ScheduledNotification {
      id: String::new(),
      title: request.title,
      message: request.message,
      kind: request.kind,
      scheduled_time: request.scheduled_time,
      audience: request.audience,
      status: ScheduleStatus::Pending,
      created_by: request.created_by,
      created_at: now,
      sent_at: None,
    };
    record.id = self.notifications.create_scheduled(&record).await?;
    self.enqueue(&record.id, delay_for(record.scheduled_time, now));
    info!(scheduled_id = %record.id, at = %record.scheduled_time, "notification scheduled");
    Ok(record)
  }

  /// Stops the pending task and marks the record CANCELLED. Returns `false`
  /// when the record is unknown or no longer pending.
  #[instrument(name = "NotificationScheduler::cancel", skip(self), err(Display))]
  pub async fn cancel(&self, scheduled_id: &str) -> VoyageResult<bool> {
    self.tasks.cancel_by_tag(scheduled_id);
    match self.notifications.get_scheduled(scheduled_id).await? {
      Some(record) if record.status == ScheduleStatus::Pending => {
        self.notifications.mark_scheduled_cancelled(scheduled_id).await?;
        Ok(true)
      }
      _ => Ok(false),
    }
  }

  /// Cancels every queued task. Records stay PENDING and are picked up by
  /// the next [`recover_pending`](Self::recover_pending).
  pub fn cancel_all(&self) -> usize {
    let cancelled = self.tasks.cancel_by_tag(BLANKET_TAG);
    info!(cancelled, "all scheduled notification tasks cancelled");
    cancelled
  }

  /// Startup recovery: due PENDING records are dispatched now, future ones
  /// are queued again with their remaining delay.
  #[instrument(name = "NotificationScheduler::recover_pending", skip(self), err(Display))]
  pub async fn recover_pending(&self) -> VoyageResult<RecoveryReport> {
    let now = self.clock.now();
    let mut report = RecoveryReport::default();
    for record in self.notifications.pending_scheduled().await? {
      if self.tasks.pending(&record.id) > 0 {
        continue;
      }
      if record.scheduled_time <= now {
        if let Err(e) = self.dispatch(&record.id).await {
          error!(scheduled_id = %record.id, error = %e, "recovered notification failed to dispatch");
          continue;
        }
        report.dispatched += 1;
      } else {
        self.enqueue(&record.id, delay_for(record.scheduled_time, now));
        report.requeued += 1;
      }
    }
    info!(dispatched = report.dispatched, requeued = report.requeued, "pending notifications recovered");
    Ok(report)
  }

  /// Delivers one scheduled notification now. Records that are no longer
  /// PENDING are left alone.
  pub async fn dispatch(&self, scheduled_id: &str) -> VoyageResult<PipelineResult> {
    let ctx = ContextData::new(DispatchState {
      scheduled_id: scheduled_id.to_string(),
      record: None,
      template: None,
      recipients: Vec::new(),
      delivered: Vec::new(),
    });
    self.dispatch.run(ctx).await
  }

  fn enqueue(&self, scheduled_id: &str, delay: Duration) {
    let this = self.clone();
    let id = scheduled_id.to_string();
    self.tasks.enqueue(delay, &[scheduled_id, BLANKET_TAG], async move {
      if let Err(e) = this.dispatch(&id).await {
        error!(scheduled_id = %id, error = %e, "scheduled notification dispatch failed");
      }
    });
  }
}

fn missing_context(step: &str, field: &'static str) -> VoyageError {
  VoyageError::from(WorkflowError::MissingContext {
    step_name: step.to_string(),
    field,
  })
}

fn dispatch_pipeline(
  notifications: NotificationRepository,
  users: UserRepository,
  push: Arc<dyn PushTransport>,
  notifier: Arc<dyn LocalNotifier>,
  clock: Arc<dyn Clock>,
) -> Pipeline<DispatchState, VoyageError> {
  let mut p = Pipeline::<DispatchState, VoyageError>::new(
    "notification_dispatch",
    &[
      ("load_record", false, None),
      ("build_notification", false, None),
      ("resolve_recipients", false, None),
      ("write_notifications", false, None),
      ("push_delivery", true, None),
      ("local_notify", false, None),
      ("mark_sent", false, None),
    ],
  );

  let loader = notifications.clone();
  p.on_step("load_record", move |ctx: ContextData<DispatchState>| {
    let notifications = loader.clone();
    async move {
      let id = ctx.read().scheduled_id.clone();
      let record = notifications
        .get_scheduled(&id)
        .await?
        .ok_or_else(|| VoyageError::missing(SCHEDULED_NOTIFICATIONS, &id))?;
      if record.status != ScheduleStatus::Pending {
        info!(scheduled_id = %id, status = record.status.as_str(), "scheduled notification no longer pending");
        return Ok(PipelineControl::Stop);
      }
      ctx.write().record = Some(record);
      Ok::<_, VoyageError>(PipelineControl::Continue)
    }
  });

  let build_clock = clock.clone();
  p.on_step("build_notification", move |ctx: ContextData<DispatchState>| {
    let clock = build_clock.clone();
    async move {
      let mut state = ctx.write();
      let record = state
        .record
        .as_ref()
        .ok_or_else(|| missing_context("build_notification", "record"))?;
      let template = Notification {
        id: String::new(),
        user_id: String::new(),
        title: record.title.clone(),
        message: record.message.clone(),
        kind: record.kind,
        is_read: false,
        created_at: clock.now(),
        scheduled_notification_id: Some(record.id.clone()),
      };
      state.template = Some(template);
      Ok::<_, VoyageError>(PipelineControl::Continue)
    }
  });

  p.on_step("resolve_recipients", move |ctx: ContextData<DispatchState>| {
    let users = users.clone();
    async move {
      let audience = ctx
        .read()
        .record
        .as_ref()
        .map(|r| r.audience.clone())
        .ok_or_else(|| missing_context("resolve_recipients", "record"))?;
      let recipients = match audience {
        Audience::AllUsers => users.list_by_type(UserType::Customer).await?,
        Audience::User { user_id } => match users.get_user(&user_id).await? {
          Some(user) => vec![user],
          None => {
            warn!(%user_id, "scheduled notification recipient does not exist");
            Vec::new()
          }
        },
      };
      ctx.write().recipients = recipients;
      Ok::<_, VoyageError>(PipelineControl::Continue)
    }
  });

  let writer = notifications.clone();
  p.on_step("write_notifications", move |ctx: ContextData<DispatchState>| {
    let notifications = writer.clone();
    async move {
      let (template, recipients) = {
        let state = ctx.read();
        let template = state
          .template
          .clone()
          .ok_or_else(|| missing_context("write_notifications", "template"))?;
        (template, state.recipients.clone())
      };
      let mut delivered = Vec::with_capacity(recipients.len());
      for user in &recipients {
        let mut notification = template.clone();
        notification.user_id = user.id.clone();
        notification.id = notifications.create_notification(&notification).await?;
        delivered.push(notification);
      }
      ctx.write().delivered = delivered;
      Ok::<_, VoyageError>(PipelineControl::Continue)
    }
  });

  p.on_step("push_delivery", move |ctx: ContextData<DispatchState>| {
    let push = push.clone();
    async move {
      let (message, tokens) = {
        let state = ctx.read();
        let template = state
          .template
          .as_ref()
          .ok_or_else(|| missing_context("push_delivery", "template"))?;
        let message = PushMessage {
          title: template.title.clone(),
          message: template.message.clone(),
          kind: template.kind,
        };
        let tokens: Vec<String> = state.recipients.iter().filter_map(|u| u.push_token.clone()).collect();
        (message, tokens)
      };
      let mut failed = 0usize;
      for token in &tokens {
        if let Err(e) = push.send_to_token(token, &message).await {
          warn!(error = %e, "push delivery failed");
          failed += 1;
        }
      }
      if failed > 0 {
        return Err(VoyageError::Delivery(format!(
          "{} of {} push deliveries failed",
          failed,
          tokens.len()
        )));
      }
      Ok::<_, VoyageError>(PipelineControl::Continue)
    }
  });

  p.on_step("local_notify", move |ctx: ContextData<DispatchState>| {
    let notifier = notifier.clone();
    async move {
      let state = ctx.read();
      let template = state
        .template
        .as_ref()
        .ok_or_else(|| missing_context("local_notify", "template"))?;
      notifier.notify(&template.title, &template.message, template.kind);
      Ok::<_, VoyageError>(PipelineControl::Continue)
    }
  });

  p.on_step("mark_sent", move |ctx: ContextData<DispatchState>| {
    let notifications = notifications.clone();
    let clock = clock.clone();
    async move {
      let (id, recipients) = ctx.with(|state| (state.scheduled_id.clone(), state.delivered.len()));
      notifications.mark_scheduled_sent(&id, clock.now()).await?;
      info!(scheduled_id = %id, recipients, "scheduled notification sent");
      Ok::<_, VoyageError>(PipelineControl::Continue)
    }
  });

  p
}
