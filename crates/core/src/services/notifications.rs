//! Notification delivery: quiet hours, daily cap, per-channel delivery,
//! grouping, and the deferred queue.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, TimeZone, Timelike, Utc};
use pulse_common::{AppResult, IdGenerator};
use pulse_db::entities::{in_app_notification, notification_queue, proactive_notification};
use pulse_db::repositories::{
    InAppNotificationRepository, NotificationQueueRepository, ProactiveNotificationRepository,
};
use sea_orm::Set;

use crate::services::preferences::{
    Channel, NotificationPreferences, PreferenceSource, QuietHours,
};
use crate::services::transports::{EmailTransport, PushTransport};
use crate::services::trigger::{ProactiveMessage, Suggestion, TriggerPriority};
use crate::services::ActionType;

/// Why a message was deferred instead of delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueReason {
    /// Current time falls inside the user's quiet-hours window.
    QuietHours,
    /// The user's daily delivery cap is reached.
    DailyCap,
}

/// The delivery decision for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryDecision {
    /// Attempt delivery on the configured channels now.
    Deliver,
    /// Queue for later delivery.
    Defer(QueueReason),
}

/// Outcome of one delivery attempt, per channel or queue route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Delivered on a channel.
    Delivered(Channel),
    /// Deferred by quiet hours.
    Queued,
    /// Deferred by the daily cap.
    QueuedLimit,
}

impl DeliveryOutcome {
    /// Stable string form used in the audit row's channel list.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delivered(channel) => channel.as_str(),
            Self::Queued => "queued",
            Self::QueuedLimit => "queued_limit",
        }
    }
}

/// Whether an hour of day falls inside a quiet-hours window, with wraparound
/// when `start > end` (e.g. 22→8 covers 22:00 through 07:59).
#[must_use]
pub const fn in_quiet_hours(hour: u32, window: QuietHours) -> bool {
    if window.start <= window.end {
        hour >= window.start && hour < window.end
    } else {
        hour >= window.start || hour < window.end
    }
}

/// Pure delivery policy: quiet hours (with urgent override), then the daily
/// cap (urgent and high exempt).
///
/// `now` carries the user's local offset; quiet hours and the cap window are
/// wall-clock concepts.
#[must_use]
pub fn decide(
    now: DateTime<FixedOffset>,
    priority: TriggerPriority,
    prefs: &NotificationPreferences,
    delivered_today: u64,
) -> DeliveryDecision {
    let hour = now.hour();

    if let Some(window) = prefs.quiet_hours
        && in_quiet_hours(hour, window)
        && !(priority == TriggerPriority::Urgent && prefs.urgent_overrides_quiet)
    {
        return DeliveryDecision::Defer(QueueReason::QuietHours);
    }

    if delivered_today >= u64::from(prefs.max_per_day)
        && !matches!(priority, TriggerPriority::Urgent | TriggerPriority::High)
    {
        return DeliveryDecision::Defer(QueueReason::DailyCap);
    }

    DeliveryDecision::Deliver
}

/// The next occurrence of a given hour of `now`'s local day, strictly after
/// `now`.
#[must_use]
pub fn next_hour_occurrence(now: DateTime<FixedOffset>, hour: u32) -> DateTime<FixedOffset> {
    let candidate = now
        .date_naive()
        .and_hms_opt(hour.min(23), 0, 0)
        .and_then(|dt| now.timezone().from_local_datetime(&dt).single())
        .unwrap_or(now);
    if candidate > now {
        candidate
    } else {
        candidate + Duration::days(1)
    }
}

/// 08:00 the following local day: where cap-deferred entries resume.
#[must_use]
pub fn next_morning(now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    now.date_naive()
        .succ_opt()
        .and_then(|d| d.and_hms_opt(8, 0, 0))
        .and_then(|dt| now.timezone().from_local_datetime(&dt).single())
        .unwrap_or_else(|| now + Duration::days(1))
}

/// Local midnight at the start of `now`'s day: the daily-cap counting window
/// opens here.
#[must_use]
pub fn start_of_day(now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|dt| now.timezone().from_local_datetime(&dt).single())
        .unwrap_or(now)
}

/// Group messages sharing the first two whitespace-delimited title words.
/// Singleton groups pass through unchanged; larger groups collapse into one
/// synthetic message carrying the group's highest priority. Relative order of
/// group heads is preserved.
#[must_use]
pub fn group_similar(messages: Vec<ProactiveMessage>) -> Vec<ProactiveMessage> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<ProactiveMessage>> = HashMap::new();

    for message in messages {
        let key = message
            .title
            .split_whitespace()
            .take(2)
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(message);
    }

    let mut grouped = Vec::with_capacity(order.len());
    for key in order {
        let Some(mut group) = groups.remove(&key) else {
            continue;
        };
        if group.len() == 1 {
            if let Some(message) = group.pop() {
                grouped.push(message);
            }
            continue;
        }

        let priority = group
            .iter()
            .map(|m| m.priority)
            .max()
            .unwrap_or(TriggerPriority::Low);
        let title = group
            .first()
            .map_or_else(String::new, |m| m.title.clone());
        grouped.push(ProactiveMessage {
            title,
            body: format!("You have {} similar notifications", group.len()),
            suggestions: vec![
                Suggestion::new("View all", ActionType::ViewAll, serde_json::json!({})),
                Suggestion::new("Dismiss all", ActionType::DismissAll, serde_json::json!({})),
            ],
            priority,
        });
    }
    grouped
}

const fn in_app_kind(priority: TriggerPriority) -> &'static str {
    match priority {
        TriggerPriority::Urgent => "modal",
        TriggerPriority::High => "banner",
        TriggerPriority::Medium => "toast",
        TriggerPriority::Low => "sidebar",
    }
}

/// Hands a produced message to the delivery pipeline and records the audit
/// row. The engine's seam onto the notification manager.
#[async_trait]
pub trait MessageDispatch: Send + Sync {
    /// Decide, deliver or queue, and persist exactly one notification record
    /// carrying the outcome. `now` carries the user's local offset.
    async fn dispatch(
        &self,
        user_id: &str,
        trigger_type: &str,
        message: &ProactiveMessage,
        prefs: &NotificationPreferences,
        now: DateTime<FixedOffset>,
    ) -> AppResult<Vec<DeliveryOutcome>>;
}

/// Notification manager: applies delivery policy and routes messages to
/// channels or the deferred queue.
#[derive(Clone)]
pub struct NotificationManager {
    notification_repo: ProactiveNotificationRepository,
    queue_repo: NotificationQueueRepository,
    in_app_repo: InAppNotificationRepository,
    push: Option<Arc<dyn PushTransport>>,
    email: Option<Arc<dyn EmailTransport>>,
    preferences: Option<Arc<dyn PreferenceSource>>,
    id_gen: IdGenerator,
}

impl NotificationManager {
    /// Create a new notification manager. Push and email channels stay
    /// inactive until a transport is set.
    #[must_use]
    pub const fn new(
        notification_repo: ProactiveNotificationRepository,
        queue_repo: NotificationQueueRepository,
        in_app_repo: InAppNotificationRepository,
    ) -> Self {
        Self {
            notification_repo,
            queue_repo,
            in_app_repo,
            push: None,
            email: None,
            preferences: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the push transport.
    pub fn set_push_transport(&mut self, transport: Arc<dyn PushTransport>) {
        self.push = Some(transport);
    }

    /// Set the email transport.
    pub fn set_email_transport(&mut self, transport: Arc<dyn EmailTransport>) {
        self.email = Some(transport);
    }

    /// Set the preference lookup consulted when flushing the deferred queue.
    /// Without one, queue flushes use the default preferences.
    pub fn set_preference_source(&mut self, preferences: Arc<dyn PreferenceSource>) {
        self.preferences = Some(preferences);
    }

    /// Apply delivery policy and either deliver on each configured channel or
    /// queue the message. Channel failures are caught per channel and never
    /// block the others.
    pub async fn deliver(
        &self,
        user_id: &str,
        message: &ProactiveMessage,
        prefs: &NotificationPreferences,
        now: DateTime<FixedOffset>,
    ) -> AppResult<Vec<DeliveryOutcome>> {
        let delivered_today = self
            .notification_repo
            .count_delivered_since(user_id, start_of_day(now).to_utc())
            .await?;

        match decide(now, message.priority, prefs, delivered_today) {
            DeliveryDecision::Defer(reason) => {
                let deliver_after = match reason {
                    QueueReason::QuietHours => {
                        let end = prefs.quiet_hours.map_or(8, |w| w.end);
                        next_hour_occurrence(now, end)
                    }
                    QueueReason::DailyCap => next_morning(now),
                };
                self.enqueue(user_id, message, now, deliver_after).await?;
                let outcome = match reason {
                    QueueReason::QuietHours => DeliveryOutcome::Queued,
                    QueueReason::DailyCap => DeliveryOutcome::QueuedLimit,
                };
                Ok(vec![outcome])
            }
            DeliveryDecision::Deliver => {
                let mut outcomes = Vec::new();
                for channel in &prefs.channels {
                    match self.deliver_on_channel(*channel, user_id, message).await {
                        Ok(()) => outcomes.push(DeliveryOutcome::Delivered(*channel)),
                        Err(e) => {
                            tracing::warn!(
                                error = %e,
                                channel = channel.as_str(),
                                user_id = %user_id,
                                "Channel delivery failed, skipping"
                            );
                        }
                    }
                }
                Ok(outcomes)
            }
        }
    }

    async fn deliver_on_channel(
        &self,
        channel: Channel,
        user_id: &str,
        message: &ProactiveMessage,
    ) -> AppResult<()> {
        match channel {
            Channel::InApp => self.deliver_in_app(user_id, message).await,
            Channel::Push => match &self.push {
                Some(transport) => transport.send(user_id, message).await,
                None => Err(pulse_common::AppError::ExternalService(
                    "push transport not configured".to_string(),
                )),
            },
            Channel::Email => match &self.email {
                Some(transport) => transport.send(user_id, message).await,
                None => Err(pulse_common::AppError::ExternalService(
                    "email transport not configured".to_string(),
                )),
            },
        }
    }

    /// Persist the presentational in-app row derived from message priority.
    async fn deliver_in_app(&self, user_id: &str, message: &ProactiveMessage) -> AppResult<()> {
        let priority = message.priority;
        let model = in_app_notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            kind: Set(in_app_kind(priority).to_string()),
            title: Set(message.title.clone()),
            body: Set(message.body.clone()),
            persistent: Set(matches!(
                priority,
                TriggerPriority::High | TriggerPriority::Urgent
            )),
            dismissable: Set(true),
            auto_hide_seconds: Set((priority == TriggerPriority::Low).then_some(10)),
            read_at: Set(None),
            created_at: Set(Utc::now().into()),
        };
        self.in_app_repo.create(model).await?;
        Ok(())
    }

    async fn enqueue(
        &self,
        user_id: &str,
        message: &ProactiveMessage,
        now: DateTime<FixedOffset>,
        deliver_after: DateTime<FixedOffset>,
    ) -> AppResult<()> {
        let model = notification_queue::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            message_json: Set(serde_json::to_value(message)
                .map_err(|e| pulse_common::AppError::Internal(e.to_string()))?),
            queued_at: Set(now.into()),
            deliver_after: Set(deliver_after.into()),
            delivered: Set(false),
        };
        self.queue_repo.enqueue(model).await?;
        Ok(())
    }

    /// Deliver due queue entries in-app, per user, and mark them delivered.
    /// Users with grouping enabled get similar entries collapsed into one
    /// synthetic message. Idempotent: already-delivered rows never come back
    /// from `find_due`.
    pub async fn process_queue(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let due = self.queue_repo.find_due(now).await?;

        let mut order: Vec<String> = Vec::new();
        let mut per_user: HashMap<String, Vec<notification_queue::Model>> = HashMap::new();
        for entry in due {
            if !per_user.contains_key(&entry.user_id) {
                order.push(entry.user_id.clone());
            }
            per_user.entry(entry.user_id.clone()).or_default().push(entry);
        }

        let mut delivered = 0;
        for user_id in order {
            let Some(entries) = per_user.remove(&user_id) else {
                continue;
            };
            delivered += self.flush_user_queue(&user_id, entries).await?;
        }
        Ok(delivered)
    }

    /// Flush one user's due entries: the entries either all get delivered and
    /// marked, or none are marked and the whole batch retries next sweep.
    async fn flush_user_queue(
        &self,
        user_id: &str,
        entries: Vec<notification_queue::Model>,
    ) -> AppResult<u64> {
        let mut messages = Vec::new();
        let mut entry_ids = Vec::new();
        for entry in entries {
            match serde_json::from_value::<ProactiveMessage>(entry.message_json.clone()) {
                Ok(message) => {
                    messages.push(message);
                    entry_ids.push(entry.id);
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        entry_id = %entry.id,
                        "Malformed queued message, dropping"
                    );
                    self.queue_repo.mark_delivered(&entry.id).await?;
                }
            }
        }
        if messages.is_empty() {
            return Ok(0);
        }

        let group = match &self.preferences {
            Some(source) => match source.get(user_id).await {
                Ok(prefs) => prefs.notifications.group_similar,
                Err(e) => {
                    tracing::warn!(error = %e, user_id = %user_id, "Preference lookup failed");
                    NotificationPreferences::default().group_similar
                }
            },
            None => NotificationPreferences::default().group_similar,
        };
        let batch = if group { group_similar(messages) } else { messages };

        for message in &batch {
            if let Err(e) = self.deliver_in_app(user_id, message).await {
                tracing::warn!(
                    error = %e,
                    user_id = %user_id,
                    "Deferred delivery failed, will retry next sweep"
                );
                return Ok(0);
            }
        }
        for id in &entry_ids {
            self.queue_repo.mark_delivered(id).await?;
        }
        Ok(entry_ids.len() as u64)
    }

    /// Inbox: list a user's notification records.
    pub async fn list_notifications(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
        unread_only: bool,
    ) -> AppResult<Vec<proactive_notification::Model>> {
        self.notification_repo
            .find_by_user(user_id, limit, until_id, unread_only)
            .await
    }

    /// Mark a notification record read.
    pub async fn mark_read(&self, id: &str) -> AppResult<()> {
        self.notification_repo.mark_read(id).await
    }

    /// Record which suggestion the user acted on.
    pub async fn mark_action_taken(&self, id: &str, action: &str) -> AppResult<()> {
        self.notification_repo.mark_action_taken(id, action).await
    }

    /// Dismiss a notification record.
    pub async fn dismiss(&self, id: &str) -> AppResult<()> {
        self.notification_repo.dismiss(id).await
    }

    /// Poll a user's in-app notifications.
    pub async fn list_in_app(
        &self,
        user_id: &str,
        limit: u64,
        unread_only: bool,
    ) -> AppResult<Vec<in_app_notification::Model>> {
        self.in_app_repo.find_by_user(user_id, limit, unread_only).await
    }

    /// Mark an in-app notification read.
    pub async fn mark_in_app_read(&self, id: &str) -> AppResult<()> {
        self.in_app_repo.mark_read(id).await
    }
}

#[async_trait]
impl MessageDispatch for NotificationManager {
    async fn dispatch(
        &self,
        user_id: &str,
        trigger_type: &str,
        message: &ProactiveMessage,
        prefs: &NotificationPreferences,
        now: DateTime<FixedOffset>,
    ) -> AppResult<Vec<DeliveryOutcome>> {
        let outcomes = self.deliver(user_id, message, prefs, now).await?;

        let channels: Vec<&str> = outcomes.iter().map(|o| o.as_str()).collect();
        let model = proactive_notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            trigger_type: Set(trigger_type.to_string()),
            message_json: Set(serde_json::to_value(message)
                .map_err(|e| pulse_common::AppError::Internal(e.to_string()))?),
            channels_json: Set(serde_json::to_value(&channels)
                .map_err(|e| pulse_common::AppError::Internal(e.to_string()))?),
            sent_at: Set(now.into()),
            read_at: Set(None),
            action_taken: Set(None),
            dismissed: Set(false),
        };
        self.notification_repo.create(model).await?;

        Ok(outcomes)
    }
}
