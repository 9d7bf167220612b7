//! Database repositories.

#![allow(missing_docs)]

pub mod action_log;
pub mod automation_rule;
pub mod in_app_notification;
pub mod notification_queue;
pub mod proactive_notification;
pub mod trigger_state;
pub mod user_trigger_preferences;

pub use action_log::ActionLogRepository;
pub use automation_rule::AutomationRuleRepository;
pub use in_app_notification::InAppNotificationRepository;
pub use notification_queue::NotificationQueueRepository;
pub use proactive_notification::ProactiveNotificationRepository;
pub use trigger_state::TriggerStateRepository;
pub use user_trigger_preferences::PreferenceRepository;
