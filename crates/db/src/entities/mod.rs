//! Database entities.

#![allow(missing_docs)]

pub mod action_log;
pub mod automation_rule;
pub mod in_app_notification;
pub mod notification_queue;
pub mod proactive_notification;
pub mod trigger_state;
pub mod user_trigger_preferences;

pub use action_log::Entity as ActionLog;
pub use automation_rule::Entity as AutomationRule;
pub use in_app_notification::Entity as InAppNotification;
pub use notification_queue::Entity as NotificationQueue;
pub use proactive_notification::Entity as ProactiveNotification;
pub use trigger_state::Entity as TriggerState;
pub use user_trigger_preferences::Entity as UserTriggerPreferences;
