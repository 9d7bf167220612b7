//! Built-in action handlers.
//!
//! The item/goal/habit handlers live with their owning domain services; the
//! handlers here are the ones the engine itself provides.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use pulse_common::{AppError, AppResult, IdGenerator};
use pulse_db::entities::in_app_notification;
use pulse_db::repositories::InAppNotificationRepository;
use sea_orm::Set;
use serde::Deserialize;

use crate::services::actions::{ActionHandler, ActionResult, ActionType};
use crate::services::preferences::PreferenceService;
use crate::services::trigger::AutoAction;

#[derive(Debug, Deserialize)]
struct SnoozeParams {
    trigger_type: String,
    /// New cooldown override in minutes; absent clears the override.
    minutes: Option<i64>,
}

/// Sets (or clears) a per-trigger cooldown override for the invoking user.
/// The result carries an undo action restoring the previous override.
pub struct SnoozeTriggerHandler {
    preferences: PreferenceService,
}

impl SnoozeTriggerHandler {
    /// Create the handler.
    #[must_use]
    pub const fn new(preferences: PreferenceService) -> Self {
        Self { preferences }
    }
}

#[async_trait]
impl ActionHandler for SnoozeTriggerHandler {
    async fn execute(&self, params: &serde_json::Value, user_id: &str) -> AppResult<ActionResult> {
        let params: SnoozeParams = serde_json::from_value(params.clone())
            .map_err(|e| AppError::BadRequest(format!("Invalid snooze parameters: {e}")))?;

        let previous = self
            .preferences
            .get(user_id)
            .await?
            .custom_cooldowns
            .get(&params.trigger_type)
            .copied();

        match params.minutes {
            Some(minutes) => {
                self.preferences
                    .set_custom_cooldown(user_id, &params.trigger_type, minutes)
                    .await?;
            }
            None => {
                self.preferences
                    .clear_custom_cooldown(user_id, &params.trigger_type)
                    .await?;
            }
        }

        let undo = AutoAction {
            action: ActionType::SnoozeTrigger,
            params: serde_json::json!({
                "trigger_type": params.trigger_type,
                "minutes": previous,
            }),
        };
        let message = match params.minutes {
            Some(minutes) => format!("Snoozed {} for {minutes} minutes", params.trigger_type),
            None => format!("Cleared snooze for {}", params.trigger_type),
        };
        Ok(ActionResult::ok_with_undo(message, undo))
    }
}

#[derive(Debug, Deserialize)]
struct SendNotificationParams {
    title: String,
    message: String,
    #[serde(default = "default_kind")]
    kind: String,
}

fn default_kind() -> String {
    "toast".to_string()
}

/// Persists an in-app notification directly, bypassing the trigger pipeline.
/// Used by automation rules that want to surface a custom message.
pub struct SendNotificationHandler {
    in_app_repo: InAppNotificationRepository,
    id_gen: IdGenerator,
}

impl SendNotificationHandler {
    /// Create the handler.
    #[must_use]
    pub const fn new(in_app_repo: InAppNotificationRepository) -> Self {
        Self {
            in_app_repo,
            id_gen: IdGenerator::new(),
        }
    }
}

#[async_trait]
impl ActionHandler for SendNotificationHandler {
    async fn execute(&self, params: &serde_json::Value, user_id: &str) -> AppResult<ActionResult> {
        let params: SendNotificationParams = serde_json::from_value(params.clone())
            .map_err(|e| AppError::BadRequest(format!("Invalid notification parameters: {e}")))?;

        let model = in_app_notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            kind: Set(params.kind),
            title: Set(params.title.clone()),
            body: Set(params.message),
            persistent: Set(false),
            dismissable: Set(true),
            auto_hide_seconds: Set(None),
            read_at: Set(None),
            created_at: Set(Utc::now().into()),
        };
        self.in_app_repo.create(model).await?;

        Ok(ActionResult::ok(format!(
            "Notification sent: {}",
            params.title
        )))
    }
}

/// Register the engine's built-in handlers.
pub fn register_builtin_handlers(
    executor: &crate::services::actions::ActionExecutor,
    preferences: PreferenceService,
    in_app_repo: InAppNotificationRepository,
) {
    executor.register(
        ActionType::SnoozeTrigger,
        Arc::new(SnoozeTriggerHandler::new(preferences)),
    );
    executor.register(
        ActionType::SendNotification,
        Arc::new(SendNotificationHandler::new(in_app_repo)),
    );
}
