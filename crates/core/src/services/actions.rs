//! Action execution with audit logging.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use pulse_common::{AppResult, IdGenerator};
use pulse_db::entities::action_log;
use pulse_db::repositories::ActionLogRepository;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use crate::services::trigger::AutoAction;

/// The closed set of executable action types. Handlers are registered against
/// these variants at process start; persistence uses the snake_case string
/// form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Create a task/item.
    CreateItem,
    /// Mark an item completed.
    CompleteItem,
    /// Move an item to a new date.
    RescheduleItem,
    /// Override a trigger's cooldown for the invoking user.
    SnoozeTrigger,
    /// Adjust a goal's target.
    AdjustGoalTarget,
    /// Log a habit for today.
    LogHabit,
    /// Send an in-app notification directly.
    SendNotification,
    /// Call a user-configured webhook.
    Webhook,
    /// Open the full list behind a grouped notification.
    ViewAll,
    /// Dismiss every message behind a grouped notification.
    DismissAll,
}

impl ActionType {
    /// Stable string form, matching the serialized representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateItem => "create_item",
            Self::CompleteItem => "complete_item",
            Self::RescheduleItem => "reschedule_item",
            Self::SnoozeTrigger => "snooze_trigger",
            Self::AdjustGoalTarget => "adjust_goal_target",
            Self::LogHabit => "log_habit",
            Self::SendNotification => "send_notification",
            Self::Webhook => "webhook",
            Self::ViewAll => "view_all",
            Self::DismissAll => "dismiss_all",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of one action execution. Embedded in the audit row alongside
/// the invoking parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    /// Whether the action succeeded.
    pub success: bool,
    /// Human-readable outcome description.
    pub message: String,
    /// Inverse action that undoes this one, when the handler supports undo.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub undo_action: Option<AutoAction>,
}

impl ActionResult {
    /// A successful result.
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            undo_action: None,
        }
    }

    /// A successful result carrying an undo action.
    #[must_use]
    pub fn ok_with_undo(message: impl Into<String>, undo: AutoAction) -> Self {
        Self {
            success: true,
            message: message.into(),
            undo_action: Some(undo),
        }
    }

    /// A failed result.
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            undo_action: None,
        }
    }
}

/// A registered action handler.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Execute the action for a user. An `Err` here is converted by the
    /// executor into a failed `ActionResult`, never propagated.
    async fn execute(&self, params: &serde_json::Value, user_id: &str) -> AppResult<ActionResult>;
}

/// Destination for action audit rows.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one audit row for an action invocation.
    async fn append(
        &self,
        user_id: &str,
        action_type: &str,
        params: &serde_json::Value,
        result: &ActionResult,
    ) -> AppResult<()>;
}

#[async_trait]
impl AuditSink for ActionLogRepository {
    async fn append(
        &self,
        user_id: &str,
        action_type: &str,
        params: &serde_json::Value,
        result: &ActionResult,
    ) -> AppResult<()> {
        let id_gen = IdGenerator::new();
        let model = action_log::ActiveModel {
            id: Set(id_gen.generate()),
            user_id: Set(user_id.to_string()),
            action_type: Set(action_type.to_string()),
            params_json: Set(params.clone()),
            result_json: Set(serde_json::to_value(result)
                .unwrap_or_else(|_| serde_json::json!({ "success": result.success }))),
            executed_at: Set(Utc::now().into()),
        };
        Self::append(self, model).await?;
        Ok(())
    }
}

/// In-memory audit sink for tests.
#[derive(Default)]
pub struct MemoryAuditSink {
    rows: std::sync::Mutex<Vec<(String, String, bool)>>,
}

impl MemoryAuditSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded rows as `(user_id, action_type, success)`.
    #[must_use]
    pub fn rows(&self) -> Vec<(String, String, bool)> {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn append(
        &self,
        user_id: &str,
        action_type: &str,
        _params: &serde_json::Value,
        result: &ActionResult,
    ) -> AppResult<()> {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((user_id.to_string(), action_type.to_string(), result.success));
        Ok(())
    }
}

/// Registry mapping action types to handlers; executes actions with audit
/// logging.
pub struct ActionExecutor {
    handlers: RwLock<HashMap<ActionType, Arc<dyn ActionHandler>>>,
    audit: Arc<dyn AuditSink>,
}

impl ActionExecutor {
    /// Create a new executor writing audit rows to the given sink.
    #[must_use]
    pub fn new(audit: Arc<dyn AuditSink>) -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            audit,
        }
    }

    /// Register a handler for an action type. The last registration for a
    /// type wins.
    pub fn register(&self, action_type: ActionType, handler: Arc<dyn ActionHandler>) {
        let mut handlers = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        handlers.insert(action_type, handler);
    }

    /// Execute an action. Total: unknown types and handler errors both come
    /// back as failed results, and every invocation appends exactly one audit
    /// row. An audit write failure is logged, never raised.
    pub async fn execute(
        &self,
        action_type: ActionType,
        params: &serde_json::Value,
        user_id: &str,
    ) -> ActionResult {
        let handler = {
            let handlers = self
                .handlers
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            handlers.get(&action_type).cloned()
        };

        let result = match handler {
            None => ActionResult::fail(format!("Unknown action type: {action_type}")),
            Some(handler) => match handler.execute(params, user_id).await {
                Ok(result) => result,
                Err(e) => ActionResult::fail(format!("Action failed: {e}")),
            },
        };

        if let Err(e) = self
            .audit
            .append(user_id, action_type.as_str(), params, &result)
            .await
        {
            tracing::warn!(error = %e, action = %action_type, "Failed to append action audit row");
        }

        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pulse_common::AppError;

    struct OkHandler;

    #[async_trait]
    impl ActionHandler for OkHandler {
        async fn execute(&self, _: &serde_json::Value, _: &str) -> AppResult<ActionResult> {
            Ok(ActionResult::ok("done"))
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl ActionHandler for FailingHandler {
        async fn execute(&self, _: &serde_json::Value, _: &str) -> AppResult<ActionResult> {
            Err(AppError::Internal("boom".to_string()))
        }
    }

    #[tokio::test]
    async fn test_unknown_action_type_is_controlled_failure() {
        let audit = Arc::new(MemoryAuditSink::new());
        let executor = ActionExecutor::new(audit.clone());

        let result = executor
            .execute(ActionType::Webhook, &serde_json::json!({}), "u1")
            .await;
        assert!(!result.success);
        assert!(result.message.contains("Unknown action type"));

        // Even the failure appended exactly one audit row
        assert_eq!(audit.rows().len(), 1);
        assert_eq!(audit.rows()[0], ("u1".to_string(), "webhook".to_string(), false));
    }

    #[tokio::test]
    async fn test_handler_error_becomes_failed_result() {
        let audit = Arc::new(MemoryAuditSink::new());
        let executor = ActionExecutor::new(audit.clone());
        executor.register(ActionType::LogHabit, Arc::new(FailingHandler));

        let result = executor
            .execute(ActionType::LogHabit, &serde_json::json!({}), "u1")
            .await;
        assert!(!result.success);
        assert!(result.message.contains("boom"));
        assert_eq!(audit.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_every_invocation_appends_one_audit_row() {
        let audit = Arc::new(MemoryAuditSink::new());
        let executor = ActionExecutor::new(audit.clone());
        executor.register(ActionType::LogHabit, Arc::new(OkHandler));

        executor
            .execute(ActionType::LogHabit, &serde_json::json!({}), "u1")
            .await;
        executor
            .execute(ActionType::CreateItem, &serde_json::json!({}), "u1")
            .await;
        assert_eq!(audit.rows().len(), 2);
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        let audit = Arc::new(MemoryAuditSink::new());
        let executor = ActionExecutor::new(audit);
        executor.register(ActionType::LogHabit, Arc::new(FailingHandler));
        executor.register(ActionType::LogHabit, Arc::new(OkHandler));

        let result = executor
            .execute(ActionType::LogHabit, &serde_json::json!({}), "u1")
            .await;
        assert!(result.success);
    }

    #[test]
    fn test_action_type_string_forms_match_serde() {
        let json = serde_json::to_value(ActionType::SnoozeTrigger).unwrap();
        assert_eq!(json, ActionType::SnoozeTrigger.as_str());
        let back: ActionType = serde_json::from_value(json).unwrap();
        assert_eq!(back, ActionType::SnoozeTrigger);
    }
}
