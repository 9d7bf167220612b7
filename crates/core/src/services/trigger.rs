//! The trigger contract and the message model triggers produce.

use crate::services::actions::ActionType;
use crate::services::context::UserContext;
use crate::services::events::SystemEvent;
use pulse_common::AppResult;
use serde::{Deserialize, Serialize};

/// Priority of a trigger and the messages it produces. Informs delivery
/// channel weight and presentation, not evaluation order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum TriggerPriority {
    /// Ambient, can wait indefinitely.
    Low,
    /// Normal proactive nudge.
    #[default]
    Medium,
    /// Important, exempt from the daily cap.
    High,
    /// Safety-relevant; may override quiet hours.
    Urgent,
}

impl TriggerPriority {
    /// Stable string form, matching the serialized representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl std::fmt::Display for TriggerPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a trigger intends its message to be received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Informational notification.
    Notify,
    /// Asks the user a question.
    Ask,
    /// Proposes concrete next steps.
    Suggest,
}

/// An actionable suggestion attached to a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    /// Button label.
    pub label: String,
    /// Action to run when chosen.
    pub action: ActionType,
    /// Action parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

impl Suggestion {
    /// Create a suggestion.
    #[must_use]
    pub fn new(label: &str, action: ActionType, params: serde_json::Value) -> Self {
        Self {
            label: label.to_string(),
            action,
            params,
        }
    }
}

/// The user-facing content produced when a trigger fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProactiveMessage {
    /// Short headline.
    pub title: String,
    /// Message body.
    pub body: String,
    /// Actionable suggestions.
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
    /// Message priority, inherited from the trigger.
    pub priority: TriggerPriority,
}

/// An action a trigger runs automatically when it fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoAction {
    /// Action to run.
    pub action: ActionType,
    /// Action parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// A registered condition/action rule, evaluated per user.
///
/// Catalog crates plug in by implementing this trait; the engine's only
/// contract with them is structural. `evaluate` and `details` must be pure
/// over the snapshot; errors from either are recovered by the engine, logged,
/// and treated as "did not fire" for that cycle only.
pub trait Trigger: Send + Sync {
    /// Unique trigger type identifier.
    fn trigger_type(&self) -> &'static str;

    /// Priority of produced messages.
    fn priority(&self) -> TriggerPriority;

    /// Minimum spacing between firings for one user, in minutes.
    /// Zero means event-only, no spacing.
    fn cooldown_minutes(&self) -> i64;

    /// Whether user preferences may suppress this trigger.
    /// Safety triggers return `false`.
    fn user_can_disable(&self) -> bool {
        true
    }

    /// How the message is intended to be received.
    fn kind(&self) -> ActionKind {
        ActionKind::Notify
    }

    /// Whether the trigger should fire for this snapshot (and event, if any).
    fn evaluate(&self, context: &UserContext, event: Option<&SystemEvent>) -> AppResult<bool>;

    /// Structured payload consumed by `build_message` and `auto_actions`.
    fn details(
        &self,
        context: &UserContext,
        event: Option<&SystemEvent>,
    ) -> AppResult<serde_json::Value>;

    /// Build the user-facing message from extracted details.
    fn build_message(&self, details: &serde_json::Value) -> ProactiveMessage;

    /// Actions to run automatically on firing. Best-effort.
    fn auto_actions(&self, _details: &serde_json::Value) -> Vec<AutoAction> {
        Vec::new()
    }
}
