//! Domain events that feed event-driven trigger evaluation and automation
//! rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A discrete domain event. Each variant carries its own typed payload;
/// trigger conditions pattern-match on the variant rather than inspecting
/// untyped fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SystemEvent {
    /// An item was completed.
    ItemCompleted {
        /// Owning user.
        user_id: String,
        /// Completed item.
        item_id: String,
        /// Item title.
        title: String,
        /// Completion time.
        completed_at: DateTime<Utc>,
    },
    /// An item passed its due date without completion.
    ItemOverdue {
        /// Owning user.
        user_id: String,
        /// Overdue item.
        item_id: String,
        /// Item title.
        title: String,
        /// Original due date.
        due_at: DateTime<Utc>,
    },
    /// A habit was logged for today.
    HabitLogged {
        /// Owning user.
        user_id: String,
        /// Logged habit.
        habit_id: String,
        /// Habit name.
        name: String,
        /// Streak length including today.
        streak_days: u32,
    },
    /// Progress was recorded against a goal.
    GoalProgress {
        /// Owning user.
        user_id: String,
        /// Goal the progress applies to.
        goal_id: String,
        /// Goal name.
        name: String,
        /// Progress toward the target, 0..=100.
        progress_percent: f64,
    },
    /// A daily check-in was submitted.
    CheckInSubmitted {
        /// Owning user.
        user_id: String,
        /// Self-reported mood, 1..=5.
        mood: i32,
        /// Self-reported energy, 1..=5.
        energy: i32,
    },
}

impl SystemEvent {
    /// The user this event belongs to.
    #[must_use]
    pub fn user_id(&self) -> &str {
        match self {
            Self::ItemCompleted { user_id, .. }
            | Self::ItemOverdue { user_id, .. }
            | Self::HabitLogged { user_id, .. }
            | Self::GoalProgress { user_id, .. }
            | Self::CheckInSubmitted { user_id, .. } => user_id,
        }
    }

    /// Stable event type string, matching the serialized `type` tag.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::ItemCompleted { .. } => "item_completed",
            Self::ItemOverdue { .. } => "item_overdue",
            Self::HabitLogged { .. } => "habit_logged",
            Self::GoalProgress { .. } => "goal_progress",
            Self::CheckInSubmitted { .. } => "check_in_submitted",
        }
    }

    /// Flat JSON object consumed by automation rule conditions.
    #[must_use]
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_matches_serde_tag() {
        let event = SystemEvent::ItemCompleted {
            user_id: "u1".to_string(),
            item_id: "i1".to_string(),
            title: "Write report".to_string(),
            completed_at: Utc::now(),
        };
        let payload = event.to_payload();
        assert_eq!(payload["type"], event.event_type());
        assert_eq!(payload["title"], "Write report");
    }

    #[test]
    fn test_user_id_accessor() {
        let event = SystemEvent::CheckInSubmitted {
            user_id: "u2".to_string(),
            mood: 4,
            energy: 2,
        };
        assert_eq!(event.user_id(), "u2");
        assert_eq!(event.event_type(), "check_in_submitted");
    }
}
