//! User context snapshots.
//!
//! The engine consumes a read-only, point-in-time view of a user's workload,
//! calendar, goals, and habits. Snapshots are assembled by an external
//! provider; the engine never mutates one or computes derived values itself.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pulse_common::AppResult;
use serde::{Deserialize, Serialize};

/// Aggregate counts over a user's open work.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkloadSnapshot {
    /// Open (not completed) items.
    pub open_items: u32,
    /// Items due today.
    pub due_today: u32,
    /// Items past their due date.
    pub overdue: u32,
    /// Items completed today.
    pub completed_today: u32,
    /// Estimated hours of work scheduled for today.
    pub estimated_hours_today: f64,
}

/// A calendar event within the snapshot window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEventSnapshot {
    /// Event title.
    pub title: String,
    /// Event start.
    pub start: DateTime<Utc>,
    /// Event end.
    pub end: DateTime<Utc>,
}

/// Goal progress as of the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalSnapshot {
    /// Goal id.
    pub id: String,
    /// Goal name.
    pub name: String,
    /// Progress toward the target, 0..=100.
    pub progress_percent: f64,
    /// Days since the last recorded progress.
    pub days_since_progress: u32,
}

/// Habit state as of the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitSnapshot {
    /// Habit id.
    pub id: String,
    /// Habit name.
    pub name: String,
    /// Current streak length in days.
    pub streak_days: u32,
    /// Whether the habit was already logged today.
    pub completed_today: bool,
    /// Hour of day the user usually logs this habit, when known.
    pub usual_hour: Option<u32>,
}

/// Derived behavior patterns supplied by the learning layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BehaviorPatterns {
    /// Hour of day with the highest historical completion rate.
    pub most_productive_hour: Option<u32>,
    /// Average items completed per day over the learning window.
    pub average_daily_completions: f64,
}

/// Read-only, point-in-time view of a user's state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserContext {
    /// User this snapshot belongs to.
    pub user_id: String,
    /// IANA timezone name, when the user has one configured.
    pub timezone: Option<String>,
    /// Snapshot time.
    pub now: DateTime<Utc>,
    /// Hour of day (0..=23) in the user's local time.
    pub local_hour: u32,
    /// Workload counts.
    pub workload: WorkloadSnapshot,
    /// Upcoming calendar events.
    pub calendar: Vec<CalendarEventSnapshot>,
    /// Top priorities, as item titles.
    pub top_priorities: Vec<String>,
    /// Goal progress.
    pub goals: Vec<GoalSnapshot>,
    /// Habit state.
    pub habits: Vec<HabitSnapshot>,
    /// Derived behavior patterns.
    pub patterns: BehaviorPatterns,
}

impl UserContext {
    /// Create an empty snapshot for a user at a point in time.
    #[must_use]
    pub fn empty(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            timezone: None,
            now,
            local_hour: 0,
            workload: WorkloadSnapshot::default(),
            calendar: Vec::new(),
            top_priorities: Vec::new(),
            goals: Vec::new(),
            habits: Vec::new(),
            patterns: BehaviorPatterns::default(),
        }
    }
}

/// Supplies context snapshots and the active-user set for sweeps.
#[async_trait]
pub trait ContextProvider: Send + Sync {
    /// Assemble a point-in-time snapshot for a user.
    async fn assemble_context(&self, user_id: &str) -> AppResult<UserContext>;

    /// Users with domain activity since the given time. Drives the sweep.
    async fn active_user_ids(&self, since: DateTime<Utc>) -> AppResult<Vec<String>>;
}

/// In-memory context provider backed by pre-seeded snapshots.
///
/// Used in tests and as a stand-in until a real aggregation layer is wired in.
#[derive(Default)]
pub struct InMemoryContextProvider {
    contexts: RwLock<HashMap<String, UserContext>>,
    activity: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryContextProvider {
    /// Create an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or replace a user's snapshot.
    pub fn set_context(&self, context: UserContext) {
        let mut contexts = self
            .contexts
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        contexts.insert(context.user_id.clone(), context);
    }

    /// Record domain activity for a user.
    pub fn mark_active(&self, user_id: &str, at: DateTime<Utc>) {
        let mut activity = self
            .activity
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        activity.insert(user_id.to_string(), at);
    }
}

#[async_trait]
impl ContextProvider for InMemoryContextProvider {
    async fn assemble_context(&self, user_id: &str) -> AppResult<UserContext> {
        let contexts = self
            .contexts
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(contexts
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| UserContext::empty(user_id, Utc::now())))
    }

    async fn active_user_ids(&self, since: DateTime<Utc>) -> AppResult<Vec<String>> {
        let activity = self
            .activity
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut ids: Vec<String> = activity
            .iter()
            .filter(|(_, at)| **at >= since)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}
