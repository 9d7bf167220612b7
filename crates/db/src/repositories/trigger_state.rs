//! Trigger state repository.
//!
//! Owns the cooldown bookkeeping for `(user, trigger type)` pairs. The
//! check-then-fire sequence must be atomic per pair, so `try_record_firing`
//! is a single conditional upsert rather than a read followed by a write:
//! two concurrent evaluators cannot both observe "off cooldown" and both
//! record a firing inside one cooldown window.

use std::sync::Arc;

use crate::entities::{TriggerState, trigger_state};
use chrono::{Duration, Utc};
use pulse_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseBackend, DatabaseConnection, EntityTrait, QueryFilter,
    Statement,
};

/// Trigger state repository for database operations.
#[derive(Clone)]
pub struct TriggerStateRepository {
    db: Arc<DatabaseConnection>,
}

impl TriggerStateRepository {
    /// Create a new trigger state repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the firing state for a `(user, trigger type)` pair.
    pub async fn find(
        &self,
        user_id: &str,
        trigger_type: &str,
    ) -> AppResult<Option<trigger_state::Model>> {
        TriggerState::find_by_id((user_id.to_string(), trigger_type.to_string()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether a trigger is currently suppressed for a user.
    ///
    /// A `cooldown_minutes` of zero means event-only spacing: never suppressed.
    /// This is a read-only pre-filter; the authoritative guard is
    /// [`Self::try_record_firing`].
    pub async fn is_on_cooldown(
        &self,
        user_id: &str,
        trigger_type: &str,
        cooldown_minutes: i64,
    ) -> AppResult<bool> {
        if cooldown_minutes <= 0 {
            return Ok(false);
        }

        let cutoff = Utc::now() - Duration::minutes(cooldown_minutes);
        let state = self.find(user_id, trigger_type).await?;

        Ok(state.is_some_and(|s| s.last_triggered.with_timezone(&Utc) > cutoff))
    }

    /// Atomically record a firing if the trigger is off cooldown.
    ///
    /// Inserts the first firing with `trigger_count = 1`, or bumps
    /// `last_triggered` and the count, but only when the previous firing is
    /// older than the cooldown window. Returns whether the firing was
    /// recorded; `false` means another evaluator fired within the window.
    pub async fn try_record_firing(
        &self,
        user_id: &str,
        trigger_type: &str,
        cooldown_minutes: i64,
    ) -> AppResult<bool> {
        let now = Utc::now();
        // Zero cooldown makes the cutoff "now": any previous firing passes.
        let cutoff = now - Duration::minutes(cooldown_minutes.max(0));

        let stmt = Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            r"INSERT INTO trigger_state (user_id, trigger_type, last_triggered, trigger_count)
              VALUES ($1, $2, $3, 1)
              ON CONFLICT (user_id, trigger_type) DO UPDATE
              SET last_triggered = EXCLUDED.last_triggered,
                  trigger_count = trigger_state.trigger_count + 1
              WHERE trigger_state.last_triggered <= $4
              RETURNING user_id",
            [
                user_id.into(),
                trigger_type.into(),
                now.into(),
                cutoff.into(),
            ],
        );

        let row = self
            .db
            .query_one(stmt)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.is_some())
    }

    /// Delete all firing state for a user (explicit data clear).
    pub async fn delete_for_user(&self, user_id: &str) -> AppResult<u64> {
        let result = TriggerState::delete_many()
            .filter(trigger_state::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
