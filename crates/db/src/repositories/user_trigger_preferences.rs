//! User trigger preferences repository.

use std::sync::Arc;

use crate::entities::{UserTriggerPreferences, user_trigger_preferences};
use pulse_common::{AppError, AppResult};
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait};

/// Preference repository for database operations.
#[derive(Clone)]
pub struct PreferenceRepository {
    db: Arc<DatabaseConnection>,
}

impl PreferenceRepository {
    /// Create a new preference repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user's preference row.
    pub async fn find_by_user(
        &self,
        user_id: &str,
    ) -> AppResult<Option<user_trigger_preferences::Model>> {
        UserTriggerPreferences::find_by_id(user_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert or replace a user's preference row.
    pub async fn upsert(&self, model: user_trigger_preferences::ActiveModel) -> AppResult<()> {
        UserTriggerPreferences::insert(model)
            .on_conflict(
                OnConflict::column(user_trigger_preferences::Column::UserId)
                    .update_columns([
                        user_trigger_preferences::Column::DisabledTriggersJson,
                        user_trigger_preferences::Column::CustomCooldownsJson,
                        user_trigger_preferences::Column::NotificationPrefsJson,
                        user_trigger_preferences::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    /// Delete a user's preference row (account deletion cascade).
    pub async fn delete_for_user(&self, user_id: &str) -> AppResult<()> {
        UserTriggerPreferences::delete_by_id(user_id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
