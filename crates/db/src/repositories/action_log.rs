//! Action log repository.

use std::sync::Arc;

use crate::entities::{ActionLog, action_log};
use pulse_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

/// Action log repository for database operations.
#[derive(Clone)]
pub struct ActionLogRepository {
    db: Arc<DatabaseConnection>,
}

impl ActionLogRepository {
    /// Create a new action log repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append an audit row.
    pub async fn append(&self, model: action_log::ActiveModel) -> AppResult<action_log::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get audit history for a user (newest first).
    pub async fn find_by_user(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<action_log::Model>> {
        let mut query = ActionLog::find()
            .filter(action_log::Column::UserId.eq(user_id))
            .order_by_desc(action_log::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(action_log::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
