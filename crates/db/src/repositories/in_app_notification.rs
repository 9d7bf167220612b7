//! In-app notification repository.

use std::sync::Arc;

use crate::entities::{InAppNotification, in_app_notification};
use chrono::Utc;
use pulse_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

/// In-app notification repository for database operations.
#[derive(Clone)]
pub struct InAppNotificationRepository {
    db: Arc<DatabaseConnection>,
}

impl InAppNotificationRepository {
    /// Create a new in-app notification repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Persist an in-app notification.
    pub async fn create(
        &self,
        model: in_app_notification::ActiveModel,
    ) -> AppResult<in_app_notification::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get recent in-app notifications for a user (newest first).
    pub async fn find_by_user(
        &self,
        user_id: &str,
        limit: u64,
        unread_only: bool,
    ) -> AppResult<Vec<in_app_notification::Model>> {
        let mut query = InAppNotification::find()
            .filter(in_app_notification::Column::UserId.eq(user_id))
            .order_by_desc(in_app_notification::Column::Id);

        if unread_only {
            query = query.filter(in_app_notification::Column::ReadAt.is_null());
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark an in-app notification as read.
    pub async fn mark_read(&self, id: &str) -> AppResult<()> {
        let notification = InAppNotification::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if let Some(n) = notification {
            let mut active: in_app_notification::ActiveModel = n.into();
            active.read_at = Set(Some(Utc::now().into()));
            active
                .update(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }
}
