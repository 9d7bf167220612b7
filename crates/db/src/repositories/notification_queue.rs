//! Notification queue repository.

use std::sync::Arc;

use crate::entities::{NotificationQueue, notification_queue};
use chrono::{DateTime, Utc};
use pulse_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

/// Notification queue repository for database operations.
#[derive(Clone)]
pub struct NotificationQueueRepository {
    db: Arc<DatabaseConnection>,
}

impl NotificationQueueRepository {
    /// Create a new notification queue repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Enqueue a deferred message.
    pub async fn enqueue(
        &self,
        model: notification_queue::ActiveModel,
    ) -> AppResult<notification_queue::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find undelivered entries that are due.
    ///
    /// Already-delivered rows are excluded, which is what makes the queue
    /// sweep idempotent against repeated invocation.
    pub async fn find_due(&self, now: DateTime<Utc>) -> AppResult<Vec<notification_queue::Model>> {
        NotificationQueue::find()
            .filter(notification_queue::Column::Delivered.eq(false))
            .filter(notification_queue::Column::DeliverAfter.lte(now))
            .order_by_asc(notification_queue::Column::DeliverAfter)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark an entry as delivered.
    pub async fn mark_delivered(&self, id: &str) -> AppResult<()> {
        let entry = NotificationQueue::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if let Some(e) = entry {
            let mut active: notification_queue::ActiveModel = e.into();
            active.delivered = Set(true);
            active
                .update(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// Count undelivered entries for a user.
    pub async fn count_pending(&self, user_id: &str) -> AppResult<u64> {
        use sea_orm::PaginatorTrait;

        NotificationQueue::find()
            .filter(notification_queue::Column::UserId.eq(user_id))
            .filter(notification_queue::Column::Delivered.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
