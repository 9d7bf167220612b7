//! Proactive notification repository.

use std::sync::Arc;

use crate::entities::{ProactiveNotification, proactive_notification};
use chrono::{DateTime, Utc};
use pulse_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseBackend, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, Statement,
};

/// Proactive notification repository for database operations.
#[derive(Clone)]
pub struct ProactiveNotificationRepository {
    db: Arc<DatabaseConnection>,
}

impl ProactiveNotificationRepository {
    /// Create a new proactive notification repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a notification by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<proactive_notification::Model>> {
        ProactiveNotification::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Append a new notification record.
    pub async fn create(
        &self,
        model: proactive_notification::ActiveModel,
    ) -> AppResult<proactive_notification::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get notifications for a user (paginated).
    pub async fn find_by_user(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
        unread_only: bool,
    ) -> AppResult<Vec<proactive_notification::Model>> {
        let mut query = ProactiveNotification::find()
            .filter(proactive_notification::Column::UserId.eq(user_id))
            .order_by_desc(proactive_notification::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(proactive_notification::Column::Id.lt(id));
        }

        if unread_only {
            query = query.filter(proactive_notification::Column::ReadAt.is_null());
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count notifications actually delivered since a point in time. Feeds
    /// the daily delivery cap. Queued rows and rows whose every channel
    /// failed (empty channel list) delivered nothing and do not count.
    pub async fn count_delivered_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> AppResult<u64> {
        let stmt = Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            r#"SELECT COUNT(*) AS cnt FROM proactive_notification
               WHERE user_id = $1
                 AND sent_at >= $2
                 AND channels_json <> '[]'::jsonb
                 AND NOT (channels_json @> '"queued"'::jsonb
                          OR channels_json @> '"queued_limit"'::jsonb)"#,
            [user_id.into(), since.into()],
        );

        let row = self
            .db
            .query_one(stmt)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let count: i64 = row
            .map(|r| r.try_get("", "cnt"))
            .transpose()
            .map_err(|e| AppError::Database(e.to_string()))?
            .unwrap_or(0);

        Ok(count.max(0) as u64)
    }

    /// Mark a notification as read.
    pub async fn mark_read(&self, id: &str) -> AppResult<()> {
        if let Some(n) = self.find_by_id(id).await? {
            let mut active: proactive_notification::ActiveModel = n.into();
            active.read_at = Set(Some(Utc::now().into()));
            active
                .update(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// Record which suggestion the user acted on.
    pub async fn mark_action_taken(&self, id: &str, action: &str) -> AppResult<()> {
        if let Some(n) = self.find_by_id(id).await? {
            let mut active: proactive_notification::ActiveModel = n.into();
            active.action_taken = Set(Some(action.to_string()));
            active.read_at = Set(Some(Utc::now().into()));
            active
                .update(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// Dismiss a notification.
    pub async fn dismiss(&self, id: &str) -> AppResult<()> {
        if let Some(n) = self.find_by_id(id).await? {
            let mut active: proactive_notification::ActiveModel = n.into();
            active.dismissed = Set(true);
            active
                .update(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }
}
