//! Automation rule repository.

use std::sync::Arc;

use crate::entities::{AutomationRule, automation_rule};
use chrono::Utc;
use pulse_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

/// Automation rule repository for database operations.
#[derive(Clone)]
pub struct AutomationRuleRepository {
    db: Arc<DatabaseConnection>,
}

impl AutomationRuleRepository {
    /// Create a new automation rule repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a rule by ID. Soft-deleted rules are not returned.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<automation_rule::Model>> {
        AutomationRule::find_by_id(id)
            .filter(automation_rule::Column::DeletedAt.is_null())
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new rule.
    pub async fn create(
        &self,
        model: automation_rule::ActiveModel,
    ) -> AppResult<automation_rule::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a rule.
    pub async fn update(
        &self,
        model: automation_rule::ActiveModel,
    ) -> AppResult<automation_rule::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a user's rules, excluding soft-deleted ones.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<automation_rule::Model>> {
        AutomationRule::find()
            .filter(automation_rule::Column::UserId.eq(user_id))
            .filter(automation_rule::Column::DeletedAt.is_null())
            .order_by_asc(automation_rule::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a user's enabled rules (for event dispatch).
    pub async fn find_enabled_by_user(
        &self,
        user_id: &str,
    ) -> AppResult<Vec<automation_rule::Model>> {
        AutomationRule::find()
            .filter(automation_rule::Column::UserId.eq(user_id))
            .filter(automation_rule::Column::Enabled.eq(true))
            .filter(automation_rule::Column::DeletedAt.is_null())
            .order_by_asc(automation_rule::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Soft-delete a rule.
    pub async fn soft_delete(&self, id: &str) -> AppResult<()> {
        if let Some(rule) = self.find_by_id(id).await? {
            let mut active: automation_rule::ActiveModel = rule.into();
            active.deleted_at = Set(Some(Utc::now().into()));
            active
                .update(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// Record a firing: bump `last_triggered_at` and the count.
    ///
    /// Called unconditionally after rule execution: firing is about reaching
    /// execution, not about every action succeeding.
    pub async fn record_firing(&self, id: &str) -> AppResult<()> {
        if let Some(rule) = self.find_by_id(id).await? {
            let count = rule.trigger_count;
            let mut active: automation_rule::ActiveModel = rule.into();
            active.last_triggered_at = Set(Some(Utc::now().into()));
            active.trigger_count = Set(count + 1);
            active
                .update(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }
}
