//! User trigger preferences entity.
//!
//! One row per user: disabled trigger types, custom cooldown overrides, and
//! notification delivery preferences. Created lazily with defaults.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_trigger_preferences")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,

    /// Set of disabled trigger types, as a JSON array of strings.
    #[sea_orm(column_type = "JsonBinary")]
    pub disabled_triggers_json: Json,

    /// Per-trigger cooldown overrides in minutes, as a JSON object.
    #[sea_orm(column_type = "JsonBinary")]
    pub custom_cooldowns_json: Json,

    /// `NotificationPreferences` as JSON.
    #[sea_orm(column_type = "JsonBinary")]
    pub notification_prefs_json: Json,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
