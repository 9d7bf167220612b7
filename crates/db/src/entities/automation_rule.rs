//! Automation rule entity.
//!
//! User-authored condition/action rules evaluated against discrete event
//! payloads. Soft-deleted via `deleted_at`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "automation_rule")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: String,

    pub name: String,

    #[sea_orm(default_value = true)]
    pub enabled: bool,

    /// `{ "conditions": [{ "field", "operator", "value" }, ...] }`, ANDed.
    #[sea_orm(column_type = "JsonBinary")]
    pub trigger_json: Json,

    /// `[{ "action", "params" }, ...]`, executed sequentially.
    #[sea_orm(column_type = "JsonBinary")]
    pub actions_json: Json,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub last_triggered_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(default_value = 0)]
    pub trigger_count: i32,

    /// Soft-delete marker.
    #[sea_orm(nullable)]
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
