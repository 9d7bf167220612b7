//! Action log entity.
//!
//! Append-only audit trail: one row per action executor invocation,
//! success or failure.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "action_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: String,

    /// Action type identifier (snake_case).
    pub action_type: String,

    /// Parameters the handler was invoked with.
    #[sea_orm(column_type = "JsonBinary")]
    pub params_json: Json,

    /// The `ActionResult`, including failure messages and any undo action.
    #[sea_orm(column_type = "JsonBinary")]
    pub result_json: Json,

    pub executed_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
