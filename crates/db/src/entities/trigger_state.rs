//! Trigger state entity.
//!
//! Tracks, per `(user, trigger type)`, when a trigger last fired and how many
//! times it has fired. This is the table the cooldown guard upserts against.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "trigger_state")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,

    #[sea_orm(primary_key, auto_increment = false)]
    pub trigger_type: String,

    /// When the trigger last fired for this user.
    pub last_triggered: DateTimeWithTimeZone,

    /// Total number of firings for this user.
    pub trigger_count: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
