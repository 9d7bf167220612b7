//! In-app notification entity.
//!
//! Presentational row persisted by the in-app delivery channel; the client
//! polls this table. Presentation fields are derived from message priority.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "in_app_notification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: String,

    /// Presentation kind: `modal`, `banner`, `toast`, or `sidebar`.
    pub kind: String,

    pub title: String,

    pub body: String,

    /// Whether the notification stays until explicitly dismissed.
    #[sea_orm(default_value = false)]
    pub persistent: bool,

    #[sea_orm(default_value = true)]
    pub dismissable: bool,

    /// Auto-hide delay in seconds, if any.
    #[sea_orm(nullable)]
    pub auto_hide_seconds: Option<i32>,

    #[sea_orm(nullable)]
    pub read_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
