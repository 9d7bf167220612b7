//! Notification queue entity.
//!
//! Holds messages deferred by quiet hours or the daily cap until a later
//! sweep attempts delivery.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification_queue")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: String,

    /// The deferred `ProactiveMessage` as JSON.
    #[sea_orm(column_type = "JsonBinary")]
    pub message_json: Json,

    pub queued_at: DateTimeWithTimeZone,

    /// Earliest time the queue sweep may deliver this entry.
    pub deliver_after: DateTimeWithTimeZone,

    #[sea_orm(default_value = false)]
    pub delivered: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
