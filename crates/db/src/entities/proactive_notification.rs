//! Proactive notification entity.
//!
//! Append-only audit/inbox row: exactly one row per trigger firing that
//! reached the delivery decision, including firings that were queued.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "proactive_notification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The user the message was produced for.
    pub user_id: String,

    /// Type of the trigger that fired.
    pub trigger_type: String,

    /// The full `ProactiveMessage` as JSON.
    #[sea_orm(column_type = "JsonBinary")]
    pub message_json: Json,

    /// Delivery outcome: succeeded channels, or `queued` / `queued_limit`.
    #[sea_orm(column_type = "JsonBinary")]
    pub channels_json: Json,

    pub sent_at: DateTimeWithTimeZone,

    /// When the user read the notification (in-app inbox).
    #[sea_orm(nullable)]
    pub read_at: Option<DateTimeWithTimeZone>,

    /// Suggestion the user acted on, if any.
    #[sea_orm(nullable)]
    pub action_taken: Option<String>,

    #[sea_orm(default_value = false)]
    pub dismissed: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
