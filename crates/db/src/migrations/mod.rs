//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20260101_000001_create_trigger_state_table;
mod m20260101_000002_create_proactive_notification_table;
mod m20260101_000003_create_notification_queue_table;
mod m20260101_000004_create_action_log_table;
mod m20260101_000005_create_automation_rule_table;
mod m20260101_000006_create_user_trigger_preferences_table;
mod m20260101_000007_create_in_app_notification_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_trigger_state_table::Migration),
            Box::new(m20260101_000002_create_proactive_notification_table::Migration),
            Box::new(m20260101_000003_create_notification_queue_table::Migration),
            Box::new(m20260101_000004_create_action_log_table::Migration),
            Box::new(m20260101_000005_create_automation_rule_table::Migration),
            Box::new(m20260101_000006_create_user_trigger_preferences_table::Migration),
            Box::new(m20260101_000007_create_in_app_notification_table::Migration),
        ]
    }
}
