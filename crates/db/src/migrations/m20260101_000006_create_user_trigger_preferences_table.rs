//! Create user_trigger_preferences table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserTriggerPreferences::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserTriggerPreferences::UserId)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserTriggerPreferences::DisabledTriggersJson)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserTriggerPreferences::CustomCooldownsJson)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserTriggerPreferences::NotificationPrefsJson)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserTriggerPreferences::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(UserTriggerPreferences::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum UserTriggerPreferences {
    Table,
    UserId,
    DisabledTriggersJson,
    CustomCooldownsJson,
    NotificationPrefsJson,
    UpdatedAt,
}
