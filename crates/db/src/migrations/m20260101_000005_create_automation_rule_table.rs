//! Create automation_rule table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AutomationRule::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AutomationRule::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AutomationRule::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AutomationRule::Name)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AutomationRule::Enabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(AutomationRule::TriggerJson)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AutomationRule::ActionsJson)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AutomationRule::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(AutomationRule::LastTriggeredAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(AutomationRule::TriggerCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(AutomationRule::DeletedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, enabled) (for event-time rule lookup)
        manager
            .create_index(
                Index::create()
                    .name("idx_automation_rule_user_enabled")
                    .table(AutomationRule::Table)
                    .col(AutomationRule::UserId)
                    .col(AutomationRule::Enabled)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AutomationRule::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AutomationRule {
    Table,
    Id,
    UserId,
    Name,
    Enabled,
    TriggerJson,
    ActionsJson,
    CreatedAt,
    LastTriggeredAt,
    TriggerCount,
    DeletedAt,
}
