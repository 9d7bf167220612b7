//! Create action_log table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ActionLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActionLog::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ActionLog::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(ActionLog::ActionType)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ActionLog::ParamsJson)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ActionLog::ResultJson)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ActionLog::ExecutedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, executed_at) (for per-user audit history)
        manager
            .create_index(
                Index::create()
                    .name("idx_action_log_user_executed")
                    .table(ActionLog::Table)
                    .col(ActionLog::UserId)
                    .col(ActionLog::ExecutedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ActionLog::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ActionLog {
    Table,
    Id,
    UserId,
    ActionType,
    ParamsJson,
    ResultJson,
    ExecutedAt,
}
