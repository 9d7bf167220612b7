//! Create trigger_state table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TriggerState::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TriggerState::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TriggerState::TriggerType)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TriggerState::LastTriggered)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TriggerState::TriggerCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_trigger_state")
                            .col(TriggerState::UserId)
                            .col(TriggerState::TriggerType),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: user_id (for cascade clears on account deletion)
        manager
            .create_index(
                Index::create()
                    .name("idx_trigger_state_user_id")
                    .table(TriggerState::Table)
                    .col(TriggerState::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TriggerState::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum TriggerState {
    Table,
    UserId,
    TriggerType,
    LastTriggered,
    TriggerCount,
}
