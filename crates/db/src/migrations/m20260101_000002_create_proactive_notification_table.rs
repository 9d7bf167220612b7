//! Create proactive_notification table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProactiveNotification::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProactiveNotification::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProactiveNotification::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProactiveNotification::TriggerType)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProactiveNotification::MessageJson)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProactiveNotification::ChannelsJson)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProactiveNotification::SentAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(ProactiveNotification::ReadAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(ProactiveNotification::ActionTaken).string_len(64))
                    .col(
                        ColumnDef::new(ProactiveNotification::Dismissed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, sent_at) (for inbox listing and the daily cap count)
        manager
            .create_index(
                Index::create()
                    .name("idx_proactive_notification_user_sent")
                    .table(ProactiveNotification::Table)
                    .col(ProactiveNotification::UserId)
                    .col(ProactiveNotification::SentAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProactiveNotification::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ProactiveNotification {
    Table,
    Id,
    UserId,
    TriggerType,
    MessageJson,
    ChannelsJson,
    SentAt,
    ReadAt,
    ActionTaken,
    Dismissed,
}
