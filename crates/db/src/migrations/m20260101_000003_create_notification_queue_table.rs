//! Create notification_queue table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NotificationQueue::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NotificationQueue::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(NotificationQueue::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(NotificationQueue::MessageJson)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(NotificationQueue::QueuedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(NotificationQueue::DeliverAfter)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(NotificationQueue::Delivered)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (delivered, deliver_after) (for the due-entry sweep)
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_queue_due")
                    .table(NotificationQueue::Table)
                    .col(NotificationQueue::Delivered)
                    .col(NotificationQueue::DeliverAfter)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NotificationQueue::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum NotificationQueue {
    Table,
    Id,
    UserId,
    MessageJson,
    QueuedAt,
    DeliverAfter,
    Delivered,
}
