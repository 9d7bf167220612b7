//! Create in_app_notification table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InAppNotification::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InAppNotification::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(InAppNotification::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InAppNotification::Kind)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InAppNotification::Title)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(ColumnDef::new(InAppNotification::Body).text().not_null())
                    .col(
                        ColumnDef::new(InAppNotification::Persistent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(InAppNotification::Dismissable)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(InAppNotification::AutoHideSeconds).integer())
                    .col(ColumnDef::new(InAppNotification::ReadAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(InAppNotification::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, created_at) (for client polling)
        manager
            .create_index(
                Index::create()
                    .name("idx_in_app_notification_user_created")
                    .table(InAppNotification::Table)
                    .col(InAppNotification::UserId)
                    .col(InAppNotification::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InAppNotification::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum InAppNotification {
    Table,
    Id,
    UserId,
    Kind,
    Title,
    Body,
    Persistent,
    Dismissable,
    AutoHideSeconds,
    ReadAt,
    CreatedAt,
}
