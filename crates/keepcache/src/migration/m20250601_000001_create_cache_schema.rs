//! Initial migration to create the cache schema.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_lists(manager).await?;
        self.create_bookmarks(manager).await?;
        self.create_sync_status(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SyncStatus::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bookmarks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Lists::Table).to_owned())
            .await?;
        Ok(())
    }
}

impl Migration {
    async fn create_lists(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Lists::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Lists::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Lists::Name).string().not_null())
                    .col(
                        ColumnDef::new(Lists::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Lists::Icon).string().not_null().default("📁"))
                    // Self-referential but deliberately unconstrained
                    .col(ColumnDef::new(Lists::ParentId).string().null())
                    .col(
                        ColumnDef::new(Lists::Position)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Lists::LastSynced)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_bookmarks(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bookmarks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bookmarks::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bookmarks::ListId).string().not_null())
                    // Content
                    .col(ColumnDef::new(Bookmarks::Title).string().null())
                    .col(ColumnDef::new(Bookmarks::Url).text().not_null())
                    .col(
                        ColumnDef::new(Bookmarks::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Bookmarks::Favicon)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Bookmarks::Metadata)
                            .json()
                            .not_null()
                            .default(Expr::cust("'{}'")),
                    )
                    // Tracking
                    .col(
                        ColumnDef::new(Bookmarks::ModifiedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookmarks::LastSynced)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookmarks_list_id")
                            .from(Bookmarks::Table, Bookmarks::ListId)
                            .to(Lists::Table, Lists::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Per-list reconciliation
        manager
            .create_index(
                Index::create()
                    .name("idx_bookmarks_list_id")
                    .table(Bookmarks::Table)
                    .col(Bookmarks::ListId)
                    .to_owned(),
            )
            .await?;

        // Watermark filtering
        manager
            .create_index(
                Index::create()
                    .name("idx_bookmarks_modified")
                    .table(Bookmarks::Table)
                    .col(Bookmarks::ModifiedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_sync_status(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SyncStatus::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SyncStatus::Id)
                            .integer()
                            .not_null()
                            .primary_key()
                            // Singleton: the only permitted key is 1
                            .check(Expr::col(SyncStatus::Id).eq(1)),
                    )
                    .col(
                        ColumnDef::new(SyncStatus::LastFullSync)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SyncStatus::LastIncrementalSync)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SyncStatus::Status)
                            .string()
                            .not_null()
                            .default("never_synced"),
                    )
                    .col(ColumnDef::new(SyncStatus::ErrorMessage).text().null())
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Lists {
    Table,
    Id,
    Name,
    Description,
    Icon,
    ParentId,
    Position,
    LastSynced,
}

#[derive(DeriveIden)]
enum Bookmarks {
    Table,
    Id,
    ListId,
    Title,
    Url,
    Description,
    Favicon,
    Metadata,
    ModifiedAt,
    LastSynced,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "sync_status")]
enum SyncStatus {
    Table,
    Id,
    LastFullSync,
    LastIncrementalSync,
    Status,
    ErrorMessage,
}
