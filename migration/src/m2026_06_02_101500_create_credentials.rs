//! Migration to create the credentials table.
//!
//! One row per HubSpot account (hub), holding the OAuth token pair and its
//! expiry. `hub_id` is the lookup key used by every authenticated call.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Credentials::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Credentials::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Credentials::HubId).text().not_null())
                    .col(ColumnDef::new(Credentials::UserId).text().null())
                    .col(ColumnDef::new(Credentials::AppId).text().null())
                    .col(ColumnDef::new(Credentials::UserEmail).text().null())
                    .col(ColumnDef::new(Credentials::AccessToken).text().not_null())
                    .col(ColumnDef::new(Credentials::RefreshToken).text().not_null())
                    .col(
                        ColumnDef::new(Credentials::ExpireTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Credentials::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Credentials::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one credential per hub
        manager
            .create_index(
                Index::create()
                    .name("idx_credentials_hub_id")
                    .table(Credentials::Table)
                    .col(Credentials::HubId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_credentials_hub_id").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Credentials::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Credentials {
    Table,
    Id,
    HubId,
    UserId,
    AppId,
    UserEmail,
    AccessToken,
    RefreshToken,
    ExpireTime,
    CreatedAt,
    UpdatedAt,
}
