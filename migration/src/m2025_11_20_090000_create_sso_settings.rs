//! Migration to create the sso_setting table.
//!
//! One row per authentication provider holding the administrator-persisted
//! settings document. Rows are soft-deleted so a later upsert revives them.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SsoSetting::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SsoSetting::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SsoSetting::Provider).text().not_null())
                    .col(ColumnDef::new(SsoSetting::Settings).json_binary().not_null())
                    .col(
                        ColumnDef::new(SsoSetting::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(SsoSetting::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SsoSetting::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sso_setting_provider")
                    .table(SsoSetting::Table)
                    .col(SsoSetting::Provider)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_sso_setting_provider").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(SsoSetting::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SsoSetting {
    Table,
    Id,
    Provider,
    Settings,
    IsDeleted,
    CreatedAt,
    UpdatedAt,
}
