use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VideoUploadUrls::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VideoUploadUrls::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VideoUploadUrls::OwnerId).integer().not_null())
                    .col(
                        ColumnDef::new(VideoUploadUrls::PublicVideoId)
                            .string_len(20)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(VideoUploadUrls::Filename).string().not_null())
                    .col(ColumnDef::new(VideoUploadUrls::ExpiresAt).big_integer().not_null())
                    .col(ColumnDef::new(VideoUploadUrls::WasUsed).boolean().not_null().default(false))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_video_upload_urls_owner_id")
                            .from(VideoUploadUrls::Table, VideoUploadUrls::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_video_upload_urls_was_used")
                    .table(VideoUploadUrls::Table)
                    .col(VideoUploadUrls::WasUsed)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VideoUploadUrls::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum VideoUploadUrls {
    Table,
    Id,
    OwnerId,
    PublicVideoId,
    Filename,
    ExpiresAt,
    WasUsed,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
