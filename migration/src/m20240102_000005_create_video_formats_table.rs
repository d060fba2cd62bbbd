use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VideoFormats::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VideoFormats::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VideoFormats::VideoId).integer().not_null())
                    .col(ColumnDef::new(VideoFormats::Name).string_len(128).not_null())
                    .col(ColumnDef::new(VideoFormats::Bitrate).integer().not_null().default(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_video_formats_video_id")
                            .from(VideoFormats::Table, VideoFormats::VideoId)
                            .to(Videos::Table, Videos::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VideoFormats::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum VideoFormats {
    Table,
    Id,
    VideoId,
    Name,
    Bitrate,
}

#[derive(DeriveIden)]
enum Videos {
    Table,
    Id,
}
