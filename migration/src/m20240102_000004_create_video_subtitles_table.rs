use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VideoSubtitles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VideoSubtitles::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VideoSubtitles::PublicId).string_len(20).not_null().unique_key())
                    .col(ColumnDef::new(VideoSubtitles::VideoId).integer().not_null())
                    .col(ColumnDef::new(VideoSubtitles::Language).string_len(7).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_video_subtitles_video_id")
                            .from(VideoSubtitles::Table, VideoSubtitles::VideoId)
                            .to(Videos::Table, Videos::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VideoSubtitles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum VideoSubtitles {
    Table,
    Id,
    PublicId,
    VideoId,
    Language,
}

#[derive(DeriveIden)]
enum Videos {
    Table,
    Id,
}
