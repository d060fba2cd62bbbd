use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VideoTranscodings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VideoTranscodings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    // one-to-one with videos
                    .col(ColumnDef::new(VideoTranscodings::VideoId).integer().not_null().unique_key())
                    .col(ColumnDef::new(VideoTranscodings::Status).string_len(32).not_null())
                    .col(ColumnDef::new(VideoTranscodings::Progress).integer().not_null().default(0))
                    .col(ColumnDef::new(VideoTranscodings::StartedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_video_transcodings_video_id")
                            .from(VideoTranscodings::Table, VideoTranscodings::VideoId)
                            .to(Videos::Table, Videos::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VideoTranscodings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum VideoTranscodings {
    Table,
    Id,
    VideoId,
    Status,
    Progress,
    StartedAt,
}

#[derive(DeriveIden)]
enum Videos {
    Table,
    Id,
}
