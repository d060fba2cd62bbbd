use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Playlists::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Playlists::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Playlists::PublicId).string_len(20).not_null().unique_key())
                    .col(ColumnDef::new(Playlists::OwnerId).integer().not_null())
                    .col(ColumnDef::new(Playlists::Name).string_len(128).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_playlists_owner_id")
                            .from(Playlists::Table, Playlists::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PlaylistVideos::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PlaylistVideos::PlaylistId).integer().not_null())
                    .col(ColumnDef::new(PlaylistVideos::VideoId).integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(PlaylistVideos::PlaylistId)
                            .col(PlaylistVideos::VideoId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_playlist_videos_playlist_id")
                            .from(PlaylistVideos::Table, PlaylistVideos::PlaylistId)
                            .to(Playlists::Table, Playlists::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_playlist_videos_video_id")
                            .from(PlaylistVideos::Table, PlaylistVideos::VideoId)
                            .to(Videos::Table, Videos::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PlaylistVideos::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Playlists::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Playlists {
    Table,
    Id,
    PublicId,
    OwnerId,
    Name,
}

#[derive(DeriveIden)]
enum PlaylistVideos {
    Table,
    PlaylistId,
    VideoId,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Videos {
    Table,
    Id,
}
