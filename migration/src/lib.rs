pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_users_table;
mod m20240102_000002_create_videos_table;
mod m20240102_000003_create_video_transcodings_table;
mod m20240102_000004_create_video_subtitles_table;
mod m20240102_000005_create_video_formats_table;
mod m20240103_000006_create_video_upload_urls_table;
mod m20240104_000007_create_playlists_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users_table::Migration),
            Box::new(m20240102_000002_create_videos_table::Migration),
            Box::new(m20240102_000003_create_video_transcodings_table::Migration),
            Box::new(m20240102_000004_create_video_subtitles_table::Migration),
            Box::new(m20240102_000005_create_video_formats_table::Migration),
            Box::new(m20240103_000006_create_video_upload_urls_table::Migration),
            Box::new(m20240104_000007_create_playlists_table::Migration),
        ]
    }
}
