use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "videos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub public_id: String,
    pub owner_id: i32,
    pub title: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_one = "super::video_transcoding::Entity")]
    VideoTranscoding,
    #[sea_orm(has_many = "super::video_subtitles::Entity")]
    VideoSubtitles,
    #[sea_orm(has_many = "super::video_format::Entity")]
    VideoFormat,
    #[sea_orm(has_many = "super::playlist_video::Entity")]
    PlaylistVideo,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::video_transcoding::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VideoTranscoding.def()
    }
}

impl Related<super::video_subtitles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VideoSubtitles.def()
    }
}

impl Related<super::video_format::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VideoFormat.def()
    }
}

impl Related<super::playlist::Entity> for Entity {
    fn to() -> RelationDef {
        super::playlist_video::Relation::Playlist.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::playlist_video::Relation::Video.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
