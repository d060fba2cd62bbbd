//! Read model for videos.
//!
//! One query loads the videos with their transcoding row; subtitles and
//! formats are then prefetched for the exact id set of that query. An empty
//! page therefore costs one round trip and any non-empty page costs three.

use std::collections::HashMap;

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::{video, video_format, video_subtitles, video_transcoding};
use crate::error::AppError;
use crate::models::video::{FormatResponse, SubtitlesResponse, VideoResponse};
use crate::services::plugin::PluginBackend;
use crate::services::visibility;

type VideoRow = (video::Model, Option<video_transcoding::Model>);

pub async fn list_videos<C: ConnectionTrait>(
    db: &C,
    backend: &dyn PluginBackend,
    owner_id: i32,
    playlist_id: Option<&str>,
) -> Result<Vec<VideoResponse>, AppError> {
    let rows = video::Entity::find()
        .find_also_related(video_transcoding::Entity)
        .filter(visibility::list_condition(owner_id, playlist_id))
        .order_by_asc(video::Column::Id)
        .all(db)
        .await?;

    aggregate(db, backend, rows).await
}

pub async fn get_video<C: ConnectionTrait>(
    db: &C,
    backend: &dyn PluginBackend,
    owner_id: i32,
    public_id: &str,
) -> Result<Option<VideoResponse>, AppError> {
    let Some(row) = video::Entity::find()
        .find_also_related(video_transcoding::Entity)
        .filter(visibility::detail_condition(owner_id, public_id))
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    Ok(aggregate(db, backend, vec![row]).await?.pop())
}

async fn aggregate<C: ConnectionTrait>(
    db: &C,
    backend: &dyn PluginBackend,
    rows: Vec<VideoRow>,
) -> Result<Vec<VideoResponse>, AppError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i32> = rows.iter().map(|(v, _)| v.id).collect();

    let mut subtitles_by_video: HashMap<i32, Vec<video_subtitles::Model>> = HashMap::new();
    for subtitles in video_subtitles::Entity::find()
        .filter(video_subtitles::Column::VideoId.is_in(ids.clone()))
        .order_by_asc(video_subtitles::Column::Id)
        .all(db)
        .await?
    {
        subtitles_by_video.entry(subtitles.video_id).or_default().push(subtitles);
    }

    let mut formats_by_video: HashMap<i32, Vec<video_format::Model>> = HashMap::new();
    for format in video_format::Entity::find()
        .filter(video_format::Column::VideoId.is_in(ids))
        .order_by_asc(video_format::Column::Id)
        .all(db)
        .await?
    {
        formats_by_video.entry(format.video_id).or_default().push(format);
    }

    let mut videos = Vec::with_capacity(rows.len());
    for (video, transcoding) in rows {
        let mut subtitles = Vec::new();
        for model in subtitles_by_video.remove(&video.id).unwrap_or_default() {
            let url = backend
                .get_subtitles_download_url(&video.public_id, &model.public_id, &model.language)
                .await?;
            subtitles.push(SubtitlesResponse::build(model, url));
        }

        let mut formats = Vec::new();
        for model in formats_by_video.remove(&video.id).unwrap_or_default() {
            let url = backend
                .get_video_streaming_url(&video.public_id, &model.name)
                .await?;
            formats.push(FormatResponse::build(model, url));
        }

        videos.push(VideoResponse::build(video, transcoding, subtitles, formats));
    }

    Ok(videos)
}
