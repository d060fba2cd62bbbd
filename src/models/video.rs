use serde::Serialize;
use utoipa::ToSchema;

use crate::entities::{video, video_format, video_subtitles, video_transcoding};

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StatusDetails {
    pub status: video_transcoding::Status,
    pub progress: i32,
    pub started_at: chrono::NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SubtitlesResponse {
    pub id: String,
    pub language: String,
    pub download_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FormatResponse {
    pub name: String,
    pub streaming_url: String,
    pub bitrate: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct VideoResponse {
    pub id: String,
    pub title: String,
    pub status_details: Option<StatusDetails>,
    pub subtitles: Vec<SubtitlesResponse>,
    pub formats: Vec<FormatResponse>,
}

impl From<video_transcoding::Model> for StatusDetails {
    fn from(model: video_transcoding::Model) -> Self {
        Self {
            status: model.status,
            progress: model.progress,
            started_at: model.started_at,
        }
    }
}

impl SubtitlesResponse {
    pub fn build(model: video_subtitles::Model, download_url: String) -> Self {
        Self {
            id: model.public_id,
            language: model.language,
            download_url,
        }
    }
}

impl FormatResponse {
    pub fn build(model: video_format::Model, streaming_url: String) -> Self {
        Self {
            name: model.name,
            streaming_url,
            bitrate: model.bitrate,
        }
    }
}

impl VideoResponse {
    pub fn build(
        video: video::Model,
        transcoding: Option<video_transcoding::Model>,
        subtitles: Vec<SubtitlesResponse>,
        formats: Vec<FormatResponse>,
    ) -> Self {
        Self {
            id: video.public_id,
            title: video.title,
            status_details: transcoding.map(StatusDetails::from),
            subtitles,
            formats,
        }
    }
}
