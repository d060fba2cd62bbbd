//! The capability set this service delegates to the storage/transcoding backend.
//!
//! Handlers never talk to storage directly: they receive an
//! `Arc<dyn PluginBackend>` through [`crate::state::AppState`], so tests swap in
//! a recording backend and production uses [`crate::services::s3::S3Backend`].

use async_trait::async_trait;
use axum::body::Bytes;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// The requested resource does not exist in the backend (yet).
    #[error("resource not found in plugin backend")]
    NotFound,
    #[error("storage error: {0}")]
    Storage(String),
    #[error("plugin backend error: {0}")]
    Other(String),
}

/// An upload destination issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct UploadUrl {
    pub url: String,
    pub method: String,
    /// Public id the uploaded video will take.
    pub id: String,
    /// Unix timestamp, in seconds.
    pub expires_at: i64,
}

/// Metadata about a completed upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadedVideo {
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodingJob {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableFormat {
    pub name: String,
    pub bitrate: i32,
}

#[async_trait]
pub trait PluginBackend: Send + Sync {
    async fn create_upload_url(&self, filename: &str) -> Result<UploadUrl, PluginError>;

    /// Returns [`PluginError::NotFound`] while the upload has not completed.
    async fn get_uploaded_video(&self, video_id: &str) -> Result<UploadedVideo, PluginError>;

    async fn create_transcoding_jobs(&self, video_id: &str)
        -> Result<Vec<TranscodingJob>, PluginError>;

    async fn iter_available_formats(&self, video_id: &str)
        -> Result<Vec<AvailableFormat>, PluginError>;

    async fn get_subtitles_download_url(
        &self,
        video_id: &str,
        subtitles_id: &str,
        language: &str,
    ) -> Result<String, PluginError>;

    async fn get_video_streaming_url(
        &self,
        video_id: &str,
        format_name: &str,
    ) -> Result<String, PluginError>;

    async fn upload_subtitles(
        &self,
        video_id: &str,
        subtitles_id: &str,
        language: &str,
        attachment: Bytes,
    ) -> Result<(), PluginError>;

    async fn delete_resources(&self, video_id: &str) -> Result<(), PluginError>;
}
