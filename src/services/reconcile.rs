//! Lazily materializes videos from upload grants.
//!
//! A grant whose upload has completed in the plugin backend but has no video
//! row yet is turned into one on the first detail lookup that misses.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
    TransactionTrait,
};

use crate::entities::{video, video_format, video_transcoding, video_upload_url};
use crate::error::AppError;
use crate::services::plugin::{PluginBackend, PluginError};

/// Returns whether a video owned by `owner_id` now exists for `public_id`.
///
/// Idempotent: once the row exists this only reads.
pub async fn ensure_materialized(
    db: &DatabaseConnection,
    backend: &dyn PluginBackend,
    owner_id: i32,
    public_id: &str,
) -> Result<bool, AppError> {
    let now = Utc::now();

    let Some(grant) = video_upload_url::Entity::find()
        .filter(video_upload_url::Column::PublicVideoId.eq(public_id))
        .filter(video_upload_url::Column::OwnerId.eq(owner_id))
        .filter(video_upload_url::Column::ExpiresAt.gt(now.timestamp()))
        .filter(video_upload_url::Column::WasUsed.eq(false))
        .one(db)
        .await?
    else {
        return Ok(false);
    };

    if let Some(existing) = video::Entity::find()
        .filter(video::Column::PublicId.eq(public_id))
        .one(db)
        .await?
    {
        return Ok(existing.owner_id == owner_id);
    }

    let uploaded = match backend.get_uploaded_video(public_id).await {
        Ok(uploaded) => uploaded,
        Err(PluginError::NotFound) => {
            tracing::debug!("Reconcile | video={} | upload not complete", public_id);
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    };

    let txn = db.begin().await?;

    let new_video = video::ActiveModel {
        public_id: Set(grant.public_video_id.clone()),
        owner_id: Set(grant.owner_id),
        title: Set(uploaded.title.unwrap_or_else(|| grant.filename.clone())),
        ..Default::default()
    };

    let video = match new_video.insert(&txn).await {
        Ok(video) => video,
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            // a concurrent lookup materialized it first
            tracing::debug!("Reconcile | video={} | already materialized", public_id);
            return Ok(true);
        }
        Err(e) => return Err(e.into()),
    };

    let jobs = backend.create_transcoding_jobs(public_id).await?;
    if !jobs.is_empty() {
        video_transcoding::ActiveModel {
            video_id: Set(video.id),
            status: Set(video_transcoding::Status::Processing),
            progress: Set(0),
            started_at: Set(now.naive_utc()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    let formats = backend.iter_available_formats(public_id).await?;
    for format in &formats {
        video_format::ActiveModel {
            video_id: Set(video.id),
            name: Set(format.name.clone()),
            bitrate: Set(format.bitrate),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    tracing::info!(
        "Reconcile | video={} | owner={} | jobs={} | formats={} | materialized",
        public_id,
        owner_id,
        jobs.len(),
        formats.len()
    );

    Ok(true)
}
