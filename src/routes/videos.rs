use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set, TransactionTrait,
};
use serde::Deserialize;

use crate::entities::{playlist_video, video, video_format, video_subtitles, video_transcoding};
use crate::error::{AppError, ValidationErrors};
use crate::middleware::auth::AuthUser;
use crate::models::video::{SubtitlesResponse, VideoResponse};
use crate::services::subtitles::{self, SubtitlesForm};
use crate::services::{catalog, reconcile};
use crate::state::AppState;

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListVideosQuery {
    /// Restrict the list to the caller's playlist with this id.
    playlist_id: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateVideoRequest {
    title: Option<String>,
}

fn not_found() -> AppError {
    AppError::NotFound("Not found.".to_string())
}

async fn find_owned(
    db: &DatabaseConnection,
    owner_id: i32,
    public_id: &str,
) -> Result<video::Model, AppError> {
    video::Entity::find()
        .filter(video::Column::PublicId.eq(public_id))
        .filter(video::Column::OwnerId.eq(owner_id))
        .one(db)
        .await?
        .ok_or_else(not_found)
}

#[utoipa::path(
    get,
    path = "/api/v1/videos/",
    params(ListVideosQuery),
    responses(
        (status = 200, description = "Videos owned by the caller", body = [VideoResponse]),
        (status = 401, description = "Missing or invalid credentials")
    ),
    security(("bearer_auth" = []), ("basic_auth" = [])),
    tag = "Videos"
)]
pub async fn list_videos(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<ListVideosQuery>,
) -> Result<Json<Vec<VideoResponse>>, AppError> {
    let videos = catalog::list_videos(
        &state.db,
        state.backend.as_ref(),
        auth_user.id,
        query.playlist_id.as_deref(),
    )
    .await?;

    tracing::debug!(
        "Videos | GET /videos/ | user={} | playlist={} | res={}",
        auth_user.username,
        query.playlist_id.as_deref().unwrap_or("-"),
        videos.len()
    );

    Ok(Json(videos))
}

#[utoipa::path(
    get,
    path = "/api/v1/videos/{id}/",
    params(("id" = String, Path, description = "Public video id")),
    responses(
        (status = 200, description = "Video details", body = VideoResponse),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 404, description = "Video not found")
    ),
    security(("bearer_auth" = []), ("basic_auth" = [])),
    tag = "Videos"
)]
pub async fn get_video(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<VideoResponse>, AppError> {
    let backend = state.backend.as_ref();

    if let Some(video) = catalog::get_video(&state.db, backend, auth_user.id, &id).await? {
        return Ok(Json(video));
    }

    // The upload may have completed since the grant was issued.
    if !reconcile::ensure_materialized(&state.db, backend, auth_user.id, &id).await? {
        return Err(not_found());
    }

    catalog::get_video(&state.db, backend, auth_user.id, &id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

#[utoipa::path(
    put,
    path = "/api/v1/videos/{id}/",
    params(("id" = String, Path, description = "Public video id")),
    request_body = UpdateVideoRequest,
    responses(
        (status = 200, description = "Updated video", body = VideoResponse),
        (status = 400, description = "Field errors"),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 404, description = "Video not found")
    ),
    security(("bearer_auth" = []), ("basic_auth" = [])),
    tag = "Videos"
)]
pub async fn update_video(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateVideoRequest>,
) -> Result<Json<VideoResponse>, AppError> {
    let video = find_owned(&state.db, auth_user.id, &id).await?;

    let title = match payload.title.as_deref().map(str::trim) {
        None => return Err(ValidationErrors::single("title", "This field is required.").into()),
        Some("") => return Err(ValidationErrors::single("title", "This field may not be blank.").into()),
        Some(title) => title.to_string(),
    };

    if video.title != title {
        let mut active = video.into_active_model();
        active.title = Set(title);
        active.update(&state.db).await?;
    }

    tracing::info!("Videos | PUT /videos/{}/ | user={} | res=updated", id, auth_user.username);

    catalog::get_video(&state.db, state.backend.as_ref(), auth_user.id, &id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

#[utoipa::path(
    delete,
    path = "/api/v1/videos/{id}/",
    params(("id" = String, Path, description = "Public video id")),
    responses(
        (status = 204, description = "Video deleted"),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 404, description = "Video not found")
    ),
    security(("bearer_auth" = []), ("basic_auth" = [])),
    tag = "Videos"
)]
pub async fn delete_video(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let video = find_owned(&state.db, auth_user.id, &id).await?;

    let txn = state.db.begin().await?;
    video_transcoding::Entity::delete_many()
        .filter(video_transcoding::Column::VideoId.eq(video.id))
        .exec(&txn)
        .await?;
    video_subtitles::Entity::delete_many()
        .filter(video_subtitles::Column::VideoId.eq(video.id))
        .exec(&txn)
        .await?;
    video_format::Entity::delete_many()
        .filter(video_format::Column::VideoId.eq(video.id))
        .exec(&txn)
        .await?;
    playlist_video::Entity::delete_many()
        .filter(playlist_video::Column::VideoId.eq(video.id))
        .exec(&txn)
        .await?;
    video::Entity::delete_by_id(video.id).exec(&txn).await?;
    txn.commit().await?;

    if let Err(e) = state.backend.delete_resources(&video.public_id).await {
        tracing::warn!(
            "Videos | DELETE /videos/{}/ | backend cleanup failed: {}",
            video.public_id,
            e
        );
    }

    tracing::info!("Videos | DELETE /videos/{}/ | user={} | res=deleted", id, auth_user.username);
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/videos/{id}/subtitles/",
    params(("id" = String, Path, description = "Public video id")),
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Subtitles created", body = SubtitlesResponse),
        (status = 400, description = "Field errors"),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 404, description = "Video not found")
    ),
    security(("bearer_auth" = []), ("basic_auth" = [])),
    tag = "Videos"
)]
pub async fn upload_subtitles(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubtitlesResponse>), AppError> {
    let video = find_owned(&state.db, auth_user.id, &id).await?;

    let max_bytes = state.config.subtitles_max_bytes;
    let form = SubtitlesForm::from_multipart(&mut multipart, max_bytes).await?;
    let valid = form.validate(max_bytes)?;

    let subtitles =
        subtitles::create_subtitles(&state.db, state.backend.as_ref(), &video, valid).await?;

    Ok((StatusCode::CREATED, Json(subtitles)))
}
