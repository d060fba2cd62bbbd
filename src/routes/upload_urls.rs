use axum::{
    extract::State,
    response::Json,
    Extension,
};
use sea_orm::{ActiveModelTrait, Set};
use serde::Deserialize;

use crate::entities::video_upload_url;
use crate::error::{AppError, ValidationErrors};
use crate::middleware::auth::AuthUser;
use crate::services::plugin::UploadUrl;
use crate::state::AppState;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateUploadUrlRequest {
    filename: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/video-upload-urls/",
    request_body = CreateUploadUrlRequest,
    responses(
        (status = 200, description = "Upload destination for a new video", body = UploadUrl),
        (status = 400, description = "Field errors"),
        (status = 401, description = "Missing or invalid credentials")
    ),
    security(("bearer_auth" = []), ("basic_auth" = [])),
    tag = "Uploads"
)]
pub async fn create_upload_url(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateUploadUrlRequest>,
) -> Result<Json<UploadUrl>, AppError> {
    let filename = match payload.filename.as_deref().map(str::trim) {
        None => return Err(ValidationErrors::single("filename", "This field is required.").into()),
        Some("") => {
            return Err(ValidationErrors::single("filename", "This field may not be blank.").into())
        }
        Some(filename) => filename.to_string(),
    };

    let upload_url = state.backend.create_upload_url(&filename).await?;

    video_upload_url::ActiveModel {
        owner_id: Set(auth_user.id),
        public_video_id: Set(upload_url.id.clone()),
        filename: Set(filename),
        expires_at: Set(upload_url.expires_at),
        was_used: Set(false),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    tracing::info!(
        "Uploads | POST /video-upload-urls/ | user={} | video={} | res=issued",
        auth_user.username,
        upload_url.id
    );

    Ok(Json(upload_url))
}
