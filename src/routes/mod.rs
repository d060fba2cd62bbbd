mod auth;
mod upload_urls;
mod videos;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::middleware::auth::auth_middleware;
use crate::state::AppState;

// Room for multipart boundaries and the non-file fields.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::login,
        videos::list_videos,
        videos::get_video,
        videos::update_video,
        videos::delete_video,
        videos::upload_subtitles,
        upload_urls::create_upload_url,
    ),
    components(
        schemas(
            auth::LoginRequest,
            auth::LoginResponse,
            videos::UpdateVideoRequest,
            upload_urls::CreateUploadUrlRequest,
            crate::models::video::VideoResponse,
            crate::models::video::StatusDetails,
            crate::models::video::SubtitlesResponse,
            crate::models::video::FormatResponse,
            crate::services::plugin::UploadUrl,
            crate::entities::video_transcoding::Status,
        )
    ),
    tags(
        (name = "Authentication", description = "Token issuance"),
        (name = "Videos", description = "Owned videos, their formats and subtitles"),
        (name = "Uploads", description = "Upload destinations for new videos")
    ),
    info(
        title = "Vidhost API",
        version = "0.1.0",
        description = "Video hosting core: per-user catalog, lazy upload reconciliation and subtitles",
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
            components.add_security_scheme(
                "basic_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Basic)),
            );
        }
    }
}

pub fn create_routes(state: AppState) -> Router {
    let swagger_router: Router = SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into();

    let subtitles_limit = state.config.subtitles_max_bytes + MULTIPART_OVERHEAD_BYTES;

    // `layer` rather than `route_layer`: a disabled method still needs credentials.
    let protected_routes = Router::new()
        .route("/videos/", get(videos::list_videos))
        .route(
            "/videos/{id}/",
            get(videos::get_video)
                .put(videos::update_video)
                .delete(videos::delete_video),
        )
        .route(
            "/videos/{id}/subtitles/",
            post(videos::upload_subtitles).layer(DefaultBodyLimit::max(subtitles_limit)),
        )
        .route("/video-upload-urls/", post(upload_urls::create_upload_url))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let api_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .merge(protected_routes)
        .with_state(state);

    Router::new()
        .merge(swagger_router)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
