//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use axum_extra::headers::{Authorization, HeaderMapExt};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use serde_json::Value;
use tower::ServiceExt;

use vidhost::config::Config;
use vidhost::entities::{
    playlist, playlist_video, user, video, video_format, video_subtitles, video_transcoding,
    video_upload_url,
};
use vidhost::middleware::auth::issue_token;
use vidhost::routes::create_routes;
use vidhost::services::plugin::{
    AvailableFormat, PluginBackend, PluginError, TranscodingJob, UploadUrl, UploadedVideo,
};
use vidhost::state::AppState;

pub const JWT_SECRET: &str = "test-secret";
pub const SUBTITLES_MAX_BYTES: usize = 1024;

/// Backend double that records every call and answers from configurable state.
#[derive(Default)]
pub struct MockBackend {
    calls: Mutex<Vec<(&'static str, String)>>,
    uploaded: Mutex<HashMap<String, UploadedVideo>>,
    pub jobs: Mutex<Vec<TranscodingJob>>,
    pub formats: Mutex<Vec<AvailableFormat>>,
    pub fail_subtitles_upload: AtomicBool,
    pub fail_download_url: AtomicBool,
    pub fail_delete: AtomicBool,
    /// (video id, subtitles id, language, content) per accepted upload.
    pub stored_subtitles: Mutex<Vec<(String, String, String, Bytes)>>,
    next_id: AtomicUsize,
}

impl MockBackend {
    fn record(&self, method: &'static str, args: String) {
        self.calls.lock().unwrap().push((method, args));
    }

    /// Arguments of every call to `method`, in call order.
    pub fn calls_to(&self, method: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| *m == method)
            .map(|(_, args)| args.clone())
            .collect()
    }

    pub fn mark_uploaded(&self, video_id: &str, title: Option<&str>) {
        self.uploaded.lock().unwrap().insert(
            video_id.to_string(),
            UploadedVideo {
                title: title.map(str::to_string),
            },
        );
    }
}

pub fn streaming_url(video_id: &str, format_name: &str) -> String {
    format!("https://cdn.test/{}/{}.mp4", video_id, format_name)
}

pub fn download_url(video_id: &str, subtitles_id: &str, language: &str) -> String {
    format!("https://cdn.test/{}/subtitles/{}.{}.vtt", video_id, subtitles_id, language)
}

#[async_trait]
impl PluginBackend for MockBackend {
    async fn create_upload_url(&self, filename: &str) -> Result<UploadUrl, PluginError> {
        self.record("create_upload_url", filename.to_string());
        let id = format!("upload{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        Ok(UploadUrl {
            url: format!("https://uploads.test/{}/{}", id, filename),
            method: "PUT".to_string(),
            id,
            expires_at: chrono::Utc::now().timestamp() + 3600,
        })
    }

    async fn get_uploaded_video(&self, video_id: &str) -> Result<UploadedVideo, PluginError> {
        self.record("get_uploaded_video", video_id.to_string());
        self.uploaded
            .lock()
            .unwrap()
            .get(video_id)
            .cloned()
            .ok_or(PluginError::NotFound)
    }

    async fn create_transcoding_jobs(
        &self,
        video_id: &str,
    ) -> Result<Vec<TranscodingJob>, PluginError> {
        self.record("create_transcoding_jobs", video_id.to_string());
        Ok(self.jobs.lock().unwrap().clone())
    }

    async fn iter_available_formats(
        &self,
        video_id: &str,
    ) -> Result<Vec<AvailableFormat>, PluginError> {
        self.record("iter_available_formats", video_id.to_string());
        Ok(self.formats.lock().unwrap().clone())
    }

    async fn get_subtitles_download_url(
        &self,
        video_id: &str,
        subtitles_id: &str,
        language: &str,
    ) -> Result<String, PluginError> {
        if self.fail_download_url.load(Ordering::SeqCst) {
            return Err(PluginError::Storage("presign failed".to_string()));
        }
        Ok(download_url(video_id, subtitles_id, language))
    }

    async fn get_video_streaming_url(
        &self,
        video_id: &str,
        format_name: &str,
    ) -> Result<String, PluginError> {
        Ok(streaming_url(video_id, format_name))
    }

    async fn upload_subtitles(
        &self,
        video_id: &str,
        subtitles_id: &str,
        language: &str,
        attachment: Bytes,
    ) -> Result<(), PluginError> {
        self.record("upload_subtitles", format!("{}/{}", video_id, subtitles_id));
        if self.fail_subtitles_upload.load(Ordering::SeqCst) {
            return Err(PluginError::Storage("bucket unavailable".to_string()));
        }
        self.stored_subtitles.lock().unwrap().push((
            video_id.to_string(),
            subtitles_id.to_string(),
            language.to_string(),
            attachment,
        ));
        Ok(())
    }

    async fn delete_resources(&self, video_id: &str) -> Result<(), PluginError> {
        self.record("delete_resources", video_id.to_string());
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(PluginError::Storage("bucket unavailable".to_string()));
        }
        Ok(())
    }
}

/// One multipart/form-data part.
pub struct Part<'a> {
    name: &'a str,
    filename: Option<&'a str>,
    content: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn text(name: &'a str, value: &'a str) -> Self {
        Self { name, filename: None, content: value.as_bytes() }
    }

    pub fn file(name: &'a str, filename: &'a str, content: &'a [u8]) -> Self {
        Self { name, filename: Some(filename), content }
    }
}

pub enum Auth<'a> {
    Anonymous,
    Bearer(&'a str),
    Basic(&'a str, &'a str),
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
    pub backend: Arc<MockBackend>,
    queries: Arc<AtomicUsize>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_subtitles_max(SUBTITLES_MAX_BYTES).await
    }

    pub async fn with_subtitles_max(subtitles_max_bytes: usize) -> Self {
        // A single connection keeps every query on the same in-memory database.
        let mut options = ConnectOptions::new("sqlite::memory:");
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        let mut db = Database::connect(options)
            .await
            .expect("Failed to connect to test database");
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        let queries = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&queries);
        db.set_metric_callback(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let config = Config {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: JWT_SECRET.to_string(),
            access_token_ttl_secs: 900,
            bind_addr: "127.0.0.1:0".to_string(),
            subtitles_max_bytes,
        };

        let backend = Arc::new(MockBackend::default());
        let state = AppState::new(db.clone(), config, backend.clone());

        Self {
            router: create_routes(state),
            db,
            backend,
            queries,
        }
    }

    pub fn reset_query_count(&self) {
        self.queries.store(0, Ordering::SeqCst);
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub async fn create_user(&self, username: &str, password: &str) -> user::Model {
        self.create_user_with_status(username, password, true).await
    }

    pub async fn create_user_with_status(
        &self,
        username: &str,
        password: &str,
        is_active: bool,
    ) -> user::Model {
        // Cheap parameters; verification reads them back from the hash.
        let params = Params::new(8, 1, 1, None).unwrap();
        let hash = Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
            .hash_password(password.as_bytes(), &SaltString::generate(&mut OsRng))
            .unwrap()
            .to_string();

        user::ActiveModel {
            username: Set(username.to_string()),
            password: Set(hash),
            is_active: Set(is_active),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .expect("Failed to create test user")
    }

    pub fn token(&self, user: &user::Model) -> String {
        issue_token(user, JWT_SECRET, 900).unwrap()
    }

    pub async fn create_video(&self, owner: &user::Model, public_id: &str, title: &str) -> video::Model {
        video::ActiveModel {
            public_id: Set(public_id.to_string()),
            owner_id: Set(owner.id),
            title: Set(title.to_string()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .expect("Failed to create test video")
    }

    pub async fn set_status(
        &self,
        video: &video::Model,
        status: video_transcoding::Status,
        progress: i32,
    ) -> video_transcoding::Model {
        video_transcoding::ActiveModel {
            video_id: Set(video.id),
            status: Set(status),
            progress: Set(progress),
            started_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .unwrap()
    }

    pub async fn add_subtitles(
        &self,
        video: &video::Model,
        public_id: &str,
        language: &str,
    ) -> video_subtitles::Model {
        video_subtitles::ActiveModel {
            public_id: Set(public_id.to_string()),
            video_id: Set(video.id),
            language: Set(language.to_string()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .unwrap()
    }

    pub async fn add_format(&self, video: &video::Model, name: &str, bitrate: i32) -> video_format::Model {
        video_format::ActiveModel {
            video_id: Set(video.id),
            name: Set(name.to_string()),
            bitrate: Set(bitrate),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .unwrap()
    }

    pub async fn create_playlist(
        &self,
        owner: &user::Model,
        public_id: &str,
        videos: &[&video::Model],
    ) -> playlist::Model {
        let playlist = playlist::ActiveModel {
            public_id: Set(public_id.to_string()),
            owner_id: Set(owner.id),
            name: Set(format!("{} playlist", public_id)),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .unwrap();

        for video in videos {
            playlist_video::ActiveModel {
                playlist_id: Set(playlist.id),
                video_id: Set(video.id),
            }
            .insert(&self.db)
            .await
            .unwrap();
        }

        playlist
    }

    pub async fn create_grant(
        &self,
        owner: &user::Model,
        public_video_id: &str,
        filename: &str,
    ) -> video_upload_url::Model {
        let expires_at = chrono::Utc::now().timestamp() + 3600;
        self.create_grant_with(owner, public_video_id, filename, expires_at, false)
            .await
    }

    pub async fn create_grant_with(
        &self,
        owner: &user::Model,
        public_video_id: &str,
        filename: &str,
        expires_at: i64,
        was_used: bool,
    ) -> video_upload_url::Model {
        video_upload_url::ActiveModel {
            owner_id: Set(owner.id),
            public_video_id: Set(public_video_id.to_string()),
            filename: Set(filename.to_string()),
            expires_at: Set(expires_at),
            was_used: Set(was_used),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .unwrap()
    }

    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        auth: Auth<'_>,
    ) -> TestResponse {
        let body = body
            .map(|b| serde_json::to_vec(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        self.send(method, path, "application/json", body, auth).await
    }

    pub async fn request_multipart(
        &self,
        path: &str,
        parts: &[Part<'_>],
        auth: Auth<'_>,
    ) -> TestResponse {
        const BOUNDARY: &str = "----vidhost-test-boundary";

        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match part.filename {
                Some(filename) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        part.name, filename
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name)
                        .as_bytes(),
                ),
            }
            body.extend_from_slice(part.content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let content_type = format!("multipart/form-data; boundary={}", BOUNDARY);
        self.send("POST", path, &content_type, body, auth).await
    }

    async fn send(
        &self,
        method: &str,
        path: &str,
        content_type: &str,
        body: Vec<u8>,
        auth: Auth<'_>,
    ) -> TestResponse {
        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .expect("Failed to build request");

        match auth {
            Auth::Anonymous => {}
            Auth::Bearer(token) => req
                .headers_mut()
                .typed_insert(Authorization::bearer(token).unwrap()),
            Auth::Basic(username, password) => req
                .headers_mut()
                .typed_insert(Authorization::basic(username, password)),
        }

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, headers, body }
    }
}
