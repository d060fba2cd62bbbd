use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use axum::body::Bytes;

use crate::config::{FormatSpec, StorageConfig};
use crate::services::plugin::{
    AvailableFormat, PluginBackend, PluginError, TranscodingJob, UploadUrl, UploadedVideo,
};
use crate::utils::{random_public_id, sanitize_filename};

const VIDEO_ID_LENGTH: usize = 16;

/// Plugin backend over a single S3 bucket.
///
/// Layout, per video:
/// `videos/{id}/src/{filename}` for the upload,
/// `videos/{id}/formats/{name}.mp4` for renditions produced by the bucket's
/// pipeline, and `videos/{id}/subtitles/{subtitles_id}.{language}.vtt`.
#[derive(Clone)]
pub struct S3Backend {
    client: Client,
    pub bucket_name: String,
    region: String,
    endpoint: Option<String>,
    upload_url_expires: Duration,
    formats: Vec<FormatSpec>,
}

fn video_prefix(video_id: &str) -> String {
    format!("videos/{}/", video_id)
}

fn source_prefix(video_id: &str) -> String {
    format!("videos/{}/src/", video_id)
}

fn format_key(video_id: &str, format_name: &str) -> String {
    format!("videos/{}/formats/{}.mp4", video_id, format_name)
}

fn subtitles_key(video_id: &str, subtitles_id: &str, language: &str) -> String {
    format!("videos/{}/subtitles/{}.{}.vtt", video_id, subtitles_id, language)
}

fn storage_error<E: std::fmt::Display>(context: &str) -> impl FnOnce(E) -> PluginError + '_ {
    move |e| {
        tracing::error!("S3 {} error: {}", context, e);
        PluginError::Storage(format!("{}: {}", context, e))
    }
}

impl S3Backend {
    pub async fn new(config: &StorageConfig) -> Self {
        let region = Region::new(config.region.clone());

        let mut s3_config_builder = match (&config.access_key_id, &config.secret_access_key) {
            (Some(key_id), Some(secret)) => {
                let credentials =
                    Credentials::new(key_id.clone(), secret.clone(), None, None, "manual_config");
                aws_sdk_s3::config::Builder::new()
                    .behavior_version(BehaviorVersion::latest())
                    .region(region)
                    .credentials_provider(credentials)
            }
            _ => {
                let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
                    .region(region)
                    .load()
                    .await;
                aws_sdk_s3::config::Builder::from(&shared)
            }
        };

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder
                .endpoint_url(endpoint)
                .force_path_style(true);
        }

        Self {
            client: Client::from_conf(s3_config_builder.build()),
            bucket_name: config.bucket_name.clone(),
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
            upload_url_expires: Duration::from_secs(config.upload_url_expires_secs),
            formats: config.formats.clone(),
        }
    }

    pub fn public_url(&self, key: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => format!(
                "{}/{}/{}",
                endpoint.trim_end_matches('/'),
                self.bucket_name,
                key
            ),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket_name, self.region, key
            ),
        }
    }

    pub async fn ensure_bucket_exists(&self) -> Result<(), PluginError> {
        if self
            .client
            .head_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
            .is_err()
        {
            tracing::info!("Bucket {} does not exist, attempting to create...", self.bucket_name);
            self.client
                .create_bucket()
                .bucket(&self.bucket_name)
                .send()
                .await
                .map_err(storage_error("create bucket"))?;
        }

        self.set_public_policy().await
    }

    // Renditions and subtitles are served straight from the bucket.
    async fn set_public_policy(&self) -> Result<(), PluginError> {
        let policy = format!(
            r#"{{
                "Version": "2012-10-17",
                "Statement": [
                    {{
                        "Sid": "PublicReadVideos",
                        "Effect": "Allow",
                        "Principal": "*",
                        "Action": "s3:GetObject",
                        "Resource": "arn:aws:s3:::{}/videos/*"
                    }}
                ]
            }}"#,
            self.bucket_name
        );

        self.client
            .put_bucket_policy()
            .bucket(&self.bucket_name)
            .policy(policy)
            .send()
            .await
            .map_err(storage_error("put bucket policy"))?;

        Ok(())
    }

    async fn object_exists(&self, key: &str) -> Result<bool, PluginError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => Err(storage_error("head object")(e)),
        }
    }

    async fn list_keys(&self, prefix: &str, limit: Option<i32>) -> Result<Vec<String>, PluginError> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let resp = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket_name)
                .prefix(prefix)
                .set_max_keys(limit)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(storage_error("list objects"))?;

            keys.extend(resp.contents().iter().filter_map(|o| o.key().map(str::to_string)));

            match resp.next_continuation_token() {
                Some(token) if limit.is_none() && resp.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => return Ok(keys),
            }
        }
    }

    async fn delete_object(&self, key: &str) -> Result<(), PluginError> {
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(storage_error("delete object"))?;

        Ok(())
    }
}

#[async_trait]
impl PluginBackend for S3Backend {
    async fn create_upload_url(&self, filename: &str) -> Result<UploadUrl, PluginError> {
        let video_id = random_public_id(VIDEO_ID_LENGTH);
        let key = format!("{}{}", source_prefix(&video_id), sanitize_filename(filename));

        let presigning_config = PresigningConfig::expires_in(self.upload_url_expires)
            .map_err(storage_error("presigning config"))?;
        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .presigned(presigning_config)
            .await
            .map_err(storage_error("presign upload"))?;

        let expires_at = chrono::Utc::now().timestamp() + self.upload_url_expires.as_secs() as i64;

        Ok(UploadUrl {
            url: presigned.uri().to_string(),
            method: presigned.method().to_string(),
            id: video_id,
            expires_at,
        })
    }

    async fn get_uploaded_video(&self, video_id: &str) -> Result<UploadedVideo, PluginError> {
        let keys = self.list_keys(&source_prefix(video_id), Some(1)).await?;
        if keys.is_empty() {
            return Err(PluginError::NotFound);
        }
        Ok(UploadedVideo::default())
    }

    async fn create_transcoding_jobs(
        &self,
        _video_id: &str,
    ) -> Result<Vec<TranscodingJob>, PluginError> {
        // Renditions are produced by the bucket's own pipeline.
        Ok(Vec::new())
    }

    async fn iter_available_formats(
        &self,
        video_id: &str,
    ) -> Result<Vec<AvailableFormat>, PluginError> {
        let mut available = Vec::new();
        for format in &self.formats {
            if self.object_exists(&format_key(video_id, &format.name)).await? {
                available.push(AvailableFormat {
                    name: format.name.clone(),
                    bitrate: format.bitrate,
                });
            }
        }
        Ok(available)
    }

    async fn get_subtitles_download_url(
        &self,
        video_id: &str,
        subtitles_id: &str,
        language: &str,
    ) -> Result<String, PluginError> {
        Ok(self.public_url(&subtitles_key(video_id, subtitles_id, language)))
    }

    async fn get_video_streaming_url(
        &self,
        video_id: &str,
        format_name: &str,
    ) -> Result<String, PluginError> {
        Ok(self.public_url(&format_key(video_id, format_name)))
    }

    async fn upload_subtitles(
        &self,
        video_id: &str,
        subtitles_id: &str,
        language: &str,
        attachment: Bytes,
    ) -> Result<(), PluginError> {
        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(subtitles_key(video_id, subtitles_id, language))
            .body(ByteStream::from(attachment))
            .content_type("text/vtt")
            .send()
            .await
            .map_err(storage_error("upload subtitles"))?;

        Ok(())
    }

    async fn delete_resources(&self, video_id: &str) -> Result<(), PluginError> {
        let keys = self.list_keys(&video_prefix(video_id), None).await?;
        tracing::info!("S3 | delete_resources | video={} | objects={}", video_id, keys.len());

        for key in keys {
            self.delete_object(&key).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_layout_is_scoped_per_video() {
        assert_eq!(source_prefix("abc"), "videos/abc/src/");
        assert_eq!(format_key("abc", "HD"), "videos/abc/formats/HD.mp4");
        assert_eq!(
            subtitles_key("abc", "sub1", "pt-br"),
            "videos/abc/subtitles/sub1.pt-br.vtt"
        );
        assert!(format_key("abc", "SD").starts_with(&video_prefix("abc")));
    }
}
