use axum::body::Bytes;
use axum::extract::Multipart;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};

use crate::entities::{video, video_subtitles};
use crate::error::{AppError, ValidationErrors};
use crate::models::languages;
use crate::models::video::SubtitlesResponse;
use crate::services::plugin::PluginBackend;
use crate::utils::random_public_id;

const SUBTITLES_ID_LENGTH: usize = 12;

/// Raw multipart fields of a subtitles upload.
#[derive(Debug, Default)]
pub struct SubtitlesForm {
    pub language: Option<String>,
    pub name: Option<String>,
    pub attachment: Option<Bytes>,
    /// The attachment had more than the allowed bytes; reading stopped early.
    pub attachment_truncated: bool,
}

#[derive(Debug)]
pub struct ValidSubtitles {
    pub language: String,
    pub name: Option<String>,
    pub attachment: Bytes,
}

pub fn too_large_message(max_bytes: usize) -> String {
    format!("The maximum file size that can be uploaded is {} bytes", max_bytes)
}

impl SubtitlesForm {
    /// Reads the form, buffering at most `max_bytes + 1` bytes of attachment.
    ///
    /// Any `id` field is ignored: uploads always create new subtitles.
    pub async fn from_multipart(
        multipart: &mut Multipart,
        max_bytes: usize,
    ) -> Result<Self, AppError> {
        let mut form = Self::default();
        let invalid = |_| AppError::BadRequest("Invalid multipart data".to_string());

        while let Some(mut field) = multipart.next_field().await.map_err(invalid)? {
            let field_name = field.name().map(str::to_string);
            match field_name.as_deref() {
                Some("language") => form.language = Some(field.text().await.map_err(invalid)?),
                Some("name") => form.name = Some(field.text().await.map_err(invalid)?),
                Some("attachment") => {
                    if form.name.is_none() {
                        form.name = field.file_name().map(str::to_string);
                    }
                    let mut data = Vec::new();
                    while let Some(chunk) = field.chunk().await.map_err(invalid)? {
                        data.extend_from_slice(&chunk);
                        if data.len() > max_bytes {
                            data.truncate(max_bytes + 1);
                            form.attachment_truncated = true;
                            break;
                        }
                    }
                    // Discard the rest of an oversized file so later fields can still be read.
                    if form.attachment_truncated {
                        while field.chunk().await.map_err(invalid)?.is_some() {}
                    }
                    form.attachment = Some(Bytes::from(data));
                }
                _ => {}
            }
        }

        Ok(form)
    }

    /// Each field is checked on its own so that all problems come back together.
    pub fn validate(self, max_bytes: usize) -> Result<ValidSubtitles, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let language = match self.language.as_deref() {
            None | Some("") => {
                errors.add("language", "This field is required.");
                None
            }
            Some(code) if !languages::is_supported(code) => {
                errors.add("language", format!("\"{}\" is not a valid choice.", code));
                None
            }
            Some(code) => Some(code.to_string()),
        };

        let attachment = match self.attachment {
            None => {
                errors.add("attachment", "No file was submitted.");
                None
            }
            Some(data) if data.is_empty() => {
                errors.add("attachment", "The submitted file is empty.");
                None
            }
            Some(data) if self.attachment_truncated || data.len() > max_bytes => {
                errors.add("attachment", too_large_message(max_bytes));
                None
            }
            Some(data) => Some(data),
        };

        match (language, attachment) {
            (Some(language), Some(attachment)) if errors.is_empty() => Ok(ValidSubtitles {
                language,
                name: self.name,
                attachment,
            }),
            _ => Err(errors),
        }
    }
}

/// Persists new subtitles for `video` and hands the content to the backend.
///
/// The row is committed only once the backend accepted the upload and
/// returned its download location.
pub async fn create_subtitles(
    db: &DatabaseConnection,
    backend: &dyn PluginBackend,
    video: &video::Model,
    subtitles: ValidSubtitles,
) -> Result<SubtitlesResponse, AppError> {
    let txn = db.begin().await?;

    let model = video_subtitles::ActiveModel {
        public_id: Set(random_public_id(SUBTITLES_ID_LENGTH)),
        video_id: Set(video.id),
        language: Set(subtitles.language),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    backend
        .upload_subtitles(
            &video.public_id,
            &model.public_id,
            &model.language,
            subtitles.attachment,
        )
        .await?;

    let download_url = backend
        .get_subtitles_download_url(&video.public_id, &model.public_id, &model.language)
        .await?;

    txn.commit().await?;

    tracing::info!(
        "Subtitles | video={} | subtitles={} | language={} | name={}",
        video.public_id,
        model.public_id,
        model.language,
        subtitles.name.as_deref().unwrap_or("-")
    );

    Ok(SubtitlesResponse::build(model, download_url))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(language: Option<&str>, attachment: Option<Vec<u8>>) -> SubtitlesForm {
        SubtitlesForm {
            language: language.map(str::to_string),
            name: Some("subs.srt".into()),
            attachment: attachment.map(Bytes::from),
            attachment_truncated: false,
        }
    }

    #[test]
    fn accepts_known_language_with_attachment() {
        let valid = form(Some("fr"), Some(b"1\n00:00:01,000 --> 00:00:02,000\nSalut\n".to_vec()))
            .validate(1024)
            .unwrap();
        assert_eq!(valid.language, "fr");
        assert_eq!(valid.name.as_deref(), Some("subs.srt"));
    }

    #[test]
    fn rejects_language_names() {
        let errors = form(Some("french"), Some(b"content".to_vec())).validate(1024).unwrap_err();
        assert_eq!(
            errors.get("language").unwrap(),
            ["\"french\" is not a valid choice.".to_string()]
        );
        assert!(errors.get("attachment").is_none());
    }

    #[test]
    fn language_code_must_match_exactly() {
        let errors = form(Some(" fr "), Some(b"content".to_vec())).validate(1024).unwrap_err();
        assert_eq!(
            errors.get("language").unwrap(),
            ["\" fr \" is not a valid choice.".to_string()]
        );
    }

    #[test]
    fn reports_missing_fields_together() {
        let errors = form(None, None).validate(1024).unwrap_err();
        assert_eq!(errors.get("language").unwrap(), ["This field is required.".to_string()]);
        assert_eq!(errors.get("attachment").unwrap(), ["No file was submitted.".to_string()]);
    }

    #[test]
    fn rejects_empty_attachment() {
        let errors = form(Some("en"), Some(Vec::new())).validate(1024).unwrap_err();
        assert_eq!(
            errors.get("attachment").unwrap(),
            ["The submitted file is empty.".to_string()]
        );
    }

    #[test]
    fn size_limit_is_inclusive() {
        let content = vec![b'a'; 140];
        assert!(form(Some("en"), Some(content.clone())).validate(140).is_ok());

        let errors = form(Some("en"), Some(content)).validate(139).unwrap_err();
        let messages = errors.get("attachment").unwrap();
        assert!(messages[0].contains("139"), "{messages:?}");
    }

    #[test]
    fn truncated_read_counts_as_too_large() {
        let mut truncated = form(Some("en"), Some(b"abcd".to_vec()));
        truncated.attachment_truncated = true;
        assert!(truncated.validate(3).is_err());
    }
}
