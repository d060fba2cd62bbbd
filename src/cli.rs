//! Administrative commands. Users, videos and playlists have no HTTP surface.

use clap::{Parser, Subcommand};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use crate::config::ConfigError;
use crate::entities::{playlist, playlist_video, user, video};
use crate::middleware::auth::hash_password;
use crate::utils::random_public_id;

const VIDEO_ID_LENGTH: usize = 16;
const PLAYLIST_ID_LENGTH: usize = 12;

#[derive(Parser)]
#[command(name = "vidhost", version, about = "Video hosting core service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run migrations, then serve the HTTP API
    Serve,
    /// Apply pending migrations and exit
    Migrate,
    /// Create a user; the password is prompted for
    CreateUser { username: String },
    /// Register a video directly, bypassing the upload flow
    CreateVideo {
        #[arg(long)]
        owner: String,
        /// Public id; generated when omitted
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        title: String,
    },
    /// Create a playlist holding some of the owner's videos
    CreatePlaylist {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        name: String,
        #[arg(long = "video")]
        videos: Vec<String>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database error: {0}")]
    Database(#[from] DbErr),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("password hashing failed")]
    Hash,
    #[error("{0}")]
    Invalid(String),
}

async fn find_user(db: &DatabaseConnection, username: &str) -> Result<user::Model, CliError> {
    user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?
        .ok_or_else(|| CliError::Invalid(format!("no such user: {}", username)))
}

pub async fn create_user(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<user::Model, CliError> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(CliError::Invalid("username and password are required".to_string()));
    }

    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(CliError::Invalid(format!("user {} already exists", username)));
    }

    let password = hash_password(password).map_err(|_| CliError::Hash)?;

    let user = user::ActiveModel {
        username: Set(username.to_string()),
        password: Set(password),
        is_active: Set(true),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!("CLI | create-user | user={} | res=created", user.username);
    Ok(user)
}

pub async fn create_video(
    db: &DatabaseConnection,
    owner: &str,
    public_id: Option<String>,
    title: &str,
) -> Result<video::Model, CliError> {
    let owner = find_user(db, owner).await?;
    let public_id = public_id.unwrap_or_else(|| random_public_id(VIDEO_ID_LENGTH));
    if public_id.is_empty() || public_id.len() > 20 {
        return Err(CliError::Invalid("video id must be 1 to 20 characters".to_string()));
    }

    let video = video::ActiveModel {
        public_id: Set(public_id),
        owner_id: Set(owner.id),
        title: Set(title.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(
        "CLI | create-video | user={} | video={} | res=created",
        owner.username,
        video.public_id
    );
    Ok(video)
}

/// Every listed video must exist and belong to `owner`.
pub async fn create_playlist(
    db: &DatabaseConnection,
    owner: &str,
    name: &str,
    video_ids: &[String],
) -> Result<playlist::Model, CliError> {
    let owner = find_user(db, owner).await?;

    let videos = video::Entity::find()
        .filter(video::Column::OwnerId.eq(owner.id))
        .filter(video::Column::PublicId.is_in(video_ids.iter().cloned()))
        .all(db)
        .await?;
    if let Some(missing) = video_ids
        .iter()
        .find(|id| !videos.iter().any(|v| &v.public_id == *id))
    {
        return Err(CliError::Invalid(format!(
            "video {} not found for user {}",
            missing, owner.username
        )));
    }

    let txn = db.begin().await?;
    let playlist = playlist::ActiveModel {
        public_id: Set(random_public_id(PLAYLIST_ID_LENGTH)),
        owner_id: Set(owner.id),
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for video in &videos {
        playlist_video::ActiveModel {
            playlist_id: Set(playlist.id),
            video_id: Set(video.id),
        }
        .insert(&txn)
        .await?;
    }
    txn.commit().await?;

    tracing::info!(
        "CLI | create-playlist | user={} | playlist={} | videos={} | res=created",
        owner.username,
        playlist.public_id,
        videos.len()
    );
    Ok(playlist)
}
