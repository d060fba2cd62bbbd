pub mod playlist;
pub mod playlist_video;
pub mod user;
pub mod video;
pub mod video_format;
pub mod video_subtitles;
pub mod video_transcoding;
pub mod video_upload_url;
