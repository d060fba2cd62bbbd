pub mod catalog;
pub mod plugin;
pub mod reconcile;
pub mod s3;
pub mod subtitles;
pub mod visibility;
