pub mod languages;
pub mod video;
