use std::env;
use std::str::FromStr;

/// A rendition the storage pipeline produces for every upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    pub name: String,
    pub bitrate: i32,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket_name: String,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub endpoint: Option<String>,
    pub upload_url_expires_secs: u64,
    pub formats: Vec<FormatSpec>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub access_token_ttl_secs: u64,
    pub bind_addr: String,
    pub subtitles_max_bytes: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

pub const DEFAULT_SUBTITLES_MAX_BYTES: usize = 2 * 1024 * 1024;

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parsed_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

/// Parses `SD:128,HD:256` into an ordered list of formats.
pub fn parse_formats(raw: &str) -> Result<Vec<FormatSpec>, ConfigError> {
    let invalid = || ConfigError::Invalid {
        name: "VIDEO_FORMATS",
        value: raw.to_string(),
    };

    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, bitrate) = entry.split_once(':').ok_or_else(invalid)?;
            let name = name.trim();
            if name.is_empty() {
                return Err(invalid());
            }
            let bitrate = bitrate.trim().parse().map_err(|_| invalid())?;
            Ok(FormatSpec {
                name: name.to_string(),
                bitrate,
            })
        })
        .collect()
}

impl StorageConfig {
    /// Only `serve` needs the bucket, so this is loaded separately from [`Config`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let formats = match env::var("VIDEO_FORMATS") {
            Ok(raw) => parse_formats(&raw)?,
            Err(_) => parse_formats("SD:128,HD:256")?,
        };

        Ok(Self {
            bucket_name: required("S3_BUCKET_NAME")?,
            region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            access_key_id: env::var("AWS_ACCESS_KEY_ID").ok(),
            secret_access_key: env::var("AWS_SECRET_ACCESS_KEY").ok(),
            endpoint: env::var("S3_ENDPOINT").ok().filter(|e| !e.is_empty()),
            upload_url_expires_secs: parsed_or("UPLOAD_URL_EXPIRES_SECS", 3600)?,
            formats,
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = required("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set in .env, using default (insecure!)");
            "secret".to_string()
        });

        Ok(Self {
            database_url,
            jwt_secret,
            access_token_ttl_secs: parsed_or("ACCESS_TOKEN_TTL_SECS", 900)?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            subtitles_max_bytes: parsed_or("SUBTITLES_MAX_BYTES", DEFAULT_SUBTITLES_MAX_BYTES)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_format_list_in_order() {
        let formats = parse_formats("SD:128, HD:256 ,").unwrap();
        assert_eq!(
            formats,
            vec![
                FormatSpec { name: "SD".into(), bitrate: 128 },
                FormatSpec { name: "HD".into(), bitrate: 256 },
            ]
        );
    }

    #[test]
    fn rejects_format_without_bitrate() {
        assert!(matches!(
            parse_formats("SD"),
            Err(ConfigError::Invalid { name: "VIDEO_FORMATS", .. })
        ));
        assert!(parse_formats(":128").is_err());
        assert!(parse_formats("HD:fast").is_err());
    }

    #[test]
    fn empty_format_list_is_allowed() {
        assert!(parse_formats("").unwrap().is_empty());
    }
}
