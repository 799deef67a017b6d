//! Configuration types for deezer-dl

use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

use crate::error::{Error, Result};

/// Default archive part size: 500 MiB
pub const DEFAULT_PART_SIZE_BYTES: u64 = 500 * 1024 * 1024;

/// Content API connection settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the content API; track payloads are fetched from
    /// `{base_url}/track/{id}/download` (default: "http://127.0.0.1:8000/api")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Whole-request timeout (None = rely on the transport, the default)
    #[serde(default, with = "optional_duration_serde")]
    pub timeout: Option<Duration>,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: None,
            user_agent: default_user_agent(),
        }
    }
}

/// Cover art rendering parameters forwarded with every track download
///
/// The content API embeds the album cover into the audio file it returns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverConfig {
    /// Image format (default: "png")
    #[serde(default = "default_cover_format")]
    pub format: String,

    /// Width and height in pixels (default: 1000x1000)
    #[serde(default = "default_cover_size")]
    pub size: (u32, u32),
}

impl CoverConfig {
    /// Size in the `WxH` form the API expects
    pub fn size_param(&self) -> String {
        format!("{}x{}", self.size.0, self.size.1)
    }
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            format: default_cover_format(),
            size: default_cover_size(),
        }
    }
}

/// Download behavior configuration (output location, archive splitting)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory finished files and archives are written to (default: "./downloads")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Archive part threshold in bytes (default: 500 MiB)
    ///
    /// Once the payload buffered for an archive exceeds this size, the buffer
    /// is written out as `name.partN.zip` and a new part is started.
    #[serde(default = "default_part_size_bytes")]
    pub part_size_bytes: u64,

    /// Cover art settings passed to the content API
    #[serde(default)]
    pub cover: CoverConfig,

    /// What to do when an output file already exists on disk
    #[serde(default)]
    pub file_collision: FileCollisionAction,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            part_size_bytes: default_part_size_bytes(),
            cover: CoverConfig::default(),
            file_collision: FileCollisionAction::default(),
        }
    }
}

/// File collision handling strategy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCollisionAction {
    /// Append (1), (2), etc. to filename (default)
    #[default]
    Rename,
    /// Overwrite existing file
    Overwrite,
    /// Skip the file, keep existing
    Skip,
}

/// Main configuration for [`Downloader`](crate::Downloader)
///
/// Fields are organized into logical sub-configs:
/// - [`api`](ApiConfig) - content API location and HTTP client settings
/// - [`download`](DownloadConfig) - output directory, archive splitting, cover art
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Content API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Download behavior settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// Event broadcast buffer size (default: 1000)
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            download: DownloadConfig::default(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

impl Config {
    /// Check the settings that would otherwise fail later at runtime
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(config_error("api.base_url must not be empty", "base_url"));
        }
        url::Url::parse(&self.api.base_url).map_err(|e| Error::Config {
            message: format!("api.base_url is not a valid URL: {e}"),
            key: Some("base_url".to_string()),
        })?;
        if self.download.part_size_bytes == 0 {
            return Err(config_error(
                "download.part_size_bytes must be greater than zero",
                "part_size_bytes",
            ));
        }
        let (width, height) = self.download.cover.size;
        if width == 0 || height == 0 {
            return Err(config_error(
                "download.cover.size must be non-zero in both dimensions",
                "cover.size",
            ));
        }
        if self.event_channel_capacity == 0 {
            return Err(config_error(
                "event_channel_capacity must be greater than zero",
                "event_channel_capacity",
            ));
        }
        Ok(())
    }
}

fn config_error(message: &str, key: &str) -> Error {
    Error::Config {
        message: message.to_string(),
        key: Some(key.to_string()),
    }
}

// Default value functions
fn default_base_url() -> String {
    "http://127.0.0.1:8000/api".to_string()
}

fn default_user_agent() -> String {
    concat!("deezer-dl/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_cover_format() -> String {
    "png".to_string()
}

fn default_cover_size() -> (u32, u32) {
    (1000, 1000)
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_part_size_bytes() -> u64 {
    DEFAULT_PART_SIZE_BYTES
}

fn default_event_channel_capacity() -> usize {
    1000
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
