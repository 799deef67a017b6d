//! Error types for deezer-dl
//!
//! This module provides the error taxonomy for the library:
//! - [`Error`] - top-level error returned by fallible public operations
//! - [`FetchError`] - failure of a single track fetch, with a distinct cancelled class
//! - [`ArchiveError`] - failure while encoding an archive part
//!
//! Per-file fetch failures never escape the run loop; they are turned into
//! [`ErrorRecord`](crate::types::ErrorRecord)s instead.

use thiserror::Error;

/// Result type alias for deezer-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for deezer-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "part_size_bytes")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Content API answered with a non-success status
    #[error("content API returned {status} for {url}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Invalid URL
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Track fetch error
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Archive encoding error
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Output file already exists and the collision action is Skip
    #[error("file collision at {path}")]
    FileCollision {
        /// The path where the collision occurred
        path: std::path::PathBuf,
    },

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Failure of a single track payload fetch
#[derive(Debug, Error)]
pub enum FetchError {
    /// The job's cancellation token fired while the request was in flight
    #[error("request cancelled")]
    Cancelled,

    /// Server answered with a non-success status
    #[error("HTTP {status} fetching {url}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Transport error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Anything else (invalid URL, local failure)
    #[error("{0}")]
    Other(String),
}

impl FetchError {
    /// Whether this failure is a user-initiated cancellation rather than an error
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}

/// Archive encoding errors
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The zip writer rejected an entry or failed to finish
    #[error("zip encoding failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Writing entry data failed
    #[error("I/O error while packing: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking encode task panicked or was aborted
    #[error("packing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
