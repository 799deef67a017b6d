//! # deezer-dl
//!
//! Backend library for queueing track, album and playlist downloads from a
//! content API and turning them into files on disk.
//!
//! ## Design Philosophy
//!
//! deezer-dl is designed to be:
//! - **Sequential** - One job, one file at a time, in strict FIFO order
//! - **Failure-isolating** - A failed track is recorded and skipped, the rest of the job carries on
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - Consumers subscribe to events, snapshots are available on demand
//!
//! Single tracks are saved as plain files. Albums and playlists are packed into
//! zip archives, split into `name.partN.zip` parts once the buffered payload
//! grows past the configured part size.
//!
//! ## Quick Start
//!
//! ```no_run
//! use deezer_dl::{Config, Downloader, Format, TrackRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = Downloader::new(Config::default())?;
//!
//!     // Subscribe to events
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let page = downloader.client().track("3135556").await?;
//!     downloader.enqueue_track(TrackRequest {
//!         format: Format::Flac,
//!         track: page.track,
//!     });
//!
//!     downloader.wait_idle().await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Archive accumulation and zip packing
pub mod archive;
/// HTTP client for the content API
pub mod client;
/// Configuration types
pub mod config;
/// Queue manager and run loop
pub mod downloader;
/// Error types
pub mod error;
/// Track payload fetching
pub mod fetch;
/// Output names, sanitization and content URLs
pub mod naming;
/// Output persistence
pub mod sink;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use archive::{ArchiveAccumulator, pack_zip};
pub use client::{ApiClient, SEARCH_PAGE_SIZE};
pub use config::{ApiConfig, Config, CoverConfig, DownloadConfig, FileCollisionAction};
pub use downloader::Downloader;
pub use error::{ArchiveError, Error, FetchError, Result};
pub use fetch::{FetchRequest, HttpTrackFetcher, TrackFetcher};
pub use sink::{DirectorySink, OutputSink};
pub use types::{
    Album, AlbumRequest, Artist, ErrorId, ErrorRecord, Event, Format, Job, JobFile, JobId,
    JobInfo, JobKind, Playlist, PlaylistRequest, RunState, SearchResults, SearchType, Track,
    TrackRequest,
};
