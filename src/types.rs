//! Core types for deezer-dl

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Unique identifier for a queued job
///
/// Assigned at enqueue time from a per-downloader counter; the first job is `JobId(1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Unique identifier for an error record
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorId(pub u64);

impl From<u64> for ErrorId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ErrorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Encoding quality tier
///
/// Variants are declared best first; [`Format::RANKING`] is the fallback order
/// used when building album and playlist jobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    /// Lossless FLAC
    #[serde(rename = "FLAC")]
    Flac,
    /// MP3 at 320 kbps
    #[serde(rename = "MP3_320")]
    Mp3_320,
    /// MP3 at 256 kbps
    #[serde(rename = "MP3_256")]
    Mp3_256,
    /// MP3 at 128 kbps
    #[serde(rename = "MP3_128")]
    Mp3_128,
    /// MP3 at 64 kbps
    #[serde(rename = "MP3_64")]
    Mp3_64,
}

impl Format {
    /// Every tier, best first
    pub const RANKING: [Format; 5] = [
        Format::Flac,
        Format::Mp3_320,
        Format::Mp3_256,
        Format::Mp3_128,
        Format::Mp3_64,
    ];

    /// Wire name used by the content API
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Flac => "FLAC",
            Format::Mp3_320 => "MP3_320",
            Format::Mp3_256 => "MP3_256",
            Format::Mp3_128 => "MP3_128",
            Format::Mp3_64 => "MP3_64",
        }
    }

    /// File extension (without the dot)
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Flac => "flac",
            Format::Mp3_320 | Format::Mp3_256 | Format::Mp3_128 | Format::Mp3_64 => "mp3",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Format::Flac => "FLAC",
            Format::Mp3_320 => "MP3 320kbps",
            Format::Mp3_256 => "MP3 256kbps",
            Format::Mp3_128 => "MP3 128kbps",
            Format::Mp3_64 => "MP3 64kbps",
        }
    }

    /// This tier followed by every lower tier, best first
    pub fn fallbacks(&self) -> &'static [Format] {
        let start = Self::RANKING
            .iter()
            .position(|f| f == self)
            .unwrap_or(Self::RANKING.len());
        &Self::RANKING[start..]
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for Format {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::RANKING
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| crate::error::Error::Other(format!("unknown format: {s}")))
    }
}

/// Content API identifiers of an artist
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRef {
    /// Artist id
    pub id: String,
}

/// Track or album artist
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    /// Display name
    pub name: String,
    /// Content API identifiers
    pub deezer: ArtistRef,
}

/// Content API identifiers and available encodings of a track
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRef {
    /// Track id
    pub id: String,
    /// Available encodings: wire format name -> file size in bytes
    #[serde(default)]
    pub formats: HashMap<String, u64>,
}

/// A single track as described by the content API
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Title, including the version suffix if any
    pub title: String,
    /// Artists in credit order
    #[serde(default)]
    pub artists: Vec<Artist>,
    /// Disk number within the album (1-based)
    #[serde(default = "default_number")]
    pub disk_number: u32,
    /// Track number within the disk (1-based)
    #[serde(default = "default_number")]
    pub track_number: u32,
    /// Duration in seconds
    #[serde(default)]
    pub duration_seconds: Option<u32>,
    /// Content API identifiers
    pub deezer: TrackRef,
}

impl Track {
    /// Whether the content API has an encoding of this track at `format`
    pub fn has_format(&self, format: Format) -> bool {
        self.deezer.formats.contains_key(format.as_str())
    }

    /// Size in bytes of the encoding at `format`, if available
    pub fn format_size(&self, format: Format) -> Option<u64> {
        self.deezer.formats.get(format.as_str()).copied()
    }
}

fn default_number() -> u32 {
    1
}

/// Content API identifiers of an album
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumRef {
    /// Album id
    pub id: String,
}

/// An album as described by the content API
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    /// Title
    pub title: String,
    /// Album artists in credit order
    #[serde(default)]
    pub artists: Vec<Artist>,
    /// Number of disks (only known when the track list was loaded)
    #[serde(default)]
    pub disk_count: Option<u32>,
    /// Number of tracks
    #[serde(default)]
    pub track_count: Option<u32>,
    /// Content API identifiers
    pub deezer: AlbumRef,
}

/// Content API identifiers of a playlist
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistRef {
    /// Playlist id
    pub id: String,
}

/// A playlist as described by the content API
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    /// Title
    pub title: String,
    /// Number of tracks
    #[serde(default)]
    pub track_count: Option<u32>,
    /// Content API identifiers
    pub deezer: PlaylistRef,
}

/// Response of `GET /track/{id}`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackPage {
    /// The track
    pub track: Track,
    /// The album the track belongs to
    pub album: Album,
}

/// Response of `GET /album/{id}`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AlbumPage {
    /// The album
    pub album: Album,
    /// Album tracks in album order
    pub tracks: Vec<Track>,
}

/// Response of `GET /playlist/{id}`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlaylistPage {
    /// The playlist
    pub playlist: Playlist,
    /// Playlist tracks in playlist order
    pub tracks: Vec<Track>,
}

/// What a search looks for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    /// Tracks, parsed as [`Track`]
    Track,
    /// Albums, parsed as [`Album`]
    Album,
    /// Playlists, parsed as [`Playlist`]
    Playlist,
}

impl SearchType {
    /// Value of the `type` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Track => "track",
            Self::Album => "album",
            Self::Playlist => "playlist",
        }
    }
}

impl std::fmt::Display for SearchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One page of search results
///
/// `next` is the index of the page after this one; the API leaves it out on
/// the last page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResults<T> {
    /// Number of matches across all pages
    pub total: u64,
    /// Index to pass to fetch the following page
    #[serde(default)]
    pub next: u64,
    /// Matches on this page
    pub data: Vec<T>,
}

impl<T> SearchResults<T> {
    /// Whether another page can be requested with `index = next`
    pub fn has_more(&self) -> bool {
        self.next > 0 && self.next < self.total
    }
}

/// Request to download one track as a plain file
#[derive(Clone, Debug)]
pub struct TrackRequest {
    /// Requested quality tier (no fallback for single tracks)
    pub format: Format,
    /// The track
    pub track: Track,
}

/// Request to download an album as a zip archive
#[derive(Clone, Debug)]
pub struct AlbumRequest {
    /// Preferred quality tier; each track falls back to lower tiers
    pub format: Format,
    /// The album
    pub album: Album,
    /// Tracks in album order
    pub tracks: Vec<Track>,
}

/// Request to download a playlist as a zip archive
#[derive(Clone, Debug)]
pub struct PlaylistRequest {
    /// Preferred quality tier; each track falls back to lower tiers
    pub format: Format,
    /// The playlist
    pub playlist: Playlist,
    /// Tracks in playlist order
    pub tracks: Vec<Track>,
}

/// How a job's output is produced
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum JobKind {
    /// One track saved as a plain file
    SingleFile,
    /// Tracks packed into one or more zip parts named after `basename`
    Archive {
        /// Sanitized archive base name
        basename: String,
    },
}

/// One entry of a job's frozen file list
#[derive(Clone, Debug)]
pub struct JobFile {
    /// The track to fetch
    pub track: Track,
    /// Tier selected for this track
    pub format: Format,
    /// Sanitized output base name (may be empty)
    pub basename: String,
}

impl JobFile {
    /// Output filename, `basename.extension`, kept within 255 bytes
    pub fn filename(&self) -> String {
        crate::naming::fit_filename(&self.basename, &format!(".{}", self.format.extension()))
    }
}

/// A queued unit of work
///
/// The file list is fixed when the job is built. The job owns its cancellation
/// token; the run loop hands it to the fetcher for every request.
#[derive(Debug)]
pub struct Job {
    pub(crate) id: JobId,
    pub(crate) kind: JobKind,
    pub(crate) source_url: String,
    pub(crate) display_filename: String,
    pub(crate) files: Vec<JobFile>,
    pub(crate) cancel_token: CancellationToken,
    pub(crate) progress: watch::Sender<f64>,
}

impl Job {
    pub(crate) fn new(
        id: JobId,
        kind: JobKind,
        source_url: String,
        display_filename: String,
        files: Vec<JobFile>,
    ) -> Self {
        let (progress, _rx) = watch::channel(0.0);
        Self {
            id,
            kind,
            source_url,
            display_filename,
            files,
            cancel_token: CancellationToken::new(),
            progress,
        }
    }

    /// Job identifier
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Output mode
    pub fn kind(&self) -> &JobKind {
        &self.kind
    }

    /// Whether the job produces zip archives
    pub fn is_archive(&self) -> bool {
        matches!(self.kind, JobKind::Archive { .. })
    }

    /// Content URL of the track, album or playlist
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Name shown to the user while the job is pending
    pub fn display_filename(&self) -> &str {
        &self.display_filename
    }

    /// Files to fetch, in fetch order
    pub fn files(&self) -> &[JobFile] {
        &self.files
    }

    /// Whether the job has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Current progress in `[0, 1]`
    pub fn progress(&self) -> f64 {
        *self.progress.borrow()
    }

    /// Watch progress updates
    pub fn watch_progress(&self) -> watch::Receiver<f64> {
        self.progress.subscribe()
    }

    /// Raise progress to `value` (clamped to `[0, 1]`).
    ///
    /// Progress never goes backwards; returns whether the stored value changed.
    pub(crate) fn advance_progress(&self, value: f64) -> bool {
        let value = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        };
        self.progress.send_if_modified(|current| {
            if value > *current {
                *current = value;
                true
            } else {
                false
            }
        })
    }

    /// Serializable snapshot
    pub fn info(&self) -> JobInfo {
        JobInfo {
            id: self.id,
            kind: self.kind.clone(),
            source_url: self.source_url.clone(),
            display_filename: self.display_filename.clone(),
            file_count: self.files.len(),
            progress: self.progress(),
        }
    }
}

/// Snapshot of a queued job
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobInfo {
    /// Job identifier
    pub id: JobId,
    /// Output mode
    pub kind: JobKind,
    /// Content URL of the track, album or playlist
    pub source_url: String,
    /// Name shown to the user while the job is pending
    pub display_filename: String,
    /// Number of files the job will fetch
    pub file_count: usize,
    /// Progress in `[0, 1]`
    pub progress: f64,
}

/// A failed track fetch, kept until dismissed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Record identifier
    pub id: ErrorId,
    /// Content URL of the job the track belonged to
    pub source_url: String,
    /// Content URL of the track itself
    pub track_url: String,
    /// Filename the track would have been saved under
    pub track_filename: String,
    /// Display filename of the job
    pub display_filename: String,
}

/// Run loop state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    /// No job is being processed
    #[default]
    Idle,
    /// The run loop is draining the queue
    Running,
}

/// Event emitted during the job lifecycle
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Job added to the queue
    Queued {
        /// Job ID
        id: JobId,
        /// Name shown to the user
        display_filename: String,
        /// Number of files the job will fetch
        file_count: usize,
    },

    /// Run loop picked up the job
    Started {
        /// Job ID
        id: JobId,
    },

    /// Job progress update
    Progress {
        /// Job ID
        id: JobId,
        /// Progress in `[0, 1]`
        progress: f64,
    },

    /// A track could not be fetched; the job carries on without it
    FileFailed {
        /// Job ID
        id: JobId,
        /// The record added to the error list
        record: ErrorRecord,
        /// Failure description
        error: String,
    },

    /// A file or archive part was handed to the output sink successfully
    Saved {
        /// Job ID
        id: JobId,
        /// Output filename
        filename: String,
        /// Archive part number (None for single-file jobs, 0 for an unsplit archive)
        #[serde(skip_serializing_if = "Option::is_none")]
        part: Option<u32>,
        /// Size of the written buffer
        size_bytes: u64,
    },

    /// Packing or persisting an output failed
    SaveFailed {
        /// Job ID
        id: JobId,
        /// Output filename
        filename: String,
        /// Error message
        error: String,
    },

    /// Job was cancelled; its output was discarded
    Cancelled {
        /// Job ID
        id: JobId,
    },

    /// Job removed from the queue by `cancel_download`
    Removed {
        /// Job ID
        id: JobId,
    },

    /// Job finished and left the queue
    Finished {
        /// Job ID
        id: JobId,
        /// Number of files or archive parts saved
        outputs: usize,
        /// Number of tracks that failed to fetch
        failed_files: usize,
    },

    /// Error record dismissed
    ErrorDismissed {
        /// Record ID
        id: ErrorId,
    },

    /// Queue drained, run loop stopped
    Idle,
}
