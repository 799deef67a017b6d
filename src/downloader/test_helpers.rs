//! Shared test helpers: scripted fetcher, recording sink and sample content.

use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::{Notify, broadcast};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::downloader::Downloader;
use crate::error::{Error, FetchError, Result};
use crate::fetch::{FetchRequest, TrackFetcher};
use crate::sink::OutputSink;
use crate::types::{
    Album, AlbumRef, Artist, ArtistRef, Event, Format, Playlist, PlaylistRef, Track, TrackRef,
};

/// How the mock fetcher answers for one track id
#[derive(Clone)]
pub(crate) enum Script {
    /// Return these bytes
    Payload(Vec<u8>),
    /// Fail with this HTTP status
    Fail(u16),
    /// Never finish on its own; only cancellation ends the request
    Hang,
    /// Return the bytes once the gate is opened
    Gated(Arc<Notify>, Vec<u8>),
    /// Report the whole payload as loaded without a total, then return it
    /// once the gate is opened
    Unsized(Arc<Notify>, Vec<u8>),
}

/// [`TrackFetcher`] answering from a per-track script
///
/// Unscripted tracks return `payload-<id>`.
#[derive(Default)]
pub(crate) struct MockFetcher {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<FetchRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockFetcher {
    pub(crate) fn script(&self, track_id: &str, script: Script) {
        self.scripts
            .lock()
            .unwrap()
            .insert(track_id.to_string(), script);
    }

    /// Track ids in the order they were requested
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|request| request.track_id.clone())
            .collect()
    }

    pub(crate) fn requests(&self) -> Vec<FetchRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Wait until `track_id` has been requested
    pub(crate) async fn wait_for_call(&self, track_id: &str) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !self.calls().iter().any(|id| id == track_id) {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("track {track_id} was never requested"));
    }
}

#[async_trait::async_trait]
impl TrackFetcher for MockFetcher {
    async fn fetch(
        &self,
        request: &FetchRequest,
        cancel: &CancellationToken,
        progress: &(dyn Fn(u64, Option<u64>) + Send + Sync),
    ) -> std::result::Result<Vec<u8>, FetchError> {
        self.calls.lock().unwrap().push(request.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let script = self.scripts.lock().unwrap().get(&request.track_id).cloned();
        let result = match script {
            None => {
                let data = format!("payload-{}", request.track_id).into_bytes();
                stream_payload(data, progress).await
            }
            Some(Script::Payload(data)) => stream_payload(data, progress).await,
            Some(Script::Fail(status)) => Err(FetchError::Status {
                status,
                url: format!("mock://track/{}", request.track_id),
            }),
            Some(Script::Hang) => {
                cancel.cancelled().await;
                Err(FetchError::Cancelled)
            }
            Some(Script::Gated(gate, data)) => {
                tokio::select! {
                    _ = cancel.cancelled() => Err(FetchError::Cancelled),
                    _ = gate.notified() => stream_payload(data, progress).await,
                }
            }
            Some(Script::Unsized(gate, data)) => {
                progress(data.len() as u64, None);
                tokio::select! {
                    _ = cancel.cancelled() => Err(FetchError::Cancelled),
                    _ = gate.notified() => Ok(data),
                }
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Report half the payload, yield, then report all of it
async fn stream_payload(
    data: Vec<u8>,
    progress: &(dyn Fn(u64, Option<u64>) + Send + Sync),
) -> std::result::Result<Vec<u8>, FetchError> {
    let total = data.len() as u64;
    progress(0, Some(total));
    progress(total / 2, Some(total));
    tokio::task::yield_now().await;
    progress(total, Some(total));
    Ok(data)
}

/// [`OutputSink`] keeping saved outputs in memory
#[derive(Default)]
pub(crate) struct RecordingSink {
    saved: Mutex<Vec<(String, Vec<u8>)>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingSink {
    /// Saved `(filename, data)` pairs in save order
    pub(crate) fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.saved.lock().unwrap().clone()
    }

    pub(crate) fn filenames(&self) -> Vec<String> {
        self.saved().into_iter().map(|(name, _)| name).collect()
    }

    /// Make every save of `filename` fail
    pub(crate) fn fail_on(&self, filename: &str) {
        self.failing.lock().unwrap().insert(filename.to_string());
    }
}

#[async_trait::async_trait]
impl OutputSink for RecordingSink {
    async fn save(&self, filename: &str, data: Vec<u8>) -> Result<PathBuf> {
        if self.failing.lock().unwrap().contains(filename) {
            return Err(Error::Io(std::io::Error::other("disk full")));
        }
        self.saved
            .lock()
            .unwrap()
            .push((filename.to_string(), data));
        Ok(PathBuf::from(filename))
    }
}

/// Downloader wired to a [`MockFetcher`] and a [`RecordingSink`]
pub(crate) fn create_test_downloader(
    part_size_bytes: u64,
) -> (Downloader, Arc<MockFetcher>, Arc<RecordingSink>) {
    let mut config = Config::default();
    config.download.part_size_bytes = part_size_bytes;

    let fetcher = Arc::new(MockFetcher::default());
    let sink = Arc::new(RecordingSink::default());
    let downloader = Downloader::with_components(config, fetcher.clone(), sink.clone()).unwrap();
    (downloader, fetcher, sink)
}

pub(crate) fn artist(name: &str) -> Artist {
    Artist {
        name: name.to_string(),
        deezer: ArtistRef {
            id: name.to_lowercase(),
        },
    }
}

/// A track available in `formats`, numbered `track_number` on disk 1
pub(crate) fn track(id: &str, title: &str, track_number: u32, formats: &[Format]) -> Track {
    Track {
        title: title.to_string(),
        artists: vec![artist("Daft Punk")],
        disk_number: 1,
        track_number,
        duration_seconds: Some(200),
        deezer: TrackRef {
            id: id.to_string(),
            formats: formats
                .iter()
                .map(|format| (format.as_str().to_string(), 1_000))
                .collect(),
        },
    }
}

pub(crate) fn flac_track(id: &str, title: &str, track_number: u32) -> Track {
    track(id, title, track_number, &[Format::Flac, Format::Mp3_320])
}

pub(crate) fn album(id: &str, title: &str) -> Album {
    Album {
        title: title.to_string(),
        artists: vec![artist("Daft Punk")],
        disk_count: Some(1),
        track_count: None,
        deezer: AlbumRef { id: id.to_string() },
    }
}

pub(crate) fn playlist(id: &str, title: &str) -> Playlist {
    Playlist {
        title: title.to_string(),
        track_count: None,
        deezer: PlaylistRef { id: id.to_string() },
    }
}

/// Entries of a zip buffer in archive order
pub(crate) fn zip_entries(buffer: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(Cursor::new(buffer)).unwrap();
    (0..archive.len())
        .map(|index| {
            let mut entry = archive.by_index(index).unwrap();
            let mut data = Vec::new();
            entry.read_to_end(&mut data).unwrap();
            (entry.name().to_string(), data)
        })
        .collect()
}

/// Drain every event received so far
pub(crate) fn drain_events(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
