//! Job construction and enqueueing.
//!
//! All three entry points build the same job shape: a frozen, ordered list of
//! `(track, tier, basename)` entries. They return immediately; the run loop is
//! started in the background when it is idle.

use std::sync::Arc;
use tracing::{debug, info};

use crate::naming::{
    album_basename, album_track_basename, album_url, archive_filename, playlist_basename,
    playlist_track_basename, playlist_url, sanitize_filename, track_basename, track_url,
};
use crate::types::{
    AlbumRequest, Event, Format, Job, JobFile, JobId, JobKind, PlaylistRequest, RunState, Track,
    TrackRequest,
};

use super::Downloader;

impl Downloader {
    /// Queue a single track, saved as `Artist - Title.ext`
    ///
    /// The requested tier is used as-is; there is no fallback for single tracks.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn enqueue_track(&self, request: TrackRequest) -> JobId {
        let TrackRequest { format, track } = request;
        let source_url = track_url(&track.deezer.id);
        let file = JobFile {
            basename: sanitize_filename(&track_basename(&track)),
            track,
            format,
        };
        let display_filename = file.filename();

        self.push_job(
            JobKind::SingleFile,
            source_url,
            display_filename,
            vec![file],
        )
    }

    /// Queue an album, saved as `Artist - Album.zip` (or `.partN.zip` parts)
    ///
    /// Each track is fetched at the best available tier at or below
    /// `request.format`; tracks with no such tier are left out.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn enqueue_album(&self, request: AlbumRequest) -> JobId {
        let AlbumRequest {
            format,
            album,
            tracks,
        } = request;
        let basename = sanitize_filename(&album_basename(&album));
        let files = select_files(format, tracks, |track| album_track_basename(&album, track));

        self.push_job(
            JobKind::Archive {
                basename: basename.clone(),
            },
            album_url(&album.deezer.id),
            archive_filename(&basename, 0),
            files,
        )
    }

    /// Queue a playlist, saved as `Title.zip` (or `.partN.zip` parts)
    ///
    /// Tier selection follows [`enqueue_album`](Self::enqueue_album). A
    /// playlist is always archived, even when it holds a single track.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn enqueue_playlist(&self, request: PlaylistRequest) -> JobId {
        let PlaylistRequest {
            format,
            playlist,
            tracks,
        } = request;
        let basename = sanitize_filename(&playlist_basename(&playlist));
        let files = select_files(format, tracks, |track| {
            playlist_track_basename(&playlist, track)
        });

        self.push_job(
            JobKind::Archive {
                basename: basename.clone(),
            },
            playlist_url(&playlist.deezer.id),
            archive_filename(&basename, 0),
            files,
        )
    }

    /// Append a job and start the run loop if it is idle
    fn push_job(
        &self,
        kind: JobKind,
        source_url: String,
        display_filename: String,
        files: Vec<JobFile>,
    ) -> JobId {
        let file_count = files.len();

        let (id, start_loop) = {
            let mut state = self.lock_state();
            state.last_job_id += 1;
            let id = JobId(state.last_job_id);
            state.jobs.push_back(Arc::new(Job::new(
                id,
                kind,
                source_url,
                display_filename.clone(),
                files,
            )));

            let start_loop = state.run_state == RunState::Idle;
            if start_loop {
                state.run_state = RunState::Running;
            }
            (id, start_loop)
        };

        info!(
            job_id = id.0,
            files = file_count,
            display_filename = %display_filename,
            "Job queued"
        );
        self.emit_event(Event::Queued {
            id,
            display_filename,
            file_count,
        });

        if start_loop {
            self.spawn_run_loop();
        }

        id
    }
}

/// Pick a tier for every track and drop tracks that have none
///
/// The first tier in `format.fallbacks()` the track is available in wins.
pub(crate) fn select_files(
    format: Format,
    tracks: Vec<Track>,
    basename: impl Fn(&Track) -> String,
) -> Vec<JobFile> {
    tracks
        .into_iter()
        .filter_map(|track| {
            let Some(chosen) = format
                .fallbacks()
                .iter()
                .copied()
                .find(|tier| track.has_format(*tier))
            else {
                debug!(
                    track_id = %track.deezer.id,
                    requested = format.as_str(),
                    "No acceptable format for track, leaving it out"
                );
                return None;
            };

            Some(JobFile {
                basename: sanitize_filename(&basename(&track)),
                track,
                format: chosen,
            })
        })
        .collect()
}
