use super::test_helpers::*;
use super::*;
use crate::config::DEFAULT_PART_SIZE_BYTES;
use crate::types::{AlbumRequest, Format, JobKind, PlaylistRequest, TrackRequest};

mod control;

/// Events other than progress updates, in emission order
fn lifecycle_events(events: &[Event]) -> Vec<&Event> {
    events
        .iter()
        .filter(|event| !matches!(event, Event::Progress { .. }))
        .collect()
}

fn album_request(title: &str, tracks: Vec<crate::types::Track>) -> AlbumRequest {
    AlbumRequest {
        format: Format::Flac,
        album: album("302127", title),
        tracks,
    }
}

fn track_request(id: &str, title: &str) -> TrackRequest {
    TrackRequest {
        format: Format::Flac,
        track: flac_track(id, title, 1),
    }
}
