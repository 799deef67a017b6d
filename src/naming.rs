//! Output names, filesystem-safe sanitization and content URLs
//!
//! Base names are built from track/album/playlist metadata and are always run
//! through [`sanitize_filename`] before they reach a job. Sanitization may
//! legitimately produce an empty string (a title made only of illegal
//! characters); callers must cope with that.

use crate::types::{Album, Artist, Playlist, Track};

/// Maximum output filename length in bytes
const MAX_FILENAME_BYTES: usize = 255;

/// Public site the content URLs point at
const SITE_URL: &str = "https://www.deezer.com";

/// Device names Windows refuses as file stems
const WINDOWS_RESERVED: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Make a string safe to use as a filename
///
/// Removes characters that are illegal on common filesystems
/// (`/ ? < > \ : * | "`) and control characters, rejects `.`/`..` and Windows
/// device names, strips trailing dots and spaces, and truncates to 255 bytes
/// on a character boundary.
///
/// # Examples
///
/// ```
/// use deezer_dl::naming::sanitize_filename;
///
/// assert_eq!(sanitize_filename("AC/DC - T.N.T."), "ACDC - T.N.T");
/// assert_eq!(sanitize_filename("???"), "");
/// ```
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '/' | '?' | '<' | '>' | '\\' | ':' | '*' | '|' | '"'))
        .filter(|c| !c.is_control())
        .collect();

    if cleaned == "." || cleaned == ".." {
        return String::new();
    }

    let stem = cleaned.split('.').next().unwrap_or_default();
    if WINDOWS_RESERVED
        .iter()
        .any(|reserved| stem.trim_end().eq_ignore_ascii_case(reserved))
    {
        return String::new();
    }

    let trimmed = cleaned.trim_end_matches(['.', ' ']);
    truncate_to_boundary(trimmed, MAX_FILENAME_BYTES).to_string()
}

fn truncate_to_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn join_artists(artists: &[Artist]) -> String {
    artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Base name of a standalone track: `Artist A, Artist B - Title`
pub fn track_basename(track: &Track) -> String {
    format!("{} - {}", join_artists(&track.artists), track.title)
}

/// Base name of a track inside an album archive: `[CDn - ]NN - Title`
///
/// The disk prefix is only added for albums spanning more than one disk.
pub fn album_track_basename(album: &Album, track: &Track) -> String {
    let disk_prefix = if album.disk_count.unwrap_or(1) > 1 {
        format!("CD{} - ", track.disk_number)
    } else {
        String::new()
    };
    format!("{disk_prefix}{:02} - {}", track.track_number, track.title)
}

/// Base name of a track inside a playlist archive: `Artist A, Artist B - Title`
pub fn playlist_track_basename(_playlist: &Playlist, track: &Track) -> String {
    track_basename(track)
}

/// Base name of an album archive: `Artist A, Artist B - Album Title`
pub fn album_basename(album: &Album) -> String {
    format!("{} - {}", join_artists(&album.artists), album.title)
}

/// Base name of a playlist archive: the playlist title
pub fn playlist_basename(playlist: &Playlist) -> String {
    playlist.title.clone()
}

/// Base name of the `duplicate`-th entry sharing `basename` inside one archive
///
/// The first occurrence keeps the name, later ones get `.1`, `.2`, ...
pub fn archive_track_basename(basename: &str, duplicate: u32) -> String {
    if duplicate == 0 {
        basename.to_string()
    } else {
        format!("{basename}.{duplicate}")
    }
}

/// Filename of an archive part
///
/// Part 0 is an unsplit archive (`basename.zip`); parts from 1 on are
/// `basename.partN.zip`. The base name is shortened if the whole name would
/// exceed 255 bytes.
pub fn archive_filename(basename: &str, part: u32) -> String {
    if part == 0 {
        fit_filename(basename, ".zip")
    } else {
        fit_filename(basename, &format!(".part{part}.zip"))
    }
}

/// Append `suffix` to `stem`, cutting the stem on a character boundary so the
/// result stays within 255 bytes
///
/// # Examples
///
/// ```
/// use deezer_dl::naming::fit_filename;
///
/// let name = fit_filename(&"a".repeat(300), ".part2.zip");
/// assert_eq!(name.len(), 255);
/// assert!(name.ends_with("a.part2.zip"));
/// ```
#[must_use]
pub fn fit_filename(stem: &str, suffix: &str) -> String {
    let budget = MAX_FILENAME_BYTES.saturating_sub(suffix.len());
    format!("{}{}", truncate_to_boundary(stem, budget), suffix)
}

/// Public page of a track
pub fn track_url(id: &str) -> String {
    format!("{SITE_URL}/track/{id}")
}

/// Public page of an artist
pub fn artist_url(id: &str) -> String {
    format!("{SITE_URL}/artist/{id}")
}

/// Public page of an album
pub fn album_url(id: &str) -> String {
    format!("{SITE_URL}/album/{id}")
}

/// Public page of a playlist
pub fn playlist_url(id: &str) -> String {
    format!("{SITE_URL}/playlist/{id}")
}
