//! Archive accumulation and zip packing
//!
//! An [`ArchiveAccumulator`] collects the payloads of one archive part while a
//! job runs. When the part is due it is drained with [`ArchiveAccumulator::take`]
//! and encoded with [`pack_zip`].

use std::collections::HashMap;
use std::io::{Cursor, Write};
use tracing::debug;

use crate::error::ArchiveError;
use crate::naming::archive_track_basename;

/// Ordered filename -> payload map for one archive part
#[derive(Debug, Default)]
pub struct ArchiveAccumulator {
    entries: Vec<(String, Vec<u8>)>,
    index: HashMap<String, usize>,
    total_bytes: u64,
}

impl ArchiveAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `data` as `basename.extension`, renaming duplicates
    ///
    /// When the name is already taken, `basename.1.extension`,
    /// `basename.2.extension`, ... are tried in turn. An empty `basename` is
    /// inserted as-is: a second empty-basename entry with the same extension
    /// replaces the first. Returns the name the entry was stored under.
    pub fn insert_unique(&mut self, basename: &str, extension: &str, data: Vec<u8>) -> String {
        let mut duplicate = 0;
        let filename = loop {
            let candidate = format!(
                "{}.{}",
                archive_track_basename(basename, duplicate),
                extension
            );
            if basename.is_empty() || !self.index.contains_key(&candidate) {
                break candidate;
            }
            duplicate += 1;
        };
        self.insert(filename.clone(), data);
        filename
    }

    /// Insert `data` under `filename`, replacing any entry of the same name in place
    pub fn insert(&mut self, filename: String, data: Vec<u8>) {
        self.total_bytes += data.len() as u64;
        match self.index.get(&filename) {
            Some(&position) => {
                let previous = std::mem::replace(&mut self.entries[position].1, data);
                self.total_bytes -= previous.len() as u64;
            }
            None => {
                self.index.insert(filename.clone(), self.entries.len());
                self.entries.push((filename, data));
            }
        }
    }

    /// Whether `filename` is present
    pub fn contains(&self, filename: &str) -> bool {
        self.index.contains_key(filename)
    }

    /// Sum of the payload sizes currently held
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drain all entries in insertion order, leaving the accumulator empty
    pub fn take(&mut self) -> Vec<(String, Vec<u8>)> {
        self.index.clear();
        self.total_bytes = 0;
        std::mem::take(&mut self.entries)
    }
}

/// Encode `entries` as a zip archive
///
/// Entries are written in order, uncompressed; audio payloads do not shrink
/// under deflate. Encoding runs on the blocking thread pool.
pub async fn pack_zip(entries: Vec<(String, Vec<u8>)>) -> Result<Vec<u8>, ArchiveError> {
    tokio::task::spawn_blocking(move || encode_zip(&entries)).await?
}

fn encode_zip(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>, ArchiveError> {
    let capacity = entries.iter().map(|(_, data)| data.len()).sum::<usize>();
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::with_capacity(capacity)));
    let options = zip::write::FileOptions::default()
        .compression_method(zip::CompressionMethod::Stored)
        .large_file(capacity as u64 >= u32::MAX as u64);

    for (name, data) in entries {
        writer.start_file(name.as_str(), options)?;
        writer.write_all(data)?;
    }

    let buffer = writer.finish()?.into_inner();
    debug!(
        entries = entries.len(),
        size_bytes = buffer.len(),
        "packed zip archive"
    );
    Ok(buffer)
}
