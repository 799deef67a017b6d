//! Output persistence
//!
//! The run loop hands every finished file or archive part to an
//! [`OutputSink`]. Save results are never propagated back into the job: a
//! failed save is logged and reported as an event, nothing more.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::FileCollisionAction;
use crate::error::{Error, Result};
use crate::naming::fit_filename;

/// Maximum number of rename attempts when resolving file collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Destination for finished files and archive parts
#[async_trait::async_trait]
pub trait OutputSink: Send + Sync {
    /// Persist `data` under `filename`, returning where it ended up
    async fn save(&self, filename: &str, data: Vec<u8>) -> Result<PathBuf>;
}

/// [`OutputSink`] writing into a directory on the local filesystem
#[derive(Clone, Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    collision: FileCollisionAction,
}

impl DirectorySink {
    /// Write into `dir`, handling existing files per `collision`
    pub fn new(dir: impl Into<PathBuf>, collision: FileCollisionAction) -> Self {
        Self {
            dir: dir.into(),
            collision,
        }
    }

    /// Target directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait::async_trait]
impl OutputSink for DirectorySink {
    async fn save(&self, filename: &str, data: Vec<u8>) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create output directory '{}': {}",
                    self.dir.display(),
                    e
                ),
            ))
        })?;

        let path = get_unique_path(&self.dir.join(filename), self.collision)?;
        let size_bytes = data.len();
        tokio::fs::write(&path, data).await?;

        info!(path = %path.display(), size_bytes, "output written");
        Ok(path)
    }
}

/// Get a unique path for a file, handling collisions according to the specified action
///
/// For `Rename`, `name.ext` becomes `name (1).ext`, `name (2).ext`, ... For
/// `Skip`, an existing file is an error. For `Overwrite`, the path is returned
/// unchanged.
///
/// Archive names such as `Album.part1.zip` keep their inner dots: only the
/// last extension is split off.
pub fn get_unique_path(path: &Path, action: FileCollisionAction) -> Result<PathBuf> {
    match action {
        FileCollisionAction::Overwrite => Ok(path.to_path_buf()),
        FileCollisionAction::Skip => {
            if path.exists() {
                return Err(Error::FileCollision {
                    path: path.to_path_buf(),
                });
            }
            Ok(path.to_path_buf())
        }
        FileCollisionAction::Rename => {
            if !path.exists() {
                return Ok(path.to_path_buf());
            }

            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let extension = path.extension().map(|e| e.to_string_lossy().into_owned());
            let parent = path.parent().unwrap_or_else(|| Path::new(""));

            for i in 1..=MAX_RENAME_ATTEMPTS {
                let new_name = match &extension {
                    Some(ext) => fit_filename(&stem, &format!(" ({i}).{ext}")),
                    None => fit_filename(&stem, &format!(" ({i})")),
                };
                let new_path = parent.join(new_name);
                if !new_path.exists() {
                    return Ok(new_path);
                }
            }

            Err(Error::FileCollision {
                path: path.to_path_buf(),
            })
        }
    }
}
