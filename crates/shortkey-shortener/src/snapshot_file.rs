//! JSON persistence for allocator snapshots.
//!
//! The file is the replica's allocator state between processes, so every
//! load/allocate/save cycle runs under an exclusive lock on `<path>.lock`.
//! Two processes restoring the same snapshot at once would otherwise resume
//! from the same cursor and mint the same keys.

use crate::error::SnapshotFileError;
use shortkey_allocator::{Allocator, AllocatorSettings, AllocatorSnapshot};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Exclusive hold on a snapshot file. The lock is released on drop.
#[derive(Debug)]
pub struct SnapshotFile {
    path: PathBuf,
    _lock: File,
}

impl SnapshotFile {
    /// Blocks until no other process or thread holds the snapshot at `path`.
    pub fn lock(path: impl Into<PathBuf>) -> Result<Self, SnapshotFileError> {
        let path = path.into();
        let lock_path = sibling(&path, ".lock");
        let io_err = |source| SnapshotFileError::Io {
            path: lock_path.clone(),
            source,
        };

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(io_err)?;
        file.lock().map_err(io_err)?;

        debug!(path = %path.display(), "locked allocator snapshot");
        Ok(Self { path, _lock: file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the snapshot, returning `None` if the file does not exist yet.
    pub fn load(&self) -> Result<Option<AllocatorSnapshot>, SnapshotFileError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SnapshotFileError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let snapshot =
            serde_json::from_slice(&bytes).map_err(|source| SnapshotFileError::Format {
                path: self.path.clone(),
                source,
            })?;
        Ok(Some(snapshot))
    }

    /// Writes the snapshot next to the target and renames it into place, so
    /// a crash mid-write never leaves a truncated file behind.
    pub fn save(&self, snapshot: &AllocatorSnapshot) -> Result<(), SnapshotFileError> {
        let io_err = |source| SnapshotFileError::Io {
            path: self.path.clone(),
            source,
        };

        let json =
            serde_json::to_vec_pretty(snapshot).map_err(|source| SnapshotFileError::Format {
                path: self.path.clone(),
                source,
            })?;

        let tmp = sibling(&self.path, ".tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;

        debug!(path = %self.path.display(), cursor = snapshot.cursor, "saved allocator snapshot");
        Ok(())
    }
}

/// Runs `f` against the allocator persisted at `path`.
///
/// The snapshot is locked, restored (or a fresh allocator is created when
/// none exists), handed to `f`, and saved again before the lock is dropped.
/// The value `f` produced is returned only once the save has succeeded, so
/// keys never escape a cycle whose state was not persisted.
pub fn with_allocator<T>(
    path: &Path,
    settings: AllocatorSettings,
    f: impl FnOnce(&Allocator) -> T,
) -> Result<T, SnapshotFileError> {
    let file = SnapshotFile::lock(path)?;

    let allocator = match file.load()? {
        Some(snapshot) => Allocator::restore(settings, snapshot)?,
        None => Allocator::new(settings)?,
    };

    let output = f(&allocator);
    file.save(&allocator.snapshot())?;
    Ok(output)
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
