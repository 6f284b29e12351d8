//! Plain file operations with path-carrying errors.

use std::io;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Creates a directory and all of its parents; no-op if it already exists.
pub fn create_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    std::fs::create_dir_all(path).map_err(|e| Error::file_op("create directory", path, e))
}

/// Copies `source` to `target`, overwriting `target` if it exists.
pub fn copy_file(source: impl AsRef<Path>, target: impl AsRef<Path>) -> Result<u64> {
    let (source, target) = (source.as_ref(), target.as_ref());
    if let Some(parent) = target.parent() {
        create_dir(parent)?;
    }
    std::fs::copy(source, target).map_err(|e| Error::file_op("copy", source, e))
}

/// Moves `source` to `target`.
///
/// Falls back to copy-and-delete when a rename is not possible (for
/// example across file systems).
pub fn move_file(source: impl AsRef<Path>, target: impl AsRef<Path>) -> Result<()> {
    let (source, target) = (source.as_ref(), target.as_ref());
    match std::fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Error::file_op("move", source, e)),
        Err(e) => {
            log::debug!(
                "rename '{}' -> '{}' failed ({}), copying instead",
                source.display(),
                target.display(),
                e
            );
            copy_file(source, target)?;
            delete_path(source)
        }
    }
}

/// Recursively removes a file or directory tree.
///
/// Does nothing if `path` does not exist, so it can be called repeatedly.
pub fn delete_path(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(Error::file_op("inspect", path, e)),
    };

    let removed = if metadata.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    removed.map_err(|e| Error::file_op("delete", path, e))
}

/// A file or directory that is deleted when the guard is dropped.
///
/// Used for every temporary and partial output of a rebuild, so an early
/// `?` return anywhere in the pipeline still leaves the build directory
/// clean. Call [`keep`](Self::keep) to hand the path over to the caller.
#[derive(Debug)]
#[must_use = "the path is deleted as soon as the guard is dropped"]
pub struct ScopedPath {
    path: PathBuf,
    armed: bool,
}

impl ScopedPath {
    /// Guards an existing (or not yet created) path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            armed: true,
        }
    }

    /// Creates a fresh, empty directory and guards it.
    ///
    /// Leftovers from an earlier interrupted run are removed first.
    pub fn create_dir(path: impl Into<PathBuf>) -> Result<Self> {
        let guard = Self::new(path);
        delete_path(&guard.path)?;
        create_dir(&guard.path)?;
        Ok(guard)
    }

    /// Returns the guarded path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Disarms the guard and returns the path, which is left on disk.
    pub fn keep(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for ScopedPath {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = delete_path(&self.path) {
                log::warn!("Failed to clean up '{}': {}", self.path.display(), e);
            }
        }
    }
}
