//! Filesystem-style access to jar, war and ear archives.
//!
//! This module is the only place that touches archive bytes. It provides:
//! - [`ArchiveFs`]: a virtual, randomly addressable file tree over one
//!   archive, able to extract a single entry to disk and to write a
//!   single entry back in place
//! - [`explode_archive`] / [`pack_directory`]: whole-archive conversion
//!   to and from a real directory tree
//! - [`delete_path`], [`copy_file`], [`move_file`], [`create_dir`]: plain
//!   file operations whose errors carry the failing path
//! - [`ScopedPath`]: a path that is deleted when it goes out of scope
//!
//! # Example
//!
//! ```rust,no_run
//! use persistence_patcher::fs::ArchiveFs;
//!
//! let mut archive = ArchiveFs::open("target/app.jar")?;
//! if archive.is_file("META-INF/persistence.xml") {
//!     archive.extract_entry("META-INF/persistence.xml", "/tmp/persistence.xml")?;
//!     // ... edit /tmp/persistence.xml ...
//!     archive.reinsert_entry("META-INF/persistence.xml", "/tmp/persistence.xml")?;
//! }
//! # Ok::<(), persistence_patcher::Error>(())
//! ```
//!
//! None of these operations are safe to run concurrently on the same path.

mod archive;
mod ops;
mod pack;

pub use archive::{ArchiveFs, DirEntry};
pub use ops::{ScopedPath, copy_file, create_dir, delete_path, move_file};
pub use pack::{explode_archive, pack_directory};

use std::path::Path;

use zip::result::ZipError;

use crate::Error;

/// Maps a zip error on `path` to the crate error type.
pub(crate) fn zip_error(path: &Path, err: ZipError) -> Error {
    match err {
        ZipError::Io(source) => Error::file_op("access", path, source),
        other => Error::invalid_archive(path, other),
    }
}
