//! Whole-archive conversion to and from directory trees.

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::{ScopedPath, create_dir, zip_error};
use crate::{Error, Result};

/// Extracts every entry of an archive below `dest_dir`.
///
/// The internal directory structure is recreated; `dest_dir` is created if
/// it does not exist. Returns `dest_dir`.
///
/// # Errors
///
/// - [`Error::InvalidArchive`] if the input is not a regular file or not
///   a zip archive
/// - [`Error::UnsafeEntryPath`] if an entry name would resolve outside
///   `dest_dir`
pub fn explode_archive(archive_path: impl AsRef<Path>, dest_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let (archive_path, dest_dir) = (archive_path.as_ref(), dest_dir.as_ref());
    if !archive_path.is_file() {
        return Err(Error::invalid_archive(
            archive_path,
            "not a regular file",
        ));
    }

    let file = File::open(archive_path).map_err(|e| Error::invalid_archive(archive_path, e))?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .map_err(|e| Error::invalid_archive(archive_path, e))?;
    create_dir(dest_dir)?;

    let mut files = 0usize;
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| zip_error(archive_path, e))?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(Error::UnsafeEntryPath {
                archive: archive_path.display().to_string(),
                entry: entry.name().to_string(),
            });
        };
        let target = dest_dir.join(relative);

        if entry.is_dir() {
            create_dir(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            create_dir(parent)?;
        }
        let mut out = File::create(&target).map_err(|e| Error::file_op("create", &target, e))?;
        io::copy(&mut entry, &mut out).map_err(|e| Error::file_op("write", &target, e))?;
        files += 1;
    }

    log::debug!(
        "Exploded {} files of '{}' into '{}'",
        files,
        archive_path.display(),
        dest_dir.display()
    );
    Ok(dest_dir.to_path_buf())
}

/// Packs a directory tree into a new archive.
///
/// Every file and directory below `source_dir` becomes an entry named by
/// its `/`-separated relative path. `META-INF` entries are written first,
/// as jar readers expect the manifest near the start; everything else
/// follows in sorted order. Returns the number of file entries written.
///
/// A partially written target is removed on failure.
///
/// # Errors
///
/// - [`Error::AlreadyExists`] if `target_archive` exists
/// - [`Error::NotADirectory`] if `source_dir` is not a directory
pub fn pack_directory(source_dir: impl AsRef<Path>, target_archive: impl AsRef<Path>) -> Result<usize> {
    let (source_dir, target) = (source_dir.as_ref(), target_archive.as_ref());
    if !source_dir.is_dir() {
        return Err(Error::NotADirectory {
            path: source_dir.display().to_string(),
        });
    }
    if target.exists() {
        return Err(Error::AlreadyExists {
            path: target.display().to_string(),
        });
    }

    let mut items = Vec::new();
    for entry in WalkDir::new(source_dir).min_depth(1).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(source_dir).to_path_buf();
            Error::file_op("walk", path, io::Error::from(e))
        })?;
        let Ok(relative) = entry.path().strip_prefix(source_dir) else {
            continue;
        };
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        items.push((name, entry.file_type().is_dir(), entry.into_path()));
    }
    items.sort_by(|a, b| pack_order(&a.0).cmp(&pack_order(&b.0)));

    let file = match File::create_new(target) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(Error::AlreadyExists {
                path: target.display().to_string(),
            });
        }
        Err(e) => return Err(Error::file_op("create", target, e)),
    };
    let partial = ScopedPath::new(target);

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let mut files = 0usize;
    for (name, is_dir, path) in &items {
        if *is_dir {
            writer
                .add_directory(name.as_str(), options)
                .map_err(|e| zip_error(target, e))?;
            continue;
        }
        writer
            .start_file(name.as_str(), options)
            .map_err(|e| zip_error(target, e))?;
        let mut input = File::open(path).map_err(|e| Error::file_op("open", path, e))?;
        io::copy(&mut input, &mut writer).map_err(|e| Error::file_op("write", target, e))?;
        files += 1;
    }
    let mut out = writer.finish().map_err(|e| zip_error(target, e))?;
    io::Write::flush(&mut out).map_err(|e| Error::file_op("write", target, e))?;
    drop(out);

    partial.keep();
    log::debug!(
        "Packed {} files from '{}' into '{}'",
        files,
        source_dir.display(),
        target.display()
    );
    Ok(files)
}

/// Sort key putting the `META-INF` tree ahead of everything else.
fn pack_order(name: &str) -> (bool, &str) {
    let in_meta_inf = name == "META-INF" || name.starts_with("META-INF/");
    (!in_meta_inf, name)
}
