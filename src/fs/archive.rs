//! Virtual file tree over a single zip-family archive.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::{create_dir, zip_error};
use crate::{ArchivePath, Error, Result};

/// An entry of the archive as seen by the tree index.
#[derive(Debug, Clone)]
struct IndexedEntry {
    path: ArchivePath,
    zip_index: usize,
    is_dir: bool,
    size: u64,
}

/// Filesystem-like interface over a jar, war or ear archive.
///
/// Opening an archive reads its central directory once and builds a path
/// index plus a directory tree, so lookups never touch the file again.
/// Entry paths are normalized through [`ArchivePath`]; entries whose names
/// cannot be normalized (absolute Windows paths, `..` segments) are left
/// out of the tree with a warning.
///
/// # Example
///
/// ```rust,no_run
/// use persistence_patcher::fs::ArchiveFs;
///
/// let archive = ArchiveFs::open("target/shop.ear")?;
/// for entry in archive.read_dir("lib")? {
///     println!("{} ({} bytes)", entry.name(), entry.size());
/// }
/// # Ok::<(), persistence_patcher::Error>(())
/// ```
pub struct ArchiveFs {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
    entries: Vec<IndexedEntry>,
    /// Normalized path -> position in `entries`
    path_index: HashMap<String, usize>,
    /// Directory path -> child names ("" is the root)
    dir_tree: BTreeMap<String, BTreeSet<String>>,
}

impl std::fmt::Debug for ArchiveFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveFs")
            .field("path", &self.path)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl ArchiveFs {
    /// Opens an archive for reading.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArchive`] if `path` does not exist, is not a
    /// regular file, or is not a readable zip archive.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|e| Error::invalid_archive(path, e))?;
        if !metadata.is_file() {
            return Err(Error::invalid_archive(path, "not a regular file"));
        }

        let file = File::open(path).map_err(|e| Error::invalid_archive(path, e))?;
        let archive =
            ZipArchive::new(BufReader::new(file)).map_err(|e| Error::invalid_archive(path, e))?;
        Self::from_archive(path.to_path_buf(), archive)
    }

    fn from_archive(path: PathBuf, mut archive: ZipArchive<BufReader<File>>) -> Result<Self> {
        let mut entries = Vec::with_capacity(archive.len());
        let mut path_index = HashMap::new();
        let mut dir_tree: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for zip_index in 0..archive.len() {
            let file = archive
                .by_index_raw(zip_index)
                .map_err(|e| zip_error(&path, e))?;
            let entry_path = match ArchivePath::new(file.name()) {
                Ok(p) => p,
                Err(e) => {
                    log::warn!(
                        "Ignoring entry '{}' in '{}': {}",
                        file.name(),
                        path.display(),
                        e
                    );
                    continue;
                }
            };

            // Register every ancestor so implicit directories are listable
            let mut child = entry_path.clone();
            while let Some(parent) = child.parent() {
                dir_tree
                    .entry(parent.as_str().to_string())
                    .or_default()
                    .insert(child.file_name().to_string());
                child = parent;
            }
            dir_tree
                .entry(String::new())
                .or_default()
                .insert(child.file_name().to_string());

            let is_dir = file.is_dir();
            if is_dir {
                dir_tree.entry(entry_path.as_str().to_string()).or_default();
            }

            path_index.insert(entry_path.as_str().to_string(), entries.len());
            entries.push(IndexedEntry {
                path: entry_path,
                zip_index,
                is_dir,
                size: file.size(),
            });
        }

        // Ensure root directory exists
        dir_tree.entry(String::new()).or_default();

        log::debug!(
            "Indexed {} entries of '{}'",
            entries.len(),
            path.display()
        );

        Ok(Self {
            path,
            archive,
            entries,
            path_index,
            dir_tree,
        })
    }

    /// Returns the path of the archive file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of indexed entries (files and explicit directories).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if the given path exists in the archive.
    pub fn exists(&self, path: impl AsRef<str>) -> bool {
        let path = lookup_key(path.as_ref());
        self.path_index.contains_key(&path) || self.dir_tree.contains_key(&path)
    }

    /// Returns true if the given path is a directory (explicit or implicit).
    pub fn is_dir(&self, path: impl AsRef<str>) -> bool {
        self.dir_tree.contains_key(&lookup_key(path.as_ref()))
    }

    /// Returns true if the given path is a regular file.
    pub fn is_file(&self, path: impl AsRef<str>) -> bool {
        self.entry(path.as_ref()).is_some_and(|e| !e.is_dir)
    }

    /// Lists the direct children of a directory.
    ///
    /// Use an empty string or `/` for the root directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotADirectory`] if `path` is not a directory.
    pub fn read_dir(&self, path: impl AsRef<str>) -> Result<Vec<DirEntry>> {
        let path = lookup_key(path.as_ref());
        let children = self
            .dir_tree
            .get(&path)
            .ok_or_else(|| Error::NotADirectory { path: path.clone() })?;

        Ok(children
            .iter()
            .map(|name| {
                let full_path = if path.is_empty() {
                    name.clone()
                } else {
                    format!("{}/{}", path, name)
                };
                let size = self.entry(&full_path).map_or(0, |e| e.size);
                DirEntry {
                    is_dir: self.dir_tree.contains_key(&full_path),
                    name: name.clone(),
                    size,
                }
            })
            .collect())
    }

    /// Yields every file entry under the given directory, in archive order.
    pub fn walk(&self, path: impl AsRef<str>) -> impl Iterator<Item = &ArchivePath> {
        let prefix = path.as_ref().to_string();
        self.files().filter(move |p| p.starts_with(&prefix))
    }

    /// Returns all file entries (non-directories), in archive order.
    pub fn files(&self) -> impl Iterator<Item = &ArchivePath> {
        self.entries.iter().filter(|e| !e.is_dir).map(|e| &e.path)
    }

    fn entry(&self, path: &str) -> Option<&IndexedEntry> {
        let &idx = self.path_index.get(&lookup_key(path))?;
        Some(&self.entries[idx])
    }

    fn file_entry(&self, path: &str) -> Result<IndexedEntry> {
        match self.entry(path) {
            Some(e) if !e.is_dir => Ok(e.clone()),
            _ => Err(Error::EntryNotFound {
                archive: self.path.display().to_string(),
                entry: path.to_string(),
            }),
        }
    }

    /// Copies one entry to a concrete file, creating parent directories.
    ///
    /// An existing file at `dest` is overwritten. Returns the number of
    /// bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] if there is no such file entry.
    pub fn extract_entry(&mut self, entry: impl AsRef<str>, dest: impl AsRef<Path>) -> Result<u64> {
        let dest = dest.as_ref();
        let indexed = self.file_entry(entry.as_ref())?;
        if let Some(parent) = dest.parent() {
            create_dir(parent)?;
        }

        let mut reader = self
            .archive
            .by_index(indexed.zip_index)
            .map_err(|e| zip_error(&self.path, e))?;
        let mut out = File::create(dest).map_err(|e| Error::file_op("create", dest, e))?;
        let written = io::copy(&mut reader, &mut out).map_err(|e| Error::file_op("write", dest, e))?;

        log::debug!(
            "Extracted '{}' from '{}' to '{}' ({} bytes)",
            indexed.path,
            self.path.display(),
            dest.display(),
            written
        );
        Ok(written)
    }

    /// Replaces the bytes of one entry with the contents of `source`.
    ///
    /// The archive is rewritten next to the original and renamed over it.
    /// Every other entry is raw-copied, so nothing else is recompressed.
    /// The replaced entry keeps its name, its permissions and (where the
    /// writer supports it) its compression method. The handle is reloaded
    /// afterwards and reflects the new contents.
    pub fn reinsert_entry(&mut self, entry: impl AsRef<str>, source: impl AsRef<Path>) -> Result<()> {
        let source = source.as_ref();
        let target = self.file_entry(entry.as_ref())?;
        let data = std::fs::read(source).map_err(|e| Error::file_op("read", source, e))?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut staging = tempfile::NamedTempFile::new_in(&dir)
            .map_err(|e| Error::file_op("create temporary file in", &dir, e))?;

        {
            let mut writer = ZipWriter::new(staging.as_file_mut());
            for zip_index in 0..self.archive.len() {
                let file = self
                    .archive
                    .by_index_raw(zip_index)
                    .map_err(|e| zip_error(&self.path, e))?;

                if zip_index != target.zip_index {
                    writer
                        .raw_copy_file(file)
                        .map_err(|e| zip_error(&self.path, e))?;
                    continue;
                }

                let method = match file.compression() {
                    CompressionMethod::Stored => CompressionMethod::Stored,
                    _ => CompressionMethod::Deflated,
                };
                let mut options = SimpleFileOptions::default().compression_method(method);
                if let Some(mode) = file.unix_mode() {
                    options = options.unix_permissions(mode);
                }
                let name = file.name().to_string();
                drop(file);

                writer
                    .start_file(name, options)
                    .map_err(|e| zip_error(&self.path, e))?;
                writer
                    .write_all(&data)
                    .map_err(|e| Error::file_op("write", &self.path, e))?;
            }
            writer.finish().map_err(|e| zip_error(&self.path, e))?;
        }

        staging
            .persist(&self.path)
            .map_err(|e| Error::file_op("replace", &self.path, e.error))?;

        log::debug!(
            "Reinserted '{}' into '{}' ({} bytes)",
            target.path,
            self.path.display(),
            data.len()
        );
        self.reload()
    }

    fn reload(&mut self) -> Result<()> {
        *self = Self::open(&self.path)?;
        Ok(())
    }
}

/// A directory entry returned by [`ArchiveFs::read_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    name: String,
    is_dir: bool,
    size: u64,
}

impl DirEntry {
    /// Returns the file/directory name (not the full path).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    /// Returns true if this is a file.
    pub fn is_file(&self) -> bool {
        !self.is_dir
    }

    /// Returns the uncompressed size (0 for directories).
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Normalizes a user-supplied path into an index key.
///
/// Paths that cannot be normalized map to a key no entry can have.
fn lookup_key(path: &str) -> String {
    let trimmed = path.replace('\\', "/");
    if trimmed.trim_matches('/').is_empty() {
        return String::new();
    }
    ArchivePath::new(&trimmed)
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|_| "\0".to_string())
}
