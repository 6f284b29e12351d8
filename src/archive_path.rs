//! Archive entry path type with normalization and validation.

use crate::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Maximum length for archive paths (in bytes).
const MAX_PATH_LENGTH: usize = 32768;

/// A normalized, validated path of an entry inside an archive.
///
/// Build tools and the JDK zip file system spell entry paths in several
/// ways (`META-INF/persistence.xml`, `/META-INF/persistence.xml`,
/// `\META-INF\persistence.xml`). `ArchivePath` maps all of them to one
/// canonical form:
/// - `/` separators
/// - no leading or trailing `/`
/// - no empty, `.` or `..` segments
/// - no NUL bytes
///
/// # Examples
///
/// ```
/// use persistence_patcher::ArchivePath;
///
/// let path = ArchivePath::new("\\META-INF\\persistence.xml").unwrap();
/// assert_eq!(path.as_str(), "META-INF/persistence.xml");
///
/// assert!(ArchivePath::new("../secret").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchivePath(String);

impl ArchivePath {
    /// Creates a new `ArchivePath`, normalizing separators first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArchivePath`] if the normalized path:
    /// - Contains NUL bytes
    /// - Is empty
    /// - Contains empty segments (e.g., `a//b`)
    /// - Contains `.` or `..` segments
    pub fn new(s: &str) -> Result<Self> {
        let normalized = normalize(s);
        Self::validate(&normalized)?;
        Ok(Self(normalized))
    }

    fn validate(s: &str) -> Result<()> {
        if s.contains('\0') {
            return Err(Error::InvalidArchivePath("contains NUL byte".into()));
        }

        if s.is_empty() {
            return Err(Error::InvalidArchivePath("empty path".into()));
        }

        if s.len() > MAX_PATH_LENGTH {
            return Err(Error::InvalidArchivePath(format!(
                "path exceeds maximum length of {} bytes",
                MAX_PATH_LENGTH
            )));
        }

        for segment in s.split('/') {
            match segment {
                "" => {
                    return Err(Error::InvalidArchivePath(
                        "empty segment (consecutive slashes)".into(),
                    ));
                }
                "." => return Err(Error::InvalidArchivePath("'.' segment not allowed".into())),
                ".." => {
                    return Err(Error::InvalidArchivePath(
                        "'..' segment not allowed (path traversal)".into(),
                    ));
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Returns the path as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Joins this path with another segment.
    pub fn join(&self, other: &str) -> Result<Self> {
        Self::new(&format!("{}/{}", self.0, other))
    }

    /// Returns the parent directory of this path, if any.
    pub fn parent(&self) -> Option<Self> {
        self.0
            .rfind('/')
            .map(|idx| Self(self.0[..idx].to_string()))
    }

    /// Returns the file name (last segment) of this path.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Returns the file extension, if any.
    ///
    /// ```
    /// use persistence_patcher::ArchivePath;
    ///
    /// let path = ArchivePath::new("lib/model.jar").unwrap();
    /// assert_eq!(path.extension(), Some("jar"));
    /// ```
    pub fn extension(&self) -> Option<&str> {
        let file_name = self.file_name();
        match file_name.rfind('.') {
            Some(0) | None => None,
            Some(pos) => Some(&file_name[pos + 1..]),
        }
    }

    /// Returns an iterator over the path segments.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Returns true if this path starts with the given prefix, segment-wise.
    pub fn starts_with(&self, prefix: &str) -> bool {
        let prefix = normalize(prefix);
        if prefix.is_empty() {
            return true;
        }
        let mut own = self.components();
        prefix.split('/').all(|p| own.next() == Some(p))
    }

    /// Resolves this path below a real directory.
    ///
    /// Because `.` and `..` segments are rejected at construction, the
    /// result always stays inside `root`.
    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(self.components());
        path
    }
}

/// Normalizes separators and strips leading/trailing slashes.
fn normalize(s: &str) -> String {
    s.replace('\\', "/").trim_matches('/').to_string()
}

impl AsRef<str> for ArchivePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for ArchivePath {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ArchivePath {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(&s)
    }
}
