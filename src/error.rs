//! Error types for descriptor patching.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes of a patch run, along with a convenient [`Result<T>`] type
//! alias.
//!
//! # Error Handling
//!
//! All fallible operations in this crate return `Result<T, Error>`. The
//! rebuild orchestrator wraps whatever went wrong in a single
//! [`Error::Rebuild`] that records the stage the run had reached; use
//! [`Error::root_cause`] to get at the underlying failure:
//!
//! ```rust,no_run
//! use persistence_patcher::{Error, OverrideSet, RebuildRequest, rebuild};
//!
//! fn run(request: &RebuildRequest, overrides: &OverrideSet) {
//!     match rebuild(request, overrides) {
//!         Ok(outcome) => println!("{}", outcome.summary()),
//!         Err(e) => match e.root_cause() {
//!             Error::UnsupportedSchemaVersion { version, .. } => {
//!                 eprintln!("No model for persistence.xml version {}", version);
//!             }
//!             Error::MalformedDescriptor { path, .. } => {
//!                 eprintln!("Broken descriptor: {}", path);
//!             }
//!             other => eprintln!("Error: {}", other),
//!         },
//!     }
//! }
//! ```
//!
//! Two situations are deliberately *not* errors: an artifact that contains
//! no descriptor, and an artifact whose packaging is not handled. Both are
//! reported through [`RebuildOutcome`](crate::RebuildOutcome).

use std::io;

use crate::rebuild::Stage;

/// The main error type for descriptor patching.
///
/// # Error Categories
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | I/O | [`Io`][Self::Io], [`FileOperation`][Self::FileOperation] | File system operations |
/// | Archive | [`InvalidArchive`][Self::InvalidArchive], [`EntryNotFound`][Self::EntryNotFound], [`UnsafeEntryPath`][Self::UnsafeEntryPath] | Damaged or unexpected archives |
/// | Descriptor | [`MalformedDescriptor`][Self::MalformedDescriptor], [`UnsupportedSchemaVersion`][Self::UnsupportedSchemaVersion] | persistence.xml content |
/// | Input | [`MissingPropertiesSource`][Self::MissingPropertiesSource], [`InvalidPattern`][Self::InvalidPattern], [`InvalidCoordinate`][Self::InvalidCoordinate] | Caller configuration |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A file system operation failed on a known path.
    ///
    /// Unlike [`Io`][Self::Io], this variant keeps the operation name and
    /// the path so the message is actionable on its own.
    #[error("cannot {operation} '{path}': {source}")]
    FileOperation {
        /// What was being attempted (e.g. "copy", "create directory").
        operation: &'static str,
        /// The path the operation failed on.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The input is missing, not a regular file, or not a readable archive.
    #[error("invalid archive '{path}': {reason}")]
    InvalidArchive {
        /// The archive path.
        path: String,
        /// Why the archive was rejected.
        reason: String,
    },

    /// The descriptor is not well-formed markup or does not fit its schema model.
    #[error("malformed descriptor '{path}': {reason}")]
    MalformedDescriptor {
        /// The descriptor file.
        path: String,
        /// Parser message.
        reason: String,
    },

    /// The descriptor declares a schema version with no registered model.
    ///
    /// A descriptor without a `version` attribute is reported with the
    /// version `<none>`.
    #[error("unsupported persistence schema version '{version}' in '{path}'")]
    UnsupportedSchemaVersion {
        /// The declared version.
        version: String,
        /// The descriptor file.
        path: String,
    },

    /// The artifact packaging is not one of `jar`, `war` or `ear`.
    ///
    /// The orchestrator turns this into a
    /// [`RebuildOutcome::Unsupported`](crate::RebuildOutcome::Unsupported)
    /// and logs a warning instead of failing.
    #[error("unsupported packaging type '{packaging}'")]
    UnsupportedPackaging {
        /// The packaging string that was rejected.
        packaging: String,
    },

    /// The override property file is not configured, absent or unreadable.
    #[error("properties source '{path}' is not available: {reason}")]
    MissingPropertiesSource {
        /// The configured path (may be empty).
        path: String,
        /// Why it could not be loaded.
        reason: String,
    },

    /// A target that must not exist already exists.
    #[error("target already exists: {path}")]
    AlreadyExists {
        /// The existing path.
        path: String,
    },

    /// A directory was expected.
    #[error("not a directory: {path}")]
    NotADirectory {
        /// The offending path.
        path: String,
    },

    /// An entry was not found in the archive.
    #[error("entry '{entry}' not found in '{archive}'")]
    EntryNotFound {
        /// The archive that was searched.
        archive: String,
        /// The entry path.
        entry: String,
    },

    /// An archive entry would be written outside the extraction directory.
    #[error("entry '{entry}' in '{archive}' escapes the destination directory")]
    UnsafeEntryPath {
        /// The archive holding the entry.
        archive: String,
        /// The raw entry name.
        entry: String,
    },

    /// An archive entry path is invalid.
    #[error("invalid archive path: {0}")]
    InvalidArchivePath(String),

    /// A search pattern could not be compiled.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The pattern source.
        pattern: String,
        /// Compiler message.
        reason: String,
    },

    /// An artifact coordinate is not of the form `group:artifact`.
    #[error("invalid artifact coordinate '{0}': expected <groupId>:<artifactId>")]
    InvalidCoordinate(String),

    /// No dependency matches the requested coordinate.
    #[error("artifact '{coordinate}' is not a dependency of the project")]
    ArtifactNotFound {
        /// The requested coordinate.
        coordinate: String,
    },

    /// A rebuild run failed.
    ///
    /// This is the single top-level failure surfaced by the orchestrator.
    /// Partial outputs have already been removed when it is returned.
    #[error("rebuild of '{artifact}' failed during {stage}: {source}")]
    Rebuild {
        /// The artifact being rebuilt.
        artifact: String,
        /// The stage the run had reached.
        stage: Stage,
        /// What went wrong.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Returns the innermost error, looking through [`Error::Rebuild`].
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Rebuild { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Returns `true` if this error is about something this crate does not handle.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self.root_cause(),
            Error::UnsupportedSchemaVersion { .. } | Error::UnsupportedPackaging { .. }
        )
    }

    /// Returns the path this error is about, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Error::FileOperation { path, .. }
            | Error::InvalidArchive { path, .. }
            | Error::MalformedDescriptor { path, .. }
            | Error::UnsupportedSchemaVersion { path, .. }
            | Error::MissingPropertiesSource { path, .. }
            | Error::AlreadyExists { path }
            | Error::NotADirectory { path } => Some(path.as_str()),
            Error::EntryNotFound { archive, .. } | Error::UnsafeEntryPath { archive, .. } => {
                Some(archive.as_str())
            }
            Error::Rebuild { source, .. } => source.path(),
            _ => None,
        }
    }

    /// Creates a FileOperation error.
    pub(crate) fn file_op(
        operation: &'static str,
        path: impl AsRef<std::path::Path>,
        source: io::Error,
    ) -> Self {
        Error::FileOperation {
            operation,
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// Creates an InvalidArchive error.
    pub(crate) fn invalid_archive(
        path: impl AsRef<std::path::Path>,
        reason: impl std::fmt::Display,
    ) -> Self {
        Error::InvalidArchive {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates a MalformedDescriptor error.
    pub(crate) fn malformed(
        path: impl AsRef<std::path::Path>,
        reason: impl std::fmt::Display,
    ) -> Self {
        Error::MalformedDescriptor {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }
}

/// A specialized Result type for patch operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_file_operation_keeps_source() {
        let err = Error::file_op(
            "copy",
            "/tmp/app.ear",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("copy"));
        assert!(msg.contains("/tmp/app.ear"));
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.path(), Some("/tmp/app.ear"));
    }

    #[test]
    fn test_unsupported_schema_version() {
        let err = Error::UnsupportedSchemaVersion {
            version: "9.9".into(),
            path: "META-INF/persistence.xml".into(),
        };
        assert!(err.to_string().contains("'9.9'"));
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_root_cause_unwraps_rebuild() {
        let err = Error::Rebuild {
            artifact: "app.ear".into(),
            stage: Stage::PerFileProcessing,
            source: Box::new(Error::malformed("persistence.xml", "unexpected end")),
        };
        assert!(matches!(err.root_cause(), Error::MalformedDescriptor { .. }));
        assert!(err.to_string().contains("app.ear"));
        assert_eq!(err.path(), Some("persistence.xml"));
        assert!(!err.is_unsupported());
    }

    #[test]
    fn test_root_cause_of_plain_error_is_itself() {
        let err = Error::InvalidCoordinate("broken".into());
        assert!(matches!(err.root_cause(), Error::InvalidCoordinate(_)));
        assert!(err.to_string().contains("<groupId>:<artifactId>"));
    }

    #[test]
    fn test_entry_not_found() {
        let err = Error::EntryNotFound {
            archive: "app.jar".into(),
            entry: "META-INF/persistence.xml".into(),
        };
        assert!(err.to_string().contains("META-INF/persistence.xml"));
        assert_eq!(err.path(), Some("app.jar"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
