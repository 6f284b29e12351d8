//! Exit codes for the CLI tool.

use persistence_patcher::Error;

/// Exit code constants
pub const SUCCESS: i32 = 0;
/// Nothing was written (no descriptor, unsupported packaging or version)
pub const WARNING: i32 = 1;
/// Fatal error occurred
pub const FATAL_ERROR: i32 = 2;
/// Input archive is missing or damaged
pub const BAD_ARCHIVE: i32 = 3;
/// A persistence.xml could not be processed
pub const BAD_DESCRIPTOR: i32 = 4;
/// I/O error
pub const IO_ERROR: i32 = 5;
/// Invalid command line arguments or inputs
pub const BAD_ARGS: i32 = 255;

/// Exit code enum for structured handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    Warning,
    FatalError,
    BadArchive,
    BadDescriptor,
    IoError,
    BadArgs,
}

impl ExitCode {
    /// Returns the numeric exit code
    pub fn code(self) -> i32 {
        match self {
            Self::Success => SUCCESS,
            Self::Warning => WARNING,
            Self::FatalError => FATAL_ERROR,
            Self::BadArchive => BAD_ARCHIVE,
            Self::BadDescriptor => BAD_DESCRIPTOR,
            Self::IoError => IO_ERROR,
            Self::BadArgs => BAD_ARGS,
        }
    }
}

/// Converts a library error to an exit code, looking through rebuild failures
pub fn error_to_exit_code(error: &Error) -> ExitCode {
    match error.root_cause() {
        Error::Io(_) | Error::FileOperation { .. } => ExitCode::IoError,
        Error::InvalidArchive { .. }
        | Error::EntryNotFound { .. }
        | Error::UnsafeEntryPath { .. }
        | Error::InvalidArchivePath(_) => ExitCode::BadArchive,
        Error::MalformedDescriptor { .. } | Error::UnsupportedSchemaVersion { .. } => {
            ExitCode::BadDescriptor
        }
        Error::MissingPropertiesSource { .. }
        | Error::InvalidPattern { .. }
        | Error::InvalidCoordinate(_)
        | Error::ArtifactNotFound { .. } => ExitCode::BadArgs,
        Error::UnsupportedPackaging { .. } => ExitCode::Warning,
        // Future error variants - required by #[non_exhaustive]
        _ => ExitCode::FatalError,
    }
}
