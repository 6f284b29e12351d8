//! Transactional rebuild of an artifact with patched descriptors.
//!
//! A run moves through fixed stages:
//!
//! ```text
//! Init -> Staged -> PerFileProcessing -> Decided -> Cleanup -> Done
//!   \________\____________\________________\__________\-----> Failed
//! ```
//!
//! - `Init`: the packaging is parsed; unsupported packagings end the run
//!   with [`RebuildOutcome::Unsupported`]
//! - `Staged`: a working copy is made (leaf) or the container is exploded
//!   and its leaf archives located
//! - `PerFileProcessing`: each candidate's descriptor is extracted,
//!   patched and reinserted
//! - `Decided`: nothing changed means [`RebuildOutcome::NoDescriptor`];
//!   otherwise the output is written, after backing up or deleting any
//!   previous output
//! - `Cleanup`: temporary files are removed (this also happens on every
//!   failure path, through [`ScopedPath`](crate::fs::ScopedPath) guards)
//!
//! Failures are reported once, as [`Error::Rebuild`](crate::Error::Rebuild)
//! carrying the stage that was reached.

mod packaging;
mod rebuilder;

pub use packaging::Packaging;
pub use rebuilder::Rebuilder;

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::descriptor::{MergeStats, SchemaVersion};
use crate::{OverrideSet, Result};

/// Name of the run-scoped directory holding extracted descriptors.
pub const TEMP_DIR_NAME: &str = "persistence-tmp";

/// Suffix of the working copy (leaf) or exploded directory (container).
pub const STAGING_SUFFIX: &str = "-update";

/// Suffix appended to a previous output kept by [`BackupPolicy::Keep`].
pub const BACKUP_SUFFIX: &str = "-backup";

/// Suffix of the new output while it is being written.
pub const PARTIAL_SUFFIX: &str = ".partial";

/// Stages of a rebuild run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Validating the request.
    Init,
    /// Working copy created.
    Staged,
    /// Patching candidate archives.
    PerFileProcessing,
    /// Writing (or discarding) the output.
    Decided,
    /// Removing temporary files.
    Cleanup,
    /// Finished successfully.
    Done,
    /// Aborted by an error.
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Init => "init",
            Stage::Staged => "staging",
            Stage::PerFileProcessing => "per-file processing",
            Stage::Decided => "output",
            Stage::Cleanup => "cleanup",
            Stage::Done => "done",
            Stage::Failed => "failed",
        })
    }
}

/// What happens to an existing file at the output path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BackupPolicy {
    /// Remove it.
    #[default]
    Delete,
    /// Rename it to `<output-name>-backup`, replacing an older backup.
    Keep,
}

/// Everything one run needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildRequest {
    /// The artifact to patch. It is never modified.
    pub artifact: PathBuf,
    /// Packaging of the artifact (`jar`, `war` or `ear`).
    pub packaging: String,
    /// Directory receiving the output and the temporary files.
    pub work_dir: PathBuf,
    /// File name of the output inside `work_dir`.
    pub output_name: String,
    /// Handling of a previous output.
    pub backup: BackupPolicy,
    /// Leave the unpacked output next to it.
    pub keep_exploded: bool,
}

impl RebuildRequest {
    /// Creates a request with the default policies.
    pub fn new(
        artifact: impl Into<PathBuf>,
        packaging: impl Into<String>,
        work_dir: impl Into<PathBuf>,
        output_name: impl Into<String>,
    ) -> Self {
        Self {
            artifact: artifact.into(),
            packaging: packaging.into(),
            work_dir: work_dir.into(),
            output_name: output_name.into(),
            backup: BackupPolicy::default(),
            keep_exploded: false,
        }
    }

    /// Sets the backup policy.
    pub fn backup(mut self, policy: BackupPolicy) -> Self {
        self.backup = policy;
        self
    }

    /// Sets whether the unpacked output is kept.
    pub fn keep_exploded(mut self, keep: bool) -> Self {
        self.keep_exploded = keep;
        self
    }

    /// Returns `<work_dir>/<output_name>`.
    pub fn output_path(&self) -> PathBuf {
        self.work_dir.join(&self.output_name)
    }

    /// Returns the file name of the artifact.
    pub(crate) fn artifact_name(&self) -> Option<String> {
        self.artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    }

    /// Returns `<work_dir>/<artifact-file>-update`.
    pub(crate) fn staging_path(&self, artifact_name: &str) -> PathBuf {
        self.work_dir
            .join(format!("{}{}", artifact_name, STAGING_SUFFIX))
    }
}

/// A descriptor rewritten during a run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChangedDescriptor {
    /// The leaf archive, relative to the artifact root (for a leaf artifact,
    /// the artifact's file name).
    pub archive: String,
    /// Entry path of the descriptor inside `archive`.
    pub entry: String,
    /// Detected schema version.
    pub version: SchemaVersion,
    /// What the merge did.
    pub stats: MergeStats,
}

/// Details of a successful rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildReport {
    /// The written output file.
    pub output: PathBuf,
    /// Where the previous output was moved, if it was kept.
    pub backup: Option<PathBuf>,
    /// The unpacked output, if requested.
    pub exploded: Option<PathBuf>,
    /// Every descriptor that was rewritten.
    pub changed: BTreeSet<ChangedDescriptor>,
}

impl RebuildReport {
    /// Returns the merge statistics summed over all descriptors.
    pub fn total_stats(&self) -> MergeStats {
        let mut total = MergeStats::default();
        for changed in &self.changed {
            total += changed.stats;
        }
        total
    }
}

/// How a run ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// At least one descriptor was patched and the output written.
    Rebuilt(RebuildReport),
    /// No candidate contained a descriptor; no output was written.
    NoDescriptor,
    /// The packaging is not handled; nothing was done.
    Unsupported {
        /// The rejected packaging string.
        packaging: String,
    },
}

impl RebuildOutcome {
    /// Returns the report of a rebuilt artifact.
    pub fn report(&self) -> Option<&RebuildReport> {
        match self {
            RebuildOutcome::Rebuilt(report) => Some(report),
            _ => None,
        }
    }

    /// Returns true if an output was written.
    pub fn is_rebuilt(&self) -> bool {
        matches!(self, RebuildOutcome::Rebuilt(_))
    }

    /// One-line, human-readable description.
    pub fn summary(&self) -> String {
        match self {
            RebuildOutcome::Rebuilt(report) => format!(
                "rebuilt '{}': {} descriptor(s) patched ({})",
                report.output.display(),
                report.changed.len(),
                report.total_stats()
            ),
            RebuildOutcome::NoDescriptor => "no persistence.xml found, nothing to do".to_string(),
            RebuildOutcome::Unsupported { packaging } => {
                format!("packaging '{}' is not supported, skipped", packaging)
            }
        }
    }
}

/// Runs a rebuild without progress reporting.
///
/// See [`Rebuilder`] for the details.
pub fn rebuild(request: &RebuildRequest, overrides: &OverrideSet) -> Result<RebuildOutcome> {
    Rebuilder::new(request, overrides).run()
}

/// Returns `<path>-backup`.
pub(crate) fn backup_path(output: &Path) -> PathBuf {
    with_suffix(output, BACKUP_SUFFIX)
}

pub(crate) fn partial_path(output: &Path) -> PathBuf {
    with_suffix(output, PARTIAL_SUFFIX)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
