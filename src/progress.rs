//! Progress reporting for rebuild runs.
//!
//! A rebuild walks through a handful of stages and, in the per-file stage,
//! through every candidate archive. [`RebuildProgress`] receives a callback
//! for each step; all methods have no-op defaults so implementors only
//! override what they display.
//!
//! # Example
//!
//! ```rust,no_run
//! use persistence_patcher::progress::StatisticsProgress;
//! use persistence_patcher::{OverrideSet, RebuildRequest, Rebuilder};
//!
//! # fn run(request: &RebuildRequest, overrides: &OverrideSet) -> persistence_patcher::Result<()> {
//! let mut progress = StatisticsProgress::new();
//! Rebuilder::with_progress(request, overrides, &mut progress).run()?;
//! println!("{} of {} archives patched", progress.patched, progress.candidates);
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use crate::descriptor::{MergeStats, SchemaVersion};
use crate::rebuild::Stage;

/// Callbacks fired by a [`Rebuilder`](crate::Rebuilder).
pub trait RebuildProgress {
    /// Called whenever the run enters a new stage.
    fn on_stage(&mut self, stage: Stage) {
        let _ = stage;
    }

    /// Called once the candidate leaf archives are known.
    fn on_candidates(&mut self, total: usize) {
        let _ = total;
    }

    /// Called before a candidate archive is opened.
    fn on_archive_start(&mut self, archive: &Path) {
        let _ = archive;
    }

    /// Called after a descriptor inside `archive` was rewritten.
    fn on_descriptor_patched(
        &mut self,
        archive: &Path,
        entry: &str,
        version: SchemaVersion,
        stats: &MergeStats,
    ) {
        let _ = (archive, entry, version, stats);
    }

    /// Called for a candidate without a descriptor.
    fn on_archive_skipped(&mut self, archive: &Path) {
        let _ = archive;
    }

    /// Called on any warning during processing.
    fn on_warning(&mut self, message: &str) {
        let _ = message;
    }
}

impl<P: RebuildProgress + ?Sized> RebuildProgress for &mut P {
    fn on_stage(&mut self, stage: Stage) {
        (**self).on_stage(stage);
    }

    fn on_candidates(&mut self, total: usize) {
        (**self).on_candidates(total);
    }

    fn on_archive_start(&mut self, archive: &Path) {
        (**self).on_archive_start(archive);
    }

    fn on_descriptor_patched(
        &mut self,
        archive: &Path,
        entry: &str,
        version: SchemaVersion,
        stats: &MergeStats,
    ) {
        (**self).on_descriptor_patched(archive, entry, version, stats);
    }

    fn on_archive_skipped(&mut self, archive: &Path) {
        (**self).on_archive_skipped(archive);
    }

    fn on_warning(&mut self, message: &str) {
        (**self).on_warning(message);
    }
}

/// A no-op progress reporter.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl RebuildProgress for NoProgress {}

/// Progress reporter that tallies what happened.
#[derive(Debug, Default, Clone)]
pub struct StatisticsProgress {
    /// Stages entered, in order.
    pub stages: Vec<Stage>,
    /// Number of candidate archives.
    pub candidates: usize,
    /// Candidates opened so far.
    pub started: usize,
    /// Descriptors rewritten.
    pub patched: usize,
    /// Candidates without a descriptor.
    pub skipped: usize,
    /// Merge statistics summed over all descriptors.
    pub stats: MergeStats,
    /// Warning messages.
    pub warnings: Vec<String>,
}

impl StatisticsProgress {
    /// Creates an empty tally.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RebuildProgress for StatisticsProgress {
    fn on_stage(&mut self, stage: Stage) {
        self.stages.push(stage);
    }

    fn on_candidates(&mut self, total: usize) {
        self.candidates = total;
    }

    fn on_archive_start(&mut self, _archive: &Path) {
        self.started += 1;
    }

    fn on_descriptor_patched(
        &mut self,
        _archive: &Path,
        _entry: &str,
        _version: SchemaVersion,
        stats: &MergeStats,
    ) {
        self.patched += 1;
        self.stats += *stats;
    }

    fn on_archive_skipped(&mut self, _archive: &Path) {
        self.skipped += 1;
    }

    fn on_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }
}
