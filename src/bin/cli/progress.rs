//! Progress bar implementation for CLI operations.

use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use persistence_patcher::progress::RebuildProgress;
use persistence_patcher::{MergeStats, SchemaVersion, Stage};

/// Progress display for a rebuild run
pub struct CliProgress {
    bar: ProgressBar,
    quiet: bool,
}

impl CliProgress {
    /// Creates a new progress display; the length is set once candidates are known
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
                pb.set_style(style);
            }
            pb.set_message("Preparing...");
            pb
        };

        Self { bar, quiet }
    }
}

impl RebuildProgress for CliProgress {
    fn on_stage(&mut self, stage: Stage) {
        match stage {
            Stage::Done => self.bar.finish_and_clear(),
            Stage::Failed => self.bar.abandon_with_message("Failed"),
            Stage::Init | Stage::PerFileProcessing => {}
            other => self.bar.set_message(format!("{}...", other)),
        }
    }

    fn on_candidates(&mut self, total: usize) {
        if self.quiet {
            return;
        }
        self.bar.set_length(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} archives {wide_msg}")
        {
            self.bar.set_style(style.progress_chars("#>-"));
        }
    }

    fn on_archive_start(&mut self, archive: &Path) {
        let name = archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.bar.set_message(name);
    }

    fn on_descriptor_patched(
        &mut self,
        archive: &Path,
        entry: &str,
        version: SchemaVersion,
        stats: &MergeStats,
    ) {
        if !self.quiet {
            self.bar.println(format!(
                "  patched {}!/{} (v{}: {})",
                archive.display(),
                entry,
                version,
                stats
            ));
        }
        self.bar.inc(1);
    }

    fn on_archive_skipped(&mut self, _archive: &Path) {
        self.bar.inc(1);
    }

    fn on_warning(&mut self, message: &str) {
        if !self.quiet {
            self.bar.println(format!("warning: {}", message));
        }
    }
}
