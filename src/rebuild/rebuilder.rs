//! The staged rebuild of one artifact.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::{
    BackupPolicy, ChangedDescriptor, Packaging, RebuildOutcome, RebuildReport, RebuildRequest,
    Stage, TEMP_DIR_NAME, backup_path, partial_path,
};
use crate::descriptor::patch_descriptor;
use crate::fs::{
    ArchiveFs, ScopedPath, copy_file, create_dir, delete_path, explode_archive, move_file,
    pack_directory,
};
use crate::locate::find_in_dir;
use crate::progress::{NoProgress, RebuildProgress};
use crate::{ArchivePath, Error, OverrideSet, Result};

/// A leaf archive to inspect.
#[derive(Debug)]
struct Candidate {
    /// Where the archive is on disk (inside the working copy).
    path: PathBuf,
    /// Name reported in logs and in the changed set.
    label: String,
    packaging: Packaging,
}

/// Drives one rebuild run.
///
/// The rebuilder owns the run-scoped state: the current [`Stage`] and the
/// set of changed descriptors. It is consumed by [`run`](Self::run), so a
/// value can never be reused for a second run.
///
/// The input artifact is only ever read. All writes happen below
/// [`RebuildRequest::work_dir`]:
///
/// | Path | Lifetime |
/// |------|----------|
/// | `persistence-tmp/` | the run |
/// | `<artifact-file>-update[/]` | the run, unless `keep_exploded` |
/// | `<output-name>.partial` | the `Decided` stage |
/// | `<output-name>` | replaced once the partial output is complete |
/// | `<output-name>-backup` | with [`BackupPolicy::Keep`] |
pub struct Rebuilder<'a, P = NoProgress> {
    request: &'a RebuildRequest,
    overrides: &'a OverrideSet,
    progress: P,
    stage: Stage,
    changed: BTreeSet<ChangedDescriptor>,
}

impl<'a> Rebuilder<'a, NoProgress> {
    /// Creates a rebuilder without progress reporting.
    pub fn new(request: &'a RebuildRequest, overrides: &'a OverrideSet) -> Self {
        Self::with_progress(request, overrides, NoProgress)
    }
}

impl<'a, P: RebuildProgress> Rebuilder<'a, P> {
    /// Creates a rebuilder reporting to `progress`.
    pub fn with_progress(request: &'a RebuildRequest, overrides: &'a OverrideSet, progress: P) -> Self {
        Self {
            request,
            overrides,
            progress,
            stage: Stage::Init,
            changed: BTreeSet::new(),
        }
    }

    /// Returns the stage the run has reached.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Executes the run.
    ///
    /// # Errors
    ///
    /// Every failure is wrapped in [`Error::Rebuild`] with the stage at
    /// which it happened. Temporary files and partial outputs are removed
    /// before the error is returned; the input artifact is untouched.
    pub fn run(mut self) -> Result<RebuildOutcome> {
        self.progress.on_stage(Stage::Init);
        match self.execute() {
            Ok(outcome) => {
                self.enter(Stage::Done);
                log::info!("{}", outcome.summary());
                Ok(outcome)
            }
            Err(source) => {
                let stage = self.stage;
                self.enter(Stage::Failed);
                Err(Error::Rebuild {
                    artifact: self.request.artifact.display().to_string(),
                    stage,
                    source: Box::new(source),
                })
            }
        }
    }

    fn enter(&mut self, stage: Stage) {
        log::debug!(
            "rebuild of '{}': {} -> {}",
            self.request.artifact.display(),
            self.stage,
            stage
        );
        self.stage = stage;
        self.progress.on_stage(stage);
    }

    fn execute(&mut self) -> Result<RebuildOutcome> {
        let request = self.request;

        let packaging = match request.packaging.parse::<Packaging>() {
            Ok(p) => p,
            Err(Error::UnsupportedPackaging { packaging }) => {
                let message = format!(
                    "The packaging type '{}' of '{}' is not supported",
                    packaging,
                    request.artifact.display()
                );
                log::warn!("{}", message);
                self.progress.on_warning(&message);
                return Ok(RebuildOutcome::Unsupported { packaging });
            }
            Err(e) => return Err(e),
        };
        if !request.artifact.is_file() {
            return Err(Error::invalid_archive(&request.artifact, "not a regular file"));
        }
        let artifact_name = request
            .artifact_name()
            .ok_or_else(|| Error::invalid_archive(&request.artifact, "no file name"))?;

        self.enter(Stage::Staged);
        create_dir(&request.work_dir)?;
        let temp = ScopedPath::create_dir(request.work_dir.join(TEMP_DIR_NAME))?;
        let staging = ScopedPath::new(request.staging_path(&artifact_name));
        delete_path(staging.path())?;

        let candidates = if packaging.is_container() {
            explode_archive(&request.artifact, staging.path())?;
            let found = find_in_dir(staging.path(), &Packaging::leaf_patterns()?)?;
            found
                .into_iter()
                .map(|m| Candidate {
                    label: relative_label(staging.path(), &m.path),
                    path: m.path,
                    packaging: m.tag,
                })
                .collect::<Vec<_>>()
        } else {
            copy_file(&request.artifact, staging.path())?;
            vec![Candidate {
                path: staging.path().to_path_buf(),
                label: artifact_name.clone(),
                packaging,
            }]
        };
        log::debug!("{} candidate archive(s) in '{}'", candidates.len(), artifact_name);
        self.progress.on_candidates(candidates.len());

        self.enter(Stage::PerFileProcessing);
        for (index, candidate) in candidates.iter().enumerate() {
            self.process(index, candidate, temp.path())?;
        }

        self.enter(Stage::Decided);
        if self.changed.is_empty() {
            log::info!(
                "No persistence.xml found in '{}', the working copy is discarded",
                request.artifact.display()
            );
            self.enter(Stage::Cleanup);
            return Ok(RebuildOutcome::NoDescriptor);
        }

        // The previous output stays in place until the new one is complete
        let output = request.output_path();
        let partial = ScopedPath::new(partial_path(&output));
        delete_path(partial.path())?;
        if packaging.is_container() {
            pack_directory(staging.path(), partial.path())?;
        } else {
            move_file(staging.path(), partial.path())?;
        }
        let backup = self.free_output(&output)?;
        let written = ScopedPath::new(&output);
        move_file(partial.path(), &output)?;
        log::info!("Created '{}'", output.display());

        let exploded = if request.keep_exploded {
            if !packaging.is_container() {
                explode_archive(&output, staging.path())?;
            }
            log::info!("Keeping exploded output in '{}'", staging.path().display());
            Some(staging.keep())
        } else {
            None
        };
        let output = written.keep();

        self.enter(Stage::Cleanup);
        drop(temp);

        Ok(RebuildOutcome::Rebuilt(RebuildReport {
            output,
            backup,
            exploded,
            changed: std::mem::take(&mut self.changed),
        }))
    }

    /// Patches the descriptor of one candidate, if it has one.
    fn process(&mut self, index: usize, candidate: &Candidate, temp_root: &Path) -> Result<()> {
        self.progress.on_archive_start(&candidate.path);
        let Some(entry) = candidate.packaging.descriptor_entry() else {
            self.progress.on_archive_skipped(&candidate.path);
            return Ok(());
        };

        let mut archive = ArchiveFs::open(&candidate.path)?;
        if !archive.is_file(entry) {
            log::debug!("'{}' has no {}", candidate.label, entry);
            self.progress.on_archive_skipped(&candidate.path);
            return Ok(());
        }

        log::info!("Start update of the persistence.xml in '{}'", candidate.label);
        let file_name = candidate
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        // Indexed so two leaves with the same file name never share a directory
        let scratch = temp_root.join(format!("{}-{}", index, file_name));
        let extracted = ArchivePath::new(entry)?.to_fs_path(&scratch);

        archive.extract_entry(entry, &extracted)?;
        let patched = patch_descriptor(&extracted, self.overrides)?;
        archive.reinsert_entry(entry, &extracted)?;

        log::info!(
            "Finished update of the persistence.xml in '{}' (version {}: {})",
            candidate.label,
            patched.version,
            patched.stats
        );
        self.progress
            .on_descriptor_patched(&candidate.path, entry, patched.version, &patched.stats);
        self.changed.insert(ChangedDescriptor {
            archive: candidate.label.clone(),
            entry: entry.to_string(),
            version: patched.version,
            stats: patched.stats,
        });
        Ok(())
    }

    /// Clears the output path according to the backup policy.
    fn free_output(&mut self, output: &Path) -> Result<Option<PathBuf>> {
        if !output.exists() {
            return Ok(None);
        }
        match self.request.backup {
            BackupPolicy::Delete => {
                log::info!("Delete the old file '{}'", output.display());
                delete_path(output)?;
                Ok(None)
            }
            BackupPolicy::Keep => {
                let backup = backup_path(output);
                log::info!("Backup the old file '{}' to '{}'", output.display(), backup.display());
                delete_path(&backup)?;
                move_file(output, &backup)?;
                Ok(Some(backup))
            }
        }
    }
}

fn relative_label(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
