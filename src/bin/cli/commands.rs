//! Command implementations for the CLI tool.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use persistence_patcher::fs::ArchiveFs;
use persistence_patcher::locate::find_in_archive;
use persistence_patcher::project::{Artifact, Coordinate, Project, UpdateOptions, attachment};
use persistence_patcher::{
    ArchivePath, BackupPolicy, Error, OverrideSet, Packaging, RebuildOutcome, RebuildRequest,
    Rebuilder, SchemaVersion, detect_version,
};

use crate::OutputFormat;
use crate::exit_codes::{ExitCode, error_to_exit_code};
use crate::output::create_formatter;
use crate::progress::CliProgress;

/// Configuration for the release command.
pub struct ReleaseConfig<'a> {
    pub artifact: &'a Path,
    pub packaging: &'a str,
    pub build_dir: &'a Path,
    pub final_name: &'a str,
    pub classifier: &'a str,
    pub properties: &'a Path,
    pub keep_exploded: bool,
    pub format: OutputFormat,
    pub quiet: bool,
}

/// Configuration for the update command.
pub struct UpdateConfig<'a> {
    pub coordinate: &'a str,
    pub dependencies: &'a [String],
    pub build_dir: &'a Path,
    pub properties: &'a Path,
    pub file_name: Option<String>,
    pub keep_backup: bool,
    pub keep_exploded: bool,
    pub format: OutputFormat,
    pub quiet: bool,
}

/// One descriptor found by `scan`.
pub struct ScanEntry {
    /// Leaf archive holding the descriptor, relative to the scanned archive
    pub archive: String,
    /// Entry path of the descriptor
    pub entry: String,
    /// The declared schema version
    pub declared: Option<String>,
    /// Whether the declared version can be patched
    pub supported: bool,
}

/// Release command implementation
pub fn release(config: &ReleaseConfig<'_>) -> ExitCode {
    let project = Project {
        artifact: Some(config.artifact.to_path_buf()),
        build_dir: config.build_dir.to_path_buf(),
        final_name: config.final_name.to_string(),
        packaging: config.packaging.to_string(),
        dependencies: Vec::new(),
    };

    let request = match project.release_request(config.classifier, config.keep_exploded) {
        Ok(r) => r,
        Err(e) => return report_error(&e),
    };

    let outcome = match run(&request, config.properties, config.format, config.quiet) {
        Ok(o) => o,
        Err(code) => return code,
    };
    if let Some(attached) = attachment(&outcome, config.classifier, config.packaging) {
        log::info!(
            "Attached '{}' with classifier '{}'",
            attached.file.display(),
            attached.classifier
        );
    }
    outcome_to_exit_code(&outcome)
}

/// Update command implementation
pub fn update(config: &UpdateConfig<'_>) -> ExitCode {
    let coordinate = match config.coordinate.parse::<Coordinate>() {
        Ok(c) => c,
        Err(e) => return report_error(&e),
    };
    let dependencies = match config
        .dependencies
        .iter()
        .map(|d| d.parse::<Artifact>())
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(d) => d,
        Err(e) => return report_error(&e),
    };

    let project = Project {
        artifact: None,
        build_dir: config.build_dir.to_path_buf(),
        final_name: String::new(),
        packaging: String::new(),
        dependencies,
    };
    let options = UpdateOptions {
        coordinate,
        file_name: config.file_name.clone(),
        backup: if config.keep_backup {
            BackupPolicy::Keep
        } else {
            BackupPolicy::Delete
        },
        keep_exploded: config.keep_exploded,
    };

    let request = match project.update_request(&options) {
        Ok(r) => r,
        Err(e) => return report_error(&e),
    };

    match run(&request, config.properties, config.format, config.quiet) {
        Ok(outcome) => outcome_to_exit_code(&outcome),
        Err(code) => code,
    }
}

/// Detect command implementation
pub fn detect(descriptor: &Path, format: OutputFormat) -> ExitCode {
    let formatter = create_formatter(format);

    let declared = match detect_version(descriptor) {
        Ok(v) => v,
        Err(e) => return report_error(&e),
    };

    print!("{}", formatter.format_detect(descriptor, declared.as_deref()));

    match declared.as_deref().and_then(SchemaVersion::lookup) {
        Some(_) => ExitCode::Success,
        None => ExitCode::Warning,
    }
}

/// Scan command implementation
pub fn scan(archive: &Path, packaging: Option<&str>, format: OutputFormat) -> ExitCode {
    let formatter = create_formatter(format);

    let packaging = packaging
        .map(str::to_string)
        .or_else(|| {
            archive
                .extension()
                .map(|e| e.to_string_lossy().to_ascii_lowercase())
        })
        .unwrap_or_default();
    let packaging = match packaging.parse::<Packaging>() {
        Ok(p) => p,
        Err(e) => return report_error(&e),
    };

    let entries = match scan_archive(archive, packaging) {
        Ok(entries) => entries,
        Err(e) => return report_error(&e),
    };

    print!("{}", formatter.format_scan(archive, &entries));

    if entries.iter().all(|e| e.supported) {
        ExitCode::Success
    } else {
        ExitCode::Warning
    }
}

/// Loads the overrides, executes a rebuild with a progress display and prints the outcome.
fn run(
    request: &RebuildRequest,
    properties: &Path,
    format: OutputFormat,
    quiet: bool,
) -> Result<RebuildOutcome, ExitCode> {
    let formatter = create_formatter(format);

    let overrides = OverrideSet::from_properties_file(properties).map_err(|e| report_error(&e))?;

    let progress = CliProgress::new(quiet || format == OutputFormat::Json);
    let outcome = Rebuilder::with_progress(request, &overrides, progress)
        .run()
        .map_err(|e| report_error(&e))?;

    print!("{}", formatter.format_outcome(&outcome));
    Ok(outcome)
}

fn outcome_to_exit_code(outcome: &RebuildOutcome) -> ExitCode {
    if outcome.is_rebuilt() {
        ExitCode::Success
    } else {
        ExitCode::Warning
    }
}

/// Lists the descriptors of a leaf archive, or of every leaf in a container.
fn scan_archive(path: &Path, packaging: Packaging) -> persistence_patcher::Result<Vec<ScanEntry>> {
    let scratch = TempDir::new()?;
    let mut archive = ArchiveFs::open(path)?;

    if !packaging.is_container() {
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Ok(scan_leaf(&mut archive, packaging, label, scratch.path())?
            .into_iter()
            .collect());
    }

    let leaves = find_in_archive(&archive, &Packaging::leaf_patterns()?);
    let mut entries = Vec::new();
    for (index, leaf) in leaves.into_iter().enumerate() {
        let label = leaf.path.to_string_lossy().into_owned();
        let file_name = leaf
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let copy = scratch.path().join(format!("{}-{}", index, file_name));
        archive.extract_entry(&label, &copy)?;

        let mut nested = ArchiveFs::open(&copy)?;
        let work = scratch.path().join(index.to_string());
        entries.extend(scan_leaf(&mut nested, leaf.tag, label, &work)?);
    }
    Ok(entries)
}

fn scan_leaf(
    archive: &mut ArchiveFs,
    packaging: Packaging,
    label: String,
    work: &Path,
) -> persistence_patcher::Result<Option<ScanEntry>> {
    let Some(entry) = packaging.descriptor_entry() else {
        return Ok(None);
    };
    if !archive.is_file(entry) {
        return Ok(None);
    }

    let extracted: PathBuf = ArchivePath::new(entry)?.to_fs_path(work);
    archive.extract_entry(entry, &extracted)?;
    let declared = detect_version(&extracted)?;
    let supported = declared.as_deref().and_then(SchemaVersion::lookup).is_some();

    Ok(Some(ScanEntry {
        archive: label,
        entry: entry.to_string(),
        declared,
        supported,
    }))
}

fn report_error(error: &Error) -> ExitCode {
    eprintln!("Error: {}", error);
    error_to_exit_code(error)
}
