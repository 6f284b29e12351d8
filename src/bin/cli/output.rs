//! Output formatting for CLI operations.

use serde_json::json;
use std::path::Path;
use persistence_patcher::{RebuildOutcome, SchemaVersion};

use crate::commands::ScanEntry;

/// Trait for output formatting
pub trait OutputFormatter {
    /// Formats the outcome of a release or update run
    fn format_outcome(&self, outcome: &RebuildOutcome) -> String;

    /// Formats the declared version of a descriptor
    fn format_detect(&self, descriptor: &Path, declared: Option<&str>) -> String;

    /// Formats the descriptors found in an archive
    fn format_scan(&self, archive: &Path, entries: &[ScanEntry]) -> String;
}

/// Human-readable output formatter
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn format_outcome(&self, outcome: &RebuildOutcome) -> String {
        let mut output = String::new();

        let Some(report) = outcome.report() else {
            output.push_str(&outcome.summary());
            output.push('\n');
            return output;
        };

        output.push_str(&format!("Created {}\n", report.output.display()));
        output.push_str(&"-".repeat(70));
        output.push('\n');
        output.push_str(&format!(
            "{:>7} {:>7} {:>7} {:>9}  {}\n",
            "Updated", "Added", "Deleted", "Unchanged", "Descriptor"
        ));
        for changed in &report.changed {
            output.push_str(&format!(
                "{:>7} {:>7} {:>7} {:>9}  {}!/{} (v{})\n",
                changed.stats.updated,
                changed.stats.inserted,
                changed.stats.deleted,
                changed.stats.unchanged,
                changed.archive,
                changed.entry,
                changed.version
            ));
        }
        output.push_str(&"-".repeat(70));
        output.push('\n');
        output.push_str(&format!(
            "{} descriptor(s): {}\n",
            report.changed.len(),
            report.total_stats()
        ));

        if let Some(backup) = &report.backup {
            output.push_str(&format!("Previous output kept as {}\n", backup.display()));
        }
        if let Some(exploded) = &report.exploded {
            output.push_str(&format!("Exploded output in {}\n", exploded.display()));
        }

        output
    }

    fn format_detect(&self, descriptor: &Path, declared: Option<&str>) -> String {
        match declared {
            Some(version) => {
                let support = if SchemaVersion::lookup(version).is_some() {
                    "supported"
                } else {
                    "not supported"
                };
                format!("{}: version {} ({})\n", descriptor.display(), version, support)
            }
            None => format!("{}: no version attribute\n", descriptor.display()),
        }
    }

    fn format_scan(&self, archive: &Path, entries: &[ScanEntry]) -> String {
        let mut output = String::new();

        if entries.is_empty() {
            output.push_str(&format!("No persistence.xml in {}\n", archive.display()));
            return output;
        }

        output.push_str(&format!("{:>8}  {}\n", "Version", "Descriptor"));
        output.push_str(&"-".repeat(70));
        output.push('\n');
        for entry in entries {
            let version = entry.declared.as_deref().unwrap_or("-");
            let marker = if entry.supported { "" } else { " (unsupported)" };
            output.push_str(&format!(
                "{:>8}  {}!/{}{}\n",
                version, entry.archive, entry.entry, marker
            ));
        }
        output.push_str(&"-".repeat(70));
        output.push('\n');
        output.push_str(&format!("{} descriptor(s)\n", entries.len()));

        output
    }
}

/// JSON output formatter
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_outcome(&self, outcome: &RebuildOutcome) -> String {
        let obj = match outcome {
            RebuildOutcome::Rebuilt(report) => json!({
                "outcome": "rebuilt",
                "output": report.output.display().to_string(),
                "backup": report.backup.as_ref().map(|p| p.display().to_string()),
                "exploded": report.exploded.as_ref().map(|p| p.display().to_string()),
                "changed": report.changed.iter().map(|c| json!({
                    "archive": c.archive,
                    "entry": c.entry,
                    "version": c.version.as_str(),
                    "updated": c.stats.updated,
                    "inserted": c.stats.inserted,
                    "deleted": c.stats.deleted,
                    "unchanged": c.stats.unchanged,
                })).collect::<Vec<_>>(),
            }),
            RebuildOutcome::NoDescriptor => json!({ "outcome": "no-descriptor" }),
            RebuildOutcome::Unsupported { packaging } => json!({
                "outcome": "unsupported",
                "packaging": packaging,
            }),
        };

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_detect(&self, descriptor: &Path, declared: Option<&str>) -> String {
        let obj = json!({
            "descriptor": descriptor.display().to_string(),
            "version": declared,
            "supported": declared.and_then(SchemaVersion::lookup).is_some(),
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_scan(&self, archive: &Path, entries: &[ScanEntry]) -> String {
        let obj = json!({
            "archive": archive.display().to_string(),
            "descriptors": entries.iter().map(|e| json!({
                "archive": e.archive,
                "entry": e.entry,
                "version": e.declared,
                "supported": e.supported,
            })).collect::<Vec<_>>(),
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Creates the appropriate formatter based on output format
pub fn create_formatter(format: super::OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        super::OutputFormat::Human => Box::new(HumanFormatter),
        super::OutputFormat::Json => Box::new(JsonFormatter),
    }
}
