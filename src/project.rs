//! The build-project inputs of a rebuild.
//!
//! A rebuild is started either for the project's own artifact (the
//! *release* flow, producing a classified sibling artifact) or for one of
//! its dependencies (the *update* flow, producing a patched copy in
//! `<build>/persistence-update`). [`Project`] turns either into a
//! [`RebuildRequest`].

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::rebuild::{BackupPolicy, RebuildOutcome, RebuildRequest};
use crate::{Error, Result};

/// Work directory of the update flow, relative to the build directory.
pub const UPDATE_DIR_NAME: &str = "persistence-update";

/// A `groupId:artifactId` pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coordinate {
    /// The group id.
    pub group_id: String,
    /// The artifact id.
    pub artifact_id: String,
}

impl FromStr for Coordinate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split(':').collect::<Vec<_>>().as_slice() {
            [group, artifact] if !group.is_empty() && !artifact.is_empty() => Ok(Self {
                group_id: group.to_string(),
                artifact_id: artifact.to_string(),
            }),
            _ => Err(Error::InvalidCoordinate(s.to_string())),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}

/// A resolved artifact: coordinates plus the file on disk.
///
/// Parses from `group:artifact:version:type=path`:
///
/// ```
/// use persistence_patcher::project::Artifact;
///
/// let artifact: Artifact = "com.example:shop:1.2:ear=repo/shop-1.2.ear".parse().unwrap();
/// assert_eq!(artifact.default_file_name(), "shop-1.2.ear");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// The group id.
    pub group_id: String,
    /// The artifact id.
    pub artifact_id: String,
    /// The version.
    pub version: String,
    /// The packaging type (`jar`, `war`, `ear`, ...).
    pub packaging: String,
    /// The artifact file.
    pub file: PathBuf,
}

impl Artifact {
    /// Returns true if this artifact has the given group and artifact id.
    pub fn matches(&self, coordinate: &Coordinate) -> bool {
        self.group_id == coordinate.group_id && self.artifact_id == coordinate.artifact_id
    }

    /// Returns `<artifactId>-<version>.<type>`.
    pub fn default_file_name(&self) -> String {
        format!("{}-{}.{}", self.artifact_id, self.version, self.packaging)
    }
}

/// Parses `group:artifact:version:type=path`.
impl FromStr for Artifact {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidCoordinate(s.to_string());
        let (coordinates, file) = s.split_once('=').ok_or_else(invalid)?;
        match coordinates.split(':').collect::<Vec<_>>().as_slice() {
            [group, artifact, version, packaging]
                if [group, artifact, version, packaging].iter().all(|p| !p.is_empty())
                    && !file.is_empty() =>
            {
                Ok(Self {
                    group_id: group.to_string(),
                    artifact_id: artifact.to_string(),
                    version: version.to_string(),
                    packaging: packaging.to_string(),
                    file: PathBuf::from(file),
                })
            }
            _ => Err(invalid()),
        }
    }
}

/// The parts of a build project a rebuild reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// The project's own artifact file, once it has been packaged.
    pub artifact: Option<PathBuf>,
    /// The build output directory (e.g. `target`).
    pub build_dir: PathBuf,
    /// Base name of the project's build outputs.
    pub final_name: String,
    /// The project packaging.
    pub packaging: String,
    /// Direct dependencies.
    pub dependencies: Vec<Artifact>,
}

/// Options of the update flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOptions {
    /// The dependency to patch.
    pub coordinate: Coordinate,
    /// Output file name; defaults to `<artifactId>-<version>.<type>`.
    pub file_name: Option<String>,
    /// Handling of a previous output.
    pub backup: BackupPolicy,
    /// Leave the unpacked output next to it.
    pub keep_exploded: bool,
}

impl Project {
    /// Builds the request of the release flow.
    ///
    /// The output is `<build>/<final-name>-<classifier>.<packaging>`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArchive`] if the project artifact has not
    /// been packaged yet.
    pub fn release_request(&self, classifier: &str, keep_exploded: bool) -> Result<RebuildRequest> {
        let artifact = self.artifact.as_ref().ok_or_else(|| {
            Error::invalid_archive(&self.final_name, "the project artifact has not been packaged")
        })?;
        let output_name = format!("{}-{}.{}", self.final_name, classifier, self.packaging);
        Ok(RebuildRequest::new(
            artifact,
            &self.packaging,
            &self.build_dir,
            output_name,
        )
        .keep_exploded(keep_exploded))
    }

    /// Finds a direct dependency by coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArtifactNotFound`] if no dependency matches.
    pub fn find_dependency(&self, coordinate: &Coordinate) -> Result<&Artifact> {
        self.dependencies
            .iter()
            .find(|a| a.matches(coordinate))
            .ok_or_else(|| Error::ArtifactNotFound {
                coordinate: coordinate.to_string(),
            })
    }

    /// Builds the request of the update flow.
    pub fn update_request(&self, options: &UpdateOptions) -> Result<RebuildRequest> {
        let dependency = self.find_dependency(&options.coordinate)?;
        let output_name = match options.file_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => dependency.default_file_name(),
        };
        log::debug!(
            "Updating dependency {} from '{}' as '{}'",
            options.coordinate,
            dependency.file.display(),
            output_name
        );
        Ok(RebuildRequest::new(
            &dependency.file,
            &dependency.packaging,
            self.build_dir.join(UPDATE_DIR_NAME),
            output_name,
        )
        .backup(options.backup)
        .keep_exploded(options.keep_exploded))
    }
}

/// An output to register with the build under a classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// The output file.
    pub file: PathBuf,
    /// The classifier.
    pub classifier: String,
    /// The packaging type.
    pub packaging: String,
}

/// Returns the attachment for a release run, if it produced an output.
pub fn attachment(outcome: &RebuildOutcome, classifier: &str, packaging: &str) -> Option<Attachment> {
    outcome.report().map(|report| Attachment {
        file: report.output.clone(),
        classifier: classifier.to_string(),
        packaging: packaging.to_string(),
    })
}
