//! Typed `persistence.xml` models and the property merge.
//!
//! A descriptor is handled in four steps:
//!
//! 1. [`detect_version`] sniffs the root `version` attribute
//! 2. [`SchemaVersion::resolve`] maps it to a registered model, or fails
//!    with [`Error::UnsupportedSchemaVersion`]
//! 3. [`Descriptor::load`] binds the document to that model
//! 4. [`Descriptor::merge`] applies an [`OverrideSet`] and
//!    [`Descriptor::save`] writes the result back
//!
//! [`patch_descriptor`] runs all four on one file.
//!
//! # Example
//!
//! ```rust,no_run
//! use persistence_patcher::OverrideSet;
//! use persistence_patcher::descriptor::patch_descriptor;
//!
//! let overrides: OverrideSet = [("hibernate.show_sql", "false")].into_iter().collect();
//! let patched = patch_descriptor("build/persistence.xml", &overrides)?;
//! println!("{}: {}", patched.version, patched.stats);
//! # Ok::<(), persistence_patcher::Error>(())
//! ```

mod detect;
mod merge;
pub mod v1_0;
pub mod v2_0;
pub mod v2_1;

pub use detect::{detect_version, detect_version_from_reader};
pub use merge::{MergeStats, Properties, Property, merge_properties};

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::{Error, OverrideSet, Result};

/// Namespace of the `xsi` prefix used by `xsi:schemaLocation`.
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// A persistence schema version with a registered model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SchemaVersion {
    /// JPA 1.0
    V1_0,
    /// JPA 2.0
    V2_0,
    /// JPA 2.1
    V2_1,
}

/// Declared version string -> model. The single source of truth for
/// which versions are supported.
const SCHEMA_VERSIONS: &[(&str, SchemaVersion)] = &[
    ("1.0", SchemaVersion::V1_0),
    ("2.0", SchemaVersion::V2_0),
    ("2.1", SchemaVersion::V2_1),
];

impl SchemaVersion {
    /// Looks up a declared version string (exact match).
    pub fn lookup(version: &str) -> Option<Self> {
        SCHEMA_VERSIONS
            .iter()
            .find(|(declared, _)| *declared == version)
            .map(|&(_, v)| v)
    }

    /// Resolves the version declared by the descriptor at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedSchemaVersion`] if the version is unknown
    /// or missing (reported as `<none>`).
    pub fn resolve(declared: Option<&str>, path: impl AsRef<Path>) -> Result<Self> {
        declared
            .and_then(Self::lookup)
            .ok_or_else(|| Error::UnsupportedSchemaVersion {
                version: declared.unwrap_or("<none>").to_string(),
                path: path.as_ref().display().to_string(),
            })
    }

    /// Returns every supported version, oldest first.
    pub fn all() -> impl Iterator<Item = SchemaVersion> {
        SCHEMA_VERSIONS.iter().map(|&(_, v)| v)
    }

    /// Returns the version string as written in the `version` attribute.
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaVersion::V1_0 => "1.0",
            SchemaVersion::V2_0 => "2.0",
            SchemaVersion::V2_1 => "2.1",
        }
    }

    /// Returns the default namespace of documents of this version.
    pub fn namespace(self) -> &'static str {
        match self {
            SchemaVersion::V1_0 => v1_0::NAMESPACE,
            SchemaVersion::V2_0 => v2_0::NAMESPACE,
            SchemaVersion::V2_1 => v2_1::NAMESPACE,
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access to the parts of a persistence unit the merge needs.
///
/// Implemented by the unit type of every schema model.
pub trait UnitModel {
    /// The unit name.
    fn name(&self) -> &str;

    /// The property list, or `None` if the unit has no `<properties>` element.
    fn properties(&self) -> Option<&[Property]>;

    /// Mutable access to the property list.
    fn properties_mut(&mut self) -> Option<&mut Vec<Property>>;
}

/// Read-only view of one unit, independent of the schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitView<'a> {
    /// The unit name.
    pub name: &'a str,
    /// The property list, if the unit has one.
    pub properties: Option<&'a [Property]>,
}

/// A loaded descriptor, tagged with its schema version.
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    /// A 1.0 document.
    V1_0(v1_0::Persistence),
    /// A 2.0 document.
    V2_0(v2_0::Persistence),
    /// A 2.1 document.
    V2_1(v2_1::Persistence),
}

impl Descriptor {
    /// Loads a descriptor file into the model for `version`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedDescriptor`] if the document does not parse
    /// or does not fit the model.
    pub fn load(version: SchemaVersion, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path).map_err(|e| Error::file_op("read", path, e))?;
        Self::from_xml(version, &xml, &path.display().to_string())
    }

    /// Parses a document held in memory. `label` names it in errors.
    pub fn from_xml(version: SchemaVersion, xml: &str, label: &str) -> Result<Self> {
        let parsed = match version {
            SchemaVersion::V1_0 => quick_xml::de::from_str(xml).map(Descriptor::V1_0),
            SchemaVersion::V2_0 => quick_xml::de::from_str(xml).map(Descriptor::V2_0),
            SchemaVersion::V2_1 => quick_xml::de::from_str(xml).map(Descriptor::V2_1),
        };
        parsed.map_err(|e| Error::malformed(label, e))
    }

    /// Renders the descriptor with an XML declaration and 4-space indentation.
    pub fn to_xml(&self) -> Result<String> {
        match self {
            Descriptor::V1_0(doc) => render(doc),
            Descriptor::V2_0(doc) => render(doc),
            Descriptor::V2_1(doc) => render(doc),
        }
    }

    /// Writes the descriptor to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let xml = self.to_xml()?;
        std::fs::write(path, xml).map_err(|e| Error::file_op("write", path, e))
    }

    /// Returns the schema version of the model.
    pub fn version(&self) -> SchemaVersion {
        match self {
            Descriptor::V1_0(_) => SchemaVersion::V1_0,
            Descriptor::V2_0(_) => SchemaVersion::V2_0,
            Descriptor::V2_1(_) => SchemaVersion::V2_1,
        }
    }

    /// Returns a view of every unit, in document order.
    pub fn units(&self) -> Vec<UnitView<'_>> {
        match self {
            Descriptor::V1_0(doc) => views(&doc.units),
            Descriptor::V2_0(doc) => views(&doc.units),
            Descriptor::V2_1(doc) => views(&doc.units),
        }
    }

    /// Merges `overrides` into every unit that has a property list.
    ///
    /// Units without `<properties>` are left untouched. See
    /// [`merge_properties`] for the per-unit rules.
    pub fn merge(&mut self, overrides: &OverrideSet) -> MergeStats {
        match self {
            Descriptor::V1_0(doc) => merge_units(&mut doc.units, overrides),
            Descriptor::V2_0(doc) => merge_units(&mut doc.units, overrides),
            Descriptor::V2_1(doc) => merge_units(&mut doc.units, overrides),
        }
    }
}

fn render<T: Serialize>(doc: &T) -> Result<String> {
    let mut xml = String::from(XML_DECLARATION);
    xml.push('\n');
    let mut serializer = quick_xml::se::Serializer::new(&mut xml);
    serializer.indent(' ', 4);
    doc.serialize(serializer)
        .map_err(|e| Error::malformed("<descriptor>", e))?;
    xml.push('\n');
    Ok(xml)
}

fn views<U: UnitModel>(units: &[U]) -> Vec<UnitView<'_>> {
    units
        .iter()
        .map(|unit| UnitView {
            name: unit.name(),
            properties: unit.properties(),
        })
        .collect()
}

fn merge_units<U: UnitModel>(units: &mut [U], overrides: &OverrideSet) -> MergeStats {
    let mut total = MergeStats::default();
    for unit in units {
        let name = unit.name().to_string();
        match unit.properties_mut() {
            Some(properties) => {
                let stats = merge_properties(properties, overrides);
                log::debug!("unit '{}': {}", name, stats);
                total += stats;
            }
            None => log::debug!("unit '{}' has no properties, skipped", name),
        }
    }
    total
}

/// Result of [`patch_descriptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchedDescriptor {
    /// The detected schema version.
    pub version: SchemaVersion,
    /// What the merge changed, summed over all units.
    pub stats: MergeStats,
}

/// Detects, loads, merges and saves one descriptor file in place.
///
/// The file is always written back, even if the merge changed nothing.
///
/// # Errors
///
/// - [`Error::MalformedDescriptor`] for unparseable documents
/// - [`Error::UnsupportedSchemaVersion`] for unknown or missing versions
pub fn patch_descriptor(path: impl AsRef<Path>, overrides: &OverrideSet) -> Result<PatchedDescriptor> {
    let path = path.as_ref();
    let declared = detect_version(path)?;
    let version = SchemaVersion::resolve(declared.as_deref(), path)?;

    let mut descriptor = Descriptor::load(version, path)?;
    let stats = descriptor.merge(overrides);
    descriptor.save(path)?;

    log::debug!("patched '{}' ({}): {}", path.display(), version, stats);
    Ok(PatchedDescriptor { version, stats })
}
