//! Model of the JPA 2.0 `persistence_2_0.xsd` schema.
//!
//! Adds `shared-cache-mode` and `validation-mode` to the 1.0 unit.

use serde::{Deserialize, Serialize};

use super::UnitModel;
use super::merge::{Properties, Property};

/// Default namespace of 2.0 documents (unchanged from 1.0).
pub const NAMESPACE: &str = "http://java.sun.com/xml/ns/persistence";

/// Schema location of 2.0 documents.
pub const SCHEMA_LOCATION: &str =
    "http://java.sun.com/xml/ns/persistence http://java.sun.com/xml/ns/persistence/persistence_2_0.xsd";

/// The `<persistence>` root element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "persistence")]
#[allow(missing_docs)]
pub struct Persistence {
    #[serde(rename = "@version")]
    pub version: String,
    #[serde(rename = "@xmlns", default, skip_serializing_if = "Option::is_none")]
    pub xmlns: Option<String>,
    #[serde(rename = "@xmlns:xsi", default, skip_serializing_if = "Option::is_none")]
    pub xmlns_xsi: Option<String>,
    #[serde(
        rename(serialize = "@xsi:schemaLocation", deserialize = "@schemaLocation"),
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub schema_location: Option<String>,
    #[serde(rename = "persistence-unit", default)]
    pub units: Vec<PersistenceUnit>,
}

impl Default for Persistence {
    fn default() -> Self {
        Self {
            version: "2.0".to_string(),
            xmlns: Some(NAMESPACE.to_string()),
            xmlns_xsi: Some(super::XSI_NAMESPACE.to_string()),
            schema_location: Some(SCHEMA_LOCATION.to_string()),
            units: Vec::new(),
        }
    }
}

/// A `<persistence-unit>` in schema order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct PersistenceUnit {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@transaction-type", default, skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(rename = "jta-data-source", default, skip_serializing_if = "Option::is_none")]
    pub jta_data_source: Option<String>,
    #[serde(rename = "non-jta-data-source", default, skip_serializing_if = "Option::is_none")]
    pub non_jta_data_source: Option<String>,
    #[serde(rename = "mapping-file", default, skip_serializing_if = "Vec::is_empty")]
    pub mapping_files: Vec<String>,
    #[serde(rename = "jar-file", default, skip_serializing_if = "Vec::is_empty")]
    pub jar_files: Vec<String>,
    #[serde(rename = "class", default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(rename = "exclude-unlisted-classes", default, skip_serializing_if = "Option::is_none")]
    pub exclude_unlisted_classes: Option<String>,
    /// `ALL`, `NONE`, `ENABLE_SELECTIVE`, `DISABLE_SELECTIVE` or `UNSPECIFIED`.
    #[serde(rename = "shared-cache-mode", default, skip_serializing_if = "Option::is_none")]
    pub shared_cache_mode: Option<String>,
    /// `AUTO`, `CALLBACK` or `NONE`.
    #[serde(rename = "validation-mode", default, skip_serializing_if = "Option::is_none")]
    pub validation_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
}

impl UnitModel for PersistenceUnit {
    fn name(&self) -> &str {
        &self.name
    }

    fn properties(&self) -> Option<&[Property]> {
        self.properties.as_ref().map(|p| p.property.as_slice())
    }

    fn properties_mut(&mut self) -> Option<&mut Vec<Property>> {
        self.properties.as_mut().map(|p| &mut p.property)
    }
}
