//! Model of the JPA 1.0 `persistence_1_0.xsd` schema.

use serde::{Deserialize, Serialize};

use super::UnitModel;
use super::merge::{Properties, Property};

/// Default namespace of 1.0 documents.
pub const NAMESPACE: &str = "http://java.sun.com/xml/ns/persistence";

/// Schema location of 1.0 documents.
pub const SCHEMA_LOCATION: &str =
    "http://java.sun.com/xml/ns/persistence http://java.sun.com/xml/ns/persistence/persistence_1_0.xsd";

/// The `<persistence>` root element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "persistence")]
pub struct Persistence {
    /// The `version` attribute.
    #[serde(rename = "@version")]
    pub version: String,
    /// Default namespace declaration.
    #[serde(rename = "@xmlns", default, skip_serializing_if = "Option::is_none")]
    pub xmlns: Option<String>,
    /// `xsi` prefix declaration.
    #[serde(rename = "@xmlns:xsi", default, skip_serializing_if = "Option::is_none")]
    pub xmlns_xsi: Option<String>,
    /// The `xsi:schemaLocation` attribute.
    #[serde(
        rename(serialize = "@xsi:schemaLocation", deserialize = "@schemaLocation"),
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub schema_location: Option<String>,
    /// The persistence units.
    #[serde(rename = "persistence-unit", default)]
    pub units: Vec<PersistenceUnit>,
}

impl Default for Persistence {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            xmlns: Some(NAMESPACE.to_string()),
            xmlns_xsi: Some(super::XSI_NAMESPACE.to_string()),
            schema_location: Some(SCHEMA_LOCATION.to_string()),
            units: Vec::new(),
        }
    }
}

/// A `<persistence-unit>` in schema order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistenceUnit {
    /// The unit name.
    #[serde(rename = "@name")]
    pub name: String,
    /// `JTA` or `RESOURCE_LOCAL`.
    #[serde(rename = "@transaction-type", default, skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<String>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Provider class name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// JNDI name of the JTA data source.
    #[serde(rename = "jta-data-source", default, skip_serializing_if = "Option::is_none")]
    pub jta_data_source: Option<String>,
    /// JNDI name of the non-JTA data source.
    #[serde(rename = "non-jta-data-source", default, skip_serializing_if = "Option::is_none")]
    pub non_jta_data_source: Option<String>,
    /// `orm.xml`-style mapping files.
    #[serde(rename = "mapping-file", default, skip_serializing_if = "Vec::is_empty")]
    pub mapping_files: Vec<String>,
    /// Additional jars to scan for entities.
    #[serde(rename = "jar-file", default, skip_serializing_if = "Vec::is_empty")]
    pub jar_files: Vec<String>,
    /// Listed managed classes.
    #[serde(rename = "class", default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    /// Kept verbatim; an empty element means `true`.
    #[serde(rename = "exclude-unlisted-classes", default, skip_serializing_if = "Option::is_none")]
    pub exclude_unlisted_classes: Option<String>,
    /// Vendor and standard properties.
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
