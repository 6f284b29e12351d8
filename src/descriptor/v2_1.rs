//! Model of the JPA 2.1 `persistence_2_1.xsd` schema.
//!
//! The unit layout is the one of 2.0; only the namespace moved to
//! `xmlns.jcp.org`.

use serde::{Deserialize, Serialize};

pub use super::v2_0::PersistenceUnit;

/// Default namespace of 2.1 documents.
pub const NAMESPACE: &str = "http://xmlns.jcp.org/xml/ns/persistence";

/// Schema location of 2.1 documents.
pub const SCHEMA_LOCATION: &str =
    "http://xmlns.jcp.org/xml/ns/persistence http://xmlns.jcp.org/xml/ns/persistence/persistence_2_1.xsd";

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
            version: "2.1".to_string(),
            xmlns: Some(NAMESPACE.to_string()),
            xmlns_xsi: Some(super::XSI_NAMESPACE.to_string()),
            schema_location: Some(SCHEMA_LOCATION.to_string()),
            units: Vec::new(),
        }
    }
}
