//! Packaging types and where each keeps its descriptor.

use std::fmt;
use std::str::FromStr;

use crate::locate::SearchPattern;
use crate::{Error, Result};

/// Archive packaging types that can carry a persistence descriptor.
///
/// `jar` and `war` are leaf archives holding the descriptor directly;
/// `ear` is a container holding leaf archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Packaging {
    /// EJB or plain jar: `META-INF/persistence.xml`.
    Jar,
    /// Web archive: `WEB-INF/classes/META-INF/persistence.xml`.
    War,
    /// Enterprise archive containing jars and wars.
    Ear,
}

impl Packaging {
    /// Returns the packaging name, which is also the file extension.
    pub fn as_str(self) -> &'static str {
        match self {
            Packaging::Jar => "jar",
            Packaging::War => "war",
            Packaging::Ear => "ear",
        }
    }

    /// Returns where the descriptor lives inside a leaf archive.
    ///
    /// Containers have no descriptor of their own.
    pub fn descriptor_entry(self) -> Option<&'static str> {
        match self {
            Packaging::Jar => Some("META-INF/persistence.xml"),
            Packaging::War => Some("WEB-INF/classes/META-INF/persistence.xml"),
            Packaging::Ear => None,
        }
    }

    /// Returns true for container archives.
    pub fn is_container(self) -> bool {
        matches!(self, Packaging::Ear)
    }

    /// Patterns classifying the leaf archives found inside a container.
    pub fn leaf_patterns() -> Result<Vec<SearchPattern<Packaging>>> {
        Ok(vec![
            SearchPattern::new(r"\.jar$", Packaging::Jar)?,
            SearchPattern::new(r"\.war$", Packaging::War)?,
        ])
    }
}

impl FromStr for Packaging {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "jar" => Ok(Packaging::Jar),
            "war" => Ok(Packaging::War),
            "ear" => Ok(Packaging::Ear),
            other => Err(Error::UnsupportedPackaging {
                packaging: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Packaging {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
