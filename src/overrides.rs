//! The property override set driving a descriptor merge.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::{Error, Result};

/// Replacement values for descriptor properties, keyed by property name.
///
/// A non-empty value updates (or adds) the property; an empty value removes
/// it. The set is loaded once per run and only ever read; every merge takes
/// its own private copy. Keys iterate in sorted order, which is also the
/// order in which new properties are appended to a unit.
///
/// # Example
///
/// ```
/// use persistence_patcher::OverrideSet;
///
/// let overrides: OverrideSet = [
///     ("hibernate.show_sql", "false"),
///     ("hibernate.hbm2ddl.auto", ""),
/// ]
/// .into_iter()
/// .collect();
///
/// assert_eq!(overrides.get("hibernate.show_sql"), Some("false"));
/// assert_eq!(overrides.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideSet {
    values: BTreeMap<String, String>,
}

impl OverrideSet {
    /// Creates an empty override set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads overrides from a Java `.properties` file.
    ///
    /// The usual properties syntax applies (`key=value`, `key: value`,
    /// `#`/`!` comments, line continuations, `\uXXXX` escapes).
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingPropertiesSource`] if `path` is empty, does
    /// not name a regular file, or cannot be parsed.
    pub fn from_properties_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let missing = |reason: String| Error::MissingPropertiesSource {
            path: path.display().to_string(),
            reason,
        };

        if path.as_os_str().is_empty() {
            return Err(missing("no properties file configured".into()));
        }
        if !path.is_file() {
            return Err(missing("file does not exist".into()));
        }

        let file = File::open(path).map_err(|e| missing(e.to_string()))?;
        let values = java_properties::read(BufReader::new(file)).map_err(|e| missing(e.to_string()))?;

        let overrides: Self = values.into_iter().collect();
        for (key, value) in overrides.iter() {
            log::debug!("property: {} new value: {}", key, value);
        }
        log::info!(
            "Loaded {} property overrides from '{}'",
            overrides.len(),
            path.display()
        );
        Ok(overrides)
    }

    /// Returns the replacement for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Returns true if `key` has an override.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterates over `(key, value)` pairs in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of overrides.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no overrides.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns true if no override removes a property.
    pub fn is_non_deleting(&self) -> bool {
        self.values.values().all(|v| !v.is_empty())
    }

    /// Returns a private, mutable copy of the map for one merge.
    pub(crate) fn working_copy(&self) -> BTreeMap<String, String> {
        self.values.clone()
    }
}

impl<K, V> FromIterator<(K, V)> for OverrideSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
