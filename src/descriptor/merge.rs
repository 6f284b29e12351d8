//! Reconciling a unit's property list against an override set.

use std::collections::HashSet;
use std::fmt;
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::OverrideSet;

/// One `<property name=".." value=".."/>` of a persistence unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// Property key.
    #[serde(rename = "@name")]
    pub name: String,
    /// Property value.
    #[serde(rename = "@value")]
    pub value: String,
}

impl Property {
    /// Creates a property.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The `<properties>` container of a persistence unit.
///
/// The element layout is identical in every schema version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Properties {
    /// The properties, in document order.
    #[serde(rename = "property", default)]
    pub property: Vec<Property>,
}

/// Counts of what a merge did to the properties it saw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MergeStats {
    /// Existing properties that received a new value.
    pub updated: usize,
    /// Properties appended because they were not present.
    pub inserted: usize,
    /// Properties removed by an empty override or as duplicate keys.
    pub deleted: usize,
    /// Existing properties left as they were.
    pub unchanged: usize,
}

impl MergeStats {
    /// Returns the number of properties that were modified.
    pub fn changed(&self) -> usize {
        self.updated + self.inserted + self.deleted
    }

    /// Returns true if the merge left every property as it was.
    pub fn is_noop(&self) -> bool {
        self.changed() == 0
    }
}

impl AddAssign for MergeStats {
    fn add_assign(&mut self, rhs: Self) {
        self.updated += rhs.updated;
        self.inserted += rhs.inserted;
        self.deleted += rhs.deleted;
        self.unchanged += rhs.unchanged;
    }
}

impl fmt::Display for MergeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} updated, {} inserted, {} deleted, {} unchanged",
            self.updated, self.inserted, self.deleted, self.unchanged
        )
    }
}

/// What happens to an existing property.
enum Fate {
    Keep,
    Update(String),
    Drop,
}

/// Merges `overrides` into one unit's property list.
///
/// The list is snapshotted, every existing property is classified against a
/// private copy of the overrides, and the result is materialized in one
/// pass:
///
/// 1. A property whose key has an override is updated in place, or dropped
///    if the override is empty. The key is then consumed.
/// 2. Overrides never consumed are appended in key order; empty ones are
///    ignored since there is nothing to remove.
/// 3. Repeated keys collapse to their first occurrence, so keys are unique
///    afterwards.
///
/// ```
/// use persistence_patcher::OverrideSet;
/// use persistence_patcher::descriptor::{Property, merge_properties};
///
/// let mut properties = vec![Property::new("a", "1"), Property::new("c", "4")];
/// let overrides: OverrideSet = [("a", ""), ("b", "3")].into_iter().collect();
///
/// let stats = merge_properties(&mut properties, &overrides);
/// assert_eq!(properties, vec![Property::new("c", "4"), Property::new("b", "3")]);
/// assert_eq!((stats.deleted, stats.inserted, stats.unchanged), (1, 1, 1));
/// ```
pub fn merge_properties(properties: &mut Vec<Property>, overrides: &OverrideSet) -> MergeStats {
    let snapshot = std::mem::take(properties);
    let mut pending = overrides.working_copy();
    let mut seen = HashSet::with_capacity(snapshot.len());

    let classified: Vec<(Property, Fate)> = snapshot
        .into_iter()
        .map(|property| {
            if !seen.insert(property.name.clone()) {
                log::debug!("dropping duplicate property '{}'", property.name);
                return (property, Fate::Drop);
            }
            let fate = match pending.remove(&property.name) {
                None => Fate::Keep,
                Some(value) if value.is_empty() => Fate::Drop,
                Some(value) if value == property.value => Fate::Keep,
                Some(value) => Fate::Update(value),
            };
            (property, fate)
        })
        .collect();

    let mut stats = MergeStats::default();
    for (mut property, fate) in classified {
        match fate {
            Fate::Keep => {
                stats.unchanged += 1;
                properties.push(property);
            }
            Fate::Update(value) => {
                log::debug!(
                    "property '{}': '{}' -> '{}'",
                    property.name,
                    property.value,
                    value
                );
                property.value = value;
                stats.updated += 1;
                properties.push(property);
            }
            Fate::Drop => stats.deleted += 1,
        }
    }

    for (name, value) in pending {
        if value.is_empty() {
            continue;
        }
        log::debug!("property '{}': added with '{}'", name, value);
        properties.push(Property { name, value });
        stats.inserted += 1;
    }

    stats
}
