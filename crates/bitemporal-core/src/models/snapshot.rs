//! Snapshot: one physical row-version of a business entity.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{dawn_of_time, infinity, is_infinity, AttributeValue, DateRange, Timestamp};

/// Primary key of a business entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey(pub String);

impl EntityKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

/// Identity of a snapshot within its entity: the key plus the from-bounds of
/// both axes. Two snapshots with the same identity describe the same row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotId {
    pub key: EntityKey,
    pub business_from: Option<Timestamp>,
    pub processing_from: Option<Timestamp>,
}

/// A row-version. `None` date bounds mean the axis is absent (or, for a `to`
/// bound, not yet set by the caller).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub key: EntityKey,
    pub attributes: BTreeMap<String, AttributeValue>,
    pub business_from: Option<Timestamp>,
    pub business_to: Option<Timestamp>,
    pub processing_from: Option<Timestamp>,
    pub processing_to: Option<Timestamp>,
    /// Optimistic-conflict stamp. Bumped whenever the row is superseded.
    pub version: u32,
}

impl Snapshot {
    pub fn new(key: impl Into<EntityKey>) -> Self {
        Self {
            key: key.into(),
            attributes: BTreeMap::new(),
            business_from: None,
            business_to: None,
            processing_from: None,
            processing_to: None,
            version: 0,
        }
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn with_business(mut self, from: Timestamp, to: Timestamp) -> Self {
        self.business_from = Some(from);
        self.business_to = Some(to);
        self
    }

    pub fn with_processing(mut self, from: Timestamp, to: Timestamp) -> Self {
        self.processing_from = Some(from);
        self.processing_to = Some(to);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn set_attribute(&mut self, name: &str, value: AttributeValue) {
        self.attributes.insert(name.to_string(), value);
    }

    pub fn identity(&self) -> SnapshotId {
        SnapshotId {
            key: self.key.clone(),
            business_from: self.business_from,
            processing_from: self.processing_from,
        }
    }

    /// Same row in the sense of a value-keyed index: every date bound equal.
    pub fn same_row(&self, other: &Snapshot) -> bool {
        self.key == other.key
            && self.business_from == other.business_from
            && self.business_to == other.business_to
            && self.processing_from == other.processing_from
            && self.processing_to == other.processing_to
    }

    pub fn same_from_dates(&self, other: &Snapshot) -> bool {
        self.key == other.key
            && self.business_from == other.business_from
            && self.processing_from == other.processing_from
    }

    pub fn business_start(&self) -> Timestamp {
        self.business_from.unwrap_or_else(dawn_of_time)
    }

    pub fn business_end(&self) -> Timestamp {
        self.business_to.unwrap_or_else(infinity)
    }

    pub fn business_range(&self) -> DateRange {
        DateRange::new(self.business_start(), self.business_end())
    }

    pub fn processing_range(&self) -> DateRange {
        DateRange::new(
            self.processing_from.unwrap_or_else(dawn_of_time),
            self.processing_to.unwrap_or_else(infinity),
        )
    }

    /// Still the current processing-time view.
    pub fn is_current(&self) -> bool {
        self.processing_to.map_or(true, is_infinity)
    }

    pub fn matches_business_date(&self, date: Timestamp) -> bool {
        let range = self.business_range();
        range.contains(date) || (is_infinity(date) && is_infinity(range.end))
    }

    pub fn matches_processing_date(&self, date: Timestamp) -> bool {
        let range = self.processing_range();
        range.contains(date) || (is_infinity(date) && is_infinity(range.end))
    }

    pub fn bump_version(&mut self) {
        self.version = self.version.saturating_add(1);
    }

    /// A copy destined to replace this row: same values, next version.
    pub fn successor(&self) -> Snapshot {
        let mut next = self.clone();
        next.bump_version();
        next
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn open_snapshot_is_current() {
        let s = Snapshot::new("E1");
        assert!(s.is_current());
        assert!(s.matches_business_date(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn successor_bumps_version_only() {
        let s = Snapshot::new("E1").with_attribute("qty", 5);
        let next = s.successor();
        assert_eq!(next.version, s.version + 1);
        assert_eq!(next.attributes, s.attributes);
        assert!(next.same_row(&s));
    }
}
