//! Feature snapshots and the provider seam.
//!
//! A snapshot is the read-only, fixed-date view of every entity's raw
//! signals. The engine never fetches or persists data itself; it asks a
//! [`FeatureSource`] for the rows of one as-of date.

use crate::{RankError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One entity's raw signals at a fixed as-of date.
///
/// Fields are keyed by their physical name (`r5`, `vol20`, `news7`, ...).
/// A field that is absent or null is simply not present in `values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    /// Entity identifier
    pub code: String,
    /// Display name
    pub name: String,
    /// Raw signal values by field name
    pub values: BTreeMap<String, f64>,
}

impl FeatureRow {
    /// Create a row with no signal values.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            values: BTreeMap::new(),
        }
    }

    /// Builder-style setter for one field.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: f64) -> Self {
        self.values.insert(field.into(), value);
        self
    }

    /// Read a field, treating absence as 0.0.
    pub fn value(&self, field: &str) -> f64 {
        self.values.get(field).copied().unwrap_or(0.0)
    }
}

/// All feature rows for one as-of date together with the snapshot schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSnapshot {
    /// Date the snapshot applies to
    pub as_of: Option<NaiveDate>,
    /// Field names physically present in this snapshot
    pub fields: BTreeSet<String>,
    /// Rows in provider order
    pub rows: Vec<FeatureRow>,
}

impl FeatureSnapshot {
    /// Build a snapshot whose schema is the union of the rows' fields.
    pub fn new(as_of: NaiveDate, rows: Vec<FeatureRow>) -> Self {
        let fields = rows
            .iter()
            .flat_map(|r| r.values.keys().cloned())
            .collect();
        Self {
            as_of: Some(as_of),
            fields,
            rows,
        }
    }

    /// Build a snapshot with an explicit schema.
    ///
    /// Useful when the store defines a column that happens to be null for
    /// every row on this date.
    pub fn with_schema(
        as_of: NaiveDate,
        fields: impl IntoIterator<Item = impl Into<String>>,
        rows: Vec<FeatureRow>,
    ) -> Self {
        Self {
            as_of: Some(as_of),
            fields: fields.into_iter().map(Into::into).collect(),
            rows,
        }
    }

    /// An empty snapshot for a date with no data.
    pub const fn empty() -> Self {
        Self {
            as_of: None,
            fields: BTreeSet::new(),
            rows: Vec::new(),
        }
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the provider had no rows for the date.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True when `field` is part of the snapshot schema.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains(field)
    }
}

/// Read-only provider of feature snapshots.
///
/// Implementations must return an empty snapshot, not an error, when no data
/// exists for the requested date.
pub trait FeatureSource: Send + Sync + std::fmt::Debug {
    /// All rows for `as_of`.
    fn features(&self, as_of: NaiveDate) -> Result<FeatureSnapshot>;

    /// Most recent date with data, if any.
    fn latest_as_of(&self) -> Result<Option<NaiveDate>>;
}

/// Date-keyed in-memory provider.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    snapshots: BTreeMap<NaiveDate, FeatureSnapshot>,
}

impl MemorySource {
    /// Create an empty provider.
    pub const fn new() -> Self {
        Self {
            snapshots: BTreeMap::new(),
        }
    }

    /// Store a snapshot under its as-of date, replacing any previous one.
    ///
    /// Snapshots without a date are ignored.
    pub fn insert(&mut self, snapshot: FeatureSnapshot) {
        if let Some(as_of) = snapshot.as_of {
            self.snapshots.insert(as_of, snapshot);
        }
    }

    /// Builder-style [`MemorySource::insert`].
    #[must_use]
    pub fn with_snapshot(mut self, snapshot: FeatureSnapshot) -> Self {
        self.insert(snapshot);
        self
    }
}

impl FeatureSource for MemorySource {
    fn features(&self, as_of: NaiveDate) -> Result<FeatureSnapshot> {
        Ok(self
            .snapshots
            .get(&as_of)
            .cloned()
            .unwrap_or_else(FeatureSnapshot::empty))
    }

    fn latest_as_of(&self) -> Result<Option<NaiveDate>> {
        Ok(self
            .snapshots
            .iter()
            .rev()
            .find(|(_, s)| !s.is_empty())
            .map(|(d, _)| *d))
    }
}

/// Parse `YYYYMMDD` or `YYYY-MM-DD`.
pub fn parse_as_of(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(s, "%Y%m%d").ok();
    }
    if s.len() == 10 {
        return NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();
    }
    None
}

/// Strict variant of [`parse_as_of`] for configuration and CLI input.
pub fn require_as_of(s: &str) -> Result<NaiveDate> {
    parse_as_of(s).ok_or_else(|| RankError::InvalidDate(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case("20251218", Some(date(2025, 12, 18)))]
    #[case("2025-12-18", Some(date(2025, 12, 18)))]
    #[case(" 2025-12-18 ", Some(date(2025, 12, 18)))]
    #[case("2025/12/18", None)]
    #[case("20251318", None)]
    #[case("", None)]
    fn test_parse_as_of(#[case] input: &str, #[case] expected: Option<NaiveDate>) {
        assert_eq!(parse_as_of(input), expected);
    }

    #[test]
    fn test_require_as_of_reports_input() {
        let err = require_as_of("yesterday").unwrap_err();
        assert!(err.to_string().contains("yesterday"));
    }

    #[test]
    fn test_missing_field_reads_zero() {
        let row = FeatureRow::new("005930", "Samsung").with("r5", 1.5);
        assert_eq!(row.value("r5"), 1.5);
        assert_eq!(row.value("r20"), 0.0);
    }

    #[test]
    fn test_snapshot_schema_is_union_of_rows() {
        let snap = FeatureSnapshot::new(
            date(2024, 1, 2),
            vec![
                FeatureRow::new("A", "a").with("r5", 1.0),
                FeatureRow::new("B", "b").with("vol20", 2.0),
            ],
        );
        assert!(snap.has_field("r5"));
        assert!(snap.has_field("vol20"));
        assert!(!snap.has_field("mdd20"));
        assert_eq!(snap.len(), 2);
    }

    #[test]
    fn test_memory_source_missing_date_is_empty() {
        let source = MemorySource::new().with_snapshot(FeatureSnapshot::new(
            date(2024, 1, 2),
            vec![FeatureRow::new("A", "a")],
        ));
        assert!(source.features(date(2024, 1, 3)).unwrap().is_empty());
        assert_eq!(source.features(date(2024, 1, 2)).unwrap().len(), 1);
    }

    #[test]
    fn test_memory_source_latest_skips_empty_snapshots() {
        let source = MemorySource::new()
            .with_snapshot(FeatureSnapshot::new(
                date(2024, 1, 2),
                vec![FeatureRow::new("A", "a")],
            ))
            .with_snapshot(FeatureSnapshot::new(date(2024, 1, 5), Vec::new()));
        assert_eq!(source.latest_as_of().unwrap(), Some(date(2024, 1, 2)));
        assert_eq!(MemorySource::new().latest_as_of().unwrap(), None);
    }
}
