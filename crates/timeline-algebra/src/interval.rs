//! Half-open integer intervals with optional unbounded ends and attached metadata.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{AlgebraError, Result};

/// Time unit constants, in seconds.
pub const SECOND: i64 = 1;
pub const MINUTE: i64 = 60;
pub const HOUR: i64 = 3_600;
pub const DAY: i64 = 86_400;
pub const WEEK: i64 = 604_800;

/// Immutable metadata fields attached to an interval.
///
/// Cloning is cheap: the field map is shared. An empty map marks a bare
/// (mask) interval.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata(Arc<Map<String, Value>>);

impl Metadata {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(Arc::new(fields))
    }
}

impl Deref for Metadata {
    type Target = Map<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Map<String, Value>> for Metadata {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl Serialize for Metadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Metadata {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Map::deserialize(deserializer).map(Self::new)
    }
}

/// A half-open interval `[start, end)` on the integer time axis.
///
/// `None` on either side means the interval is unbounded in that direction.
/// Equality is structural over both bounds and every metadata field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub end: Option<i64>,
    #[serde(flatten)]
    pub metadata: Metadata,
}

impl Interval {
    /// Create a bare interval, rejecting empty or inverted bounded ranges.
    ///
    /// `i64::MIN` and `i64::MAX` are reserved for the unbounded sides and are
    /// rejected as explicit bounds; pass `None` instead.
    ///
    /// ```
    /// use timeline_algebra::Interval;
    ///
    /// let iv = Interval::new(0, 10).unwrap();
    /// assert_eq!(iv.duration(), Some(10));
    /// assert!(Interval::new(10, 10).is_err());
    /// assert!(Interval::new(None, 10).is_ok());
    /// assert!(Interval::new(i64::MIN, 10).is_err());
    /// ```
    pub fn new(start: impl Into<Option<i64>>, end: impl Into<Option<i64>>) -> Result<Self> {
        let interval = Self {
            start: start.into(),
            end: end.into(),
            metadata: Metadata::default(),
        };
        interval.validate()?;
        Ok(interval)
    }

    /// Check the invariants [`Interval::new`] enforces, for intervals built
    /// field by field or deserialized.
    pub fn validate(&self) -> Result<()> {
        let reserved = |bound: Option<i64>| matches!(bound, Some(i64::MIN | i64::MAX));
        if reserved(self.start) || reserved(self.end) {
            return Err(AlgebraError::InvalidArgument(format!(
                "interval {} uses a reserved bound; leave that side unbounded instead",
                self
            )));
        }
        if let (Some(s), Some(e)) = (self.start, self.end) {
            if s >= e {
                return Err(AlgebraError::InvalidInterval { start: s, end: e });
            }
        }
        Ok(())
    }

    /// Attach metadata, replacing any existing fields.
    pub fn with_metadata(mut self, metadata: impl Into<Metadata>) -> Self {
        self.metadata = metadata.into();
        self
    }

    /// A copy of this interval with new bounds and the same metadata.
    pub fn with_bounds(&self, start: Option<i64>, end: Option<i64>) -> Self {
        Self {
            start,
            end,
            metadata: self.metadata.clone(),
        }
    }

    /// Start bound with `None` mapped to `i64::MIN`.
    pub fn finite_start(&self) -> i64 {
        self.start.unwrap_or(i64::MIN)
    }

    /// End bound with `None` mapped to `i64::MAX`.
    pub fn finite_end(&self) -> i64 {
        self.end.unwrap_or(i64::MAX)
    }

    /// Sort key shared by every stream: `(start, end)` with unbounded sides as sentinels.
    pub fn key(&self) -> (i64, i64) {
        (self.finite_start(), self.finite_end())
    }

    /// Length in seconds, or `None` when either side is unbounded.
    pub fn duration(&self) -> Option<i64> {
        match (self.start, self.end) {
            (Some(s), Some(e)) => Some(e - s),
            _ => None,
        }
    }

    /// True when the interval carries no metadata.
    pub fn is_mask(&self) -> bool {
        self.metadata.is_empty()
    }

    /// True when the interval intersects the query window `[start, end)`.
    pub fn intersects(&self, start: Option<i64>, end: Option<i64>) -> bool {
        start.is_none_or(|s| self.finite_end() > s) && end.is_none_or(|e| self.finite_start() < e)
    }
}

/// Map a sentinel start back to an unbounded side.
pub(crate) fn start_bound(value: i64) -> Option<i64> {
    (value != i64::MIN).then_some(value)
}

/// Map a sentinel end back to an unbounded side.
pub(crate) fn end_bound(value: i64) -> Option<i64> {
    (value != i64::MAX).then_some(value)
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.start {
            Some(s) => write!(f, "[{}, ", s)?,
            None => write!(f, "(-inf, ")?,
        }
        match self.end {
            Some(e) => write!(f, "{})", e),
            None => write!(f, "+inf)"),
        }
    }
}
