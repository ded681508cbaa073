//! Coercion of human-friendly slice bounds into the integer coordinate space.
//!
//! Accepted values: unbounded, integer Unix seconds, timezone-aware datetimes,
//! and calendar dates (UTC day boundaries). Naive datetimes and anything else are
//! rejected with [`AlgebraError::TypeConversion`] before any fetch happens.

use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use serde_json::Value;

use crate::error::{AlgebraError, Result};

/// Which side of a slice a bound sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Start,
    End,
}

impl Edge {
    fn name(self) -> &'static str {
        match self {
            Edge::Start => "start",
            Edge::End => "end",
        }
    }
}

/// A slice bound before coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    Unbounded,
    Seconds(i64),
    Aware(DateTime<FixedOffset>),
    /// A calendar date: midnight UTC as a start, the following midnight as an end.
    Date(NaiveDate),
    /// Rejected during coercion: wall-clock time without a timezone.
    Naive(NaiveDateTime),
    /// Textual bound: integer seconds, RFC 3339, or `YYYY-MM-DD`.
    Text(String),
}

impl From<i64> for Bound {
    fn from(seconds: i64) -> Self {
        Bound::Seconds(seconds)
    }
}

impl From<Option<i64>> for Bound {
    fn from(seconds: Option<i64>) -> Self {
        seconds.map_or(Bound::Unbounded, Bound::Seconds)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Bound {
    fn from(dt: DateTime<Tz>) -> Self {
        Bound::Aware(dt.fixed_offset())
    }
}

impl From<NaiveDate> for Bound {
    fn from(date: NaiveDate) -> Self {
        Bound::Date(date)
    }
}

impl From<NaiveDateTime> for Bound {
    fn from(dt: NaiveDateTime) -> Self {
        Bound::Naive(dt)
    }
}

impl From<&str> for Bound {
    fn from(text: &str) -> Self {
        Bound::Text(text.to_string())
    }
}

impl From<String> for Bound {
    fn from(text: String) -> Self {
        Bound::Text(text)
    }
}

impl Bound {
    /// Interpret a JSON value: `null`, an integer, or a string.
    pub fn from_json(value: &Value, edge: Edge) -> Result<Bound> {
        match value {
            Value::Null => Ok(Bound::Unbounded),
            Value::Number(n) => n.as_i64().map(Bound::Seconds).ok_or_else(|| {
                AlgebraError::TypeConversion(format!(
                    "{} bound must be whole seconds, got {}",
                    edge.name(),
                    n
                ))
            }),
            Value::String(s) => Ok(Bound::Text(s.clone())),
            other => Err(unsupported(edge, other)),
        }
    }
}

/// Convert a bound to integer seconds (`None` = unbounded).
///
/// ```
/// use chrono::NaiveDate;
/// use timeline_algebra::{coerce_bound, Bound, Edge};
///
/// let day = NaiveDate::from_ymd_opt(1970, 1, 2).unwrap();
/// assert_eq!(coerce_bound(&day.into(), Edge::Start).unwrap(), Some(86_400));
/// assert_eq!(coerce_bound(&day.into(), Edge::End).unwrap(), Some(172_800));
/// assert!(coerce_bound(&Bound::Text("noon".into()), Edge::Start).is_err());
/// ```
pub fn coerce_bound(bound: &Bound, edge: Edge) -> Result<Option<i64>> {
    match bound {
        Bound::Unbounded => Ok(None),
        Bound::Seconds(s) => Ok(Some(*s)),
        Bound::Aware(dt) => Ok(Some(dt.timestamp())),
        Bound::Date(date) => date_seconds(*date, edge).map(Some),
        Bound::Naive(dt) => Err(naive(edge, dt)),
        Bound::Text(text) => coerce_text(text.trim(), edge),
    }
}

fn coerce_text(text: &str, edge: Edge) -> Result<Option<i64>> {
    if let Ok(seconds) = text.parse::<i64>() {
        return Ok(Some(seconds));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(Some(dt.timestamp()));
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date_seconds(date, edge).map(Some);
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Err(naive(edge, &dt));
        }
    }
    Err(unsupported(edge, text))
}

fn date_seconds(date: NaiveDate, edge: Edge) -> Result<i64> {
    let day = match edge {
        Edge::Start => Some(date),
        Edge::End => date.checked_add_days(Days::new(1)),
    };
    day.map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc().timestamp())
        .ok_or_else(|| AlgebraError::TypeConversion(format!("date {} is out of range", date)))
}

fn naive(edge: Edge, dt: &NaiveDateTime) -> AlgebraError {
    AlgebraError::TypeConversion(format!(
        "timeline slice {} bound must be timezone-aware, got naive datetime {}. \
         Add an offset (e.g. {}Z or {}+02:00) or pass Unix seconds",
        edge.name(),
        dt,
        dt.format("%Y-%m-%dT%H:%M:%S"),
        dt.format("%Y-%m-%dT%H:%M:%S"),
    ))
}

fn unsupported(edge: Edge, value: impl std::fmt::Display) -> AlgebraError {
    AlgebraError::TypeConversion(format!(
        "timeline slice {} bound must be integer seconds, a timezone-aware datetime, \
         a date, or unbounded; got {}. Examples: 1735689600, \
         2025-01-01T00:00:00Z, 2025-01-01",
        edge.name(),
        value
    ))
}
