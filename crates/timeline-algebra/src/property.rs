//! Properties and filters: predicates evaluated against a single interval.
//!
//! A [`Property`] extracts a JSON value from an interval (a bound, a scaled
//! duration, a metadata field, or anything a closure computes). Comparing a
//! property with a value yields a [`Filter`]; filters compose with `&` and `|`,
//! and `timeline & filter` keeps only the intervals the filter accepts.
//!
//! ```
//! use timeline_algebra::{has_any, property, timeline, Interval};
//!
//! let meetings = timeline([
//!     Interval::new(0, 1800).unwrap().with_metadata(
//!         [("tags", serde_json::json!(["work"]))].into_iter().collect::<timeline_algebra::Metadata>(),
//!     ),
//!     Interval::new(3600, 10800).unwrap(),
//! ]);
//! let long = meetings.clone() & property::hours().ge(1);
//! assert_eq!(long.collect(None, None).unwrap().len(), 1);
//! let work = meetings & has_any(property::field("tags"), ["work"]);
//! assert_eq!(work.collect(None, None).unwrap()[0].start, Some(0));
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::ops::{BitAnd, BitOr};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::interval::{Interval, DAY, HOUR, MINUTE, SECOND};

type Getter = Arc<dyn Fn(&Interval) -> Value + Send + Sync>;
type Predicate = Arc<dyn Fn(&Interval) -> bool + Send + Sync>;

/// A value extracted from an interval.
#[derive(Clone)]
pub enum Property {
    /// Start bound; `null` when unbounded.
    Start,
    /// End bound; `null` when unbounded.
    End,
    /// Length divided by the given number of seconds; `f64::MAX` when unbounded.
    Duration(i64),
    /// A metadata field by name; `null` when absent.
    Field(String),
    Getter(Getter),
}

pub fn start() -> Property {
    Property::Start
}

pub fn end() -> Property {
    Property::End
}

pub fn seconds() -> Property {
    Property::Duration(SECOND)
}

pub fn minutes() -> Property {
    Property::Duration(MINUTE)
}

pub fn hours() -> Property {
    Property::Duration(HOUR)
}

pub fn days() -> Property {
    Property::Duration(DAY)
}

pub fn field(name: impl Into<String>) -> Property {
    Property::Field(name.into())
}

/// A property computed by a closure.
pub fn getter(f: impl Fn(&Interval) -> Value + Send + Sync + 'static) -> Property {
    Property::Getter(Arc::new(f))
}

impl Property {
    pub fn value(&self, interval: &Interval) -> Value {
        match self {
            Property::Start => interval.start.map_or(Value::Null, Value::from),
            Property::End => interval.end.map_or(Value::Null, Value::from),
            Property::Duration(scale) => {
                let length = interval
                    .duration()
                    .map_or(f64::MAX, |d| d as f64 / *scale as f64);
                Value::from(length)
            }
            Property::Field(name) => interval.metadata.get(name).cloned().unwrap_or(Value::Null),
            Property::Getter(f) => f(interval),
        }
    }

    fn compare(self, op: CmpOp, value: impl Into<Value>) -> Filter {
        Filter::Compare {
            property: self,
            op,
            value: value.into(),
        }
    }

    pub fn eq(self, value: impl Into<Value>) -> Filter {
        self.compare(CmpOp::Eq, value)
    }

    pub fn ne(self, value: impl Into<Value>) -> Filter {
        self.compare(CmpOp::Ne, value)
    }

    pub fn lt(self, value: impl Into<Value>) -> Filter {
        self.compare(CmpOp::Lt, value)
    }

    pub fn le(self, value: impl Into<Value>) -> Filter {
        self.compare(CmpOp::Le, value)
    }

    pub fn gt(self, value: impl Into<Value>) -> Filter {
        self.compare(CmpOp::Gt, value)
    }

    pub fn ge(self, value: impl Into<Value>) -> Filter {
        self.compare(CmpOp::Ge, value)
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::Start => write!(f, "start"),
            Property::End => write!(f, "end"),
            Property::Duration(scale) => write!(f, "duration/{}", scale),
            Property::Field(name) => write!(f, "field({:?})", name),
            Property::Getter(_) => write!(f, "getter(..)"),
        }
    }
}

/// Comparison operator, serialized as its symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
}

impl CmpOp {
    pub fn evaluate(self, left: &Value, right: &Value) -> bool {
        match self {
            CmpOp::Eq => values_equal(left, right),
            CmpOp::Ne => !values_equal(left, right),
            CmpOp::Lt => order(left, right) == Some(Ordering::Less),
            CmpOp::Le => matches!(order(left, right), Some(Ordering::Less | Ordering::Equal)),
            CmpOp::Gt => order(left, right) == Some(Ordering::Greater),
            CmpOp::Ge => matches!(
                order(left, right),
                Some(Ordering::Greater | Ordering::Equal)
            ),
        }
    }
}

/// Numbers compare by value regardless of integer or float representation.
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left.as_f64(), right.as_f64()) {
        (Some(l), Some(r)) => l == r,
        _ => left == right,
    }
}

/// Ordering between two numbers or two strings; anything else is unordered.
fn order(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(_), Value::Number(_)) => left.as_f64()?.partial_cmp(&right.as_f64()?),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

/// A predicate over one interval.
#[derive(Clone)]
pub enum Filter {
    Compare {
        property: Property,
        op: CmpOp,
        value: Value,
    },
    /// The property value equals one of `values`.
    OneOf { property: Property, values: Vec<Value> },
    /// The property is an array sharing at least one element with `values`.
    HasAny { property: Property, values: Vec<Value> },
    /// The property is an array containing every element of `values`.
    HasAll { property: Property, values: Vec<Value> },
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Predicate(Predicate),
}

impl Filter {
    /// A filter backed by an arbitrary closure.
    pub fn predicate(f: impl Fn(&Interval) -> bool + Send + Sync + 'static) -> Self {
        Filter::Predicate(Arc::new(f))
    }

    pub fn apply(&self, interval: &Interval) -> bool {
        match self {
            Filter::Compare {
                property,
                op,
                value,
            } => op.evaluate(&property.value(interval), value),
            Filter::OneOf { property, values } => {
                let actual = property.value(interval);
                values.iter().any(|v| values_equal(&actual, v))
            }
            Filter::HasAny { property, values } => match property.value(interval) {
                Value::Array(items) => items
                    .iter()
                    .any(|item| values.iter().any(|v| values_equal(item, v))),
                _ => false,
            },
            Filter::HasAll { property, values } => match property.value(interval) {
                Value::Array(items) => values
                    .iter()
                    .all(|v| items.iter().any(|item| values_equal(item, v))),
                _ => false,
            },
            Filter::And(filters) => filters.iter().all(|f| f.apply(interval)),
            Filter::Or(filters) => filters.iter().any(|f| f.apply(interval)),
            Filter::Predicate(f) => f(interval),
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Compare {
                property,
                op,
                value,
            } => write!(f, "{:?} {:?} {}", property, op, value),
            Filter::OneOf { property, values } => write!(f, "one_of({:?}, {:?})", property, values),
            Filter::HasAny { property, values } => write!(f, "has_any({:?}, {:?})", property, values),
            Filter::HasAll { property, values } => write!(f, "has_all({:?}, {:?})", property, values),
            Filter::And(filters) => f.debug_tuple("And").field(filters).finish(),
            Filter::Or(filters) => f.debug_tuple("Or").field(filters).finish(),
            Filter::Predicate(_) => write!(f, "predicate(..)"),
        }
    }
}

impl BitAnd for Filter {
    type Output = Filter;

    fn bitand(self, rhs: Filter) -> Filter {
        match self {
            Filter::And(mut filters) => {
                filters.push(rhs);
                Filter::And(filters)
            }
            lhs => Filter::And(vec![lhs, rhs]),
        }
    }
}

impl BitOr for Filter {
    type Output = Filter;

    fn bitor(self, rhs: Filter) -> Filter {
        match self {
            Filter::Or(mut filters) => {
                filters.push(rhs);
                Filter::Or(filters)
            }
            lhs => Filter::Or(vec![lhs, rhs]),
        }
    }
}

fn collect_values<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Vec<Value> {
    values.into_iter().map(Into::into).collect()
}

/// Match when the property equals any of `values`.
pub fn one_of<V: Into<Value>>(property: Property, values: impl IntoIterator<Item = V>) -> Filter {
    Filter::OneOf {
        property,
        values: collect_values(values),
    }
}

/// Match when an array-valued property contains any of `values`.
pub fn has_any<V: Into<Value>>(property: Property, values: impl IntoIterator<Item = V>) -> Filter {
    Filter::HasAny {
        property,
        values: collect_values(values),
    }
}

/// Match when an array-valued property contains all of `values`.
pub fn has_all<V: Into<Value>>(property: Property, values: impl IntoIterator<Item = V>) -> Filter {
    Filter::HasAll {
        property,
        values: collect_values(values),
    }
}
