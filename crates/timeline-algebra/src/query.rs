//! JSON query documents: an expression tree plus slice bounds.
//!
//! ```json
//! {
//!   "start": "2025-01-06",
//!   "end": "2025-01-10",
//!   "expr": {
//!     "op": "difference",
//!     "source": { "op": "recurring", "rule": { "freq": "daily", "start": 32400, "duration": 28800 } },
//!     "subtract": [{ "op": "intervals", "intervals": [{ "start": 1736157600, "end": 1736161200, "title": "sync" }] }]
//!   }
//! }
//! ```
//!
//! Documents are built through [`Expr`], so mixing a timeline and a filter under
//! an operator that has no meaning for them fails with a composition error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bounds::{coerce_bound, Bound, Edge};
use crate::error::{AlgebraError, Result};
use crate::expr::Expr;
use crate::intersection::Intersection;
use crate::interval::Interval;
use crate::property::{self, CmpOp, Filter, Property};
use crate::recurrence::{recurring, RecurrenceRule};
use crate::source::timeline;
use crate::timeline::{flatten, Node};
use crate::transform::{buffer, merge_within};

/// A property reference: `"start"`, `"hours"`, or `{"field": "tags"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyDoc {
    Start,
    End,
    Seconds,
    Minutes,
    Hours,
    Days,
    Field(String),
}

impl From<&PropertyDoc> for Property {
    fn from(doc: &PropertyDoc) -> Self {
        match doc {
            PropertyDoc::Start => property::start(),
            PropertyDoc::End => property::end(),
            PropertyDoc::Seconds => property::seconds(),
            PropertyDoc::Minutes => property::minutes(),
            PropertyDoc::Hours => property::hours(),
            PropertyDoc::Days => property::days(),
            PropertyDoc::Field(name) => property::field(name.clone()),
        }
    }
}

/// One node of a query expression, tagged by `op`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ExprDoc {
    Intervals {
        intervals: Vec<Interval>,
    },
    Recurring {
        rule: RecurrenceRule,
    },
    Union {
        of: Vec<ExprDoc>,
    },
    Intersection {
        of: Vec<ExprDoc>,
    },
    Difference {
        source: Box<ExprDoc>,
        subtract: Vec<ExprDoc>,
    },
    Complement {
        of: Box<ExprDoc>,
    },
    Flatten {
        of: Box<ExprDoc>,
    },
    Buffer {
        of: Box<ExprDoc>,
        #[serde(default)]
        before: i64,
        #[serde(default)]
        after: i64,
    },
    MergeWithin {
        of: Box<ExprDoc>,
        gap: i64,
    },
    Compare {
        property: PropertyDoc,
        cmp: CmpOp,
        value: Value,
    },
    OneOf {
        property: PropertyDoc,
        values: Vec<Value>,
    },
    HasAny {
        property: PropertyDoc,
        values: Vec<Value>,
    },
    HasAll {
        property: PropertyDoc,
        values: Vec<Value>,
    },
}

impl ExprDoc {
    pub fn build(&self) -> Result<Expr> {
        Ok(match self {
            ExprDoc::Intervals { intervals } => {
                intervals.iter().try_for_each(Interval::validate)?;
                Expr::Timeline(timeline(intervals.iter().cloned()))
            }
            ExprDoc::Recurring { rule } => Expr::Timeline(recurring(rule.clone())?),
            ExprDoc::Union { of } => {
                let mut operands = of.iter().map(ExprDoc::build);
                let first = operands.next().ok_or_else(|| {
                    AlgebraError::InvalidArgument("union needs at least one operand".to_string())
                })??;
                operands.try_fold(first, |acc, next| acc.union(next?))?
            }
            ExprDoc::Intersection { of } => {
                let mut operands = of.iter().map(ExprDoc::build);
                match operands.next() {
                    None => Expr::Timeline(Node::new(Intersection::new(Vec::new()))),
                    Some(first) => operands.try_fold(first?, |acc, next| acc.and(next?))?,
                }
            }
            ExprDoc::Difference { source, subtract } => subtract
                .iter()
                .try_fold(source.build()?, |acc, next| acc.difference(next.build()?))?,
            ExprDoc::Complement { of } => of.build()?.complement()?,
            ExprDoc::Flatten { of } => Expr::Timeline(flatten(of.build()?.into_timeline()?)),
            ExprDoc::Buffer { of, before, after } => {
                Expr::Timeline(buffer(of.build()?.into_timeline()?, *before, *after)?)
            }
            ExprDoc::MergeWithin { of, gap } => {
                Expr::Timeline(merge_within(of.build()?.into_timeline()?, *gap)?)
            }
            ExprDoc::Compare {
                property,
                cmp,
                value,
            } => Expr::Filter(Filter::Compare {
                property: property.into(),
                op: *cmp,
                value: value.clone(),
            }),
            ExprDoc::OneOf { property, values } => Expr::Filter(Filter::OneOf {
                property: property.into(),
                values: values.clone(),
            }),
            ExprDoc::HasAny { property, values } => Expr::Filter(Filter::HasAny {
                property: property.into(),
                values: values.clone(),
            }),
            ExprDoc::HasAll { property, values } => Expr::Filter(Filter::HasAll {
                property: property.into(),
                values: values.clone(),
            }),
        })
    }
}

/// A complete query: what to evaluate and over which window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDoc {
    pub expr: ExprDoc,
    /// `null`, integer seconds, RFC 3339, or `YYYY-MM-DD`.
    #[serde(default)]
    pub start: Value,
    #[serde(default)]
    pub end: Value,
}

impl QueryDoc {
    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The window in integer seconds; `None` sides are unbounded.
    pub fn bounds(&self) -> Result<(Option<i64>, Option<i64>)> {
        let start = coerce_bound(&Bound::from_json(&self.start, Edge::Start)?, Edge::Start)?;
        let end = coerce_bound(&Bound::from_json(&self.end, Edge::End)?, Edge::End)?;
        Ok((start, end))
    }

    /// The expression as a timeline; a bare filter is a composition error.
    pub fn timeline(&self) -> Result<Node> {
        self.expr.build()?.into_timeline()
    }

    pub fn evaluate(&self) -> Result<Vec<Interval>> {
        let (start, end) = self.bounds()?;
        self.timeline()?.collect(start, end)
    }
}
