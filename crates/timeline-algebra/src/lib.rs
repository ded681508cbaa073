//! # timeline-algebra
//!
//! Lazy set algebra over timelines of half-open intervals `[start, end)`.
//!
//! A timeline is anything that can answer `fetch(start, end)` with an ordered
//! stream of intervals. Sources (static lists, recurrence rules) and combinators
//! (union, intersection, difference, complement, filters) all implement the same
//! [`Timeline`] trait, so expressions compose freely and evaluate on demand:
//! nothing is computed until a slice is pulled, and every combinator streams.
//!
//! ```
//! use timeline_algebra::{business_hours, timeline, Interval};
//!
//! // Monday 1970-01-05, 10:00-11:00 UTC
//! let meetings = timeline([Interval::new(381_600, 385_200).unwrap()]);
//! let free = business_hours("UTC", 9, 17).unwrap() - meetings;
//! let monday: Vec<_> = free.collect(Some(345_600), Some(432_000)).unwrap();
//! assert_eq!(monday.len(), 2);
//! assert_eq!(monday[0].end, Some(381_600));
//! ```
//!
//! ## Modules
//!
//! - [`interval`]: the interval value type and time unit constants
//! - [`timeline`](mod@timeline): the `Timeline` trait, `Node` handle and operators
//! - [`union`](mod@union), [`intersection`](mod@intersection), [`difference`], [`complement`], [`filtered`]: combinators
//! - [`property`]: properties and filters over single intervals
//! - [`recurrence`]: RFC 5545 recurrence expansion with stable phase
//! - [`windows`]: weekdays, weekends, business hours, time-of-day windows
//! - [`transform`]: buffering and gap-tolerant merging
//! - [`metrics`]: coverage and duration summaries
//! - [`bounds`]: slice bound coercion
//! - [`query`]: JSON query documents
//! - [`error`]: Error types

pub mod bounds;
pub mod complement;
pub mod difference;
pub mod dst;
pub mod error;
pub mod expr;
pub mod filtered;
pub mod intersection;
pub mod interval;
pub mod metrics;
pub mod property;
pub mod query;
pub mod recurrence;
pub mod source;
pub mod timeline;
pub mod transform;
pub mod union;
pub mod windows;

pub use bounds::{coerce_bound, Bound, Edge};
pub use dst::DstPolicy;
pub use error::{AlgebraError, Result};
pub use expr::Expr;
pub use interval::{Interval, Metadata, DAY, HOUR, MINUTE, SECOND, WEEK};
pub use property::{has_all, has_any, one_of, CmpOp, Filter, Property};
pub use query::{ExprDoc, QueryDoc};
pub use recurrence::{recurring, Frequency, RecurrenceRule, RecurringPattern};
pub use source::{timeline, StaticTimeline};
pub use timeline::{flatten, intersection, union, Intervals, Kind, Node, Timeline};
pub use transform::{buffer, merge_within};
pub use windows::{business_hours, day_of_week, time_of_day, weekdays, weekends};
