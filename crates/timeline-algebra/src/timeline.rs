//! The `Timeline` abstraction and the `Node` handle used to compose expressions.
//!
//! Every source and combinator implements [`Timeline`]: a single `fetch(start, end)`
//! returning intervals ordered by `(start, end)`. Nodes are immutable; the operators
//! on [`Node`] always build a new node.
//!
//! | Operator | Result                         |
//! |----------|--------------------------------|
//! | `a \| b` | [`Union`]                      |
//! | `a & b`  | [`Intersection`] (flattened)   |
//! | `a & f`  | [`Filtered`] (`f` a [`Filter`])|
//! | `a - b`  | [`Difference`]                 |
//! | `!a`     | [`Complement`]                 |

use std::fmt;
use std::ops::{BitAnd, BitOr, Not, Sub};
use std::sync::Arc;

use crate::bounds::{coerce_bound, Bound, Edge};
use crate::complement::Complement;
use crate::difference::Difference;
use crate::error::{AlgebraError, Result};
use crate::filtered::Filtered;
use crate::intersection::Intersection;
use crate::interval::Interval;
use crate::property::Filter;
use crate::union::Union;

/// A lazily produced, ordered stream of intervals.
pub type Intervals<'a> = Box<dyn Iterator<Item = Interval> + 'a>;

/// Whether a timeline yields bare coordinates or metadata-carrying intervals.
///
/// Computed once per node from its children, never inferred from the items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Bare intervals with no metadata.
    Mask,
    /// Intervals carrying metadata.
    Rich,
}

impl Kind {
    /// `Mask` only when every kind is `Mask`.
    pub fn combine(kinds: impl IntoIterator<Item = Kind>) -> Kind {
        if kinds.into_iter().all(|k| k == Kind::Mask) {
            Kind::Mask
        } else {
            Kind::Rich
        }
    }
}

/// A source of ordered intervals.
///
/// Implementations keep all sweep state inside the returned iterator, never on
/// `self`, so `fetch` may be called any number of times.
pub trait Timeline: Send + Sync {
    /// Yield intervals intersecting `[start, end)`, ordered by `(start, end)`.
    ///
    /// `None` leaves that side unbounded. Errors are reported here, before any
    /// interval is produced.
    fn fetch(&self, start: Option<i64>, end: Option<i64>) -> Result<Intervals<'_>>;

    fn kind(&self) -> Kind {
        Kind::Rich
    }

    /// The flat source list when this node is an intersection.
    fn intersection_sources(&self) -> Option<&[Node]> {
        None
    }
}

/// Shared handle to an immutable timeline expression node.
#[derive(Clone)]
pub struct Node(Arc<dyn Timeline>);

impl Node {
    pub fn new<T: Timeline + 'static>(timeline: T) -> Self {
        Self(Arc::new(timeline))
    }

    pub fn fetch(&self, start: Option<i64>, end: Option<i64>) -> Result<Intervals<'_>> {
        self.0.fetch(start, end)
    }

    pub fn kind(&self) -> Kind {
        self.0.kind()
    }

    /// Fetch with human-friendly bounds (seconds, aware datetimes, dates, or unbounded).
    ///
    /// ```
    /// use timeline_algebra::{timeline, Bound, Interval};
    ///
    /// let tl = timeline([Interval::new(0, 5).unwrap(), Interval::new(10, 15).unwrap()]);
    /// let hits: Vec<_> = tl.slice(3i64, Bound::Unbounded).unwrap().collect();
    /// assert_eq!(hits.len(), 2);
    /// ```
    pub fn slice(&self, start: impl Into<Bound>, end: impl Into<Bound>) -> Result<Intervals<'_>> {
        let start = coerce_bound(&start.into(), Edge::Start)?;
        let end = coerce_bound(&end.into(), Edge::End)?;
        self.fetch(start, end)
    }

    /// Fetch and collect into a vector.
    pub fn collect(&self, start: Option<i64>, end: Option<i64>) -> Result<Vec<Interval>> {
        Ok(self.fetch(start, end)?.collect())
    }
}

impl Timeline for Node {
    fn fetch(&self, start: Option<i64>, end: Option<i64>) -> Result<Intervals<'_>> {
        self.0.fetch(start, end)
    }

    fn kind(&self) -> Kind {
        self.0.kind()
    }

    fn intersection_sources(&self) -> Option<&[Node]> {
        self.0.intersection_sources()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Node").field(&self.kind()).finish()
    }
}

impl BitOr for Node {
    type Output = Node;

    fn bitor(self, rhs: Node) -> Node {
        Node::new(Union::new(vec![self, rhs]))
    }
}

impl BitAnd for Node {
    type Output = Node;

    fn bitand(self, rhs: Node) -> Node {
        Node::new(Intersection::new(vec![self, rhs]))
    }
}

impl BitAnd<Filter> for Node {
    type Output = Node;

    fn bitand(self, rhs: Filter) -> Node {
        Node::new(Filtered::new(self, rhs))
    }
}

impl BitAnd<Node> for Filter {
    type Output = Node;

    fn bitand(self, rhs: Node) -> Node {
        Node::new(Filtered::new(rhs, self))
    }
}

impl Sub for Node {
    type Output = Node;

    fn sub(self, rhs: Node) -> Node {
        Node::new(Difference::new(self, vec![rhs]))
    }
}

impl Not for Node {
    type Output = Node;

    fn not(self) -> Node {
        Node::new(Complement::new(self))
    }
}

/// Compose timelines with union semantics (equivalent to chaining `|`).
pub fn union(nodes: impl IntoIterator<Item = Node>) -> Result<Node> {
    nodes.into_iter().reduce(|acc, next| acc | next).ok_or_else(|| {
        AlgebraError::InvalidArgument(
            "union() requires at least one timeline, e.g. union([cal_a, cal_b])".to_string(),
        )
    })
}

/// Compose timelines with intersection semantics (equivalent to chaining `&`).
pub fn intersection(nodes: impl IntoIterator<Item = Node>) -> Result<Node> {
    nodes.into_iter().reduce(|acc, next| acc & next).ok_or_else(|| {
        AlgebraError::InvalidArgument(
            "intersection() requires at least one timeline, e.g. intersection([cal_a, cal_b])"
                .to_string(),
        )
    })
}

/// Coalesce overlapping and adjacent intervals into maximal runs.
///
/// Implemented as a double complement, so it needs finite query bounds and
/// always yields bare intervals.
pub fn flatten(node: Node) -> Node {
    !(!node)
}
