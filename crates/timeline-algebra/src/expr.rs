//! Dynamically typed composition of timelines and filters.
//!
//! The static operators on [`Node`] and [`Filter`] only exist for meaningful
//! pairs. When operands arrive untyped (from a query document, say), [`Expr`]
//! checks the pairing at construction time and reports a
//! [`AlgebraError::Composition`] for the combinations that have no meaning.

use crate::error::{AlgebraError, Result};
use crate::property::Filter;
use crate::timeline::Node;

/// Either operand of the algebra.
#[derive(Debug, Clone)]
pub enum Expr {
    Timeline(Node),
    Filter(Filter),
}

impl From<Node> for Expr {
    fn from(node: Node) -> Self {
        Expr::Timeline(node)
    }
}

impl From<Filter> for Expr {
    fn from(filter: Filter) -> Self {
        Expr::Filter(filter)
    }
}

impl Expr {
    fn describe(&self) -> &'static str {
        match self {
            Expr::Timeline(_) => "timeline",
            Expr::Filter(_) => "filter",
        }
    }

    /// `self | other`: two timelines, or two filters.
    pub fn union(self, other: Expr) -> Result<Expr> {
        match (self, other) {
            (Expr::Timeline(a), Expr::Timeline(b)) => Ok(Expr::Timeline(a | b)),
            (Expr::Filter(a), Expr::Filter(b)) => Ok(Expr::Filter(a | b)),
            (a, b) => Err(AlgebraError::Composition(format!(
                "cannot union a {} with a {}: union merges two interval streams. \
                 To keep only matching intervals, intersect instead: timeline & filter",
                a.describe(),
                b.describe()
            ))),
        }
    }

    /// `self & other`: any pairing; a timeline with a filter yields a filtered timeline.
    pub fn and(self, other: Expr) -> Result<Expr> {
        Ok(match (self, other) {
            (Expr::Timeline(a), Expr::Timeline(b)) => Expr::Timeline(a & b),
            (Expr::Timeline(t), Expr::Filter(f)) | (Expr::Filter(f), Expr::Timeline(t)) => {
                Expr::Timeline(t & f)
            }
            (Expr::Filter(a), Expr::Filter(b)) => Expr::Filter(a & b),
        })
    }

    /// `self - other`: only between timelines.
    pub fn difference(self, other: Expr) -> Result<Expr> {
        match (self, other) {
            (Expr::Timeline(a), Expr::Timeline(b)) => Ok(Expr::Timeline(a - b)),
            (a, b) => Err(AlgebraError::Composition(format!(
                "cannot subtract a {} from a {}: difference needs two timelines. \
                 To drop intervals matching a filter, intersect with an inverted comparison",
                b.describe(),
                a.describe()
            ))),
        }
    }

    /// `!self`: only for timelines.
    pub fn complement(self) -> Result<Expr> {
        match self {
            Expr::Timeline(node) => Ok(Expr::Timeline(!node)),
            Expr::Filter(_) => Err(AlgebraError::Composition(
                "cannot complement a filter: complement inverts a timeline's coverage. \
                 Use the opposite comparison instead, e.g. hours().lt(1) for hours().ge(1)"
                    .to_string(),
            )),
        }
    }

    pub fn into_timeline(self) -> Result<Node> {
        match self {
            Expr::Timeline(node) => Ok(node),
            Expr::Filter(_) => Err(AlgebraError::Composition(
                "expected a timeline but got a filter; apply it to a timeline with &".to_string(),
            )),
        }
    }

    pub fn into_filter(self) -> Result<Filter> {
        match self {
            Expr::Filter(filter) => Ok(filter),
            Expr::Timeline(_) => Err(AlgebraError::Composition(
                "expected a filter but got a timeline".to_string(),
            )),
        }
    }
}
