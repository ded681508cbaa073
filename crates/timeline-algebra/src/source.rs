//! In-memory leaf timeline over a fixed set of intervals.

use crate::error::Result;
use crate::interval::Interval;
use crate::timeline::{Intervals, Kind, Node, Timeline};

/// A static, pre-sorted interval list.
///
/// `max_end[i]` is the largest end among the first `i + 1` intervals, which lets
/// `fetch` skip the prefix that cannot reach the window even when long intervals
/// are mixed with short ones.
#[derive(Debug, Clone)]
pub struct StaticTimeline {
    intervals: Vec<Interval>,
    max_end: Vec<i64>,
    kind: Kind,
}

impl StaticTimeline {
    pub fn new(intervals: impl IntoIterator<Item = Interval>) -> Self {
        let mut intervals: Vec<Interval> = intervals.into_iter().collect();
        intervals.sort_by_key(Interval::key);
        let max_end = intervals
            .iter()
            .scan(i64::MIN, |acc, iv| {
                *acc = (*acc).max(iv.finite_end());
                Some(*acc)
            })
            .collect();
        let kind = if intervals.iter().all(Interval::is_mask) {
            Kind::Mask
        } else {
            Kind::Rich
        };
        Self {
            intervals,
            max_end,
            kind,
        }
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

impl Timeline for StaticTimeline {
    fn fetch(&self, start: Option<i64>, end: Option<i64>) -> Result<Intervals<'_>> {
        let from = start.map_or(0, |s| self.max_end.partition_point(|&e| e <= s));
        let to = end.map_or(self.intervals.len(), |e| {
            self.intervals.partition_point(|iv| iv.finite_start() < e)
        });
        let window = self.intervals.get(from..to).unwrap_or(&[]);
        Ok(Box::new(
            window
                .iter()
                .filter(move |iv| iv.intersects(start, end))
                .cloned(),
        ))
    }

    fn kind(&self) -> Kind {
        self.kind
    }
}

/// Wrap a collection of intervals as a timeline node.
///
/// ```
/// use timeline_algebra::{timeline, Interval};
///
/// let tl = timeline([Interval::new(10, 15).unwrap(), Interval::new(0, 5).unwrap()]);
/// let starts: Vec<_> = tl.fetch(None, None).unwrap().map(|iv| iv.start).collect();
/// assert_eq!(starts, vec![Some(0), Some(10)]);
/// ```
pub fn timeline(intervals: impl IntoIterator<Item = Interval>) -> Node {
    Node::new(StaticTimeline::new(intervals))
}
