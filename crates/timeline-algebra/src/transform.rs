//! Shape-changing transforms that keep each interval's metadata.

use crate::error::{AlgebraError, Result};
use crate::interval::Interval;
use crate::timeline::{Intervals, Kind, Node, Timeline};

/// Every source interval widened by `before` and `after` seconds.
pub struct Buffered {
    source: Node,
    before: i64,
    after: i64,
}

impl Timeline for Buffered {
    fn fetch(&self, start: Option<i64>, end: Option<i64>) -> Result<Intervals<'_>> {
        // A source interval reaches the window once widened, so look that much further out.
        let source = self.source.fetch(
            start.map(|s| s.saturating_sub(self.after)),
            end.map(|e| e.saturating_add(self.before)),
        )?;
        let (before, after) = (self.before, self.after);
        Ok(Box::new(source.map(move |interval| {
            let start = interval.start.map(|s| s.saturating_sub(before));
            let end = interval.end.map(|e| e.saturating_add(after));
            interval.with_bounds(start, end)
        })))
    }

    fn kind(&self) -> Kind {
        self.source.kind()
    }
}

/// Add slack before and after each interval (travel time, setup, teardown).
///
/// Overlaps created by the padding are kept; flatten afterwards for coverage.
///
/// ```
/// use timeline_algebra::{buffer, timeline, Interval};
///
/// let flights = timeline([Interval::new(7_200, 10_800).unwrap()]);
/// let blocked = buffer(flights, 3_600, 0).unwrap();
/// assert_eq!(blocked.collect(Some(0), Some(4_000)).unwrap()[0].start, Some(3_600));
/// ```
pub fn buffer(source: Node, before: i64, after: i64) -> Result<Node> {
    if before < 0 || after < 0 {
        return Err(AlgebraError::InvalidArgument(format!(
            "buffer amounts must be non-negative, got before={} after={}",
            before, after
        )));
    }
    Ok(Node::new(Buffered {
        source,
        before,
        after,
    }))
}

/// Intervals no more than `gap` seconds apart merged into one.
pub struct MergedWithin {
    source: Node,
    gap: i64,
}

impl Timeline for MergedWithin {
    fn fetch(&self, start: Option<i64>, end: Option<i64>) -> Result<Intervals<'_>> {
        Ok(Box::new(Groups {
            source: self.source.fetch(start, end)?,
            gap: self.gap,
            current: None,
            done: false,
        }))
    }

    fn kind(&self) -> Kind {
        self.source.kind()
    }
}

struct Groups<'a> {
    source: Intervals<'a>,
    gap: i64,
    current: Option<Interval>,
    /// Set once an unbounded group has been handed out; it absorbs everything after.
    done: bool,
}

impl Iterator for Groups<'_> {
    type Item = Interval;

    fn next(&mut self) -> Option<Interval> {
        if self.done {
            return None;
        }
        loop {
            if self.current.as_ref().is_some_and(|c| c.end.is_none()) {
                self.done = true;
                return self.current.take();
            }
            let Some(interval) = self.source.next() else {
                return self.current.take();
            };
            let Some(current) = self.current.as_mut() else {
                self.current = Some(interval);
                continue;
            };
            if interval.finite_start().saturating_sub(current.finite_end()) <= self.gap {
                if current.finite_end() < interval.finite_end() {
                    current.end = interval.end;
                }
            } else {
                return self.current.replace(interval);
            }
        }
    }
}

/// Coalesce intervals separated by at most `gap` seconds, keeping the first
/// interval's metadata for each merged group.
///
/// Unlike [`crate::flatten`], this works on unbounded queries and keeps metadata.
pub fn merge_within(source: Node, gap: i64) -> Result<Node> {
    if gap < 0 {
        return Err(AlgebraError::InvalidArgument(format!(
            "merge_within gap must be non-negative, got {}",
            gap
        )));
    }
    Ok(Node::new(MergedWithin { source, gap }))
}
