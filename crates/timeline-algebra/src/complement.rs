//! Complement: the gaps of a source inside a closed query window.
//!
//! A cursor sweeps the ordered source from `start`; every stretch the source leaves
//! uncovered becomes a bare interval. Gaps never carry metadata.

use crate::error::{AlgebraError, Result};
use crate::interval::{Interval, Metadata};
use crate::timeline::{Intervals, Kind, Node, Timeline};

pub struct Complement {
    source: Node,
}

impl Complement {
    pub fn new(source: Node) -> Self {
        Self { source }
    }
}

impl Timeline for Complement {
    fn fetch(&self, start: Option<i64>, end: Option<i64>) -> Result<Intervals<'_>> {
        let (Some(start), Some(end)) = (start, end) else {
            return Err(AlgebraError::Bounds(format!(
                "complement needs a finite window to invert against, got start={:?} end={:?}. \
                 Slice with both bounds, e.g. (!node).slice(0i64, 86400i64)",
                start, end
            )));
        };
        tracing::debug!(start, end, "complement fetch");
        Ok(Box::new(Gaps {
            source: self.source.fetch(Some(start), Some(end))?,
            cursor: start,
            end,
            done: start >= end,
        }))
    }

    fn kind(&self) -> Kind {
        Kind::Mask
    }
}

struct Gaps<'a> {
    source: Intervals<'a>,
    cursor: i64,
    end: i64,
    done: bool,
}

impl Gaps<'_> {
    fn gap(start: i64, end: i64) -> Interval {
        Interval {
            start: Some(start),
            end: Some(end),
            metadata: Metadata::default(),
        }
    }
}

impl Iterator for Gaps<'_> {
    type Item = Interval;

    fn next(&mut self) -> Option<Interval> {
        if self.done {
            return None;
        }
        for interval in self.source.by_ref() {
            let (busy_start, busy_end) = interval.key();
            if busy_end <= self.cursor {
                continue;
            }
            if busy_start >= self.end {
                break;
            }
            let busy_start = busy_start.max(self.cursor);
            let busy_end = busy_end.min(self.end);
            let gap = (self.cursor < busy_start).then(|| Self::gap(self.cursor, busy_start));
            self.cursor = busy_end;
            if self.cursor >= self.end {
                self.done = true;
            }
            if gap.is_some() {
                return gap;
            }
            if self.done {
                return None;
            }
        }

        // Trailing gap after the last busy stretch.
        self.done = true;
        (self.cursor < self.end).then(|| Self::gap(self.cursor, self.end))
    }
}
