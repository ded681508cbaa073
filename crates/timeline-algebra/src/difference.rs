//! Difference: sweep-line subtraction of N subtractor timelines from a source.
//!
//! Subtractors are merged into one ordered stream that is consumed once across all
//! source intervals, one subtractor at a time. A subtractor stays retained while it
//! can still cut a later source interval (its end lies beyond the next source start),
//! so overlapping source intervals are carved correctly without rescanning the
//! subtractor stream.
//!
//! Each source interval is carved incrementally: a cursor walks it and every hole is
//! handed out as soon as the subtractor closing it is seen, so an unbounded source
//! interval against an endless subtractor still streams.
//!
//! Fragments keep the metadata of their source interval. They are held in a small
//! heap until neither the active interval nor the next source interval can produce
//! an earlier one, which keeps the output ordered by `(start, end)` even when source
//! intervals overlap.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, VecDeque};
use std::iter::Peekable;

use crate::error::Result;
use crate::interval::{end_bound, start_bound, Interval};
use crate::timeline::{Intervals, Kind, Node, Timeline};
use crate::union::Merge;

pub struct Difference {
    source: Node,
    subtractors: Vec<Node>,
}

impl Difference {
    pub fn new(source: Node, subtractors: Vec<Node>) -> Self {
        Self {
            source,
            subtractors,
        }
    }
}

impl Timeline for Difference {
    fn fetch(&self, start: Option<i64>, end: Option<i64>) -> Result<Intervals<'_>> {
        tracing::debug!(?start, ?end, subtractors = self.subtractors.len(), "difference fetch");
        let source = self.source.fetch(start, end)?;
        if self.subtractors.is_empty() {
            return Ok(source);
        }
        let streams = self
            .subtractors
            .iter()
            .map(|s| s.fetch(start, end))
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(Carve {
            source: source.peekable(),
            subtractors: Merge::new(streams).peekable(),
            retained: VecDeque::new(),
            active: None,
            fragments: BinaryHeap::new(),
            seq: 0,
        }))
    }

    fn kind(&self) -> Kind {
        self.source.kind()
    }
}

struct Fragment {
    key: (i64, i64),
    seq: u64,
    interval: Interval,
}

impl PartialEq for Fragment {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Fragment {}

impl PartialOrd for Fragment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fragment {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.key, self.seq).cmp(&(other.key, other.seq))
    }
}

/// The source interval currently being carved.
struct Active {
    event: Interval,
    cursor: i64,
    end: i64,
    /// Next retained subtractor to look at.
    scan: usize,
}

struct Carve<'a> {
    source: Peekable<Intervals<'a>>,
    subtractors: Peekable<Merge<'a>>,
    /// Pulled subtractor spans that may still cut a later source interval, in start order.
    retained: VecDeque<(i64, i64)>,
    active: Option<Active>,
    fragments: BinaryHeap<Reverse<Fragment>>,
    seq: u64,
}

impl Carve<'_> {
    fn emit(&mut self, event: &Interval, start: i64, end: i64) {
        self.fragments.push(Reverse(Fragment {
            key: (start, end),
            seq: self.seq,
            interval: event.with_bounds(start_bound(start), end_bound(end)),
        }));
        self.seq += 1;
    }

    /// Next subtractor span starting before the active end, retained ones first.
    ///
    /// Spans ending at or before the next source start cannot cut anything later
    /// and are dropped as they are handed out.
    fn next_subtractor(&mut self, active: &mut Active) -> Option<(i64, i64)> {
        let horizon = self.source.peek().map_or(i64::MAX, Interval::finite_start);
        if let Some(&(start, end)) = self.retained.get(active.scan) {
            if start >= active.end {
                return None;
            }
            if end <= horizon {
                self.retained.remove(active.scan);
            } else {
                active.scan += 1;
            }
            return Some((start, end));
        }
        let sub = self
            .subtractors
            .next_if(|sub| sub.finite_start() < active.end)?
            .key();
        if sub.1 > horizon {
            self.retained.push_back(sub);
            active.scan += 1;
        }
        Some(sub)
    }

    /// Carve the active interval until it yields one fragment or runs out.
    fn step(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };
        while active.cursor < active.end {
            let Some((sub_start, sub_end)) = self.next_subtractor(&mut active) else {
                self.emit(&active.event, active.cursor, active.end);
                return;
            };
            if sub_end <= active.cursor {
                continue;
            }
            let hole = (active.cursor, sub_start);
            active.cursor = active.end.min(sub_end);
            if hole.0 < hole.1 {
                self.emit(&active.event, hole.0, hole.1);
                self.active = Some(active);
                return;
            }
        }
    }
}

impl Iterator for Carve<'_> {
    type Item = Interval;

    fn next(&mut self) -> Option<Interval> {
        loop {
            if let Some(Reverse(top)) = self.fragments.peek() {
                // Later fragments of the active interval start at or after its cursor.
                let floor = top.key.0;
                let releasable = self.active.as_ref().is_none_or(|a| floor < a.cursor)
                    && self
                        .source
                        .peek()
                        .is_none_or(|next| floor < next.finite_start());
                if releasable {
                    return self.fragments.pop().map(|Reverse(f)| f.interval);
                }
            }
            if self.active.is_some() {
                self.step();
                continue;
            }
            let event = self.source.next()?;
            let (cursor, end) = event.key();
            self.active = Some(Active {
                event,
                cursor,
                end,
                scan: 0,
            });
        }
    }
}
