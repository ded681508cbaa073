//! Intersection: a multi-cursor sweep over N ordered sources.
//!
//! Intervals from all sources are visited in `(start, end)` order. Each source keeps
//! the set of its intervals still open at the sweep position, so a wide interval from
//! one source keeps matching every later interval of another source, even after its
//! own stream has run dry. An overlap is discovered exactly once: when the last of its
//! member intervals arrives, at which point its start is that interval's start.
//!
//! What gets emitted per overlap depends on the sources' [`Kind`]:
//!
//! - all mask: one trimmed interval (taken from the first source)
//! - mixed: one trimmed copy per rich source; masks only filter
//! - all rich: one trimmed copy per source, in source order

use std::collections::VecDeque;

use crate::error::Result;
use crate::interval::{end_bound, start_bound, Interval};
use crate::timeline::{Intervals, Kind, Node, Timeline};
use crate::union::Merge;

pub struct Intersection {
    sources: Vec<Node>,
    kind: Kind,
}

impl Intersection {
    /// Build an intersection, splicing in the sources of nested intersections.
    pub fn new(sources: Vec<Node>) -> Self {
        let mut flat = Vec::with_capacity(sources.len());
        for source in sources {
            match source.intersection_sources() {
                Some(inner) => flat.extend(inner.iter().cloned()),
                None => flat.push(source),
            }
        }
        let kind = Kind::combine(flat.iter().map(Node::kind));
        Self {
            sources: flat,
            kind,
        }
    }

    pub fn sources(&self) -> &[Node] {
        &self.sources
    }

    /// Per-source flag: does this source contribute output intervals?
    fn emitters(&self) -> Vec<bool> {
        let kinds: Vec<Kind> = self.sources.iter().map(Node::kind).collect();
        let all_mask = kinds.iter().all(|k| *k == Kind::Mask);
        let any_mask = kinds.iter().any(|k| *k == Kind::Mask);
        kinds
            .iter()
            .enumerate()
            .map(|(i, kind)| {
                if all_mask {
                    i == 0
                } else if any_mask {
                    *kind == Kind::Rich
                } else {
                    true
                }
            })
            .collect()
    }
}

impl Timeline for Intersection {
    fn fetch(&self, start: Option<i64>, end: Option<i64>) -> Result<Intervals<'_>> {
        tracing::debug!(?start, ?end, sources = self.sources.len(), "intersection fetch");
        if self.sources.is_empty() {
            return Ok(Box::new(std::iter::empty()));
        }
        let streams = self
            .sources
            .iter()
            .map(|s| s.fetch(start, end))
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(Sweep::new(Merge::new(streams), self.emitters())))
    }

    fn kind(&self) -> Kind {
        self.kind
    }

    fn intersection_sources(&self) -> Option<&[Node]> {
        Some(&self.sources)
    }
}

struct Sweep<'a> {
    merge: Merge<'a>,
    emitters: Vec<bool>,
    /// Per source: intervals whose end lies beyond the sweep position.
    open: Vec<Vec<Interval>>,
    /// Overlaps sharing the current start, released once the sweep moves past it.
    pending: Vec<Interval>,
    pending_start: i64,
    ready: VecDeque<Interval>,
    done: bool,
}

impl<'a> Sweep<'a> {
    fn new(merge: Merge<'a>, emitters: Vec<bool>) -> Self {
        let n = emitters.len();
        let done = (0..n).any(|i| merge.is_exhausted(i));
        Self {
            merge,
            emitters,
            open: vec![Vec::new(); n],
            pending: Vec::new(),
            pending_start: i64::MIN,
            ready: VecDeque::new(),
            done,
        }
    }

    fn release(&mut self) {
        // Every pending overlap starts at `pending_start`; order the batch by end.
        self.pending.sort_by_key(Interval::finite_end);
        self.ready.extend(self.pending.drain(..));
    }

    /// Record every overlap completed by `arrival` from `source`, starting at `at`.
    fn complete(&mut self, source: usize, arrival: &Interval, at: i64) {
        if arrival.finite_end() <= at {
            return;
        }
        let n = self.open.len();
        if (0..n).any(|j| j != source && self.open[j].is_empty()) {
            return;
        }

        // Odometer over one open interval per other source.
        let mut picks = vec![0usize; n];
        loop {
            let member = |j: usize| {
                if j == source {
                    arrival
                } else {
                    &self.open[j][picks[j]]
                }
            };
            let overlap_end = (0..n).map(|j| member(j).finite_end()).min().unwrap_or(at);
            if overlap_end > at {
                for j in (0..n).filter(|j| self.emitters[*j]) {
                    self.pending
                        .push(member(j).with_bounds(start_bound(at), end_bound(overlap_end)));
                }
            }

            let mut j = 0;
            loop {
                if j == n {
                    return;
                }
                if j != source {
                    picks[j] += 1;
                    if picks[j] < self.open[j].len() {
                        break;
                    }
                    picks[j] = 0;
                }
                j += 1;
            }
        }
    }
}

impl Iterator for Sweep<'_> {
    type Item = Interval;

    fn next(&mut self) -> Option<Interval> {
        loop {
            if let Some(interval) = self.ready.pop_front() {
                return Some(interval);
            }
            if self.done {
                if self.pending.is_empty() {
                    return None;
                }
                self.release();
                continue;
            }

            let Some((source, arrival)) = self.merge.next_tagged() else {
                self.done = true;
                continue;
            };
            let at = arrival.finite_start();
            if !self.pending.is_empty() && at > self.pending_start {
                self.release();
            }
            self.pending_start = at;

            for open in &mut self.open {
                open.retain(|iv| iv.finite_end() > at);
            }
            self.complete(source, &arrival, at);
            if arrival.finite_end() > at {
                self.open[source].push(arrival);
            }

            // A drained source with nothing left open can never overlap again.
            let merge = &self.merge;
            if self
                .open
                .iter()
                .enumerate()
                .any(|(i, open)| open.is_empty() && merge.is_exhausted(i))
            {
                self.done = true;
            }
        }
    }
}
