//! Union: a streaming k-way merge of already-ordered sources.
//!
//! No deduplication and no coalescing. Overlapping or identical intervals from
//! different sources all appear; use [`crate::flatten`] for coverage.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::error::Result;
use crate::interval::Interval;
use crate::timeline::{Intervals, Kind, Node, Timeline};

pub struct Union {
    sources: Vec<Node>,
    kind: Kind,
}

impl Union {
    pub fn new(sources: Vec<Node>) -> Self {
        let kind = Kind::combine(sources.iter().map(Node::kind));
        Self { sources, kind }
    }

    pub fn sources(&self) -> &[Node] {
        &self.sources
    }
}

impl Timeline for Union {
    fn fetch(&self, start: Option<i64>, end: Option<i64>) -> Result<Intervals<'_>> {
        tracing::debug!(?start, ?end, sources = self.sources.len(), "union fetch");
        let streams = self
            .sources
            .iter()
            .map(|s| s.fetch(start, end))
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(Merge::new(streams)))
    }

    fn kind(&self) -> Kind {
        self.kind
    }
}

/// Current head of one merged stream.
struct Head {
    key: (i64, i64),
    source: usize,
    interval: Interval,
}

impl PartialEq for Head {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Head {}

impl PartialOrd for Head {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Head {
    // Ties on key fall back to source order, keeping the merge deterministic.
    fn cmp(&self, other: &Self) -> Ordering {
        (self.key, self.source).cmp(&(other.key, other.source))
    }
}

/// Min-heap merge of ordered streams keyed by `(start, end)`.
pub(crate) struct Merge<'a> {
    streams: Vec<Intervals<'a>>,
    heap: BinaryHeap<Reverse<Head>>,
    exhausted: Vec<bool>,
}

impl<'a> Merge<'a> {
    pub(crate) fn new(mut streams: Vec<Intervals<'a>>) -> Self {
        let mut heap = BinaryHeap::with_capacity(streams.len());
        let mut exhausted = vec![false; streams.len()];
        for (source, stream) in streams.iter_mut().enumerate() {
            match stream.next() {
                Some(interval) => heap.push(Reverse(Head {
                    key: interval.key(),
                    source,
                    interval,
                })),
                None => exhausted[source] = true,
            }
        }
        Self {
            streams,
            heap,
            exhausted,
        }
    }

    /// True once `source` has handed out its last interval.
    pub(crate) fn is_exhausted(&self, source: usize) -> bool {
        self.exhausted[source]
    }

    /// Next interval in merged order, tagged with the index of its source.
    pub(crate) fn next_tagged(&mut self) -> Option<(usize, Interval)> {
        let Reverse(head) = self.heap.pop()?;
        match self.streams[head.source].next() {
            Some(interval) => self.heap.push(Reverse(Head {
                key: interval.key(),
                source: head.source,
                interval,
            })),
            None => self.exhausted[head.source] = true,
        }
        Some((head.source, head.interval))
    }
}

impl Iterator for Merge<'_> {
    type Item = Interval;

    fn next(&mut self) -> Option<Interval> {
        self.next_tagged().map(|(_, interval)| interval)
    }
}
