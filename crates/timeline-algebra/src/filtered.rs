//! Filtered: pass through the source intervals accepted by a [`Filter`].

use crate::error::Result;
use crate::property::Filter;
use crate::timeline::{Intervals, Kind, Node, Timeline};

pub struct Filtered {
    source: Node,
    filter: Filter,
}

impl Filtered {
    pub fn new(source: Node, filter: Filter) -> Self {
        Self { source, filter }
    }
}

impl Timeline for Filtered {
    fn fetch(&self, start: Option<i64>, end: Option<i64>) -> Result<Intervals<'_>> {
        let filter = &self.filter;
        Ok(Box::new(
            self.source
                .fetch(start, end)?
                .filter(move |interval| filter.apply(interval)),
        ))
    }

    fn kind(&self) -> Kind {
        self.source.kind()
    }
}
