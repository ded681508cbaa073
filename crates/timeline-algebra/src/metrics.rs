//! Summary metrics over a finite window `[start, end)`.

use crate::error::Result;
use crate::interval::Interval;
use crate::timeline::{flatten, Node};

/// Seconds of `[start, end)` covered by at least one interval.
///
/// ```
/// use timeline_algebra::{metrics, timeline, Interval};
///
/// let busy = timeline([Interval::new(0, 10).unwrap(), Interval::new(5, 20).unwrap()]);
/// assert_eq!(metrics::total_duration(&busy, 0, 100).unwrap(), 20);
/// assert_eq!(metrics::coverage_ratio(&busy, 0, 100).unwrap(), 0.2);
/// ```
pub fn total_duration(node: &Node, start: i64, end: i64) -> Result<i64> {
    if start >= end {
        return Ok(0);
    }
    let covered = flatten(node.clone());
    let total = covered
        .fetch(Some(start), Some(end))?
        .filter_map(|interval| interval.duration())
        .sum();
    Ok(total)
}

/// Longest interval in the window, clamped to it. Ties keep the earliest.
pub fn max_duration(node: &Node, start: i64, end: i64) -> Result<Option<Interval>> {
    extreme(node, start, end, |length, best| length > best)
}

/// Shortest interval in the window, clamped to it. Ties keep the earliest.
pub fn min_duration(node: &Node, start: i64, end: i64) -> Result<Option<Interval>> {
    extreme(node, start, end, |length, best| length < best)
}

fn extreme(
    node: &Node,
    start: i64,
    end: i64,
    better: impl Fn(i64, i64) -> bool,
) -> Result<Option<Interval>> {
    if start >= end {
        return Ok(None);
    }
    let mut best: Option<(i64, Interval)> = None;
    for interval in node.fetch(Some(start), Some(end))? {
        let clamped_start = interval.finite_start().max(start);
        let clamped_end = interval.finite_end().min(end);
        if clamped_start >= clamped_end {
            continue;
        }
        let length = clamped_end - clamped_start;
        if best.as_ref().is_none_or(|(best_len, _)| better(length, *best_len)) {
            best = Some((
                length,
                interval.with_bounds(Some(clamped_start), Some(clamped_end)),
            ));
        }
    }
    Ok(best.map(|(_, interval)| interval))
}

/// Number of intervals the timeline yields for the window.
pub fn count_intervals(node: &Node, start: i64, end: i64) -> Result<usize> {
    if start >= end {
        return Ok(0);
    }
    Ok(node.fetch(Some(start), Some(end))?.count())
}

/// Fraction of the window that is covered, between 0 and 1.
pub fn coverage_ratio(node: &Node, start: i64, end: i64) -> Result<f64> {
    if start >= end {
        return Ok(0.0);
    }
    let covered = total_duration(node, start, end)?;
    Ok(covered as f64 / (end - start) as f64)
}
