//! Tests for the multi-cursor intersection sweep and its emission policy.

use serde_json::json;
use timeline_algebra::intersection::Intersection;
use timeline_algebra::{intersection, timeline, Interval, Kind, Metadata, Node};

fn iv(start: i64, end: i64) -> Interval {
    Interval::new(start, end).unwrap()
}

fn tagged(start: i64, end: i64, id: &str) -> Interval {
    iv(start, end).with_metadata([("id", json!(id))].into_iter().collect::<Metadata>())
}

fn spans(intervals: &[Interval]) -> Vec<(i64, i64)> {
    intervals.iter().map(Interval::key).collect()
}

fn ids(intervals: &[Interval]) -> Vec<String> {
    intervals
        .iter()
        .map(|iv| iv.metadata["id"].as_str().unwrap().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Sweep correctness
// ---------------------------------------------------------------------------

#[test]
fn wide_interval_matches_every_nested_interval() {
    // One wide interval on one side, two overlapping intervals on the other:
    // both overlaps must come out, not just the first.
    let x = timeline([iv(100, 200), iv(150, 160)]);
    let y = timeline([iv(0, 200)]);

    let result = (x & y).collect(Some(0), Some(200)).unwrap();

    assert_eq!(spans(&result), vec![(100, 200), (150, 160)]);
}

#[test]
fn trims_to_overlap() {
    let a = timeline([iv(0, 10), iv(20, 30)]);
    let b = timeline([iv(5, 25)]);

    let result = (a & b).collect(None, None).unwrap();

    assert_eq!(spans(&result), vec![(5, 10), (20, 25)]);
}

#[test]
fn touching_intervals_do_not_overlap() {
    let a = timeline([iv(0, 10)]);
    let b = timeline([iv(10, 20)]);

    assert!((a & b).collect(None, None).unwrap().is_empty());
}

#[test]
fn exhausted_source_ends_the_stream() {
    let a = timeline([iv(0, 10), iv(20, 30)]);
    let empty = timeline(Vec::new());

    assert!((a & empty).collect(None, None).unwrap().is_empty());
}

#[test]
fn zero_sources_yield_nothing() {
    let none = Node::new(Intersection::new(Vec::new()));

    assert!(none.collect(None, None).unwrap().is_empty());
    assert!(none.collect(Some(0), Some(100)).unwrap().is_empty());
    assert!(intersection(Vec::new()).is_err());
}

#[test]
fn unbounded_source_acts_as_identity() {
    let everything = timeline([Interval::new(None, None).unwrap()]);
    let a = timeline([iv(0, 10), iv(20, 30)]);

    let result = (a & everything).collect(None, None).unwrap();

    assert_eq!(spans(&result), vec![(0, 10), (20, 30)]);
}

#[test]
fn output_is_ordered_with_staggered_overlaps() {
    let a = timeline([iv(0, 100), iv(10, 20), iv(50, 60)]);
    let b = timeline([iv(5, 55), iv(58, 70)]);

    let result = (a & b).collect(None, None).unwrap();

    assert_eq!(
        spans(&result),
        vec![(5, 55), (10, 20), (50, 55), (58, 60), (58, 70)]
    );
}

// ---------------------------------------------------------------------------
// Emission policy
// ---------------------------------------------------------------------------

#[test]
fn all_mask_sources_emit_one_interval_per_overlap() {
    let a = timeline([iv(0, 10)]);
    let b = timeline([iv(5, 15)]);
    let c = timeline([iv(8, 20)]);

    let both = a & b & c;
    assert_eq!(both.kind(), Kind::Mask);
    let result = both.collect(None, None).unwrap();

    assert_eq!(spans(&result), vec![(8, 10)]);
    assert!(result[0].is_mask());
}

#[test]
fn mixed_sources_emit_only_rich_copies() {
    let events = timeline([tagged(0, 10, "standup"), tagged(20, 30, "review")]);
    let window = timeline([iv(5, 25)]);

    let result = (window & events).collect(None, None).unwrap();

    assert_eq!(spans(&result), vec![(5, 10), (20, 25)]);
    assert_eq!(ids(&result), vec!["standup", "review"]);
}

#[test]
fn all_rich_sources_emit_one_copy_per_source() {
    let a = timeline([tagged(0, 10, "a")]);
    let b = timeline([tagged(5, 15, "b")]);

    let result = (a & b).collect(None, None).unwrap();

    assert_eq!(spans(&result), vec![(5, 10), (5, 10)]);
    assert_eq!(ids(&result), vec!["a", "b"]);
}

#[test]
fn nested_intersections_are_flattened() {
    let a = timeline([tagged(0, 10, "a")]);
    let b = timeline([tagged(5, 15, "b")]);
    let c = timeline([tagged(8, 20, "c")]);

    // Flat: three sources, one copy each. Nested would yield four copies.
    let result = ((a & b) & c).collect(None, None).unwrap();

    assert_eq!(ids(&result), vec!["a", "b", "c"]);
    assert!(result.iter().all(|iv| iv.key() == (8, 10)));
}
