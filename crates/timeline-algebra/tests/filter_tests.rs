//! Tests for properties, filters, and dynamic composition.

use serde_json::{json, Value};
use timeline_algebra::property::{self, field, getter, hours, minutes};
use timeline_algebra::{
    has_all, has_any, one_of, timeline, AlgebraError, Expr, Filter, Interval, Kind, Metadata, HOUR,
};

fn event(start: i64, end: i64, fields: Value) -> Interval {
    let Value::Object(map) = fields else {
        panic!("fields must be an object");
    };
    Interval::new(start, end).unwrap().with_metadata(Metadata::from(map))
}

fn calendar() -> timeline_algebra::Node {
    timeline([
        event(0, HOUR / 2, json!({"title": "standup", "priority": 3, "tags": ["work"]})),
        event(HOUR, 3 * HOUR, json!({"title": "deep work", "priority": 8, "tags": ["work", "focus"]})),
        event(4 * HOUR, 5 * HOUR, json!({"title": "gym", "priority": 5, "tags": ["personal"]})),
    ])
}

fn titles(intervals: &[Interval]) -> Vec<&str> {
    intervals
        .iter()
        .map(|iv| iv.metadata["title"].as_str().unwrap())
        .collect()
}

#[test]
fn duration_properties_compare_in_their_unit() {
    let long = (calendar() & hours().ge(1)).collect(None, None).unwrap();
    assert_eq!(titles(&long), vec!["deep work", "gym"]);

    let short = (calendar() & minutes().lt(45)).collect(None, None).unwrap();
    assert_eq!(titles(&short), vec!["standup"]);
}

#[test]
fn unbounded_duration_is_maximal() {
    let open = Interval::new(0, None).unwrap();
    assert_eq!(property::days().value(&open).as_f64(), Some(f64::MAX));
}

#[test]
fn field_comparisons_and_boolean_combinators() {
    let important = field("priority").ge(5);
    let not_gym = field("title").ne("gym");

    let both = (calendar() & (important & not_gym))
        .collect(None, None)
        .unwrap();
    assert_eq!(titles(&both), vec!["deep work"]);

    let either = (calendar() & (field("priority").lt(4) | field("title").eq("gym")))
        .collect(None, None)
        .unwrap();
    assert_eq!(titles(&either), vec!["standup", "gym"]);
}

#[test]
fn missing_field_never_orders() {
    let filter = field("room").gt(1);
    assert!(!filter.apply(&Interval::new(0, 1).unwrap()));
}

#[test]
fn bound_properties() {
    let late = (calendar() & property::start().ge(HOUR)).collect(None, None).unwrap();
    assert_eq!(titles(&late), vec!["deep work", "gym"]);

    let early_end = (calendar() & property::end().le(HOUR)).collect(None, None).unwrap();
    assert_eq!(titles(&early_end), vec!["standup"]);
}

#[test]
fn membership_filters() {
    let picked = (calendar() & one_of(field("title"), ["gym", "standup"]))
        .collect(None, None)
        .unwrap();
    assert_eq!(titles(&picked), vec!["standup", "gym"]);

    let any = (calendar() & has_any(field("tags"), ["focus", "personal"]))
        .collect(None, None)
        .unwrap();
    assert_eq!(titles(&any), vec!["deep work", "gym"]);

    let all = (calendar() & has_all(field("tags"), ["work", "focus"]))
        .collect(None, None)
        .unwrap();
    assert_eq!(titles(&all), vec!["deep work"]);
}

#[test]
fn collection_filters_ignore_scalar_fields() {
    // `title` is a string, not an array.
    let filter = has_any(field("title"), ["gym"]);
    assert!((calendar() & filter).collect(None, None).unwrap().is_empty());
}

#[test]
fn getter_and_predicate_filters() {
    let tag_count = getter(|iv| json!(iv.metadata["tags"].as_array().map_or(0, Vec::len)));
    let multi = (calendar() & tag_count.ge(2)).collect(None, None).unwrap();
    assert_eq!(titles(&multi), vec!["deep work"]);

    let odd_start = Filter::predicate(|iv| iv.finite_start() % 2 == 1);
    assert!((calendar() & odd_start).collect(None, None).unwrap().is_empty());
}

#[test]
fn filter_on_left_side_and_kind_passthrough() {
    let filtered = field("priority").eq(8) & calendar();
    assert_eq!(filtered.kind(), Kind::Rich);
    assert_eq!(titles(&filtered.collect(None, None).unwrap()), vec!["deep work"]);
}

#[test]
fn numbers_compare_across_representations() {
    let iv = event(0, 1, json!({"score": 2}));
    assert!(field("score").eq(2.0).apply(&iv));
    assert!(field("score").lt(2.5).apply(&iv));
}

// ---------------------------------------------------------------------------
// Dynamic composition
// ---------------------------------------------------------------------------

#[test]
fn union_of_timeline_and_filter_is_a_composition_error() {
    let result = Expr::from(calendar()).union(Expr::from(hours().ge(1)));
    assert!(matches!(result, Err(AlgebraError::Composition(_))));
}

#[test]
fn difference_and_complement_reject_filters() {
    let diff = Expr::from(calendar()).difference(Expr::from(hours().ge(1)));
    assert!(matches!(diff, Err(AlgebraError::Composition(_))));

    let inverted = Expr::from(hours().ge(1)).complement();
    assert!(matches!(inverted, Err(AlgebraError::Composition(_))));
}

#[test]
fn intersection_accepts_any_pairing() {
    let filtered = Expr::from(hours().ge(1))
        .and(Expr::from(calendar()))
        .unwrap()
        .into_timeline()
        .unwrap();
    assert_eq!(filtered.collect(None, None).unwrap().len(), 2);

    let combined = Expr::from(hours().ge(1))
        .and(Expr::from(field("priority").gt(6)))
        .unwrap()
        .into_filter()
        .unwrap();
    let kept = (calendar() & combined).collect(None, None).unwrap();
    assert_eq!(titles(&kept), vec!["deep work"]);
}
