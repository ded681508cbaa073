//! Tests for JSON query documents.

use serde_json::json;
use timeline_algebra::{AlgebraError, ExprDoc, QueryDoc};

const JAN_6: i64 = 1_736_121_600;
const HOUR: i64 = 3_600;

fn spans(doc: &QueryDoc) -> Vec<(i64, i64)> {
    doc.evaluate().unwrap().iter().map(|iv| iv.key()).collect()
}

#[test]
fn workday_minus_meeting() {
    let doc = QueryDoc::parse(
        r#"{
            "start": "2025-01-06",
            "end": "2025-01-07",
            "expr": {
                "op": "difference",
                "source": { "op": "recurring", "rule": { "freq": "daily", "start": 32400, "duration": 28800 } },
                "subtract": [{
                    "op": "intervals",
                    "intervals": [{ "start": 1736157600, "end": 1736161200, "title": "sync" }]
                }]
            }
        }"#,
    )
    .unwrap();

    // A date end bound covers the whole of that day.
    assert_eq!(
        spans(&doc),
        vec![
            (JAN_6 + 9 * HOUR, JAN_6 + 10 * HOUR),
            (JAN_6 + 11 * HOUR, JAN_6 + 17 * HOUR),
            (JAN_6 + 33 * HOUR, JAN_6 + 41 * HOUR),
        ]
    );
}

#[test]
fn filters_compose_with_timelines() {
    let doc = QueryDoc::parse(
        r#"{
            "expr": {
                "op": "intersection",
                "of": [
                    { "op": "intervals", "intervals": [
                        { "start": 0, "end": 1800, "tags": ["work"] },
                        { "start": 3600, "end": 10800, "tags": ["work", "focus"] },
                        { "start": 14400, "end": 18000, "tags": ["personal"] }
                    ] },
                    { "op": "compare", "property": "hours", "cmp": ">=", "value": 1 },
                    { "op": "has_any", "property": { "field": "tags" }, "values": ["work"] }
                ]
            }
        }"#,
    )
    .unwrap();

    let result = doc.evaluate().unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].key(), (3_600, 10_800));
    assert_eq!(result[0].metadata["tags"], json!(["work", "focus"]));
}

#[test]
fn transforms_and_complement() {
    let doc = QueryDoc::parse(
        r#"{
            "start": 0,
            "end": 100,
            "expr": {
                "op": "complement",
                "of": {
                    "op": "merge_within",
                    "gap": 5,
                    "of": {
                        "op": "buffer",
                        "before": 2,
                        "of": { "op": "intervals", "intervals": [
                            { "start": 10, "end": 20 },
                            { "start": 25, "end": 30 },
                            { "start": 60, "end": 70 }
                        ] }
                    }
                }
            }
        }"#,
    )
    .unwrap();

    assert_eq!(spans(&doc), vec![(0, 8), (30, 58), (70, 100)]);
}

#[test]
fn union_of_a_timeline_and_a_filter_fails() {
    let doc = QueryDoc::parse(
        r#"{
            "expr": {
                "op": "union",
                "of": [
                    { "op": "intervals", "intervals": [{ "start": 0, "end": 10 }] },
                    { "op": "compare", "property": "seconds", "cmp": ">", "value": 5 }
                ]
            }
        }"#,
    )
    .unwrap();

    assert!(matches!(doc.evaluate(), Err(AlgebraError::Composition(_))));
}

#[test]
fn a_bare_filter_is_not_a_timeline() {
    let doc = QueryDoc::parse(
        r#"{ "expr": { "op": "one_of", "property": { "field": "title" }, "values": ["a"] } }"#,
    )
    .unwrap();
    assert!(matches!(doc.timeline(), Err(AlgebraError::Composition(_))));
}

#[test]
fn bounds_are_coerced() {
    let doc = QueryDoc::parse(
        r#"{ "start": "2025-01-06T09:00:00+01:00", "end": null,
             "expr": { "op": "intervals", "intervals": [] } }"#,
    )
    .unwrap();
    assert_eq!(doc.bounds().unwrap(), (Some(JAN_6 + 8 * HOUR), None));

    let naive = QueryDoc::parse(
        r#"{ "start": "2025-01-06T09:00:00", "expr": { "op": "intervals", "intervals": [] } }"#,
    )
    .unwrap();
    assert!(matches!(naive.evaluate(), Err(AlgebraError::TypeConversion(_))));
}

#[test]
fn complement_without_bounds_is_a_bounds_error() {
    let doc = QueryDoc::parse(
        r#"{ "start": 0, "expr": { "op": "complement", "of": { "op": "intervals", "intervals": [] } } }"#,
    )
    .unwrap();
    assert!(matches!(doc.evaluate(), Err(AlgebraError::Bounds(_))));
}

#[test]
fn malformed_documents() {
    let inverted = QueryDoc::parse(
        r#"{ "expr": { "op": "intervals", "intervals": [{ "start": 10, "end": 5 }] } }"#,
    )
    .unwrap();
    assert!(matches!(
        inverted.evaluate(),
        Err(AlgebraError::InvalidInterval { start: 10, end: 5 })
    ));

    assert!(matches!(
        QueryDoc::parse(r#"{ "expr": { "op": "explode" } }"#),
        Err(AlgebraError::Json(_))
    ));

    let bad_rule = QueryDoc::parse(
        r#"{ "expr": { "op": "recurring", "rule": { "freq": "daily", "interval": 0 } } }"#,
    )
    .unwrap();
    assert!(matches!(bad_rule.timeline(), Err(AlgebraError::InvalidRule(_))));
}

#[test]
fn documents_round_trip_through_serde() {
    let doc = ExprDoc::Buffer {
        of: Box::new(ExprDoc::Intervals { intervals: Vec::new() }),
        before: 60,
        after: 0,
    };
    let encoded = serde_json::to_value(&doc).unwrap();
    assert_eq!(encoded["op"], "buffer");
    assert_eq!(serde_json::from_value::<ExprDoc>(encoded).unwrap(), doc);
}

#[test]
fn reserved_bounds_in_documents_are_rejected() {
    let doc = QueryDoc::parse(&format!(
        r#"{{ "expr": {{ "op": "intervals", "intervals": [{{ "start": {}, "end": 5 }}] }} }}"#,
        i64::MIN
    ))
    .unwrap();
    assert!(matches!(doc.evaluate(), Err(AlgebraError::InvalidArgument(_))));
}
