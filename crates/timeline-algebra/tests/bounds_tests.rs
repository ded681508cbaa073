//! Tests for slice bound coercion.

use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::json;
use timeline_algebra::{coerce_bound, timeline, AlgebraError, Bound, Edge, Interval};

fn assert_type_error(result: Result<Option<i64>, AlgebraError>) {
    assert!(
        matches!(result, Err(AlgebraError::TypeConversion(_))),
        "expected a type conversion error, got {:?}",
        result
    );
}

#[test]
fn integers_and_unbounded_pass_through() {
    assert_eq!(coerce_bound(&Bound::Seconds(42), Edge::Start).unwrap(), Some(42));
    assert_eq!(coerce_bound(&Bound::Unbounded, Edge::End).unwrap(), None);
    assert_eq!(coerce_bound(&Some(7).into(), Edge::End).unwrap(), Some(7));
}

#[test]
fn aware_datetimes_use_their_offset() {
    let utc = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    assert_eq!(coerce_bound(&utc.into(), Edge::Start).unwrap(), Some(1_735_689_600));

    let plus_two = FixedOffset::east_opt(2 * 3600)
        .unwrap()
        .with_ymd_and_hms(2025, 1, 1, 2, 0, 0)
        .unwrap();
    assert_eq!(coerce_bound(&plus_two.into(), Edge::Start).unwrap(), Some(1_735_689_600));

    let tz: Tz = "America/New_York".parse().unwrap();
    let ny = tz.with_ymd_and_hms(2024, 12, 31, 19, 0, 0).unwrap();
    assert_eq!(coerce_bound(&ny.into(), Edge::End).unwrap(), Some(1_735_689_600));
}

#[test]
fn dates_are_utc_day_boundaries() {
    let day = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

    assert_eq!(coerce_bound(&day.into(), Edge::Start).unwrap(), Some(1_735_689_600));
    assert_eq!(
        coerce_bound(&day.into(), Edge::End).unwrap(),
        Some(1_735_689_600 + 86_400)
    );
}

#[test]
fn text_bounds() {
    assert_eq!(coerce_bound(&"1735689600".into(), Edge::Start).unwrap(), Some(1_735_689_600));
    assert_eq!(
        coerce_bound(&"2025-01-01T00:00:00Z".into(), Edge::Start).unwrap(),
        Some(1_735_689_600)
    );
    assert_eq!(
        coerce_bound(&"2025-01-01T03:00:00+03:00".into(), Edge::Start).unwrap(),
        Some(1_735_689_600)
    );
    assert_eq!(coerce_bound(&"2025-01-01".into(), Edge::Start).unwrap(), Some(1_735_689_600));
}

#[test]
fn naive_datetimes_are_rejected() {
    let naive = NaiveDate::from_ymd_opt(2025, 1, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    assert_type_error(coerce_bound(&naive.into(), Edge::Start));
    assert_type_error(coerce_bound(&"2025-01-01T09:00:00".into(), Edge::Start));

    let Err(AlgebraError::TypeConversion(message)) = coerce_bound(&naive.into(), Edge::End) else {
        panic!("naive datetime must be rejected");
    };
    assert!(message.contains("timezone-aware"), "unhelpful message: {}", message);
}

#[test]
fn unsupported_values_are_rejected() {
    assert_type_error(coerce_bound(&"next tuesday".into(), Edge::Start));
    assert!(matches!(
        Bound::from_json(&json!(1.5), Edge::Start),
        Err(AlgebraError::TypeConversion(_))
    ));
    assert!(matches!(
        Bound::from_json(&json!([1, 2]), Edge::End),
        Err(AlgebraError::TypeConversion(_))
    ));
    assert_eq!(Bound::from_json(&json!(null), Edge::End).unwrap(), Bound::Unbounded);
}

#[test]
fn slicing_rejects_before_fetching() {
    let tl = timeline([Interval::new(0, 10).unwrap()]);
    let naive = NaiveDate::from_ymd_opt(1970, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 5)
        .unwrap();

    assert!(tl.slice(naive, Bound::Unbounded).is_err());
    assert_eq!(tl.slice(0i64, 5i64).unwrap().count(), 1);
    assert_eq!(tl.slice(Bound::Unbounded, "1970-01-01").unwrap().count(), 1);
}

#[test]
fn extreme_integers_are_not_interval_bounds() {
    assert!(matches!(
        Interval::new(i64::MIN, 5i64),
        Err(AlgebraError::InvalidArgument(_))
    ));
    assert!(matches!(
        Interval::new(0i64, i64::MAX),
        Err(AlgebraError::InvalidArgument(_))
    ));
    assert!(matches!(
        Interval::new(None, i64::MIN),
        Err(AlgebraError::InvalidArgument(_))
    ));

    let unbounded = Interval::new(None, 5i64).unwrap();
    assert_eq!(unbounded.start, None);
    assert_eq!(unbounded.finite_start(), i64::MIN);

    let field_built = Interval {
        start: Some(i64::MIN),
        ..unbounded
    };
    assert!(field_built.validate().is_err());
}
