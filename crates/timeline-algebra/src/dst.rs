//! DST transition policies for recurring occurrences.

use chrono::{Duration, LocalResult, NaiveDateTime, Offset, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Policy for occurrences whose local start time does not exist (spring-forward gap).
///
/// Ambiguous local times (fall-back overlap) always resolve to the earlier instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DstPolicy {
    /// Skip instances that fall in the DST gap (e.g., 2:30 AM during spring forward)
    Skip,
    /// Shift to the first valid minute after the gap
    ShiftForward,
    /// Keep the wall-clock reading and apply the offset in force before the gap
    #[default]
    WallClock,
}

impl DstPolicy {
    /// Resolve a local wall-clock time to Unix seconds, or `None` when skipped.
    pub fn resolve(self, local: NaiveDateTime, tz: &Tz) -> Option<i64> {
        match tz.from_local_datetime(&local) {
            LocalResult::Single(dt) => Some(dt.timestamp()),
            LocalResult::Ambiguous(earliest, _) => Some(earliest.timestamp()),
            LocalResult::None => match self {
                DstPolicy::Skip => None,
                DstPolicy::ShiftForward => (1..=24 * 60).find_map(|minutes| {
                    tz.from_local_datetime(&(local + Duration::minutes(minutes)))
                        .earliest()
                        .map(|dt| dt.timestamp())
                }),
                DstPolicy::WallClock => {
                    let before = tz
                        .from_local_datetime(&(local - Duration::days(1)))
                        .earliest()?;
                    let offset = before.offset().fix().local_minus_utc();
                    Some(local.and_utc().timestamp() - i64::from(offset))
                }
            },
        }
    }
}

