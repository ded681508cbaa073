//! Recurrence engine: calendar rules expanded lazily into interval streams.
//!
//! A [`RecurrenceRule`] names which calendar dates occur (frequency, step, weekday,
//! nth-weekday, day-of-month and month constraints) and the time-of-day window each
//! occurrence covers. [`RecurringPattern`] compiles the date part into an RFC 5545
//! RRULE body and expands it page by page with the `rrule` crate.
//!
//! ## Phase
//!
//! Every page is generated from a DTSTART on a fixed grid: the rule's `anchor` date
//! (or 1970-01-01) stepped by whole `interval` units. Weekly grids start on the
//! Monday on or before the origin, so an unanchored weekly rule counts weeks from
//! Monday 1969-12-29. Where a query begins never changes which cycle an occurrence
//! falls in.
//!
//! ## Lookback
//!
//! An occurrence that starts before the query may still reach into it. Expansion
//! begins at `start - (duration + period)`, where `period` is a conservative length
//! of one step (1 day, 1 week, 32 days or 366 days, times `interval`), and drops any
//! occurrence ending at or before `start`.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveTime, Weekday};
use chrono_tz::Tz;
use rrule::RRuleSet;
use serde::{Deserialize, Serialize};

use crate::dst::DstPolicy;
use crate::error::{AlgebraError, Result};
use crate::interval::{Interval, Metadata, DAY, WEEK};
use crate::timeline::{Intervals, Kind, Node, Timeline};

/// Raw dates requested from `rrule` per page.
const PAGE_LIMIT: u16 = 512;
/// Grid units covered by one page.
const PAGE_SPAN: u32 = 32;
/// Consecutive pages without a single date before a stream gives up.
const MAX_EMPTY_PAGES: u32 = 64;
/// Longest occurrence a rule may describe: one hundred leap years.
const MAX_DURATION: i64 = 100 * 366 * DAY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    fn as_rrule(self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Yearly => "YEARLY",
        }
    }

    /// Upper bound on the length of one step, in seconds.
    fn period(self) -> i64 {
        match self {
            Frequency::Daily => DAY,
            Frequency::Weekly => WEEK,
            Frequency::Monthly => 32 * DAY,
            Frequency::Yearly => 366 * DAY,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        })
    }
}

impl FromStr for Frequency {
    type Err = AlgebraError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            other => Err(AlgebraError::InvalidRule(format!(
                "unknown frequency '{}'; expected daily, weekly, monthly or yearly",
                other
            ))),
        }
    }
}

/// Parameters of a recurring series.
///
/// `start` is the occurrence start in seconds after local midnight and `duration`
/// its length in seconds; both are applied in `tz`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurrenceRule {
    pub freq: Frequency,
    /// Repeat every N units.
    pub interval: u32,
    pub days: Vec<Weekday>,
    /// Which occurrence of `days` within the month (1 = first, -1 = last).
    pub week: Option<i8>,
    /// Days of the month, negative counting from the end (-1 = last day).
    pub days_of_month: Vec<i8>,
    pub months: Vec<u32>,
    pub start: u32,
    pub duration: i64,
    pub tz: String,
    /// First date of the series and origin of its phase.
    pub anchor: Option<NaiveDate>,
    pub dst: DstPolicy,
    /// Occurrence start timestamps to leave out.
    pub exdates: Vec<i64>,
    pub metadata: Metadata,
}

impl Default for RecurrenceRule {
    fn default() -> Self {
        Self {
            freq: Frequency::Daily,
            interval: 1,
            days: Vec::new(),
            week: None,
            days_of_month: Vec::new(),
            months: Vec::new(),
            start: 0,
            duration: DAY,
            tz: "UTC".to_string(),
            anchor: None,
            dst: DstPolicy::default(),
            exdates: Vec::new(),
            metadata: Metadata::default(),
        }
    }
}

impl RecurrenceRule {
    pub fn new(freq: Frequency) -> Self {
        Self {
            freq,
            ..Self::default()
        }
    }

    pub fn every(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    pub fn on(mut self, days: impl IntoIterator<Item = Weekday>) -> Self {
        self.days = days.into_iter().collect();
        self
    }

    pub fn week(mut self, week: i8) -> Self {
        self.week = Some(week);
        self
    }

    pub fn days_of_month(mut self, days: impl IntoIterator<Item = i8>) -> Self {
        self.days_of_month = days.into_iter().collect();
        self
    }

    pub fn months(mut self, months: impl IntoIterator<Item = u32>) -> Self {
        self.months = months.into_iter().collect();
        self
    }

    /// Time-of-day window: `start` seconds after midnight, lasting `duration` seconds.
    pub fn window(mut self, start: u32, duration: i64) -> Self {
        self.start = start;
        self.duration = duration;
        self
    }

    pub fn tz(mut self, tz: impl Into<String>) -> Self {
        self.tz = tz.into();
        self
    }

    pub fn anchor(mut self, anchor: NaiveDate) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn dst(mut self, policy: DstPolicy) -> Self {
        self.dst = policy;
        self
    }

    pub fn exdates(mut self, exdates: impl IntoIterator<Item = i64>) -> Self {
        self.exdates = exdates.into_iter().collect();
        self
    }

    pub fn metadata(mut self, metadata: impl Into<Metadata>) -> Self {
        self.metadata = metadata.into();
        self
    }
}

/// Date constraints after filling in the anchor-derived defaults.
#[derive(Debug, Clone)]
struct Constraints {
    days: Vec<Weekday>,
    days_of_month: Vec<i8>,
    months: Vec<u32>,
}

/// A validated, compiled recurrence rule; a [`Timeline`] of its occurrences.
#[derive(Debug, Clone)]
pub struct RecurringPattern {
    rule: RecurrenceRule,
    tz: Tz,
    constraints: Constraints,
    body: String,
    /// Grid origin: the anchor (or epoch), moved back to Monday for weekly rules.
    origin: NaiveDate,
    exdates: Vec<i64>,
}

impl RecurringPattern {
    pub fn new(rule: RecurrenceRule) -> Result<Self> {
        validate(&rule)?;
        let tz: Tz = rule
            .tz
            .parse()
            .map_err(|_| AlgebraError::InvalidTimezone(rule.tz.clone()))?;

        // 1970-01-01
        let base = rule.anchor.unwrap_or_default();
        let origin = match rule.freq {
            Frequency::Weekly => base
                .checked_sub_days(Days::new(u64::from(base.weekday().num_days_from_monday())))
                .ok_or_else(|| AlgebraError::InvalidRule(format!("anchor {} is out of range", base)))?,
            _ => base,
        };

        let constraints = fill_defaults(&rule);
        let body = compile(&rule, &constraints);
        let mut exdates = rule.exdates.clone();
        exdates.sort_unstable();

        let pattern = Self {
            rule,
            tz,
            constraints,
            body,
            origin,
            exdates,
        };
        // Reject anything `rrule` refuses now rather than mid-stream.
        pattern.page(pattern.origin)?;
        Ok(pattern)
    }

    /// The rule this pattern was built from, anchor included.
    pub fn rule(&self) -> &RecurrenceRule {
        &self.rule
    }

    /// The compiled RRULE body, e.g. `FREQ=WEEKLY;INTERVAL=2;BYDAY=MO`.
    pub fn to_rrule(&self) -> &str {
        &self.body
    }

    /// Round `date` down to the nearest grid point.
    fn grid_floor(&self, date: NaiveDate) -> Option<NaiveDate> {
        let step = i64::from(self.rule.interval);
        match self.rule.freq {
            Frequency::Daily | Frequency::Weekly => {
                let unit = if self.rule.freq == Frequency::Weekly {
                    7 * step
                } else {
                    step
                };
                let offset = (date - self.origin).num_days().div_euclid(unit) * unit;
                self.origin.checked_add_signed(Duration::days(offset))
            }
            Frequency::Monthly => {
                let origin = month_index(self.origin);
                let floored = origin + (month_index(date) - origin).div_euclid(step) * step;
                let year = i32::try_from(floored.div_euclid(12)).ok()?;
                NaiveDate::from_ymd_opt(year, floored.rem_euclid(12) as u32 + 1, 1)
            }
            Frequency::Yearly => {
                let origin = i64::from(self.origin.year());
                let floored = origin + (i64::from(date.year()) - origin).div_euclid(step) * step;
                NaiveDate::from_ymd_opt(i32::try_from(floored).ok()?, 1, 1)
            }
        }
    }

    /// The grid point `units` steps after `grid`.
    fn advance(&self, grid: NaiveDate, units: u32) -> Option<NaiveDate> {
        let steps = self.rule.interval.checked_mul(units)?;
        match self.rule.freq {
            Frequency::Daily => grid.checked_add_days(Days::new(u64::from(steps))),
            Frequency::Weekly => grid.checked_add_days(Days::new(7 * u64::from(steps))),
            Frequency::Monthly => grid.checked_add_months(Months::new(steps)),
            Frequency::Yearly => grid.checked_add_months(Months::new(steps.checked_mul(12)?)),
        }
    }

    /// Expand one page of dates on or after `from`.
    fn page(&self, from: NaiveDate) -> Result<Page> {
        let out_of_range =
            || AlgebraError::InvalidRule(format!("dates near {} are out of range", from));
        let grid = self.grid_floor(from).ok_or_else(out_of_range)?;
        let horizon = self.advance(grid, PAGE_SPAN).ok_or_else(out_of_range)?;

        let text = format!(
            "DTSTART:{}T000000Z\nRRULE:{};UNTIL={}T000000Z",
            grid.format("%Y%m%d"),
            self.body,
            horizon.format("%Y%m%d")
        );
        let set: RRuleSet = text
            .parse()
            .map_err(|e: rrule::RRuleError| AlgebraError::InvalidRule(e.to_string()))?;
        let result = set.all(PAGE_LIMIT);

        let raw: Vec<NaiveDate> = result.dates.iter().map(DateTime::date_naive).collect();
        let next = if result.limited {
            raw.last().and_then(|d| d.succ_opt()).filter(|d| *d > from)
        } else {
            Some(horizon)
        };
        let dates: Vec<NaiveDate> = raw
            .into_iter()
            .filter(|d| *d >= from && *d < horizon)
            .filter(|d| self.rule.anchor.is_none_or(|anchor| *d >= anchor))
            // RFC 5545 counts DTSTART as an occurrence even when it breaks the rule.
            .filter(|d| *d != grid || self.matches(*d))
            .collect();

        tracing::trace!(%from, %grid, %horizon, dates = dates.len(), "recurrence page");
        Ok(Page { dates, next })
    }

    /// Does `date` satisfy every date constraint of the rule?
    fn matches(&self, date: NaiveDate) -> bool {
        let c = &self.constraints;
        if !c.months.is_empty() && !c.months.contains(&date.month()) {
            return false;
        }
        let day = date.day() as i32;
        let last = days_in_month(date);
        if !c.days_of_month.is_empty()
            && !c.days_of_month.iter().any(|&d| {
                let d = i32::from(d);
                d == day || (d < 0 && last + d + 1 == day)
            })
        {
            return false;
        }
        if !c.days.is_empty() {
            if !c.days.contains(&date.weekday()) {
                return false;
            }
            if let Some(week) = self.rule.week {
                let week = i32::from(week);
                let nth = if week > 0 {
                    (day - 1) / 7 + 1
                } else {
                    -((last - day) / 7 + 1)
                };
                return nth == week;
            }
        }
        true
    }

    fn occurrence(&self, date: NaiveDate) -> Option<Interval> {
        let local = date.and_time(NaiveTime::MIN) + Duration::seconds(i64::from(self.rule.start));
        let start = self.rule.dst.resolve(local, &self.tz)?;
        Some(Interval {
            start: Some(start),
            end: Some(start.checked_add(self.rule.duration)?),
            metadata: self.rule.metadata.clone(),
        })
    }
}

impl Timeline for RecurringPattern {
    fn fetch(&self, start: Option<i64>, end: Option<i64>) -> Result<Intervals<'_>> {
        let Some(start) = start else {
            return Err(AlgebraError::Bounds(format!(
                "recurring {} pattern needs a finite start to anchor its lookback, got start=None. \
                 Slice from a concrete time, e.g. node.slice(1735689600i64, Bound::Unbounded)",
                self.rule.freq
            )));
        };
        tracing::debug!(start, ?end, rule = %self.body, "recurrence fetch");

        let lookback = self
            .rule
            .duration
            .saturating_add(self.rule.freq.period() * i64::from(self.rule.interval));
        let from = DateTime::from_timestamp(start.saturating_sub(lookback), 0)
            .ok_or_else(|| {
                AlgebraError::InvalidArgument(format!(
                    "start {} is outside the calendar range a recurrence can expand",
                    start
                ))
            })?
            .with_timezone(&self.tz)
            .date_naive();
        let from = self.rule.anchor.map_or(from, |anchor| from.max(anchor));

        Ok(Box::new(Occurrences {
            pattern: self,
            start,
            end,
            dates: VecDeque::new(),
            next_page: Some(from),
            empty_pages: 0,
        }))
    }

    fn kind(&self) -> Kind {
        if self.rule.metadata.is_empty() {
            Kind::Mask
        } else {
            Kind::Rich
        }
    }
}

/// Build a recurring timeline node.
///
/// ```
/// use chrono::Weekday;
/// use timeline_algebra::{recurring, Frequency, RecurrenceRule, HOUR};
///
/// // Mondays 09:00-10:00 UTC
/// let standup = recurring(
///     RecurrenceRule::new(Frequency::Weekly)
///         .on([Weekday::Mon])
///         .window(9 * HOUR as u32, HOUR),
/// )
/// .unwrap();
/// let first: Vec<_> = standup.fetch(Some(0), None).unwrap().take(2).collect();
/// // 1970-01-05 was a Monday
/// assert_eq!(first[0].start, Some(4 * 86_400 + 9 * 3_600));
/// assert_eq!(first[1].start, Some(11 * 86_400 + 9 * 3_600));
/// ```
pub fn recurring(rule: RecurrenceRule) -> Result<Node> {
    Ok(Node::new(RecurringPattern::new(rule)?))
}

struct Page {
    dates: Vec<NaiveDate>,
    /// Where the following page begins; `None` when nothing can follow.
    next: Option<NaiveDate>,
}

struct Occurrences<'a> {
    pattern: &'a RecurringPattern,
    start: i64,
    end: Option<i64>,
    dates: VecDeque<NaiveDate>,
    next_page: Option<NaiveDate>,
    empty_pages: u32,
}

impl Occurrences<'_> {
    /// Load the next non-empty page; `None` once generation is over.
    fn fill(&mut self) -> Option<()> {
        loop {
            let from = self.next_page?;
            // Nothing dated `from` or later can start before local midnight minus a day.
            let earliest = from.and_time(NaiveTime::MIN).and_utc().timestamp() - DAY;
            if self.end.is_some_and(|end| earliest >= end) {
                self.next_page = None;
                return None;
            }
            let page = match self.pattern.page(from) {
                Ok(page) => page,
                Err(err) => {
                    tracing::warn!(%from, error = %err, "recurrence expansion stopped");
                    self.next_page = None;
                    return None;
                }
            };
            self.next_page = page.next;
            if page.dates.is_empty() {
                self.empty_pages += 1;
                if self.empty_pages >= MAX_EMPTY_PAGES {
                    tracing::warn!(
                        rule = %self.pattern.body,
                        pages = self.empty_pages,
                        "recurrence produced no dates; giving up"
                    );
                    self.next_page = None;
                    return None;
                }
                continue;
            }
            self.empty_pages = 0;
            self.dates.extend(page.dates);
            return Some(());
        }
    }
}

impl Iterator for Occurrences<'_> {
    type Item = Interval;

    fn next(&mut self) -> Option<Interval> {
        loop {
            let Some(date) = self.dates.pop_front() else {
                self.fill()?;
                continue;
            };
            let Some(occurrence) = self.pattern.occurrence(date) else {
                continue;
            };
            let (start, end) = occurrence.key();
            if self.end.is_some_and(|e| start >= e) {
                self.dates.clear();
                self.next_page = None;
                return None;
            }
            if end <= self.start || self.pattern.exdates.binary_search(&start).is_ok() {
                continue;
            }
            return Some(occurrence);
        }
    }
}

fn validate(rule: &RecurrenceRule) -> Result<()> {
    let invalid = |msg: String| Err(AlgebraError::InvalidRule(msg));
    if rule.interval == 0 {
        return invalid("interval must be at least 1".to_string());
    }
    if i64::from(rule.start) >= DAY {
        return invalid(format!(
            "start must be seconds after midnight (0..86400), got {}",
            rule.start
        ));
    }
    if rule.duration <= 0 {
        return invalid(format!(
            "duration must be positive, got {}. Example: 3600 for one hour",
            rule.duration
        ));
    }
    if rule.duration > MAX_DURATION {
        return invalid(format!(
            "duration must be at most {} seconds, got {}",
            MAX_DURATION, rule.duration
        ));
    }
    if let Some(week) = rule.week {
        if week == 0 || !(-5..=5).contains(&week) {
            return invalid(format!("week must be 1..=5 or -5..=-1, got {}", week));
        }
        if rule.days.is_empty() {
            return invalid("week needs at least one day, e.g. week=1 with monday".to_string());
        }
        match rule.freq {
            Frequency::Monthly => {}
            Frequency::Yearly if !rule.months.is_empty() => {}
            Frequency::Yearly => {
                return invalid("a yearly week constraint needs months".to_string());
            }
            _ => {
                return invalid(format!(
                    "week only applies to monthly or yearly rules, not {}",
                    rule.freq
                ));
            }
        }
    }
    if let Some(d) = rule
        .days_of_month
        .iter()
        .find(|d| **d == 0 || !(-31..=31).contains(*d))
    {
        return invalid(format!("day of month must be 1..=31 or -31..=-1, got {}", d));
    }
    if let Some(m) = rule.months.iter().find(|m| !(1..=12).contains(*m)) {
        return invalid(format!("month must be 1..=12, got {}", m));
    }
    Ok(())
}

/// Pin the dates a bare rule would otherwise take from its DTSTART to the anchor,
/// so paging never shifts them.
fn fill_defaults(rule: &RecurrenceRule) -> Constraints {
    let mut c = Constraints {
        days: rule.days.clone(),
        days_of_month: rule.days_of_month.clone(),
        months: rule.months.clone(),
    };
    let anchor_day = rule.anchor.map_or(1, |a| a.day() as i8);
    match rule.freq {
        Frequency::Daily => {}
        Frequency::Weekly => {
            if c.days.is_empty() {
                c.days.push(rule.anchor.map_or(Weekday::Mon, |a| a.weekday()));
            }
        }
        Frequency::Monthly => {
            if c.days.is_empty() && c.days_of_month.is_empty() {
                c.days_of_month.push(anchor_day);
            }
        }
        Frequency::Yearly => {
            if c.days.is_empty() && c.days_of_month.is_empty() {
                if c.months.is_empty() {
                    c.months.push(rule.anchor.map_or(1, |a| a.month()));
                }
                c.days_of_month.push(anchor_day);
            }
        }
    }
    c
}

fn compile(rule: &RecurrenceRule, c: &Constraints) -> String {
    let mut parts = vec![format!("FREQ={}", rule.freq.as_rrule())];
    if rule.interval > 1 {
        parts.push(format!("INTERVAL={}", rule.interval));
    }
    if !c.days.is_empty() {
        let days: Vec<String> = c
            .days
            .iter()
            .map(|d| match rule.week {
                Some(week) => format!("{}{}", week, weekday_code(*d)),
                None => weekday_code(*d).to_string(),
            })
            .collect();
        parts.push(format!("BYDAY={}", days.join(",")));
    }
    if !c.days_of_month.is_empty() {
        parts.push(format!("BYMONTHDAY={}", join(&c.days_of_month)));
    }
    if !c.months.is_empty() {
        parts.push(format!("BYMONTH={}", join(&c.months)));
    }
    parts.join(";")
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

fn month_index(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}

fn days_in_month(date: NaiveDate) -> i32 {
    date.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .map_or(31, |last| last.day() as i32)
}
