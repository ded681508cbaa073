//! `timeline` CLI: expand recurrence rules and evaluate timeline queries.
//!
//! ## Usage
//!
//! ```sh
//! # Every other Monday at 09:00 for 30 minutes, New York time
//! timeline expand --freq weekly --interval 2 --day mon --start 09:00 --duration 30 \
//!     --tz America/New_York --from 2025-01-01 --to 2025-03-01
//!
//! # Third Tuesday of each month, first five occurrences
//! timeline expand --freq monthly --day tue --week 3 --from 2025-01-01 --limit 5
//!
//! # Show the compiled RRULE instead of expanding
//! timeline expand --freq monthly --day-of-month 1,-1 --show-rule
//!
//! # Evaluate a JSON query document (stdin or -i)
//! timeline eval -i query.json
//! timeline eval --metrics < query.json
//! ```
//!
//! Occurrences and query results are printed as JSON lines on stdout. Logs go
//! to stderr; set `RUST_LOG` or pass `-v` to see them.

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveTime, Timelike, Weekday};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::io::{self, Read, Write};
use timeline_algebra::{
    coerce_bound, metrics, Bound, Edge, Frequency, Interval, QueryDoc, RecurrenceRule,
    RecurringPattern, Timeline, DAY, MINUTE,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "timeline",
    version,
    about = "Expand recurrence rules and evaluate timeline queries"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log debug output to stderr (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand a recurrence rule into occurrences
    Expand {
        /// daily, weekly, monthly or yearly
        #[arg(long, default_value = "daily")]
        freq: Frequency,
        /// Repeat every N periods
        #[arg(long, default_value_t = 1)]
        interval: u32,
        /// Weekdays, comma-separated (mon,wed,fri)
        #[arg(long = "day", value_delimiter = ',')]
        days: Vec<Weekday>,
        /// Which occurrence of --day in the month (1..5, or -1 for the last)
        #[arg(long, allow_hyphen_values = true)]
        week: Option<i8>,
        /// Days of the month, comma-separated; negative counts from the end
        #[arg(long = "day-of-month", value_delimiter = ',', allow_hyphen_values = true)]
        days_of_month: Vec<i8>,
        /// Months (1..12), comma-separated
        #[arg(long = "month", value_delimiter = ',')]
        months: Vec<u32>,
        /// Local start time of each occurrence (HH:MM)
        #[arg(long, default_value = "00:00", value_parser = parse_time_of_day)]
        start: u32,
        /// Occurrence length in minutes (defaults to a full day)
        #[arg(long)]
        duration: Option<i64>,
        /// IANA timezone the rule is evaluated in
        #[arg(long, default_value = "UTC")]
        tz: String,
        /// First date of the series
        #[arg(long)]
        anchor: Option<NaiveDate>,
        /// Expand from here: integer seconds, RFC 3339, or YYYY-MM-DD
        #[arg(long, required_unless_present = "show_rule")]
        from: Option<String>,
        /// Stop here (same formats as --from)
        #[arg(long)]
        to: Option<String>,
        /// Maximum number of occurrences to print
        #[arg(long)]
        limit: Option<usize>,
        /// Print the compiled RRULE instead of expanding
        #[arg(long)]
        show_rule: bool,
    },
    /// Evaluate a JSON query document
    Eval {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Print summary metrics over the query window instead of intervals
        #[arg(long)]
        metrics: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Expand {
            freq,
            interval,
            days,
            week,
            days_of_month,
            months,
            start,
            duration,
            tz,
            anchor,
            from,
            to,
            limit,
            show_rule,
        } => {
            let mut rule = RecurrenceRule::new(freq)
                .every(interval)
                .on(days)
                .days_of_month(days_of_month)
                .months(months)
                .window(start, duration.map_or(DAY, |m| m.saturating_mul(MINUTE)))
                .tz(tz);
            if let Some(week) = week {
                rule = rule.week(week);
            }
            if let Some(anchor) = anchor {
                rule = rule.anchor(anchor);
            }

            let pattern = RecurringPattern::new(rule).context("Invalid recurrence rule")?;
            tracing::debug!(rrule = pattern.to_rrule(), "compiled rule");

            if show_rule {
                println!("{}", pattern.to_rrule());
                return Ok(());
            }

            let from = parse_bound(from.as_deref(), Edge::Start)?;
            let to = parse_bound(to.as_deref(), Edge::End)?;
            if to.is_none() && limit.is_none() {
                bail!("An open-ended expansion needs --to or --limit");
            }

            let occurrences = pattern
                .fetch(from, to)
                .context("Failed to expand recurrence rule")?;
            write_lines(occurrences.take(limit.unwrap_or(usize::MAX)))?;
        }
        Commands::Eval { input, metrics } => {
            let raw = read_input(input.as_deref())?;
            let doc = QueryDoc::parse(&raw).context("Failed to parse query document")?;

            if metrics {
                let summary = summarize(&doc)?;
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                let results = doc.evaluate().context("Failed to evaluate query")?;
                write_lines(results)?;
            }
        }
    }

    Ok(())
}

/// Send logs to stderr, honouring `RUST_LOG` unless `--verbose` is given.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();
}

fn parse_time_of_day(raw: &str) -> Result<u32, String> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .map(|t| t.num_seconds_from_midnight())
        .map_err(|e| format!("expected HH:MM, got '{}': {}", raw, e))
}

fn parse_bound(raw: Option<&str>, edge: Edge) -> Result<Option<i64>> {
    let bound = raw.map_or(Bound::Unbounded, Bound::from);
    coerce_bound(&bound, edge).with_context(|| format!("Invalid bound: {}", raw.unwrap_or("")))
}

fn summarize(doc: &QueryDoc) -> Result<serde_json::Value> {
    let (Some(start), Some(end)) = doc.bounds().context("Invalid query bounds")? else {
        bail!("--metrics needs a query document with both start and end");
    };
    let node = doc.timeline().context("Failed to build query")?;

    Ok(json!({
        "start": start,
        "end": end,
        "count": metrics::count_intervals(&node, start, end)?,
        "total_duration": metrics::total_duration(&node, start, end)?,
        "coverage_ratio": metrics::coverage_ratio(&node, start, end)?,
        "max_duration": metrics::max_duration(&node, start, end)?,
        "min_duration": metrics::min_duration(&node, start, end)?,
    }))
}

fn write_lines(intervals: impl IntoIterator<Item = Interval>) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for interval in intervals {
        serde_json::to_writer(&mut out, &interval)?;
        writeln!(out)?;
    }
    Ok(())
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}
