// Timeframe selection
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use std::fmt;
use tracing::warn;

use crate::dates;

/// Parsed `--timeframe` selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    Year(i32),
    YearMonth(i32, u32),
    ExactDate(NaiveDate),
    /// Everything dated on or after `now - n days`; no upper bound
    LastNDays(i64),
}

impl Timeframe {
    /// Parse a user selector. Absent input selects the default window.
    ///
    /// Precedence is by length: 4 characters is a year, 7 characters with a
    /// `-` is a year-month, anything else must be a full date. Malformed input
    /// logs a warning and falls back to the default window.
    pub fn parse(raw: Option<&str>, window_days: i64, now: NaiveDateTime) -> Self {
        let Some(raw) = raw.filter(|r| !r.is_empty()) else {
            return Timeframe::LastNDays(window_days);
        };

        match Self::parse_selector(raw, now) {
            Some(timeframe) => timeframe,
            None => {
                warn!("Could not parse timeframe '{}'. Using last {} days.", raw, window_days);
                Timeframe::LastNDays(window_days)
            }
        }
    }

    fn parse_selector(raw: &str, now: NaiveDateTime) -> Option<Self> {
        match raw.chars().count() {
            4 => raw.parse().ok().map(Timeframe::Year),
            7 if raw.contains('-') => {
                let (year, month) = raw.split_once('-')?;
                if month.contains('-') {
                    return None;
                }
                Some(Timeframe::YearMonth(year.parse().ok()?, month.parse().ok()?))
            }
            _ => dates::parse_date(raw, now).map(Timeframe::ExactDate),
        }
    }

    pub fn contains(&self, date: NaiveDateTime, now: NaiveDateTime) -> bool {
        match *self {
            Timeframe::Year(year) => date.year() == year,
            Timeframe::YearMonth(year, month) => date.year() == year && date.month() == month,
            Timeframe::ExactDate(day) => date.date() == day,
            // A window reaching past the representable range has no lower bound
            Timeframe::LastNDays(days) => Duration::try_days(days)
                .and_then(|window| now.checked_sub_signed(window))
                .map_or(true, |cutoff| date >= cutoff),
        }
    }

    /// Keep the entries inside this timeframe, preserving input order.
    pub fn filter<T>(&self, entries: Vec<(T, NaiveDateTime)>, now: NaiveDateTime) -> Vec<(T, NaiveDateTime)> {
        entries
            .into_iter()
            .filter(|(_, date)| self.contains(*date, now))
            .collect()
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timeframe::Year(year) => write!(f, "{}", year),
            Timeframe::YearMonth(year, month) => write!(f, "{}-{:02}", year, month),
            Timeframe::ExactDate(day) => write!(f, "{}", day.format("%Y-%m-%d")),
            Timeframe::LastNDays(days) => write!(f, "Last {} days", days),
        }
    }
}

/// Range filter over resolved `(item, date)` pairs.
pub fn filter_by_timeframe<T>(
    entries: Vec<(T, NaiveDateTime)>,
    timeframe: Option<&str>,
    window_days: i64,
    now: NaiveDateTime,
) -> Vec<(T, NaiveDateTime)> {
    Timeframe::parse(timeframe, window_days, now).filter(entries, now)
}
