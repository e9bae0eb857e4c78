// Date resolution for log files
//
// A file's date comes from its name when possible, otherwise from its
// modification time. Files with neither are dropped by the caller.

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Where the year sits inside a matched date substring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldOrder {
    /// `YYYY-MM-DD`
    YearFirst,
    /// `DD-MM-YYYY`, read day-first
    YearLast,
}

/// Substring patterns tried against the file stem, in priority order.
const NAME_PATTERNS: [(&str, FieldOrder); 5] = [
    (r"\d{4}-\d{2}-\d{2}", FieldOrder::YearFirst),
    (r"\d{2}-\d{2}-\d{4}", FieldOrder::YearLast),
    (r"\d{2}/\d{2}/\d{4}", FieldOrder::YearLast),
    (r"\d{4}_\d{2}_\d{2}", FieldOrder::YearFirst),
    (r"\d{2}_\d{2}_\d{4}", FieldOrder::YearLast),
];

fn name_patterns() -> &'static [(Regex, FieldOrder)] {
    static PATTERNS: OnceLock<Vec<(Regex, FieldOrder)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        NAME_PATTERNS
            .iter()
            .filter_map(|(pattern, order)| Regex::new(pattern).ok().map(|re| (re, *order)))
            .collect()
    })
}

/// Resolve the best-guess timestamp for a log file.
///
/// Order: date-shaped substring in the stem, fuzzy parse of the whole stem,
/// filesystem modification time. `None` when the stat fails too.
pub fn resolve(path: &Path, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    date_from_name(&stem, now).or_else(|| modified_time(path))
}

/// Date encoded in a file stem, without touching the filesystem.
pub fn date_from_name(stem: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    match_name_patterns(stem).or_else(|| fuzzy_parse(stem, now))
}

fn match_name_patterns(stem: &str) -> Option<NaiveDateTime> {
    for (re, order) in name_patterns() {
        let Some(found) = re.find(stem) else { continue };
        let normalized = found.as_str().replace(['/', '_'], "-");
        // An impossible date in this class falls through to the next class
        if let Some(date) = parse_matched(&normalized, *order) {
            return Some(date.and_time(NaiveTime::MIN));
        }
    }
    None
}

fn parse_matched(s: &str, order: FieldOrder) -> Option<NaiveDate> {
    let parts: Vec<u32> = s
        .split('-')
        .map(|p| p.parse::<u32>())
        .collect::<Result<_, _>>()
        .ok()?;
    let &[a, b, c] = parts.as_slice() else { return None };

    let (year, first, second) = match order {
        FieldOrder::YearFirst => (a as i32, b, c),
        FieldOrder::YearLast => (c as i32, b, a),
    };
    // `first` is the month in the preferred reading; swap only when that reading is impossible
    NaiveDate::from_ymd_opt(year, first, second).or_else(|| NaiveDate::from_ymd_opt(year, second, first))
}

fn modified_time(path: &Path) -> Option<NaiveDateTime> {
    let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok()?;
    Some(DateTime::<Local>::from(modified).naive_local())
}

/// Lenient parse of a whole file stem. Unknown words are skipped.
pub fn fuzzy_parse(stem: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    DateTokens::scan(stem, false)?.build(now.date())
}

/// Strict parse of a user-supplied date such as `2025-05-15`, `15/05/2025`
/// or `May 15 2025`. Every word must be part of the date.
pub fn parse_date(s: &str, now: NaiveDateTime) -> Option<NaiveDate> {
    let tokens = DateTokens::scan(s, true)?;
    if tokens.numbers.len() > 2 {
        return None;
    }
    tokens.build(now.date()).map(|dt| dt.date())
}

#[derive(Debug, Default)]
struct DateTokens {
    year: Option<i32>,
    month_name: Option<u32>,
    /// Loose one/two digit numbers, in order of appearance
    numbers: Vec<u32>,
    compact: Option<NaiveDate>,
    time: Option<NaiveTime>,
}

impl DateTokens {
    fn scan(text: &str, strict: bool) -> Option<Self> {
        let mut tokens = DateTokens::default();

        for chunk in text.split(|c: char| !(c.is_alphanumeric() || c == ':')).filter(|c| !c.is_empty()) {
            if let Some(time) = parse_time(chunk) {
                if tokens.time.is_some() && strict {
                    return None;
                }
                tokens.time.get_or_insert(time);
                continue;
            }
            for word in split_alpha_digit(chunk) {
                if !tokens.push(word) && strict {
                    return None;
                }
            }
        }

        Some(tokens)
    }

    /// Record one token; false when it carries no date meaning.
    fn push(&mut self, word: &str) -> bool {
        if word.chars().all(|c| c.is_ascii_digit()) {
            return match word.len() {
                1 | 2 => {
                    self.numbers.push(word.parse().unwrap_or(0));
                    true
                }
                4 if self.year.is_none() => {
                    self.year = word.parse().ok();
                    true
                }
                8 if self.compact.is_none() => {
                    self.compact = NaiveDate::parse_from_str(word, "%Y%m%d").ok();
                    self.compact.is_some()
                }
                _ => false,
            };
        }

        let lower = word.to_lowercase();
        if let Some(month) = month_from_name(&lower) {
            if self.month_name.is_some() {
                return false;
            }
            self.month_name = Some(month);
            return true;
        }
        is_weekday(&lower) || matches!(lower.as_str(), "st" | "nd" | "rd" | "th")
    }

    /// Assemble a date, taking whatever the tokens leave out from `today`.
    fn build(&self, today: NaiveDate) -> Option<NaiveDateTime> {
        let time = self.time.unwrap_or(NaiveTime::MIN);
        if let Some(date) = self.compact {
            return Some(date.and_time(time));
        }

        let year = self.year.unwrap_or(today.year());
        // `None` day means "today's day, clamped to the month's length"
        let (month, day) = match (self.month_name, self.numbers.as_slice()) {
            (Some(month), [day, ..]) => (month, Some(*day)),
            (Some(month), []) => (month, None),
            (None, [month, day, ..]) if *month > 12 && *day <= 12 => (*day, Some(*month)),
            (None, [month, day, ..]) => (*month, Some(*day)),
            // Beside a year a lone number is the month, on its own it is the day
            (None, [month]) if self.year.is_some() => (*month, None),
            (None, [day]) => (today.month(), Some(*day)),
            (None, []) if self.year.is_some() || self.time.is_some() => (today.month(), None),
            (None, []) => return None,
        };

        let day = match day {
            Some(day) => day,
            None => today.day().min(last_day_of_month(year, month)?),
        };
        NaiveDate::from_ymd_opt(year, month, day).map(|d| d.and_time(time))
    }
}

fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    (28..=31).rev().find(|&day| NaiveDate::from_ymd_opt(year, month, day).is_some())
}

fn parse_time(chunk: &str) -> Option<NaiveTime> {
    if !chunk.contains(':') {
        return None;
    }
    NaiveTime::parse_from_str(chunk, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(chunk, "%H:%M"))
        .ok()
}

/// "march2024v2" -> ["march", "2024", "v", "2"]
fn split_alpha_digit(chunk: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start = 0;
    let mut prev_digit: Option<bool> = None;

    for (i, c) in chunk.char_indices() {
        if c == ':' {
            if start < i {
                words.push(&chunk[start..i]);
            }
            start = i + c.len_utf8();
            prev_digit = None;
            continue;
        }
        let digit = c.is_ascii_digit();
        if let Some(prev) = prev_digit {
            if prev != digit {
                words.push(&chunk[start..i]);
                start = i;
            }
        }
        prev_digit = Some(digit);
    }
    if start < chunk.len() {
        words.push(&chunk[start..]);
    }
    words
}

const MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june",
    "july", "august", "september", "october", "november", "december",
];

fn month_from_name(lower: &str) -> Option<u32> {
    if lower == "sept" {
        return Some(9);
    }
    MONTHS
        .iter()
        .position(|m| *m == lower || (lower.len() == 3 && m.starts_with(lower)))
        .map(|i| i as u32 + 1)
}

fn is_weekday(lower: &str) -> bool {
    const DAYS: [&str; 7] = ["monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday"];
    DAYS.iter().any(|d| *d == lower || (lower.len() == 3 && d.starts_with(lower)))
}
