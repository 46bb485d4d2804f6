//! Cleaning of free-text incident dates.
//!
//! Raw values such as `"Reported 03-Jan-2015"` or `"12--05--1998 text"` go
//! through four steps, each exposed on its own:
//!
//! 1. [`strip_leading_non_digits`] drops prefixes like `"Reported "`.
//! 2. [`strip_trailing_letters`] drops trailing unit text.
//! 3. [`collapse_hyphens`] turns `--` runs into a single separator.
//! 4. [`parse_lenient`] infers the day/month/year order from the content.
//!
//! Anything that does not survive the parse becomes the `"Unknown"` sentinel.

use std::borrow::Cow;
use std::fmt;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::Value;

/// Placeholder written in place of an unparsable date.
pub const UNKNOWN_DATE: &str = "Unknown";

static LEADING_NON_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^0-9]*").unwrap());
static TRAILING_LETTERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]*$").unwrap());
static REPEATED_HYPHENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").unwrap());

const MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

const WEEKDAYS: [&str; 7] = [
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];

/// Result of cleaning one date cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrSentinel {
    Date(NaiveDate),
    Unknown,
}

impl DateOrSentinel {
    pub fn is_unknown(&self) -> bool {
        matches!(self, DateOrSentinel::Unknown)
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            DateOrSentinel::Date(d) => Some(*d),
            DateOrSentinel::Unknown => None,
        }
    }
}

impl From<DateOrSentinel> for Value {
    fn from(cleaned: DateOrSentinel) -> Self {
        match cleaned {
            DateOrSentinel::Date(d) => Value::Date(d),
            DateOrSentinel::Unknown => Value::Text(UNKNOWN_DATE.to_string()),
        }
    }
}

impl fmt::Display for DateOrSentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateOrSentinel::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            DateOrSentinel::Unknown => f.write_str(UNKNOWN_DATE),
        }
    }
}

/// Clean a single raw date. Missing input yields the sentinel.
pub fn clean_date(raw: Option<&str>) -> DateOrSentinel {
    let raw = match raw {
        Some(r) if !Value::is_null_token(r) => r,
        _ => return DateOrSentinel::Unknown,
    };

    let stripped = strip_leading_non_digits(raw);
    let stripped = strip_trailing_letters(&stripped);
    let collapsed = collapse_hyphens(&stripped);

    match parse_lenient(&collapsed) {
        Some(date) => DateOrSentinel::Date(date),
        None => DateOrSentinel::Unknown,
    }
}

/// Clean a table cell.
pub fn clean_date_value(value: &Value) -> DateOrSentinel {
    match value {
        Value::Missing => DateOrSentinel::Unknown,
        Value::Date(d) => DateOrSentinel::Date(*d),
        other => {
            let text = other.as_text();
            clean_date(Some(&*text))
        }
    }
}

/// Remove the leading run of non-digit characters.
pub fn strip_leading_non_digits(raw: &str) -> Cow<'_, str> {
    LEADING_NON_DIGITS.replace(raw, "")
}

/// Remove the trailing run of ASCII letters.
pub fn strip_trailing_letters(raw: &str) -> Cow<'_, str> {
    TRAILING_LETTERS.replace(raw, "")
}

/// Collapse doubled (or longer) hyphen runs to a single hyphen.
pub fn collapse_hyphens(raw: &str) -> Cow<'_, str> {
    REPEATED_HYPHENS.replace_all(raw, "-")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Number { value: u32, digits: usize },
    Month(u32),
}

/// Parse a date without a fixed format.
///
/// - A four-digit number, or one above 31, is the year.
/// - A leading year means year-month-day.
/// - Otherwise numbers read month first, unless the first cannot be a month.
/// - Two-digit years below 50 belong to the 2000s, the rest to the 1900s.
/// - A missing day or month defaults to 1.
/// - Time-of-day tokens are ignored; any unrecognised word fails the parse.
pub fn parse_lenient(raw: &str) -> Option<NaiveDate> {
    let tokens = tokenize(raw)?;

    let mut month_name = None;
    let mut numbers = Vec::new();
    for token in tokens {
        match token {
            Token::Month(m) if month_name.is_none() => month_name = Some(m),
            Token::Month(_) => return None,
            Token::Number { value, digits } => numbers.push((value, digits)),
        }
    }

    if numbers.is_empty() || numbers.len() > 3 {
        return None;
    }

    let year_idx = numbers.iter().position(|&(v, d)| d >= 3 || v > 31);

    let (year, month, day) = match month_name {
        Some(month) => {
            let (year, rest) = match year_idx {
                Some(i) => (numbers[i], without(&numbers, i)),
                // "03-Jan-15": the trailing number is a two-digit year
                None if numbers.len() == 2 => (numbers[1], vec![numbers[0]]),
                None => return None,
            };
            match rest.as_slice() {
                [] => (year, month, 1),
                [(day, _)] => (year, month, *day),
                _ => return None,
            }
        }
        None => match (numbers.as_slice(), year_idx) {
            // Compact YYYYMMDD
            ([(v, 8)], _) => ((v / 10_000, 4), (v / 100) % 100, v % 100),
            ([year], Some(0)) => (*year, 1, 1),
            ([_, _], Some(i)) => {
                let year = numbers[i];
                let month = numbers[1 - i].0;
                (year, month, 1)
            }
            ([year, (a, _), (b, _)], Some(0)) => {
                let (month, day) = month_first(*a, *b);
                (*year, month, day)
            }
            ([(a, _), (b, _), year], Some(2)) => {
                let (month, day) = month_first(*a, *b);
                (*year, month, day)
            }
            ([(a, _), (b, _), year], None) => {
                let (month, day) = month_first(*a, *b);
                (*year, month, day)
            }
            _ => return None,
        },
    };

    NaiveDate::from_ymd_opt(expand_year(year)?, month, day)
}

fn without(numbers: &[(u32, usize)], idx: usize) -> Vec<(u32, usize)> {
    numbers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != idx)
        .map(|(_, n)| *n)
        .collect()
}

/// Read two numbers as month then day, swapping when the first cannot be a month.
fn month_first(a: u32, b: u32) -> (u32, u32) {
    if a > 12 && b <= 12 { (b, a) } else { (a, b) }
}

fn expand_year((value, digits): (u32, usize)) -> Option<i32> {
    let year = i32::try_from(value).ok()?;
    if digits <= 2 {
        Some(if year < 50 { 2000 + year } else { 1900 + year })
    } else {
        Some(year)
    }
}

fn tokenize(raw: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();

    let words = raw
        .split(|c: char| c.is_whitespace() || matches!(c, '-' | '/' | '.' | ','))
        .filter(|w| !w.is_empty());

    for word in words {
        if word.contains(':') {
            if is_time(word) {
                continue;
            }
            return None;
        }

        let mut after_number = false;
        for run in runs(word)? {
            if run.chars().all(|c| c.is_ascii_digit()) {
                if run.len() > 8 {
                    return None;
                }
                tokens.push(Token::Number {
                    value: run.parse().ok()?,
                    digits: run.len(),
                });
                after_number = true;
                continue;
            }

            let lower = run.to_lowercase();
            if after_number && matches!(lower.as_str(), "st" | "nd" | "rd" | "th") {
                after_number = false;
                continue;
            }
            if let Some(month) = month_from_name(&lower) {
                tokens.push(Token::Month(month));
            } else if !is_weekday(&lower) {
                return None;
            }
            after_number = false;
        }
    }

    Some(tokens)
}

/// Split a word into alternating runs of ASCII digits and ASCII letters.
fn runs(word: &str) -> Option<Vec<&str>> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut current: Option<bool> = None;

    for (i, c) in word.char_indices() {
        let is_digit = if c.is_ascii_digit() {
            true
        } else if c.is_ascii_alphabetic() {
            false
        } else {
            return None;
        };
        match current {
            Some(kind) if kind != is_digit => {
                runs.push(&word[start..i]);
                start = i;
            }
            _ => {}
        }
        current = Some(is_digit);
    }
    runs.push(&word[start..]);

    Some(runs)
}

fn is_time(word: &str) -> bool {
    let parts: Vec<&str> = word.split(':').collect();
    (2..=3).contains(&parts.len())
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.len() <= 2 && p.chars().all(|c| c.is_ascii_digit()))
}

fn month_from_name(lower: &str) -> Option<u32> {
    if lower.len() < 3 {
        return None;
    }
    if lower == "sept" {
        return Some(9);
    }
    MONTHS
        .iter()
        .position(|name| *name == lower || (lower.len() == 3 && name.starts_with(lower)))
        .map(|i| i as u32 + 1)
}

fn is_weekday(lower: &str) -> bool {
    lower.len() >= 3
        && WEEKDAYS
            .iter()
            .any(|name| *name == lower || (lower.len() == 3 && name.starts_with(lower)))
}
