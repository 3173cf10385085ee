//! Tour start-date codec
//!
//! Tour dates are stored as human-readable French strings such as
//! `"15 janvier 2024"`. This module converts between that form and a
//! structural [`TourDate`], and from there to a calendar [`NaiveDate`].
//!
//! Parsing is structural only: the day must be an integer and the month one
//! of the twelve names below, but the day is not checked against the length
//! of the month. `"31 février 2024"` parses, keeps its day for formatting,
//! and rolls over to 2 March 2024 when converted to a calendar date.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// French month names in calendar order, canonical lower-case spelling
pub const MONTHS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

/// A tour date as written in the store: day, month number (1-12), year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TourDate {
    day: i32,
    month: u32,
    year: i32,
}

impl TourDate {
    /// Build a tour date. Returns `None` when `month` is outside 1..=12.
    pub fn new(day: i32, month: u32, year: i32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { day, month, year })
        } else {
            None
        }
    }

    pub fn day(&self) -> i32 {
        self.day
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// French name of the month, lower case
    pub fn month_name(&self) -> &'static str {
        MONTHS[(self.month - 1) as usize]
    }

    /// Convert to a calendar date.
    ///
    /// Out-of-range days roll over into neighbouring months the way a
    /// lenient calendar constructor would (day 0 is the last day of the
    /// previous month). Returns `None` only when the result falls outside
    /// chrono's supported range.
    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        let first = NaiveDate::from_ymd_opt(self.year, self.month, 1)?;
        first.checked_add_signed(Duration::days(i64::from(self.day) - 1))
    }

    /// Structural form of a calendar date
    pub fn from_naive_date(date: NaiveDate) -> Self {
        Self {
            day: date.day() as i32,
            month: date.month(),
            year: date.year(),
        }
    }
}

impl fmt::Display for TourDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.day, self.month_name(), self.year)
    }
}

/// Look up a month name, case-insensitively. Returns the month number (1-12).
pub fn month_from_name(name: &str) -> Option<u32> {
    let lowered = name.to_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == lowered)
        .map(|index| index as u32 + 1)
}

/// Parse a stored tour date string.
///
/// Returns `None` unless the input splits into exactly three
/// whitespace-separated tokens `<day> <month> <year>` where day and year
/// are unsigned decimal integers without leading zeros and month is one of
/// [`MONTHS`] (any case). Every accepted string formats back to itself up
/// to whitespace and month case.
///
/// # Examples
///
/// ```
/// use flyer_common::tour_date::parse_tour_date;
///
/// let date = parse_tour_date("15 janvier 2024").unwrap();
/// assert_eq!((date.day(), date.month(), date.year()), (15, 1, 2024));
///
/// assert!(parse_tour_date("15 JANVIER 2024").is_some());
/// assert!(parse_tour_date("15 january 2024").is_none());
/// assert!(parse_tour_date("15 janvier").is_none());
/// assert!(parse_tour_date("015 janvier 2024").is_none());
/// ```
pub fn parse_tour_date(value: &str) -> Option<TourDate> {
    let mut tokens = value.split_whitespace();
    let (day, month, year) = (tokens.next()?, tokens.next()?, tokens.next()?);
    if tokens.next().is_some() {
        return None;
    }

    let day = parse_number(day)?;
    let month = month_from_name(month)?;
    let year = parse_number(year)?;

    TourDate::new(day, month, year)
}

/// Digits only, no sign, no leading zero
fn parse_number(token: &str) -> Option<i32> {
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if token.len() > 1 && token.starts_with('0') {
        return None;
    }
    token.parse().ok()
}

/// Format a tour date back into its stored string form.
///
/// # Examples
///
/// ```
/// use flyer_common::tour_date::{format_tour_date, parse_tour_date};
///
/// let date = parse_tour_date("3 août 2025").unwrap();
/// assert_eq!(format_tour_date(&date), "3 août 2025");
/// ```
pub fn format_tour_date(date: &TourDate) -> String {
    date.to_string()
}
