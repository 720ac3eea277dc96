use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::normalize_text;

pub const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const MONTH_LABELS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

static DATE_ONLY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// Strict `YYYY-MM-DD` parse; anything else counts as unknown, never an error.
pub fn parse_date_only(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if !DATE_ONLY_RE.is_match(trimmed) {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}

/// Month index (0-11) from a month name or an unambiguous prefix of at least
/// three characters ("May", "sept", "Jan.").
pub fn month_index_from_token(value: &str) -> Option<u32> {
    let normalized = normalize_text(value);
    let token: String = normalized
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect();
    if token.len() < 3 {
        return None;
    }

    MONTH_NAMES
        .iter()
        .position(|name| name.starts_with(&token))
        .map(|index| index as u32)
}

/// Display name for a month index; indices wrap modulo 12.
pub fn month_label(index: u32) -> &'static str {
    MONTH_LABELS[(index % 12) as usize]
}

/// Signed month distance from `from` to `to`, wrapped into [-6, 6] so the
/// year boundary compares sanely (December availability against a January
/// listing is one month late, not eleven months early).
pub fn wrapped_month_distance(from: u32, to: u32) -> i32 {
    let mut diff = (to % 12) as i32 - (from % 12) as i32;
    if diff > 6 {
        diff -= 12;
    } else if diff < -6 {
        diff += 12;
    }
    diff
}
