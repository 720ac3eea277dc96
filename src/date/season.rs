use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::month::month_index_from_token;
use crate::normalize::normalize_text;

/// Quarter-of-year term buckets. Variant order is the canonical display
/// order, so ordered sets iterate spring -> winter.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Fall, Season::Winter];

    /// Fallback start-month index used when only a season keyword is known.
    pub fn start_month_index(self) -> u32 {
        match self {
            Season::Spring => 2,
            Season::Summer => 4,
            Season::Fall => 8,
            Season::Winter => 0,
        }
    }
}

/// Month index (0-11) -> season. Dec/Jan/Feb are winter, Mar/Apr/May spring,
/// Jun/Jul/Aug summer, Sep/Oct/Nov fall.
pub fn season_for_month_index(month: u32) -> Option<Season> {
    match month {
        0 | 1 | 11 => Some(Season::Winter),
        2..=4 => Some(Season::Spring),
        5..=7 => Some(Season::Summer),
        8..=10 => Some(Season::Fall),
        _ => None,
    }
}

/// Single season from a free-text value: explicit season keyword first, then
/// a month name.
pub fn season_from_value(value: &str) -> Option<Season> {
    let normalized = normalize_text(value);
    if normalized.is_empty() {
        return None;
    }

    if let Some(season) = explicit_season(&normalized) {
        return Some(season);
    }

    month_index_from_token(&normalized).and_then(season_for_month_index)
}

fn explicit_season(normalized: &str) -> Option<Season> {
    if normalized.contains("spring") {
        Some(Season::Spring)
    } else if normalized.contains("summer") {
        Some(Season::Summer)
    } else if normalized.contains("fall") || normalized.contains("autumn") {
        Some(Season::Fall)
    } else if normalized.contains("winter") {
        Some(Season::Winter)
    } else {
        None
    }
}

static MONTH_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(january|february|march|april|may|june|july|august|september|october|november|december)\s+\d{4}\s*(?:-|to|through)\s*(january|february|march|april|may|june|july|august|september|october|november|december)\s+\d{4}",
    )
    .unwrap()
});

/// All seasons a term value touches. Priority: explicit season keywords, a
/// `Month YYYY - Month YYYY` range (every month in the span counts), then
/// bare month mentions.
pub fn seasons_from_value(value: &str) -> BTreeSet<Season> {
    let normalized = normalize_text(value);
    let mut seasons = BTreeSet::new();
    if normalized.is_empty() {
        return seasons;
    }

    for season in Season::ALL {
        if normalized.contains(&season.to_string())
            || (season == Season::Fall && normalized.contains("autumn"))
        {
            seasons.insert(season);
        }
    }
    if !seasons.is_empty() {
        return seasons;
    }

    // Ranges are parsed before normalization strips the dash.
    if let Some(caps) = MONTH_RANGE_RE.captures(value) {
        let start = month_index_from_token(caps.get(1).map(|m| m.as_str()).unwrap_or(""));
        let end = month_index_from_token(caps.get(2).map(|m| m.as_str()).unwrap_or(""));
        if let (Some(start), Some(end)) = (start, end) {
            let mut month = start;
            for _ in 0..12 {
                if let Some(season) = season_for_month_index(month) {
                    seasons.insert(season);
                }
                if month == end {
                    break;
                }
                month = (month + 1) % 12;
            }
            return seasons;
        }
    }

    for word in normalized.split(' ') {
        if let Some(month) = month_index_from_token(word) {
            if let Some(season) = season_for_month_index(month) {
                seasons.insert(season);
            }
        }
    }

    seasons
}

/// Merges explicit term preferences with the season implied by the
/// availability start month.
pub fn normalize_preferred_seasons(
    preferred_terms: &[String],
    availability_start_month: Option<&str>,
) -> BTreeSet<Season> {
    let mut seasons = BTreeSet::new();
    for term in preferred_terms {
        seasons.extend(seasons_from_value(term));
    }
    if let Some(month) = availability_start_month {
        if let Some(season) = month_index_from_token(month).and_then(season_for_month_index) {
            seasons.insert(season);
        }
    }
    seasons
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeasonOverlap {
    pub overlap_seasons: Vec<Season>,
    pub mismatch_seasons: Vec<Season>,
    /// Share of the listing's seasons the student covers.
    pub listing_coverage: f64,
}

impl SeasonOverlap {
    pub fn has_overlap(&self) -> bool {
        !self.overlap_seasons.is_empty()
    }
}

pub fn season_overlap(
    student_seasons: &BTreeSet<Season>,
    listing_seasons: &BTreeSet<Season>,
) -> SeasonOverlap {
    let overlap_seasons: Vec<Season> = listing_seasons
        .iter()
        .filter(|season| student_seasons.contains(season))
        .copied()
        .collect();
    let mismatch_seasons: Vec<Season> = listing_seasons
        .iter()
        .filter(|season| !student_seasons.contains(season))
        .copied()
        .collect();
    let listing_coverage = if listing_seasons.is_empty() {
        0.0
    } else {
        overlap_seasons.len() as f64 / listing_seasons.len() as f64
    };

    SeasonOverlap {
        overlap_seasons,
        mismatch_seasons,
        listing_coverage,
    }
}
