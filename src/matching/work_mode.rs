use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::normalize::normalize_text;
use crate::ListingMatchInput;

/// Commute arrangement for a listing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkMode {
    Remote,
    Hybrid,
    InPerson,
}

impl WorkMode {
    /// Anything that requires showing up at least sometimes.
    pub fn is_in_person(self) -> bool {
        matches!(self, WorkMode::Hybrid | WorkMode::InPerson)
    }
}

static TRAILING_PARENTHETICAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^)]+)\)\s*$").unwrap());
static STRIP_PARENTHETICAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\([^)]*\)\s*$").unwrap());

/// Maps free-text commute wording onto the closed set. Unrecognized wording
/// is unknown, not an error.
pub fn parse_work_mode(value: &str) -> Option<WorkMode> {
    let normalized = normalize_text(value);
    if normalized.is_empty() {
        return None;
    }

    if normalized.contains("remote") {
        return Some(WorkMode::Remote);
    }
    if normalized.contains("hybrid") {
        return Some(WorkMode::Hybrid);
    }
    if normalized == "in person"
        || normalized.contains("on site")
        || normalized.contains("onsite")
    {
        return Some(WorkMode::InPerson);
    }

    None
}

/// Work mode from the explicit field first, then from a trailing
/// parenthetical in the location string ("New York, NY (Hybrid)").
pub fn derive_work_mode(listing: &ListingMatchInput) -> Option<WorkMode> {
    if let Some(mode) = listing.work_mode.as_deref().and_then(parse_work_mode) {
        return Some(mode);
    }

    let location = listing.location.as_deref().unwrap_or("");
    TRAILING_PARENTHETICAL_RE
        .captures(location)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_work_mode(m.as_str()))
}

/// Location name with any trailing parenthetical suffix stripped, in
/// canonical token form.
pub fn derive_location_name(listing: &ListingMatchInput) -> String {
    let location = listing.location.as_deref().unwrap_or("");
    if location.is_empty() {
        return String::new();
    }

    normalize_text(&STRIP_PARENTHETICAL_RE.replace(location, ""))
}
