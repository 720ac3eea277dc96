use serde::{Deserialize, Serialize};

use super::scoring::evaluate_match;
use crate::date::season::{season_for_month_index, Season};
use crate::date::month::month_index_from_token;
use crate::{ListingMatchInput, StudentMatchProfile};

/// The four-field record persisted alongside an application so reviewers can
/// see the score the candidate applied with, even after the algorithm moves
/// on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub match_score: u32,
    pub match_reasons: Vec<String>,
    pub match_gaps: Vec<String>,
    pub matching_version: String,
}

/// Builds the snapshot with default weights. Profiles without explicit term
/// preferences get one derived from their availability month, so seasonal
/// fit still shows up in the stored reasons.
pub fn build_match_snapshot(
    listing: &ListingMatchInput,
    profile: &StudentMatchProfile,
) -> MatchSnapshot {
    let result = evaluate_match(listing, &snapshot_profile(profile));

    MatchSnapshot {
        match_score: result.score.min(100),
        match_reasons: result.reasons,
        match_gaps: result.gaps,
        matching_version: result.matching_version,
    }
}

fn snapshot_profile(profile: &StudentMatchProfile) -> StudentMatchProfile {
    let mut profile = profile.clone();
    if profile.preferred_terms.is_empty() {
        if let Some(season) = derived_season(&profile) {
            profile.preferred_terms = vec![season.to_string()];
        }
    }
    profile
}

fn derived_season(profile: &StudentMatchProfile) -> Option<Season> {
    profile
        .availability_start_month
        .as_deref()
        .and_then(month_index_from_token)
        .and_then(season_for_month_index)
}
