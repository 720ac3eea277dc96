use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use super::scoring::{MatchEngine, MatchResult};
use crate::{ListingMatchInput, StudentMatchProfile};

/// One eligible listing with its evaluation, in final rank order.
#[derive(Debug, Clone)]
pub struct RankedListing {
    pub listing: ListingMatchInput,
    pub result: MatchResult,
}

impl MatchEngine {
    /// Evaluates every listing against the profile, drops ineligible ones,
    /// and sorts into a total deterministic order: score descending, then
    /// creation time descending, then listing ID ascending. The order is
    /// stable across runs, which pagination and tests both rely on.
    pub fn rank_listings(
        &self,
        listings: &[ListingMatchInput],
        profile: &StudentMatchProfile,
    ) -> Vec<RankedListing> {
        let mut ranked: Vec<RankedListing> = listings
            .iter()
            .map(|listing| RankedListing {
                listing: listing.clone(),
                result: self.evaluate(listing, profile),
            })
            .filter(|ranked| ranked.result.eligible)
            .collect();

        ranked.sort_by(|a, b| {
            match b.result.score.cmp(&a.result.score) {
                Ordering::Equal => {}
                other => return other,
            }
            match created_at(&b.listing).cmp(&created_at(&a.listing)) {
                Ordering::Equal => {}
                other => return other,
            }
            a.listing.id.cmp(&b.listing.id)
        });

        ranked
    }
}

fn created_at(listing: &ListingMatchInput) -> DateTime<Utc> {
    listing.created_at.unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Ranks with the default engine configuration.
pub fn rank_listings(
    listings: &[ListingMatchInput],
    profile: &StudentMatchProfile,
) -> Vec<RankedListing> {
    MatchEngine::default().rank_listings(listings, profile)
}
