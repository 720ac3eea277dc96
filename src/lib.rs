pub mod date;
pub mod logging;
pub mod matching;
pub mod normalize;
pub mod skill_normalizer;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use normalize::TokenList;

pub use logging::{DiagnosticSink, NoopSink, TracingSink};
pub use matching::pipeline::{rank_listings, RankedListing};
pub use matching::scoring::{
    evaluate_match, evaluate_match_detailed, MatchBreakdown, MatchEngine, MatchEngineConfig,
    MatchResult,
};
pub use matching::snapshot::{build_match_snapshot, MatchSnapshot};

/// Stamped into every result so consumers can detect scores produced by an
/// older revision of the algorithm.
pub const MATCHING_VERSION: &str = "v2.0";

// Commonly used data models for matching functions.
//
// All fields except `id` are optional or empty-able; the evaluators treat
// absent and malformed values as unknowns, never as errors.

/// The opportunity side of an evaluation, as delivered by the listing loader.
///
/// Canonical catalog relations arrive pre-flattened into ID vectors; fields
/// that upstream forms deliver either as comma-joined strings or as arrays
/// use [`TokenList`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingMatchInput {
    pub id: String,
    pub title: Option<String>,
    pub majors: TokenList,
    pub target_graduation_years: TokenList,
    pub hours_per_week: Option<u32>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub work_mode: Option<String>,
    pub term: Option<String>,
    pub start_date: Option<String>,
    pub application_deadline: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub experience_level: Option<String>,
    pub target_student_year: Option<String>,
    pub category: Option<String>,
    pub required_skills: TokenList,
    pub preferred_skills: TokenList,
    pub required_skill_ids: Vec<String>,
    pub preferred_skill_ids: Vec<String>,
    /// Skill labels the employer typed that resolved to no catalog entry.
    pub custom_required_skills: Vec<String>,
    pub custom_preferred_skills: Vec<String>,
    pub recommended_coursework: TokenList,
    pub required_course_category_ids: Vec<String>,
    pub required_course_category_names: Vec<String>,
    pub desired_coursework_strength: Option<String>,
    /// Legacy coursework requirement model, consulted only when no canonical
    /// category requirement is present.
    pub coursework_category_ids: Vec<String>,
    pub coursework_category_names: Vec<String>,
    pub coursework_item_ids: Vec<String>,
}

/// The candidate side of an evaluation, as delivered by the profile loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentMatchProfile {
    pub majors: Vec<String>,
    /// Graduation-year token ("2026", "Spring 2026").
    pub year: Option<String>,
    pub experience_level: Option<String>,
    pub skills: Vec<String>,
    pub skill_ids: Vec<String>,
    /// Skill labels with no catalog entry.
    pub custom_skills: Vec<String>,
    /// Free-text course names.
    pub coursework: Vec<String>,
    pub coursework_item_ids: Vec<String>,
    pub coursework_category_ids: Vec<String>,
    pub canonical_coursework_category_ids: Vec<String>,
    pub canonical_coursework_category_names: Vec<String>,
    /// Level bands inferred from course numbers: intro/intermediate/advanced.
    pub canonical_coursework_level_bands: Vec<String>,
    pub availability_start_month: Option<String>,
    pub availability_hours_per_week: Option<u32>,
    pub preferred_terms: Vec<String>,
    pub preferred_locations: Vec<String>,
    pub preferred_work_modes: Vec<matching::work_mode::WorkMode>,
    pub remote_only: bool,
    /// Turns soft work-mode/location preference penalties into hard
    /// eligibility failures.
    pub strict_preferences: bool,
    /// Excludes listings that start before the profile's earliest month.
    pub strict_term_only: bool,
}
