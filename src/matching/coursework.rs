use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::evidence::{
    describe_reason, CategoryKey, EvidenceToken, Gap, GapKind, Reason, SignalContribution,
    SignalKey,
};
use super::weights::MatchWeights;
use crate::normalize::{dedup_ids, normalize_text, normalize_tokens};
use crate::{ListingMatchInput, StudentMatchProfile};

/// Which coursework comparison tier actually fired, recorded on the result
/// for observability. Canonical categories -> legacy categories -> legacy
/// items -> free text; the order is never inverted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CourseworkPath {
    Canonical,
    Legacy,
    Text,
    #[default]
    None,
}

/// Listing-declared minimum number of matching coursework categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum CourseworkStrength {
    #[default]
    None,
    Medium,
    High,
}

impl CourseworkStrength {
    pub fn parse(value: Option<&str>) -> Self {
        match normalize_text(value.unwrap_or("")).as_str() {
            "high" => CourseworkStrength::High,
            "medium" => CourseworkStrength::Medium,
            _ => CourseworkStrength::None,
        }
    }

    /// Minimum category hits that count as fully satisfying the strength.
    pub fn minimum_hits(self) -> usize {
        match self {
            CourseworkStrength::High => 5,
            CourseworkStrength::Medium => 3,
            CourseworkStrength::None => 1,
        }
    }
}

/// Course-number level bands inferred upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LevelBand {
    Intro,
    Intermediate,
    Advanced,
}

/// Raw bump for advanced-level coursework against demanding listings.
const ADVANCED_BAND_BONUS: f64 = 0.1;
/// Free-text overlap is low-confidence and scores at a discount.
const TEXT_TIER_SCALE: f64 = 0.6;
/// Neutral raw value when the profile lists no coursework at all.
const MISSING_COURSEWORK_NEUTRAL: f64 = 0.45;

#[derive(Debug, Default)]
pub struct CourseworkOutcome {
    pub contribution: Option<SignalContribution>,
    pub reason: Option<Reason>,
    pub gap: Option<Gap>,
    pub path: CourseworkPath,
    pub evidence_tokens: Vec<EvidenceToken>,
}

fn has_any_student_coursework(profile: &StudentMatchProfile) -> bool {
    !dedup_ids(&profile.canonical_coursework_category_ids).is_empty()
        || !dedup_ids(&profile.coursework_category_ids).is_empty()
        || !dedup_ids(&profile.coursework_item_ids).is_empty()
        || !normalize_tokens(&profile.coursework).is_empty()
}

fn advanced_band(profile: &StudentMatchProfile) -> bool {
    profile
        .canonical_coursework_level_bands
        .iter()
        .any(|band| normalize_text(band).parse::<LevelBand>() == Ok(LevelBand::Advanced))
}

/// Coursework alignment with the tiered fallback chain. `targets_seniors`
/// comes from the listing's experience floor and unlocks the advanced-band
/// bonus alongside high desired strength.
pub fn evaluate_coursework(
    listing: &ListingMatchInput,
    profile: &StudentMatchProfile,
    weights: &MatchWeights,
    targets_seniors: bool,
) -> CourseworkOutcome {
    let weight = weights.coursework_alignment;
    let canonical_ids = dedup_ids(&listing.required_course_category_ids);

    // Tier: canonical required categories.
    if !canonical_ids.is_empty() {
        if !has_any_student_coursework(profile) {
            let contribution = SignalContribution::new(
                SignalKey::CourseworkAlignment,
                weight,
                MISSING_COURSEWORK_NEUTRAL,
                vec![
                    "student coursework missing, neutral raw applied".to_string(),
                    "path=canonical".to_string(),
                ],
            );
            return CourseworkOutcome {
                contribution: Some(contribution),
                reason: None,
                gap: Some(Gap::new(
                    GapKind::RequiredCoursework,
                    CategoryKey::Coursework,
                    "Add courses to improve matching for this role.",
                )),
                path: CourseworkPath::Canonical,
                evidence_tokens: vec![EvidenceToken::StudentCourseworkMissing],
            };
        }

        let student_ids: HashSet<String> = dedup_ids(&profile.canonical_coursework_category_ids)
            .into_iter()
            .collect();
        let hits = canonical_ids
            .iter()
            .filter(|id| student_ids.contains(*id))
            .count();
        let total = canonical_ids.len();
        let strength = CourseworkStrength::parse(listing.desired_coursework_strength.as_deref());
        let minimum = strength.minimum_hits();

        let direct_ratio = hits as f64 / total as f64;
        let strength_ratio = hits.min(minimum) as f64 / minimum as f64;
        let mut raw = direct_ratio.max(strength_ratio);

        let mut evidence = vec![
            format!("{hits}/{total} coursework categories matched"),
            format!("strength={strength}"),
            "path=canonical".to_string(),
        ];

        if advanced_band(profile) && (strength == CourseworkStrength::High || targets_seniors) {
            raw = (raw + ADVANCED_BAND_BONUS).min(1.0);
            evidence.push("advanced coursework bonus".to_string());
        }

        let names = dedup_ids(&listing.required_course_category_names);
        let contribution =
            SignalContribution::new(SignalKey::CourseworkAlignment, weight, raw, evidence.clone());

        if hits > 0 {
            let detail = if names.is_empty() {
                format!("{hits}/{total} categories matched ({strength} strength)")
            } else {
                format!(
                    "inferred categories match ({})",
                    names
                        .iter()
                        .take(hits)
                        .map(String::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            };
            let reason = Reason {
                key: "coursework.categories.canonical_overlap",
                text: describe_reason("Coursework categories", contribution.points, &detail),
                points: contribution.points,
                evidence,
                category: CategoryKey::Coursework,
            };
            return CourseworkOutcome {
                contribution: Some(contribution),
                reason: Some(reason),
                gap: None,
                path: CourseworkPath::Canonical,
                evidence_tokens: Vec::new(),
            };
        }

        let gap_detail = if names.is_empty() {
            format!("{total} categor{}", if total == 1 { "y" } else { "ies" })
        } else {
            names.join(", ")
        };
        return CourseworkOutcome {
            contribution: Some(contribution),
            reason: None,
            gap: Some(Gap::new(
                GapKind::RequiredCoursework,
                CategoryKey::Coursework,
                format!("Missing required coursework: {gap_detail}"),
            )),
            path: CourseworkPath::Canonical,
            evidence_tokens: Vec::new(),
        };
    }

    // Tier: legacy category links.
    let legacy_category_ids = dedup_ids(&listing.coursework_category_ids);
    let student_legacy_categories: HashSet<String> = dedup_ids(&profile.coursework_category_ids)
        .into_iter()
        .collect();
    if !legacy_category_ids.is_empty() && !student_legacy_categories.is_empty() {
        return ratio_tier(
            weight,
            &legacy_category_ids,
            &student_legacy_categories,
            CourseworkPath::Legacy,
            "coursework categories",
            "coursework.categories.legacy_overlap",
            1.0,
        );
    }

    // Tier: legacy coursework items.
    let legacy_item_ids = dedup_ids(&listing.coursework_item_ids);
    let student_items: HashSet<String> = dedup_ids(&profile.coursework_item_ids)
        .into_iter()
        .collect();
    if !legacy_item_ids.is_empty() && !student_items.is_empty() {
        return ratio_tier(
            weight,
            &legacy_item_ids,
            &student_items,
            CourseworkPath::Legacy,
            "coursework items",
            "coursework.items.legacy_overlap",
            1.0,
        );
    }

    // Tier: free-text overlap, discounted.
    let recommended = listing.recommended_coursework.tokens();
    let student_text: HashSet<String> = normalize_tokens(&profile.coursework)
        .into_iter()
        .collect();
    if !recommended.is_empty() && !student_text.is_empty() {
        return ratio_tier(
            weight,
            &recommended,
            &student_text,
            CourseworkPath::Text,
            "coursework text tokens",
            "coursework.text_overlap",
            TEXT_TIER_SCALE,
        );
    }

    CourseworkOutcome::default()
}

fn ratio_tier(
    weight: f64,
    required: &[String],
    student: &HashSet<String>,
    path: CourseworkPath,
    noun: &str,
    reason_key: &'static str,
    scale: f64,
) -> CourseworkOutcome {
    let hits = required.iter().filter(|id| student.contains(*id)).count();
    let total = required.len();
    let raw = (hits as f64 / total as f64) * scale;

    let mut evidence = vec![
        format!("{hits}/{total} {noun} matched"),
        format!("path={path}"),
    ];
    if scale < 1.0 {
        evidence.push("low-confidence text fallback".to_string());
    }

    let contribution =
        SignalContribution::new(SignalKey::CourseworkAlignment, weight, raw, evidence.clone());
    let reason = (hits > 0).then(|| Reason {
        key: reason_key,
        text: describe_reason(
            "Recommended coursework",
            contribution.points,
            &format!("{hits}/{total} matched"),
        ),
        points: contribution.points,
        evidence,
        category: CategoryKey::Coursework,
    });

    CourseworkOutcome {
        contribution: Some(contribution),
        reason,
        gap: None,
        path,
        evidence_tokens: Vec::new(),
    }
}
