use std::collections::BTreeSet;

use serde::Serialize;

use super::evidence::{
    CategoryKey, CategoryStatus, EvidenceToken, Gap, Reason, SignalBoard, SignalKey,
};
use super::weights::CATEGORY_WEIGHTS;

/// One user-facing category row of the explain breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryBreakdown {
    pub key: CategoryKey,
    pub weight_points: f64,
    pub earned_points: f64,
    pub achieved_fraction: f64,
    pub status: CategoryStatus,
    pub reasons: Vec<String>,
    pub gaps: Vec<String>,
}

const GOOD_THRESHOLD: f64 = 0.85;
const NEAR_ZERO_THRESHOLD: f64 = 0.1;

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Regroups the evaluated signals into the five fixed categories. A signal
/// that never became comparable is excluded from its category's weight
/// denominator, so undeclared data does not depress the category.
pub fn aggregate_categories(
    board: &SignalBoard,
    reasons: &[Reason],
    gaps: &[Gap],
    evidence: &BTreeSet<EvidenceToken>,
) -> Vec<CategoryBreakdown> {
    CategoryKey::ALL
        .iter()
        .map(|&category| {
            let mut weighted_raw_sum = 0.0;
            let mut weight_sum = 0.0;
            for key in SignalKey::ALL {
                if key.category() != category {
                    continue;
                }
                if let Some(contribution) = board.get(key) {
                    weighted_raw_sum += contribution.raw_value * contribution.weight;
                    weight_sum += contribution.weight;
                }
            }

            let in_play = weight_sum > 0.0;
            let achieved_fraction = if in_play {
                (weighted_raw_sum / weight_sum).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let weight_points = CATEGORY_WEIGHTS.for_category(category);
            let earned_points = round1(weight_points * achieved_fraction);

            let category_reasons: Vec<String> = reasons
                .iter()
                .filter(|reason| reason.category == category)
                .map(|reason| reason.text.clone())
                .collect();
            let category_gaps: Vec<String> = gaps
                .iter()
                .filter(|gap| gap.category == category)
                .map(|gap| gap.text.clone())
                .collect();

            let status = derive_status(
                category,
                in_play,
                achieved_fraction,
                &category_reasons,
                &category_gaps,
                evidence,
            );

            CategoryBreakdown {
                key: category,
                weight_points,
                earned_points,
                achieved_fraction,
                status,
                reasons: category_reasons,
                gaps: category_gaps,
            }
        })
        .collect()
}

fn derive_status(
    category: CategoryKey,
    in_play: bool,
    fraction: f64,
    reasons: &[String],
    gaps: &[String],
    evidence: &BTreeSet<EvidenceToken>,
) -> CategoryStatus {
    if !in_play {
        return CategoryStatus::Unknown;
    }

    if category == CategoryKey::Coursework
        && evidence.contains(&EvidenceToken::StudentCourseworkMissing)
    {
        return CategoryStatus::Unknown;
    }

    if category == CategoryKey::Availability {
        if evidence.contains(&EvidenceToken::LateStart) {
            return CategoryStatus::Gap;
        }
        return if fraction >= GOOD_THRESHOLD {
            CategoryStatus::Good
        } else if fraction > NEAR_ZERO_THRESHOLD {
            CategoryStatus::Partial
        } else {
            CategoryStatus::Gap
        };
    }

    if !gaps.is_empty() {
        return if fraction <= NEAR_ZERO_THRESHOLD {
            CategoryStatus::Gap
        } else {
            CategoryStatus::Partial
        };
    }
    if fraction >= GOOD_THRESHOLD {
        return CategoryStatus::Good;
    }
    if !reasons.is_empty() {
        return CategoryStatus::Partial;
    }
    CategoryStatus::Partial
}
