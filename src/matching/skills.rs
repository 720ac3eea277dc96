use std::collections::{BTreeSet, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use strum::{AsRefStr, Display};

use super::evidence::{
    describe_reason, CategoryKey, Gap, GapKind, Reason, SignalContribution, SignalKey,
};
use super::weights::MatchWeights;
use crate::normalize::dedup_ids;
use crate::skill_normalizer::{normalize_skill, normalize_skill_set};
use crate::{ListingMatchInput, StudentMatchProfile};

/// Which comparison strategy actually fired. Canonical catalog IDs always
/// outrank free-text token overlap; the order is never inverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SkillPath {
    Canonical,
    Text,
}

/// Share of a skill signal's weight that out-of-catalog labels can add.
const CUSTOM_SKILL_SHARE: f64 = 0.2;

#[derive(Debug, Default)]
pub struct SkillSignalOutcome {
    pub contribution: Option<SignalContribution>,
    pub reason: Option<Reason>,
    pub gap: Option<Gap>,
    pub path: Option<SkillPath>,
}

static REQUIRED_SKILLS_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^required skills?:\s*(.+)$").unwrap());
static PREFERRED_SKILLS_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^preferred skills?:\s*(.+)$").unwrap());

struct RequirementSets {
    ids: Vec<String>,
    labels: BTreeSet<String>,
    custom: BTreeSet<String>,
}

impl RequirementSets {
    fn declared(&self) -> bool {
        !self.ids.is_empty() || !self.labels.is_empty() || !self.custom.is_empty()
    }
}

struct StudentSets {
    ids: HashSet<String>,
    text: HashSet<String>,
    custom: HashSet<String>,
}

fn skill_line_labels(listing: &ListingMatchInput, line_re: &Regex) -> Vec<String> {
    let description = listing.description.as_deref().unwrap_or("");
    line_re
        .captures(description)
        .and_then(|caps| caps.get(1))
        .map(|m| {
            m.as_str()
                .split(',')
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn requirement_sets(
    ids: &[String],
    declared_labels: Vec<String>,
    mined_labels: Vec<String>,
    custom: &[String],
) -> RequirementSets {
    let mut labels = BTreeSet::new();
    for label in declared_labels.into_iter().chain(mined_labels) {
        let normalized = normalize_skill(&label);
        if !normalized.is_empty() {
            labels.insert(normalized);
        }
    }

    RequirementSets {
        ids: dedup_ids(ids),
        labels,
        custom: normalize_skill_set(custom).into_iter().collect(),
    }
}

fn student_sets(profile: &StudentMatchProfile) -> StudentSets {
    // Free-text matching also credits coursework names and majors, the way
    // students actually describe what they can do.
    let mut text = HashSet::new();
    for label in profile
        .skills
        .iter()
        .chain(profile.coursework.iter())
        .chain(profile.majors.iter())
    {
        let normalized = normalize_skill(label);
        if !normalized.is_empty() {
            text.insert(normalized);
        }
    }

    StudentSets {
        ids: dedup_ids(&profile.skill_ids).into_iter().collect(),
        text,
        custom: normalize_skill_set(&profile.custom_skills),
    }
}

/// Core required-skills signal. Canonical ID overlap when both sides carry
/// IDs, else normalized free-text overlap; unmatched requirements surface as
/// the highest-severity gap.
pub fn evaluate_required_skills(
    listing: &ListingMatchInput,
    profile: &StudentMatchProfile,
    weights: &MatchWeights,
) -> SkillSignalOutcome {
    let requirement = requirement_sets(
        &listing.required_skill_ids,
        listing.required_skills.tokens(),
        skill_line_labels(listing, &REQUIRED_SKILLS_LINE_RE),
        &listing.custom_required_skills,
    );
    let student = student_sets(profile);

    evaluate_skill_signal(
        SignalKey::SkillsRequired,
        "Required skills",
        weights.skills_required,
        requirement,
        &student,
        true,
    )
}

/// Optional preferred-skills signal; same ladder, never gaps.
pub fn evaluate_preferred_skills(
    listing: &ListingMatchInput,
    profile: &StudentMatchProfile,
    weights: &MatchWeights,
) -> SkillSignalOutcome {
    let requirement = requirement_sets(
        &listing.preferred_skill_ids,
        listing.preferred_skills.tokens(),
        skill_line_labels(listing, &PREFERRED_SKILLS_LINE_RE),
        &listing.custom_preferred_skills,
    );
    let student = student_sets(profile);

    evaluate_skill_signal(
        SignalKey::SkillsPreferred,
        "Preferred skills",
        weights.skills_preferred,
        requirement,
        &student,
        false,
    )
}

fn evaluate_skill_signal(
    key: SignalKey,
    label: &str,
    weight: f64,
    requirement: RequirementSets,
    student: &StudentSets,
    emit_gaps: bool,
) -> SkillSignalOutcome {
    if !requirement.declared() {
        return SkillSignalOutcome::default();
    }

    let mut evidence = Vec::new();
    let mut gap = None;
    let mut path = None;
    let mut base_ratio = 0.0;
    let mut matched_detail = None;

    if !requirement.ids.is_empty() && !student.ids.is_empty() {
        let hits = requirement
            .ids
            .iter()
            .filter(|id| student.ids.contains(*id))
            .count();
        let total = requirement.ids.len();
        base_ratio = hits as f64 / total as f64;
        path = Some(SkillPath::Canonical);
        evidence.push(format!("{hits}/{total} canonical skill IDs matched"));
        matched_detail = Some(format!("{hits}/{total} matched"));

        let missing = total - hits;
        if emit_gaps && missing > 0 {
            gap = Some(Gap::new(
                GapKind::MissingRequiredSkills,
                CategoryKey::Skills,
                format!("Missing required skills: {missing} canonical skill(s)"),
            ));
        }
    } else if !requirement.labels.is_empty() {
        let hits: Vec<&String> = requirement
            .labels
            .iter()
            .filter(|label| student.text.contains(*label))
            .collect();
        let total = requirement.labels.len();
        base_ratio = hits.len() as f64 / total as f64;
        path = Some(SkillPath::Text);
        evidence.push(format!("{}/{total} skill tokens matched", hits.len()));
        matched_detail = Some(format!("{}/{total} matched", hits.len()));

        let missing: Vec<&str> = requirement
            .labels
            .iter()
            .filter(|label| !student.text.contains(*label))
            .map(String::as_str)
            .collect();
        if emit_gaps && !missing.is_empty() {
            gap = Some(Gap::new(
                GapKind::MissingRequiredSkills,
                CategoryKey::Skills,
                format!("Missing required skills: {}", missing.join(", ")),
            ));
        }
    } else if !requirement.ids.is_empty() {
        // Declared canonical requirement but the profile carries no canonical
        // skills and the listing offers no text fallback.
        let total = requirement.ids.len();
        path = Some(SkillPath::Canonical);
        evidence.push(format!(
            "0/{total} canonical skill IDs matched (profile has no canonical skills)"
        ));
        if emit_gaps {
            gap = Some(Gap::new(
                GapKind::MissingRequiredSkills,
                CategoryKey::Skills,
                format!("Missing required skills: {total} canonical skill(s)"),
            ));
        }
    }

    if let Some(path) = path {
        evidence.push(format!("path={path}"));
    }

    let mut raw = base_ratio;
    if !requirement.custom.is_empty() && !student.custom.is_empty() {
        let custom_hits = requirement
            .custom
            .iter()
            .filter(|label| student.custom.contains(*label))
            .count();
        if custom_hits > 0 {
            let custom_ratio = custom_hits as f64 / requirement.custom.len() as f64;
            raw = (raw + CUSTOM_SKILL_SHARE * custom_ratio).min(1.0);
            evidence.push(format!(
                "custom skills matched {custom_hits}/{}",
                requirement.custom.len()
            ));
        }
    }

    let contribution = SignalContribution::new(key, weight, raw, evidence.clone());
    let reason = (raw > 0.0 && matched_detail.is_some()).then(|| {
        let detail = matched_detail.unwrap_or_default();
        Reason {
            key: match (key, path) {
                (SignalKey::SkillsRequired, Some(SkillPath::Canonical)) => {
                    "skills.required.canonical_overlap"
                }
                (SignalKey::SkillsRequired, _) => "skills.required.text_overlap",
                (_, Some(SkillPath::Canonical)) => "skills.preferred.canonical_overlap",
                (_, _) => "skills.preferred.text_overlap",
            },
            text: describe_reason(label, contribution.points, &detail),
            points: contribution.points,
            evidence,
            category: CategoryKey::Skills,
        }
    });

    SkillSignalOutcome {
        contribution: Some(contribution),
        reason,
        gap,
        path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::weights::DEFAULT_WEIGHTS;

    fn listing_with_ids(ids: &[&str]) -> ListingMatchInput {
        ListingMatchInput {
            id: "listing-1".into(),
            required_skill_ids: ids.iter().map(|s| s.to_string()).collect(),
            ..ListingMatchInput::default()
        }
    }

    fn profile_with_ids(ids: &[&str]) -> StudentMatchProfile {
        StudentMatchProfile {
            skill_ids: ids.iter().map(|s| s.to_string()).collect(),
            ..StudentMatchProfile::default()
        }
    }

    #[test]
    fn canonical_ids_win_over_text_labels() {
        let mut listing = listing_with_ids(&["s1", "s2"]);
        listing.required_skills = vec!["Excel", "SQL"].into();

        let mut profile = profile_with_ids(&["s1"]);
        profile.skills = vec!["excel".into(), "sql".into()];

        let outcome = evaluate_required_skills(&listing, &profile, &DEFAULT_WEIGHTS);
        assert_eq!(outcome.path, Some(SkillPath::Canonical));

        let contribution = outcome.contribution.unwrap();
        assert!((contribution.raw_value - 0.5).abs() < 1e-9);
        assert!(contribution
            .evidence
            .iter()
            .any(|entry| entry == "path=canonical"));
        assert_eq!(
            outcome.gap.unwrap().text,
            "Missing required skills: 1 canonical skill(s)"
        );
    }

    #[test]
    fn text_fallback_uses_alias_normalization() {
        let mut listing = ListingMatchInput {
            id: "listing-1".into(),
            ..ListingMatchInput::default()
        };
        listing.required_skills = vec!["MS Excel", "Written Communication"].into();

        let mut profile = StudentMatchProfile::default();
        profile.skills = vec!["excel".into(), "communication skills".into()];

        let outcome = evaluate_required_skills(&listing, &profile, &DEFAULT_WEIGHTS);
        assert_eq!(outcome.path, Some(SkillPath::Text));

        let contribution = outcome.contribution.unwrap();
        assert!((contribution.raw_value - 1.0).abs() < 1e-9);
        assert!(outcome.gap.is_none());
        assert!(outcome.reason.unwrap().text.starts_with("Required skills:"));
    }

    #[test]
    fn text_gap_lists_missing_labels() {
        let mut listing = ListingMatchInput {
            id: "listing-1".into(),
            ..ListingMatchInput::default()
        };
        listing.required_skills = vec!["python", "sql", "tableau"].into();

        let mut profile = StudentMatchProfile::default();
        profile.skills = vec!["python".into()];

        let outcome = evaluate_required_skills(&listing, &profile, &DEFAULT_WEIGHTS);
        assert_eq!(
            outcome.gap.unwrap().text,
            "Missing required skills: sql, tableau"
        );
    }

    #[test]
    fn description_lines_feed_the_text_requirement() {
        let listing = ListingMatchInput {
            id: "listing-1".into(),
            description: Some("About us.\nRequired skills: Excel, SQL\n".into()),
            ..ListingMatchInput::default()
        };

        let mut profile = StudentMatchProfile::default();
        profile.skills = vec!["excel".into()];

        let outcome = evaluate_required_skills(&listing, &profile, &DEFAULT_WEIGHTS);
        let contribution = outcome.contribution.unwrap();
        assert!((contribution.raw_value - 0.5).abs() < 1e-9);
    }

    #[test]
    fn coursework_and_majors_count_as_text_evidence() {
        let mut listing = ListingMatchInput {
            id: "listing-1".into(),
            ..ListingMatchInput::default()
        };
        listing.required_skills = vec!["finance"].into();

        let profile = StudentMatchProfile {
            majors: vec!["Finance".into()],
            ..StudentMatchProfile::default()
        };

        let outcome = evaluate_required_skills(&listing, &profile, &DEFAULT_WEIGHTS);
        assert!((outcome.contribution.unwrap().raw_value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn custom_skills_add_at_most_a_fifth_of_the_weight() {
        let mut listing = listing_with_ids(&["s1"]);
        listing.custom_required_skills = vec!["Pottery Wheel".into()];

        let mut profile = profile_with_ids(&["s1"]);
        profile.custom_skills = vec!["pottery wheel".into()];

        let outcome = evaluate_required_skills(&listing, &profile, &DEFAULT_WEIGHTS);
        let contribution = outcome.contribution.unwrap();
        // Base ratio already 1.0, so the bonus is capped away.
        assert!((contribution.raw_value - 1.0).abs() < 1e-9);
        assert!((contribution.points - DEFAULT_WEIGHTS.skills_required).abs() < 1e-9);

        let mut partial_profile = profile_with_ids(&["other"]);
        partial_profile.custom_skills = vec!["pottery wheel".into()];
        let outcome = evaluate_required_skills(&listing, &partial_profile, &DEFAULT_WEIGHTS);
        let contribution = outcome.contribution.unwrap();
        assert!((contribution.raw_value - 0.2).abs() < 1e-9);
    }

    #[test]
    fn undeclared_requirements_stay_out_of_play() {
        let listing = ListingMatchInput {
            id: "listing-1".into(),
            ..ListingMatchInput::default()
        };
        let outcome =
            evaluate_required_skills(&listing, &StudentMatchProfile::default(), &DEFAULT_WEIGHTS);
        assert!(outcome.contribution.is_none());
        assert!(outcome.gap.is_none());

        let preferred =
            evaluate_preferred_skills(&listing, &StudentMatchProfile::default(), &DEFAULT_WEIGHTS);
        assert!(preferred.contribution.is_none());
    }

    #[test]
    fn preferred_signal_never_gaps() {
        let mut listing = ListingMatchInput {
            id: "listing-1".into(),
            ..ListingMatchInput::default()
        };
        listing.preferred_skills = vec!["tableau"].into();

        let outcome =
            evaluate_preferred_skills(&listing, &StudentMatchProfile::default(), &DEFAULT_WEIGHTS);
        assert!(outcome.gap.is_none());
        let contribution = outcome.contribution.unwrap();
        assert_eq!(contribution.raw_value, 0.0);
        assert_eq!(contribution.key, SignalKey::SkillsPreferred);
    }
}
