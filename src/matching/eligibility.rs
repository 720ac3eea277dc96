use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::evidence::{CategoryKey, Gap, GapKind};
use super::work_mode::WorkMode;
use crate::date::month::{month_label, parse_date_only, wrapped_month_distance};
use crate::normalize::{normalize_grad_year_token, normalize_text};

/// Outcome of a single hard gate. A failed gate short-circuits scoring and
/// carries the one gap that explains the exclusion.
#[derive(Debug, Clone)]
pub enum GateDecision {
    Pass,
    Ineligible(Gap),
}

impl GateDecision {
    pub fn is_ineligible(&self) -> bool {
        matches!(self, GateDecision::Ineligible(_))
    }
}

/// Expired application deadlines exclude regardless of fit. Date-only UTC
/// comparison; malformed deadlines are unknown and pass.
pub fn check_deadline(deadline: Option<&str>, today: NaiveDate) -> GateDecision {
    let Some(date) = deadline.and_then(parse_date_only) else {
        return GateDecision::Pass;
    };

    if date < today {
        GateDecision::Ineligible(Gap::new(
            GapKind::DeadlinePassed,
            CategoryKey::Availability,
            "Application deadline has passed.",
        ))
    } else {
        GateDecision::Pass
    }
}

/// Remote-only profiles cannot take hybrid/in-person work; an unknown work
/// mode also fails because it cannot be shown to be remote.
pub fn check_remote_only(remote_only: bool, work_mode: Option<WorkMode>) -> GateDecision {
    if remote_only && work_mode != Some(WorkMode::Remote) {
        return GateDecision::Ineligible(Gap::new(
            GapKind::RemoteOnlyConflict,
            CategoryKey::Location,
            "Requires in-person or hybrid work but your profile is remote-only.",
        ));
    }
    GateDecision::Pass
}

/// Strict mode turns a declared work-mode preference into a filter. Only a
/// listing with a derived mode outside the preference set fails.
pub fn check_strict_work_mode(
    strict: bool,
    preferred_modes: &[WorkMode],
    work_mode: Option<WorkMode>,
) -> GateDecision {
    let Some(mode) = work_mode else {
        return GateDecision::Pass;
    };
    if strict && !preferred_modes.is_empty() && !preferred_modes.contains(&mode) {
        return GateDecision::Ineligible(Gap::new(
            GapKind::WorkModeMismatch,
            CategoryKey::Location,
            format!("Work mode mismatch ({mode})."),
        ));
    }
    GateDecision::Pass
}

/// Strict mode also filters by place for listings that require showing up.
/// Containment runs both directions so "new york" matches "new york, ny".
pub fn check_strict_location(
    strict: bool,
    work_mode: Option<WorkMode>,
    preferred_locations: &[String],
    location_name: &str,
) -> GateDecision {
    if !strict
        || preferred_locations.is_empty()
        || location_name.is_empty()
        || !work_mode.is_some_and(WorkMode::is_in_person)
    {
        return GateDecision::Pass;
    }

    let matches_preference = preferred_locations.iter().any(|preferred| {
        let preferred = normalize_text(preferred);
        !preferred.is_empty()
            && (location_name.contains(&preferred) || preferred.contains(location_name))
    });
    if matches_preference {
        GateDecision::Pass
    } else {
        GateDecision::Ineligible(Gap::new(
            GapKind::LocationMismatch,
            CategoryKey::Location,
            format!("In-person location mismatch ({location_name})."),
        ))
    }
}

/// Strict-term mode excludes listings the student cannot start on time for,
/// whenever both sides resolve a month at all.
pub fn check_strict_term(
    strict_term_only: bool,
    listing_month: Option<u32>,
    student_month: Option<u32>,
) -> GateDecision {
    if !strict_term_only {
        return GateDecision::Pass;
    }
    let (Some(listing), Some(student)) = (listing_month, student_month) else {
        return GateDecision::Pass;
    };

    if wrapped_month_distance(listing, student) > 0 {
        return GateDecision::Ineligible(Gap::new(
            GapKind::TermMismatch,
            CategoryKey::Availability,
            format!(
                "Starts in {} but you're not available until {}.",
                month_label(listing),
                month_label(student)
            ),
        ));
    }
    GateDecision::Pass
}

/// Mid-pipeline gate: listings that restrict graduation years exclude
/// profiles outside the set.
pub fn check_graduation_year(
    target_year_tokens: &[String],
    student_year: Option<&str>,
) -> GateDecision {
    let targets: BTreeSet<String> = target_year_tokens
        .iter()
        .map(|token| normalize_grad_year_token(token))
        .filter(|token| !token.is_empty())
        .collect();
    let student = normalize_grad_year_token(student_year.unwrap_or(""));
    if targets.is_empty() || student.is_empty() {
        return GateDecision::Pass;
    }

    if targets.contains(&student) {
        GateDecision::Pass
    } else {
        GateDecision::Ineligible(Gap::new(
            GapKind::GraduationYear,
            CategoryKey::Major,
            format!("Graduation year mismatch ({})." , student_year.unwrap_or("unknown")),
        ))
    }
}

/// Mid-pipeline gate: an experience floor the profile does not meet.
/// Comparable only when both sides resolve on the ordinal scale.
pub fn check_experience(
    required_rank: Option<u8>,
    student_rank: Option<u8>,
    required_label: Option<&str>,
    student_label: Option<&str>,
) -> GateDecision {
    let (Some(required), Some(student)) = (required_rank, student_rank) else {
        return GateDecision::Pass;
    };

    if student >= required {
        GateDecision::Pass
    } else {
        GateDecision::Ineligible(Gap::new(
            GapKind::ExperienceMismatch,
            CategoryKey::Major,
            format!(
                "Experience mismatch (requires {}, profile is {}).",
                required_label.unwrap_or("unknown"),
                student_label.unwrap_or("unknown")
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn past_deadlines_exclude() {
        let today = date(2026, 8, 8);
        let decision = check_deadline(Some("2026-08-07"), today);
        assert!(decision.is_ineligible());

        assert!(!check_deadline(Some("2026-08-08"), today).is_ineligible());
        assert!(!check_deadline(Some("2026-09-01"), today).is_ineligible());
        assert!(!check_deadline(Some("whenever"), today).is_ineligible());
        assert!(!check_deadline(None, today).is_ineligible());
    }

    #[test]
    fn remote_only_conflicts_with_everything_but_remote() {
        assert!(check_remote_only(true, Some(WorkMode::Hybrid)).is_ineligible());
        assert!(check_remote_only(true, None).is_ineligible());
        assert!(!check_remote_only(true, Some(WorkMode::Remote)).is_ineligible());
        assert!(!check_remote_only(false, Some(WorkMode::InPerson)).is_ineligible());
    }

    #[test]
    fn strict_work_mode_needs_a_derived_mode_to_fail() {
        let prefs = vec![WorkMode::Remote];
        assert!(check_strict_work_mode(true, &prefs, Some(WorkMode::InPerson)).is_ineligible());
        assert!(!check_strict_work_mode(true, &prefs, None).is_ineligible());
        assert!(!check_strict_work_mode(true, &[], Some(WorkMode::InPerson)).is_ineligible());
        assert!(!check_strict_work_mode(false, &prefs, Some(WorkMode::InPerson)).is_ineligible());
    }

    #[test]
    fn strict_location_contains_either_direction() {
        let prefs = vec!["New York".to_string()];
        assert!(!check_strict_location(
            true,
            Some(WorkMode::InPerson),
            &prefs,
            "new york, ny"
        )
        .is_ineligible());

        assert!(check_strict_location(true, Some(WorkMode::InPerson), &prefs, "boston, ma")
            .is_ineligible());
        // Remote listings never location-gate.
        assert!(!check_strict_location(true, Some(WorkMode::Remote), &prefs, "boston, ma")
            .is_ineligible());
    }

    #[test]
    fn strict_term_cites_both_months() {
        let decision = check_strict_term(true, Some(2), Some(4));
        match decision {
            GateDecision::Ineligible(gap) => {
                assert!(gap.text.contains("March"));
                assert!(gap.text.contains("May"));
            }
            GateDecision::Pass => panic!("expected ineligible"),
        }

        assert!(!check_strict_term(true, Some(4), Some(2)).is_ineligible());
        assert!(!check_strict_term(true, None, Some(4)).is_ineligible());
        assert!(!check_strict_term(false, Some(2), Some(4)).is_ineligible());
    }

    #[test]
    fn graduation_year_gate_normalizes_tokens() {
        let targets = vec!["2026".to_string(), "Spring 2027".to_string()];
        assert!(!check_graduation_year(&targets, Some("2026")).is_ineligible());
        assert!(!check_graduation_year(&targets, Some("spring2027")).is_ineligible());
        assert!(check_graduation_year(&targets, Some("2028")).is_ineligible());
        assert!(!check_graduation_year(&targets, None).is_ineligible());
        assert!(!check_graduation_year(&[], Some("2028")).is_ineligible());
    }

    #[test]
    fn experience_gate_compares_ordinally() {
        assert!(check_experience(Some(2), Some(1), Some("junior"), Some("sophomore"))
            .is_ineligible());
        assert!(!check_experience(Some(2), Some(2), Some("junior"), Some("junior"))
            .is_ineligible());
        assert!(!check_experience(None, Some(0), None, Some("freshman")).is_ineligible());
        assert!(!check_experience(Some(2), None, Some("junior"), None).is_ineligible());
    }
}
