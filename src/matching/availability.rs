use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use strum::{AsRefStr, Display};

use super::evidence::{
    describe_reason, CategoryKey, EvidenceToken, Gap, GapKind, Reason, SignalContribution,
    SignalKey,
};
use super::weights::MatchWeights;
use crate::date::month::{month_index_from_token, month_label, parse_date_only, wrapped_month_distance};
use crate::date::season::{season_overlap, seasons_from_value, Season};
use crate::normalize::{description_line, normalize_text};
use crate::{ListingMatchInput, StudentMatchProfile};

/// Where a start month came from, recorded as evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StartSource {
    StartDate,
    TermMonth,
    SeasonKeyword,
    StartMonth,
    SeasonFallback,
    Missing,
}

/// Resolved start month (0-11) plus its provenance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartResolution {
    pub month: Option<u32>,
    pub source: StartSource,
}

// Start-fit bands. Hard calendar math is overkill here; listings slip by
// weeks, so month-level bands are the honest resolution.
const START_FIT_ON_TIME: f64 = 1.0;
const START_FIT_ONE_MONTH_LATE: f64 = 0.6;
const START_FIT_VERY_LATE: f64 = 0.1;
const START_FIT_LISTING_UNKNOWN: f64 = 0.6;
const START_FIT_STUDENT_UNKNOWN: f64 = 0.45;
const HOURS_FIT_UNKNOWN: f64 = 0.55;

const START_WEIGHT_SHARE: f64 = 0.6;
const HOURS_WEIGHT_SHARE: f64 = 0.4;

static SEASON_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?im)^season:\s*(.+)$").unwrap());

/// Normalized term text: the term field, else a `Season:` line from the
/// description.
pub fn derive_term(listing: &ListingMatchInput) -> String {
    if let Some(term) = listing.term.as_deref() {
        let normalized = normalize_text(term);
        if !normalized.is_empty() {
            return normalized;
        }
    }

    description_line(listing.description.as_deref().unwrap_or(""), &SEASON_LINE_RE)
        .unwrap_or_default()
}

/// All seasons the listing's term touches, falling back to the start date's
/// month when the term says nothing.
pub fn listing_seasons(term_text: &str, start_date: Option<&str>) -> BTreeSet<Season> {
    let by_term = seasons_from_value(term_text);
    if !by_term.is_empty() {
        return by_term;
    }

    let mut seasons = BTreeSet::new();
    if let Some(date) = start_date.and_then(parse_date_only) {
        use chrono::Datelike;
        if let Some(season) = crate::date::season::season_for_month_index(date.month0()) {
            seasons.insert(season);
        }
    }
    seasons
}

/// Listing start month: explicit start date first, then the first month
/// named in the term text, then the earliest month of a season keyword.
pub fn resolve_listing_start_month(
    term_text: &str,
    start_date: Option<&str>,
) -> StartResolution {
    if let Some(date) = start_date.and_then(parse_date_only) {
        use chrono::Datelike;
        return StartResolution {
            month: Some(date.month0()),
            source: StartSource::StartDate,
        };
    }

    for word in term_text.split(' ') {
        if let Some(month) = month_index_from_token(word) {
            return StartResolution {
                month: Some(month),
                source: StartSource::TermMonth,
            };
        }
    }

    let seasons = seasons_from_value(term_text);
    if let Some(month) = seasons
        .iter()
        .map(|season| season.start_month_index())
        .min()
    {
        return StartResolution {
            month: Some(month),
            source: StartSource::SeasonKeyword,
        };
    }

    StartResolution {
        month: None,
        source: StartSource::Missing,
    }
}

/// Student start month: the explicit availability month first, else the
/// earliest month implied by preferred seasons.
pub fn resolve_student_start_month(
    profile: &StudentMatchProfile,
    student_seasons: &BTreeSet<Season>,
) -> StartResolution {
    if let Some(month) = profile
        .availability_start_month
        .as_deref()
        .and_then(month_index_from_token)
    {
        return StartResolution {
            month: Some(month),
            source: StartSource::StartMonth,
        };
    }

    if let Some(month) = student_seasons
        .iter()
        .map(|season| season.start_month_index())
        .min()
    {
        return StartResolution {
            month: Some(month),
            source: StartSource::SeasonFallback,
        };
    }

    StartResolution {
        month: None,
        source: StartSource::Missing,
    }
}

/// Banded start fit plus how many months late the student is (when both
/// months resolve).
pub fn start_fit_raw(listing: &StartResolution, student: &StartResolution) -> (f64, Option<i32>) {
    let Some(listing_month) = listing.month else {
        return (START_FIT_LISTING_UNKNOWN, None);
    };
    let Some(student_month) = student.month else {
        return (START_FIT_STUDENT_UNKNOWN, None);
    };

    let months_late = wrapped_month_distance(listing_month, student_month);
    let raw = if months_late <= 0 {
        START_FIT_ON_TIME
    } else if months_late == 1 {
        START_FIT_ONE_MONTH_LATE
    } else {
        START_FIT_VERY_LATE
    };
    (raw, Some(months_late))
}

/// Hours closeness: how much of the listing's weekly commitment the student
/// can cover.
pub fn hours_fit_raw(listing_hours: Option<u32>, student_hours: Option<u32>) -> f64 {
    match (listing_hours, student_hours) {
        (Some(listing), Some(student)) if listing > 0 => {
            (student as f64 / listing as f64).clamp(0.0, 1.0)
        }
        (Some(_), Some(_)) => 1.0,
        _ => HOURS_FIT_UNKNOWN,
    }
}

#[derive(Debug, Default)]
pub struct AvailabilityOutcome {
    pub contribution: Option<SignalContribution>,
    pub reason: Option<Reason>,
    pub gaps: Vec<Gap>,
    pub evidence_tokens: Vec<EvidenceToken>,
}

/// Combined availability signal: 0.6 start fit + 0.4 hours fit, with
/// neutral defaults for whichever half is unknown.
pub fn evaluate_availability(
    listing: &ListingMatchInput,
    profile: &StudentMatchProfile,
    listing_start: &StartResolution,
    student_start: &StartResolution,
    weights: &MatchWeights,
) -> AvailabilityOutcome {
    let any_data = listing.hours_per_week.is_some()
        || profile.availability_hours_per_week.is_some()
        || listing_start.month.is_some()
        || student_start.month.is_some();
    if !any_data {
        return AvailabilityOutcome::default();
    }

    let (start_raw, months_late) = start_fit_raw(listing_start, student_start);
    let hours_raw = hours_fit_raw(listing.hours_per_week, profile.availability_hours_per_week);
    let raw = START_WEIGHT_SHARE * start_raw + HOURS_WEIGHT_SHARE * hours_raw;

    let mut evidence = vec![
        format!("start_fit={start_raw:.2}"),
        format!("hours_fit={hours_raw:.2}"),
    ];
    if let (Some(listing_hours), Some(student_hours)) =
        (listing.hours_per_week, profile.availability_hours_per_week)
    {
        evidence.push(format!(
            "listing_hours={listing_hours} student_hours={student_hours}"
        ));
    }

    let mut gaps = Vec::new();
    let mut evidence_tokens = Vec::new();

    match months_late {
        Some(late) if late >= 1 => {
            evidence_tokens.push(EvidenceToken::LateStart);
            // Both months are present whenever months_late is.
            let listing_name = month_label(listing_start.month.unwrap_or(0));
            let student_name = month_label(student_start.month.unwrap_or(0));
            gaps.push(Gap::new(
                GapKind::LateStart,
                CategoryKey::Availability,
                format!(
                    "Late start: available in {student_name}, after this role's {listing_name} start."
                ),
            ));
        }
        _ => {}
    }

    if student_start.month.is_none() {
        evidence_tokens.push(EvidenceToken::StudentStartMissing);
        gaps.push(Gap::new(
            GapKind::Other,
            CategoryKey::Availability,
            "Add your availability start month to improve matching.",
        ));
    }
    if listing_start.month.is_none() {
        evidence_tokens.push(EvidenceToken::ListingStartMissing);
    }
    if student_start.source == StartSource::SeasonFallback {
        evidence_tokens.push(EvidenceToken::StudentStartSeasonFallback);
    }

    let contribution =
        SignalContribution::new(SignalKey::Availability, weights.availability, raw, evidence.clone());

    let reason = match (listing.hours_per_week, months_late) {
        (Some(listing_hours), _) if hours_raw >= 1.0 && months_late.map_or(true, |l| l <= 0) => {
            Some(Reason {
                key: "availability.fit",
                text: describe_reason(
                    "Availability fit",
                    contribution.points,
                    &format!("{listing_hours} hrs/week"),
                ),
                points: contribution.points,
                evidence,
                category: CategoryKey::Availability,
            })
        }
        _ => None,
    };

    AvailabilityOutcome {
        contribution: Some(contribution),
        reason,
        gaps,
        evidence_tokens,
    }
}

#[derive(Debug, Default)]
pub struct StartDateFitOutcome {
    pub contribution: Option<SignalContribution>,
    pub reason: Option<Reason>,
    pub gap: Option<Gap>,
}

/// Diagnostic twin of availability's start component: same banded value,
/// plus provenance for both sides.
pub fn evaluate_start_date_fit(
    listing_start: &StartResolution,
    student_start: &StartResolution,
    weights: &MatchWeights,
) -> StartDateFitOutcome {
    if listing_start.month.is_none() && student_start.month.is_none() {
        return StartDateFitOutcome::default();
    }

    let (raw, months_late) = start_fit_raw(listing_start, student_start);
    let evidence = vec![
        format!("listing_start_source={}", listing_start.source),
        format!("student_start_source={}", student_start.source),
        format!(
            "listing_start={}",
            listing_start.month.map(month_label).unwrap_or("unknown")
        ),
        format!(
            "student_start={}",
            student_start.month.map(month_label).unwrap_or("unknown")
        ),
    ];

    let contribution = SignalContribution::new(
        SignalKey::StartDateFit,
        weights.start_date_fit,
        raw,
        evidence.clone(),
    );

    let mut reason = None;
    let mut gap = None;
    match months_late {
        Some(late) if late <= 0 => {
            reason = Some(Reason {
                key: "start_date.after_availability",
                text: describe_reason(
                    "Start date fit",
                    contribution.points,
                    "starts after your availability",
                ),
                points: contribution.points,
                evidence,
                category: CategoryKey::Availability,
            });
        }
        Some(late) if late >= 2 => {
            gap = Some(Gap::new(
                GapKind::StartBefore,
                CategoryKey::Availability,
                "May start before you're available.",
            ));
        }
        _ => {}
    }

    StartDateFitOutcome {
        contribution: Some(contribution),
        reason,
        gap,
    }
}

#[derive(Debug, Default)]
pub struct TermAlignmentOutcome {
    pub contribution: Option<SignalContribution>,
    pub reason: Option<Reason>,
    pub gap: Option<Gap>,
}

/// Season-level term alignment. Only meaningful when the student never set
/// an exact start month, so season data is the best both sides have.
pub fn evaluate_term_alignment(
    student_has_explicit_month: bool,
    student_seasons: &BTreeSet<Season>,
    listing_season_set: &BTreeSet<Season>,
    weights: &MatchWeights,
) -> TermAlignmentOutcome {
    if student_has_explicit_month || student_seasons.is_empty() || listing_season_set.is_empty() {
        return TermAlignmentOutcome::default();
    }

    let overlap = season_overlap(student_seasons, listing_season_set);
    let raw = overlap.listing_coverage;
    let listing_names: Vec<String> = listing_season_set
        .iter()
        .map(|season| season.to_string())
        .collect();
    let evidence = vec![
        format!(
            "preferred_terms={}",
            student_seasons
                .iter()
                .map(|season| season.to_string())
                .collect::<Vec<_>>()
                .join("|")
        ),
        format!("listing_terms={}", listing_names.join("|")),
    ];

    let contribution = SignalContribution::new(
        SignalKey::TermAlignment,
        weights.term_alignment,
        raw,
        evidence.clone(),
    );

    let mut reason = None;
    let mut gap = None;
    if overlap.has_overlap() {
        let matched: Vec<String> = overlap
            .overlap_seasons
            .iter()
            .map(|season| season.to_string())
            .collect();
        reason = Some(Reason {
            key: "term.aligned",
            text: describe_reason("Term alignment", contribution.points, &matched.join(", ")),
            points: contribution.points,
            evidence,
            category: CategoryKey::Availability,
        });
    } else {
        gap = Some(Gap::new(
            GapKind::TermMismatch,
            CategoryKey::Availability,
            format!("Term mismatch ({})." , listing_names.join(", ")),
        ));
    }

    TermAlignmentOutcome {
        contribution: Some(contribution),
        reason,
        gap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::weights::DEFAULT_WEIGHTS;

    fn resolution(month: Option<u32>, source: StartSource) -> StartResolution {
        StartResolution { month, source }
    }

    #[test]
    fn listing_month_resolution_prefers_the_start_date() {
        let resolved = resolve_listing_start_month("march 2026 june 2026", Some("2026-05-15"));
        assert_eq!(resolved.month, Some(4));
        assert_eq!(resolved.source, StartSource::StartDate);
    }

    #[test]
    fn listing_month_resolution_reads_the_first_term_month() {
        let resolved = resolve_listing_start_month("march 2026 june 2026", None);
        assert_eq!(resolved.month, Some(2));
        assert_eq!(resolved.source, StartSource::TermMonth);
    }

    #[test]
    fn listing_month_resolution_falls_back_to_season_keywords() {
        let resolved = resolve_listing_start_month("summer internship", None);
        assert_eq!(resolved.month, Some(4));
        assert_eq!(resolved.source, StartSource::SeasonKeyword);

        let missing = resolve_listing_start_month("flexible", None);
        assert_eq!(missing.month, None);
        assert_eq!(missing.source, StartSource::Missing);
    }

    #[test]
    fn student_month_resolution_prefers_the_explicit_month() {
        let profile = StudentMatchProfile {
            availability_start_month: Some("May".into()),
            ..StudentMatchProfile::default()
        };
        let seasons = [Season::Fall].into_iter().collect();
        let resolved = resolve_student_start_month(&profile, &seasons);
        assert_eq!(resolved.month, Some(4));
        assert_eq!(resolved.source, StartSource::StartMonth);
    }

    #[test]
    fn student_month_resolution_uses_the_earliest_preferred_season() {
        let seasons = [Season::Fall, Season::Summer].into_iter().collect();
        let resolved = resolve_student_start_month(&StudentMatchProfile::default(), &seasons);
        assert_eq!(resolved.month, Some(4));
        assert_eq!(resolved.source, StartSource::SeasonFallback);
    }

    #[test]
    fn start_fit_bands() {
        let listing = resolution(Some(2), StartSource::TermMonth);
        let on_time = resolution(Some(2), StartSource::StartMonth);
        let early = resolution(Some(1), StartSource::StartMonth);
        let one_late = resolution(Some(3), StartSource::StartMonth);
        let very_late = resolution(Some(4), StartSource::StartMonth);

        assert_eq!(start_fit_raw(&listing, &on_time), (1.0, Some(0)));
        assert_eq!(start_fit_raw(&listing, &early), (1.0, Some(-1)));
        assert_eq!(start_fit_raw(&listing, &one_late), (0.6, Some(1)));
        assert_eq!(start_fit_raw(&listing, &very_late), (0.1, Some(2)));

        let unknown_listing = resolution(None, StartSource::Missing);
        assert_eq!(start_fit_raw(&unknown_listing, &on_time), (0.6, None));
        let unknown_student = resolution(None, StartSource::Missing);
        assert_eq!(start_fit_raw(&listing, &unknown_student), (0.45, None));
    }

    #[test]
    fn hours_fit_is_a_clamped_ratio_with_neutral_unknown() {
        assert!((hours_fit_raw(Some(25), Some(30)) - 1.0).abs() < 1e-9);
        assert!((hours_fit_raw(Some(25), Some(20)) - 0.8).abs() < 1e-9);
        assert!((hours_fit_raw(None, Some(20)) - 0.55).abs() < 1e-9);
        assert!((hours_fit_raw(Some(25), None) - 0.55).abs() < 1e-9);
    }

    #[test]
    fn late_start_raises_the_gap_and_token() {
        let listing = ListingMatchInput {
            id: "listing-1".into(),
            ..ListingMatchInput::default()
        };
        let profile = StudentMatchProfile::default();
        let outcome = evaluate_availability(
            &listing,
            &profile,
            &resolution(Some(2), StartSource::TermMonth),
            &resolution(Some(4), StartSource::StartMonth),
            &DEFAULT_WEIGHTS,
        );

        assert!(outcome
            .gaps
            .iter()
            .any(|gap| gap.text.contains("Late start") && gap.text.contains("March")));
        assert!(outcome
            .evidence_tokens
            .contains(&EvidenceToken::LateStart));
        let contribution = outcome.contribution.unwrap();
        // 0.6 * 0.1 + 0.4 * 0.55
        assert!((contribution.raw_value - 0.28).abs() < 1e-9);
    }

    #[test]
    fn missing_student_month_prompts_for_it() {
        let listing = ListingMatchInput {
            id: "listing-1".into(),
            hours_per_week: Some(20),
            ..ListingMatchInput::default()
        };
        let outcome = evaluate_availability(
            &listing,
            &StudentMatchProfile::default(),
            &resolution(Some(2), StartSource::TermMonth),
            &resolution(None, StartSource::Missing),
            &DEFAULT_WEIGHTS,
        );

        assert!(outcome
            .gaps
            .iter()
            .any(|gap| gap.text.contains("Add your availability start month")));
        assert!(outcome
            .evidence_tokens
            .contains(&EvidenceToken::StudentStartMissing));
    }

    #[test]
    fn start_date_fit_records_sources() {
        let outcome = evaluate_start_date_fit(
            &resolution(Some(2), StartSource::TermMonth),
            &resolution(Some(4), StartSource::SeasonFallback),
            &DEFAULT_WEIGHTS,
        );
        let contribution = outcome.contribution.unwrap();
        assert!(contribution
            .evidence
            .iter()
            .any(|entry| entry == "student_start_source=season_fallback"));
        assert!((contribution.raw_value - 0.1).abs() < 1e-9);
        assert_eq!(
            outcome.gap.unwrap().text,
            "May start before you're available."
        );
    }

    #[test]
    fn early_start_earns_the_reason() {
        let outcome = evaluate_start_date_fit(
            &resolution(Some(2), StartSource::StartDate),
            &resolution(Some(1), StartSource::StartMonth),
            &DEFAULT_WEIGHTS,
        );
        assert!(outcome.reason.unwrap().text.starts_with("Start date fit"));
        assert!(outcome.gap.is_none());
    }

    #[test]
    fn term_alignment_only_fires_without_an_explicit_month() {
        let student: BTreeSet<Season> = [Season::Summer].into_iter().collect();
        let listing: BTreeSet<Season> = [Season::Spring, Season::Summer].into_iter().collect();

        let skipped = evaluate_term_alignment(true, &student, &listing, &DEFAULT_WEIGHTS);
        assert!(skipped.contribution.is_none());

        let outcome = evaluate_term_alignment(false, &student, &listing, &DEFAULT_WEIGHTS);
        let contribution = outcome.contribution.unwrap();
        assert!((contribution.raw_value - 0.5).abs() < 1e-9);
        assert!(outcome.reason.unwrap().text.contains("summer"));
    }

    #[test]
    fn term_mismatch_gaps_with_listing_seasons() {
        let student: BTreeSet<Season> = [Season::Winter].into_iter().collect();
        let listing: BTreeSet<Season> = [Season::Spring, Season::Summer].into_iter().collect();

        let outcome = evaluate_term_alignment(false, &student, &listing, &DEFAULT_WEIGHTS);
        assert_eq!(outcome.contribution.unwrap().raw_value, 0.0);
        assert_eq!(
            outcome.gap.unwrap().text,
            "Term mismatch (spring, summer)."
        );
    }

    #[test]
    fn derive_term_reads_the_description_season_line() {
        let listing = ListingMatchInput {
            id: "listing-1".into(),
            description: Some("About.\nSeason: Summer 2026\n".into()),
            ..ListingMatchInput::default()
        };
        assert_eq!(derive_term(&listing), "summer 2026");

        let with_term = ListingMatchInput {
            term: Some("Fall 2026".into()),
            ..listing
        };
        assert_eq!(derive_term(&with_term), "fall 2026");
    }

    #[test]
    fn listing_seasons_fall_back_to_the_start_date() {
        let seasons = listing_seasons("", Some("2026-05-15"));
        assert_eq!(seasons.into_iter().collect::<Vec<_>>(), vec![Season::Spring]);
    }
}
