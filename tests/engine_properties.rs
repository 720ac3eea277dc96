use chrono::{NaiveDate, TimeZone, Utc};

use intern_match::matching::coursework::CourseworkPath;
use intern_match::matching::evidence::{CategoryKey, CategoryStatus, SignalKey};
use intern_match::matching::work_mode::WorkMode;
use intern_match::{
    build_match_snapshot, ListingMatchInput, MatchEngine, MatchEngineConfig, StudentMatchProfile,
    MATCHING_VERSION,
};

fn engine() -> MatchEngine {
    MatchEngine::new(MatchEngineConfig {
        today: NaiveDate::from_ymd_opt(2026, 8, 8),
        explain: true,
        ..MatchEngineConfig::default()
    })
}

fn finance_listing() -> ListingMatchInput {
    ListingMatchInput {
        id: "listing-finance".into(),
        majors: vec!["finance"].into(),
        required_skill_ids: vec!["s1".into(), "s2".into()],
        ..ListingMatchInput::default()
    }
}

fn finance_profile() -> StudentMatchProfile {
    StudentMatchProfile {
        majors: vec!["finance".into()],
        skill_ids: vec!["s1".into(), "s2".into()],
        ..StudentMatchProfile::default()
    }
}

#[test]
fn identical_inputs_yield_bit_identical_results() {
    let listing = finance_listing();
    let profile = finance_profile();

    let first = engine().evaluate(&listing, &profile);
    let second = engine().evaluate(&listing, &profile);

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn score_is_bounded_and_equals_the_rounded_category_total() {
    let result = engine().evaluate(&finance_listing(), &finance_profile());
    assert!(result.score <= 100);

    let breakdown = result.breakdown.expect("explain requested");
    let category_total: f64 = breakdown
        .categories
        .iter()
        .map(|category| category.earned_points)
        .sum();
    assert_eq!(result.score, category_total.clamp(0.0, 100.0).round() as u32);
}

#[test]
fn category_weights_sum_to_one_hundred_for_every_evaluation() {
    let inputs = [
        (finance_listing(), finance_profile()),
        (ListingMatchInput {
            id: "empty".into(),
            ..ListingMatchInput::default()
        }, StudentMatchProfile::default()),
    ];

    for (listing, profile) in inputs {
        let result = engine().evaluate(&listing, &profile);
        let breakdown = result.breakdown.expect("explain requested");
        let weight_total: f64 = breakdown
            .categories
            .iter()
            .map(|category| category.weight_points)
            .sum();
        assert!((weight_total - 100.0).abs() < 1e-9);
    }
}

#[test]
fn full_skill_and_major_match_earns_the_skills_budget() {
    let result = engine().evaluate(&finance_listing(), &finance_profile());
    let breakdown = result.breakdown.expect("explain requested");
    let skills = breakdown
        .categories
        .iter()
        .find(|category| category.key == CategoryKey::Skills)
        .expect("skills category");

    assert!((skills.earned_points - 25.0).abs() < 1e-9);
    assert_eq!(skills.status, CategoryStatus::Good);
}

#[test]
fn past_deadline_is_ineligible_with_one_dominant_gap() {
    let listing = ListingMatchInput {
        application_deadline: Some("2026-08-07".into()),
        ..finance_listing()
    };
    let result = engine().evaluate(&listing, &finance_profile());

    assert!(!result.eligible);
    assert_eq!(result.score, 0);
    assert_eq!(result.gaps, vec!["Application deadline has passed.".to_string()]);
}

#[test]
fn hard_gates_zero_the_score() {
    let remote_only = StudentMatchProfile {
        remote_only: true,
        ..finance_profile()
    };
    let in_person = ListingMatchInput {
        work_mode: Some("in_person".into()),
        ..finance_listing()
    };
    let result = engine().evaluate(&in_person, &remote_only);
    assert!(!result.eligible);
    assert_eq!(result.score, 0);
    assert_eq!(result.gaps.len(), 1);

    let strict = StudentMatchProfile {
        strict_preferences: true,
        preferred_work_modes: vec![WorkMode::Remote],
        ..finance_profile()
    };
    let result = engine().evaluate(&in_person, &strict);
    assert!(!result.eligible);
    assert_eq!(result.score, 0);
}

#[test]
fn canonical_ids_beat_text_when_both_sides_have_them() {
    let listing = ListingMatchInput {
        required_course_category_ids: vec!["canon-fin".into()],
        required_course_category_names: vec!["Finance & Accounting".into()],
        recommended_coursework: vec!["Corporate Finance"].into(),
        ..finance_listing()
    };
    let profile = StudentMatchProfile {
        canonical_coursework_category_ids: vec!["canon-fin".into()],
        coursework: vec!["corporate finance".into()],
        ..finance_profile()
    };

    let result = engine().evaluate(&listing, &profile);
    assert_eq!(result.coursework_path, CourseworkPath::Canonical);

    let breakdown = result.breakdown.expect("explain requested");
    let skills_signal = breakdown
        .signals
        .iter()
        .find(|signal| signal.key == SignalKey::SkillsRequired)
        .expect("required skills signal");
    assert!(skills_signal
        .evidence
        .iter()
        .any(|entry| entry == "path=canonical"));
}

#[test]
fn march_listing_with_may_availability_gaps_on_late_start() {
    let listing = ListingMatchInput {
        term: Some("March 2026 - June 2026".into()),
        ..finance_listing()
    };
    let profile = StudentMatchProfile {
        availability_start_month: Some("May".into()),
        ..finance_profile()
    };

    let result = engine().evaluate(&listing, &profile);
    assert!(result.eligible);
    assert!(result
        .gaps
        .iter()
        .any(|gap| gap.to_lowercase().contains("late start")));

    let breakdown = result.breakdown.expect("explain requested");
    let availability = breakdown
        .categories
        .iter()
        .find(|category| category.key == CategoryKey::Availability)
        .expect("availability category");
    assert_eq!(availability.status, CategoryStatus::Gap);
}

#[test]
fn reason_and_gap_caps_hold_under_noisy_inputs() {
    let listing = ListingMatchInput {
        term: Some("March 2026 - June 2026".into()),
        preferred_skill_ids: vec!["p1".into(), "p2".into()],
        required_course_category_ids: vec!["c1".into(), "c2".into()],
        required_course_category_names: vec!["Finance & Accounting".into(), "Statistics".into()],
        hours_per_week: Some(35),
        location: Some("New York, NY (In person)".into()),
        experience_level: Some("freshman".into()),
        ..finance_listing()
    };
    let profile = StudentMatchProfile {
        skill_ids: vec!["s1".into(), "p1".into()],
        experience_level: Some("junior".into()),
        canonical_coursework_category_ids: vec!["c1".into()],
        availability_start_month: Some("August".into()),
        availability_hours_per_week: Some(10),
        preferred_locations: vec!["Boston".into()],
        preferred_work_modes: vec![WorkMode::Remote],
        ..finance_profile()
    };

    let result = engine().evaluate(&listing, &profile);
    assert!(result.reasons.len() <= 3);
    assert!(result.gaps.len() <= 2);
}

#[test]
fn equal_scores_and_timestamps_rank_by_id_ascending() {
    let created = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
    let a = ListingMatchInput {
        id: "listing-a".into(),
        created_at: Some(created),
        ..finance_listing()
    };
    let b = ListingMatchInput {
        id: "listing-b".into(),
        created_at: Some(created),
        ..finance_listing()
    };

    let ranked = engine().rank_listings(&[b, a], &finance_profile());
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].listing.id, "listing-a");
    assert_eq!(ranked[1].listing.id, "listing-b");
    assert_eq!(ranked[0].result.score, ranked[1].result.score);
}

#[test]
fn ranking_filters_ineligible_listings() {
    let expired = ListingMatchInput {
        id: "expired".into(),
        application_deadline: Some("2026-01-01".into()),
        ..finance_listing()
    };

    let ranked = engine().rank_listings(&[expired, finance_listing()], &finance_profile());
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].listing.id, "listing-finance");
}

#[test]
fn snapshot_carries_the_four_persisted_fields() {
    let snapshot = build_match_snapshot(&finance_listing(), &finance_profile());
    assert!(snapshot.match_score <= 100);
    assert!(snapshot.match_reasons.len() <= 3);
    assert!(snapshot.match_gaps.len() <= 2);
    assert_eq!(snapshot.matching_version, MATCHING_VERSION);
}

#[test]
fn malformed_optional_fields_never_panic() {
    let listing = ListingMatchInput {
        id: "listing-messy".into(),
        majors: "  ,,  ".into(),
        start_date: Some("not a date".into()),
        application_deadline: Some("tomorrow-ish".into()),
        term: Some("???".into()),
        work_mode: Some("teleport".into()),
        location: Some("(".into()),
        experience_level: Some("rockstar".into()),
        desired_coursework_strength: Some("extreme".into()),
        hours_per_week: Some(0),
        ..ListingMatchInput::default()
    };
    let profile = StudentMatchProfile {
        majors: vec!["".into()],
        year: Some("  ".into()),
        availability_start_month: Some("soonish".into()),
        preferred_terms: vec!["whenever".into()],
        ..StudentMatchProfile::default()
    };

    let result = engine().evaluate(&listing, &profile);
    assert!(result.eligible);
    assert!(result.score <= 100);
}
