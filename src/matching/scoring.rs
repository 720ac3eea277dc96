use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use super::availability::{
    derive_term, evaluate_availability, evaluate_start_date_fit, evaluate_term_alignment,
    listing_seasons, resolve_listing_start_month, resolve_student_start_month, StartSource,
};
use super::categories::{aggregate_categories, CategoryBreakdown};
use super::coursework::{evaluate_coursework, CourseworkOutcome, CourseworkPath};
use super::eligibility::{
    check_deadline, check_experience, check_graduation_year, check_remote_only,
    check_strict_location, check_strict_term, check_strict_work_mode, GateDecision,
};
use super::evidence::{
    describe_reason, CategoryKey, EvidenceToken, Gap, GapKind, Reason, SignalBoard,
    SignalContribution, SignalKey,
};
use super::experience::{listing_experience_rank, student_experience_rank};
use super::skills::{evaluate_preferred_skills, evaluate_required_skills, SkillSignalOutcome};
use super::weights::MatchWeights;
use super::work_mode::{derive_location_name, derive_work_mode, WorkMode};
use crate::logging::{DiagnosticSink, NoopSink};
use crate::normalize::{normalize_text, normalize_tokens};
use crate::{ListingMatchInput, StudentMatchProfile, MATCHING_VERSION};

#[derive(Debug, Clone)]
pub struct MatchEngineConfig {
    pub weights: MatchWeights,
    /// Stamped into every result; bump when scoring semantics change.
    pub matching_version: String,
    /// Reference date for deadline checks. `None` means the current UTC day;
    /// tests pin it for determinism.
    pub today: Option<NaiveDate>,
    /// Attach the itemized signal/category breakdown to results.
    pub explain: bool,
}

impl Default for MatchEngineConfig {
    fn default() -> Self {
        Self {
            weights: MatchWeights::default(),
            matching_version: MATCHING_VERSION.to_string(),
            today: None,
            explain: false,
        }
    }
}

impl MatchEngineConfig {
    pub fn explain() -> Self {
        Self {
            explain: true,
            ..Self::default()
        }
    }
}

/// One listing/profile evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub listing_id: String,
    /// Bounded 0-100 integer; the rounded category total.
    pub score: u32,
    pub eligible: bool,
    /// At most three, strongest contribution first.
    pub reasons: Vec<String>,
    /// At most two, most severe first.
    pub gaps: Vec<String>,
    pub matching_version: String,
    /// Which coursework comparison tier fired.
    pub coursework_path: CourseworkPath,
    pub breakdown: Option<MatchBreakdown>,
}

/// Itemized explain payload for UI display and debugging.
#[derive(Debug, Clone, Serialize)]
pub struct MatchBreakdown {
    /// Flat sum of the nine signal point contributions (diagnostic; the
    /// category total is authoritative and can legitimately diverge).
    pub total_score_raw: f64,
    pub max_score_raw: f64,
    pub normalized_score: f64,
    pub category_total: f64,
    pub signals: Vec<SignalContribution>,
    pub categories: Vec<CategoryBreakdown>,
}

#[derive(Default)]
struct EvalContext {
    board: SignalBoard,
    reasons: Vec<Reason>,
    gaps: Vec<Gap>,
    evidence: BTreeSet<EvidenceToken>,
    coursework_path: CourseworkPath,
}

impl EvalContext {
    fn apply_skill(&mut self, outcome: SkillSignalOutcome) {
        if let Some(contribution) = outcome.contribution {
            self.board.set(contribution);
        }
        if let Some(reason) = outcome.reason {
            self.reasons.push(reason);
        }
        if let Some(gap) = outcome.gap {
            self.gaps.push(gap);
        }
    }

    fn apply_coursework(&mut self, outcome: CourseworkOutcome) {
        if let Some(contribution) = outcome.contribution {
            self.board.set(contribution);
        }
        if let Some(reason) = outcome.reason {
            self.reasons.push(reason);
        }
        if let Some(gap) = outcome.gap {
            self.gaps.push(gap);
        }
        self.evidence.extend(outcome.evidence_tokens);
        self.coursework_path = outcome.path;
    }
}

/// The matching engine: a pure function of one listing and one profile,
/// wrapped in a struct so weights, the reference date, and the diagnostic
/// sink are injectable.
pub struct MatchEngine {
    config: MatchEngineConfig,
    sink: Box<dyn DiagnosticSink + Send + Sync>,
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new(MatchEngineConfig::default())
    }
}

impl MatchEngine {
    pub fn new(config: MatchEngineConfig) -> Self {
        Self {
            config,
            sink: Box::new(NoopSink),
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn DiagnosticSink + Send + Sync>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &MatchEngineConfig {
        &self.config
    }

    /// Scores one listing against one profile. Never panics; malformed or
    /// absent optional fields degrade to neutral contributions or gaps.
    pub fn evaluate(&self, listing: &ListingMatchInput, profile: &StudentMatchProfile) -> MatchResult {
        let today = self
            .config
            .today
            .unwrap_or_else(|| Utc::now().date_naive());

        let work_mode = derive_work_mode(listing);
        let location_name = derive_location_name(listing);
        let term_text = derive_term(listing);
        let listing_season_set = listing_seasons(&term_text, listing.start_date.as_deref());
        let student_seasons = crate::date::season::normalize_preferred_seasons(
            &profile.preferred_terms,
            profile.availability_start_month.as_deref(),
        );
        let listing_start = resolve_listing_start_month(&term_text, listing.start_date.as_deref());
        let student_start = resolve_student_start_month(profile, &student_seasons);
        let student_has_explicit_month = student_start.source == StartSource::StartMonth;

        let mut ctx = EvalContext::default();

        // Hard gates, in order; the first failure wins and skips scoring.
        let gates = [
            check_deadline(listing.application_deadline.as_deref(), today),
            check_remote_only(profile.remote_only, work_mode),
            check_strict_work_mode(
                profile.strict_preferences,
                &profile.preferred_work_modes,
                work_mode,
            ),
            check_strict_location(
                profile.strict_preferences,
                work_mode,
                &profile.preferred_locations,
                &location_name,
            ),
            check_strict_term(
                profile.strict_term_only,
                listing_start.month,
                student_start.month,
            ),
        ];
        for gate in gates {
            if let GateDecision::Ineligible(gap) = gate {
                self.sink
                    .debug(&format!("listing {} gated: {}", listing.id, gap.text));
                ctx.gaps.push(gap);
                return self.finalize(listing, ctx, false);
            }
        }

        ctx.apply_skill(evaluate_required_skills(listing, profile, &self.config.weights));
        ctx.apply_skill(evaluate_preferred_skills(listing, profile, &self.config.weights));

        let required_level_label = listing
            .target_student_year
            .as_deref()
            .filter(|value| !normalize_text(value).is_empty())
            .or(listing.experience_level.as_deref());
        let required_rank = required_level_label.and_then(listing_experience_rank);
        let targets_seniors = required_rank == Some(3);

        ctx.apply_coursework(evaluate_coursework(
            listing,
            profile,
            &self.config.weights,
            targets_seniors,
        ));

        // Mid-pipeline hard gates.
        if let GateDecision::Ineligible(gap) = check_graduation_year(
            &listing.target_graduation_years.tokens(),
            profile.year.as_deref(),
        ) {
            self.sink
                .debug(&format!("listing {} gated: {}", listing.id, gap.text));
            ctx.gaps.push(gap);
            return self.finalize(listing, ctx, false);
        }

        let student_rank = profile
            .experience_level
            .as_deref()
            .and_then(student_experience_rank);
        if let (Some(required), Some(student)) = (required_rank, student_rank) {
            let passes = student >= required;
            ctx.board.set(SignalContribution::new(
                SignalKey::ExperienceAlignment,
                self.config.weights.experience_alignment,
                if passes { 1.0 } else { 0.0 },
                vec![
                    format!(
                        "student_level={}",
                        profile.experience_level.as_deref().unwrap_or("unknown")
                    ),
                    format!(
                        "required_level={}",
                        required_level_label.unwrap_or("unknown")
                    ),
                ],
            ));

            if let GateDecision::Ineligible(gap) = check_experience(
                required_rank,
                student_rank,
                required_level_label,
                profile.experience_level.as_deref(),
            ) {
                self.sink
                    .debug(&format!("listing {} gated: {}", listing.id, gap.text));
                ctx.gaps.push(gap);
                return self.finalize(listing, ctx, false);
            }

            ctx.reasons.push(Reason {
                key: "experience.fit",
                text: describe_reason(
                    "Experience alignment",
                    self.config.weights.experience_alignment,
                    profile.experience_level.as_deref().unwrap_or("aligned"),
                ),
                points: self.config.weights.experience_alignment,
                evidence: vec![format!(
                    "student_level={}",
                    profile.experience_level.as_deref().unwrap_or("unknown")
                )],
                category: CategoryKey::Major,
            });
        }

        self.evaluate_major(listing, profile, &mut ctx);

        let availability = evaluate_availability(
            listing,
            profile,
            &listing_start,
            &student_start,
            &self.config.weights,
        );
        if let Some(contribution) = availability.contribution {
            ctx.board.set(contribution);
        }
        if let Some(reason) = availability.reason {
            ctx.reasons.push(reason);
        }
        ctx.gaps.extend(availability.gaps);
        ctx.evidence.extend(availability.evidence_tokens);

        let start_fit = evaluate_start_date_fit(&listing_start, &student_start, &self.config.weights);
        if let Some(contribution) = start_fit.contribution {
            ctx.board.set(contribution);
        }
        if let Some(reason) = start_fit.reason {
            ctx.reasons.push(reason);
        }
        if let Some(gap) = start_fit.gap {
            ctx.gaps.push(gap);
        }

        let term = evaluate_term_alignment(
            student_has_explicit_month,
            &student_seasons,
            &listing_season_set,
            &self.config.weights,
        );
        if let Some(contribution) = term.contribution {
            ctx.board.set(contribution);
        }
        if let Some(reason) = term.reason {
            ctx.reasons.push(reason);
        }
        if let Some(gap) = term.gap {
            ctx.gaps.push(gap);
        }

        self.evaluate_preference(work_mode, &location_name, profile, &mut ctx);

        self.finalize(listing, ctx, true)
    }

    /// Major/category alignment: any major overlap earns full weight, a
    /// free-text category containment earns half, anything else gaps.
    fn evaluate_major(
        &self,
        listing: &ListingMatchInput,
        profile: &StudentMatchProfile,
        ctx: &mut EvalContext,
    ) {
        let student_majors = normalize_tokens(&profile.majors);
        if student_majors.is_empty() {
            return;
        }
        let student_set: HashSet<&String> = student_majors.iter().collect();

        let listing_majors = listing.majors.tokens();
        let category = listing
            .category
            .as_deref()
            .map(normalize_text)
            .filter(|value| !value.is_empty())
            .or_else(|| listing_majors.first().cloned())
            .unwrap_or_default();

        let major_hits = listing_majors
            .iter()
            .filter(|major| student_set.contains(major))
            .count();
        let category_hit =
            !category.is_empty() && student_majors.iter().any(|major| category.contains(major));

        let (raw, evidence) = if major_hits > 0 {
            (
                1.0,
                vec![format!(
                    "major_hits={major_hits}/{}",
                    listing_majors.len().max(1)
                )],
            )
        } else if category_hit {
            (0.5, vec![format!("category_hit={category}")])
        } else {
            (0.0, Vec::new())
        };

        let contribution = SignalContribution::new(
            SignalKey::MajorCategoryAlignment,
            self.config.weights.major_category_alignment,
            raw,
            evidence.clone(),
        );
        let points = contribution.points;
        ctx.board.set(contribution);

        if raw > 0.0 {
            ctx.reasons.push(Reason {
                key: if major_hits > 0 {
                    "major.overlap"
                } else {
                    "major.category_fallback"
                },
                text: describe_reason(
                    "Major/category alignment",
                    points,
                    &if major_hits > 0 {
                        format!("{major_hits} major overlap")
                    } else {
                        format!("category match ({category})")
                    },
                ),
                points,
                evidence,
                category: CategoryKey::Major,
            });
        } else {
            ctx.gaps.push(Gap::new(
                GapKind::NoMajorAlignment,
                CategoryKey::Major,
                "No major/category alignment",
            ));
        }
    }

    /// Signed preference signal: only contributes when a comparison is
    /// possible, +weight on match and -weight on mismatch.
    fn evaluate_preference(
        &self,
        work_mode: Option<WorkMode>,
        location_name: &str,
        profile: &StudentMatchProfile,
        ctx: &mut EvalContext,
    ) {
        let preferred_locations = normalize_tokens(&profile.preferred_locations);
        let mut comparable = false;
        let mut aligned = false;
        let mut mismatch = false;

        if let Some(mode) = work_mode {
            if !profile.preferred_work_modes.is_empty() {
                comparable = true;
                if profile.preferred_work_modes.contains(&mode) {
                    aligned = true;
                } else {
                    mismatch = true;
                    ctx.gaps.push(Gap::new(
                        GapKind::WorkModeMismatch,
                        CategoryKey::Location,
                        format!("Work mode mismatch ({mode})."),
                    ));
                }
            }
        }

        if !preferred_locations.is_empty()
            && work_mode.is_some_and(WorkMode::is_in_person)
            && !location_name.is_empty()
        {
            comparable = true;
            let matches_preference = preferred_locations.iter().any(|preferred| {
                location_name.contains(preferred) || preferred.contains(location_name)
            });
            if matches_preference {
                aligned = true;
            } else {
                mismatch = true;
                ctx.gaps.push(Gap::new(
                    GapKind::LocationMismatch,
                    CategoryKey::Location,
                    format!("In-person location mismatch ({location_name})."),
                ));
            }
        }

        if !comparable {
            return;
        }

        let raw = if mismatch {
            -1.0
        } else if aligned {
            1.0
        } else {
            0.0
        };
        let evidence = vec![
            format!(
                "work_mode={}",
                work_mode.map(|m| m.to_string()).unwrap_or_else(|| "unknown".into())
            ),
            format!(
                "location={}",
                if location_name.is_empty() {
                    "unknown"
                } else {
                    location_name
                }
            ),
        ];

        let contribution = SignalContribution::new(
            SignalKey::PreferenceAlignment,
            self.config.weights.preference_alignment,
            raw,
            evidence.clone(),
        );
        let points = contribution.points;
        ctx.board.set(contribution);

        if raw > 0.0 {
            ctx.reasons.push(Reason {
                key: "preferences.aligned",
                text: describe_reason("Preference alignment", points, "work mode/location match"),
                points,
                evidence,
                category: CategoryKey::Location,
            });
        }
    }

    fn finalize(&self, listing: &ListingMatchInput, ctx: EvalContext, eligible: bool) -> MatchResult {
        let weights = &self.config.weights;
        let categories = aggregate_categories(&ctx.board, &ctx.reasons, &ctx.gaps, &ctx.evidence);
        let category_total: f64 = categories.iter().map(|row| row.earned_points).sum();
        let score = if eligible {
            category_total.clamp(0.0, 100.0).round() as u32
        } else {
            0
        };

        let mut ranked_reasons = ctx.reasons;
        ranked_reasons.sort_by(|a, b| b.points.partial_cmp(&a.points).unwrap_or(Ordering::Equal));
        let reasons: Vec<String> = ranked_reasons
            .iter()
            .take(3)
            .map(|reason| reason.text.clone())
            .collect();

        let mut seen = HashSet::new();
        let mut deduped_gaps: Vec<&Gap> = ctx
            .gaps
            .iter()
            .filter(|gap| {
                let squeezed = normalize_text(&gap.text);
                !squeezed.is_empty() && seen.insert(squeezed)
            })
            .collect();
        deduped_gaps.sort_by(|a, b| b.kind.severity().cmp(&a.kind.severity()));
        let gaps: Vec<String> = deduped_gaps
            .iter()
            .take(2)
            .map(|gap| gap.text.clone())
            .collect();

        let total_score_raw = ctx.board.total_points();
        let max_score_raw = weights.max_score_raw();
        let normalized_score = if max_score_raw > 0.0 {
            (total_score_raw / max_score_raw).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let breakdown = self.config.explain.then(|| MatchBreakdown {
            total_score_raw: round3(total_score_raw),
            max_score_raw: round3(max_score_raw),
            normalized_score: round4(normalized_score),
            category_total: round1(category_total),
            signals: SignalKey::ALL
                .iter()
                .map(|&key| {
                    ctx.board
                        .get(key)
                        .cloned()
                        .map(|mut contribution| {
                            contribution.raw_value = round4(contribution.raw_value);
                            contribution.points = round3(contribution.points);
                            contribution
                        })
                        .unwrap_or_else(|| SignalContribution::empty(key, weights.for_signal(key)))
                })
                .collect(),
            categories,
        });

        MatchResult {
            listing_id: listing.id.clone(),
            score,
            eligible,
            reasons,
            gaps,
            matching_version: self.config.matching_version.clone(),
            coursework_path: ctx.coursework_path,
            breakdown,
        }
    }
}

/// Scores with default weights and no breakdown.
pub fn evaluate_match(listing: &ListingMatchInput, profile: &StudentMatchProfile) -> MatchResult {
    MatchEngine::default().evaluate(listing, profile)
}

/// Scores with default weights and the full explain breakdown attached.
pub fn evaluate_match_detailed(
    listing: &ListingMatchInput,
    profile: &StudentMatchProfile,
) -> MatchResult {
    MatchEngine::new(MatchEngineConfig::explain()).evaluate(listing, profile)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn round4(value: f64) -> f64 {
    (value * 10000.0).round() / 10000.0
}
