use serde::Serialize;
use strum::{AsRefStr, Display};

/// The nine scored signals, in evaluation and display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, AsRefStr)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum SignalKey {
    SkillsRequired,
    MajorCategoryAlignment,
    CourseworkAlignment,
    SkillsPreferred,
    ExperienceAlignment,
    Availability,
    StartDateFit,
    TermAlignment,
    PreferenceAlignment,
}

impl SignalKey {
    pub const ALL: [SignalKey; 9] = [
        SignalKey::SkillsRequired,
        SignalKey::MajorCategoryAlignment,
        SignalKey::CourseworkAlignment,
        SignalKey::SkillsPreferred,
        SignalKey::ExperienceAlignment,
        SignalKey::Availability,
        SignalKey::StartDateFit,
        SignalKey::TermAlignment,
        SignalKey::PreferenceAlignment,
    ];

    /// Fixed signal -> category regrouping table.
    pub fn category(self) -> CategoryKey {
        match self {
            SignalKey::SkillsRequired | SignalKey::SkillsPreferred => CategoryKey::Skills,
            SignalKey::CourseworkAlignment => CategoryKey::Coursework,
            SignalKey::MajorCategoryAlignment | SignalKey::ExperienceAlignment => {
                CategoryKey::Major
            }
            SignalKey::Availability | SignalKey::StartDateFit | SignalKey::TermAlignment => {
                CategoryKey::Availability
            }
            SignalKey::PreferenceAlignment => CategoryKey::Location,
        }
    }
}

/// The five user-facing score categories.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display, AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CategoryKey {
    Skills,
    Coursework,
    Major,
    Availability,
    Location,
}

impl CategoryKey {
    pub const ALL: [CategoryKey; 5] = [
        CategoryKey::Skills,
        CategoryKey::Coursework,
        CategoryKey::Major,
        CategoryKey::Availability,
        CategoryKey::Location,
    ];
}

/// Qualitative category verdict shown in the UI breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CategoryStatus {
    Good,
    Partial,
    Gap,
    Unknown,
}

/// Machine-readable flags the evaluators raise for status derivation.
/// Kept as a closed enum so the aggregation logic cannot drift from the
/// strings the evaluators emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EvidenceToken {
    StudentCourseworkMissing,
    LateStart,
    StudentStartSeasonFallback,
    StudentStartMissing,
    ListingStartMissing,
}

/// Gap classes; `severity` drives the deterministic ordering of the
/// user-facing gap list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GapKind {
    DeadlinePassed,
    MissingRequiredSkills,
    RequiredCoursework,
    GraduationYear,
    ExperienceMismatch,
    LateStart,
    StartBefore,
    TermMismatch,
    WorkModeMismatch,
    LocationMismatch,
    RemoteOnlyConflict,
    PreferenceMismatch,
    NoMajorAlignment,
    Other,
}

impl GapKind {
    pub fn severity(self) -> u8 {
        match self {
            GapKind::DeadlinePassed => 100,
            GapKind::MissingRequiredSkills => 100,
            GapKind::RequiredCoursework => 90,
            GapKind::GraduationYear => 85,
            GapKind::ExperienceMismatch => 85,
            GapKind::LateStart => 80,
            GapKind::StartBefore => 70,
            GapKind::TermMismatch => 60,
            GapKind::WorkModeMismatch
            | GapKind::LocationMismatch
            | GapKind::RemoteOnlyConflict
            | GapKind::PreferenceMismatch => 50,
            GapKind::NoMajorAlignment => 40,
            GapKind::Other => 10,
        }
    }
}

/// A positive contribution worth surfacing to the user.
#[derive(Debug, Clone, Serialize)]
pub struct Reason {
    pub key: &'static str,
    pub text: String,
    pub points: f64,
    pub evidence: Vec<String>,
    pub category: CategoryKey,
}

/// A shortfall worth surfacing to the user.
#[derive(Debug, Clone, Serialize)]
pub struct Gap {
    pub kind: GapKind,
    pub text: String,
    pub category: CategoryKey,
}

impl Gap {
    pub fn new(kind: GapKind, category: CategoryKey, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            category,
        }
    }
}

/// One signal's weighted contribution plus its evidence trail.
#[derive(Debug, Clone, Serialize)]
pub struct SignalContribution {
    pub key: SignalKey,
    pub weight: f64,
    pub raw_value: f64,
    pub points: f64,
    pub evidence: Vec<String>,
}

impl SignalContribution {
    pub fn new(key: SignalKey, weight: f64, raw_value: f64, evidence: Vec<String>) -> Self {
        Self {
            key,
            weight,
            raw_value,
            points: weight * raw_value,
            evidence,
        }
    }

    /// Zero-valued placeholder for signals that never became comparable.
    pub fn empty(key: SignalKey, weight: f64) -> Self {
        Self {
            key,
            weight,
            raw_value: 0.0,
            points: 0.0,
            evidence: Vec::new(),
        }
    }
}

/// Evaluated signals. `None` means the signal never became comparable and is
/// excluded from its category's weight denominator.
#[derive(Debug, Clone, Default)]
pub struct SignalBoard {
    pub skills_required: Option<SignalContribution>,
    pub major_category_alignment: Option<SignalContribution>,
    pub coursework_alignment: Option<SignalContribution>,
    pub skills_preferred: Option<SignalContribution>,
    pub experience_alignment: Option<SignalContribution>,
    pub availability: Option<SignalContribution>,
    pub start_date_fit: Option<SignalContribution>,
    pub term_alignment: Option<SignalContribution>,
    pub preference_alignment: Option<SignalContribution>,
}

impl SignalBoard {
    pub fn get(&self, key: SignalKey) -> Option<&SignalContribution> {
        match key {
            SignalKey::SkillsRequired => self.skills_required.as_ref(),
            SignalKey::MajorCategoryAlignment => self.major_category_alignment.as_ref(),
            SignalKey::CourseworkAlignment => self.coursework_alignment.as_ref(),
            SignalKey::SkillsPreferred => self.skills_preferred.as_ref(),
            SignalKey::ExperienceAlignment => self.experience_alignment.as_ref(),
            SignalKey::Availability => self.availability.as_ref(),
            SignalKey::StartDateFit => self.start_date_fit.as_ref(),
            SignalKey::TermAlignment => self.term_alignment.as_ref(),
            SignalKey::PreferenceAlignment => self.preference_alignment.as_ref(),
        }
    }

    pub fn set(&mut self, contribution: SignalContribution) {
        let slot = match contribution.key {
            SignalKey::SkillsRequired => &mut self.skills_required,
            SignalKey::MajorCategoryAlignment => &mut self.major_category_alignment,
            SignalKey::CourseworkAlignment => &mut self.coursework_alignment,
            SignalKey::SkillsPreferred => &mut self.skills_preferred,
            SignalKey::ExperienceAlignment => &mut self.experience_alignment,
            SignalKey::Availability => &mut self.availability,
            SignalKey::StartDateFit => &mut self.start_date_fit,
            SignalKey::TermAlignment => &mut self.term_alignment,
            SignalKey::PreferenceAlignment => &mut self.preference_alignment,
        };
        *slot = Some(contribution);
    }

    /// Flat diagnostic total across evaluated signals.
    pub fn total_points(&self) -> f64 {
        SignalKey::ALL
            .iter()
            .filter_map(|key| self.get(*key))
            .map(|contribution| contribution.points)
            .sum()
    }
}

/// Human-readable reason line in the original marketplace format.
pub fn describe_reason(label: &str, points: f64, details: &str) -> String {
    format!("{label}: {details} (+{points:.1})")
}
