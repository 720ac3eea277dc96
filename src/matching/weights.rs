use serde::{Deserialize, Serialize};

use super::evidence::{CategoryKey, SignalKey};

/// Default signal weights. The flat sum bounds the diagnostic raw score;
/// the authoritative 0-100 score comes from the category regrouping below.
pub const DEFAULT_WEIGHTS: MatchWeights = MatchWeights {
    skills_required: 4.0,
    major_category_alignment: 3.0,
    coursework_alignment: 2.5,
    skills_preferred: 2.0,
    experience_alignment: 1.5,
    availability: 2.0,
    start_date_fit: 1.0,
    term_alignment: 1.0,
    preference_alignment: 1.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchWeights {
    pub skills_required: f64,
    pub major_category_alignment: f64,
    pub coursework_alignment: f64,
    pub skills_preferred: f64,
    pub experience_alignment: f64,
    pub availability: f64,
    pub start_date_fit: f64,
    pub term_alignment: f64,
    pub preference_alignment: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        DEFAULT_WEIGHTS
    }
}

impl MatchWeights {
    pub fn for_signal(&self, key: SignalKey) -> f64 {
        match key {
            SignalKey::SkillsRequired => self.skills_required,
            SignalKey::MajorCategoryAlignment => self.major_category_alignment,
            SignalKey::CourseworkAlignment => self.coursework_alignment,
            SignalKey::SkillsPreferred => self.skills_preferred,
            SignalKey::ExperienceAlignment => self.experience_alignment,
            SignalKey::Availability => self.availability,
            SignalKey::StartDateFit => self.start_date_fit,
            SignalKey::TermAlignment => self.term_alignment,
            SignalKey::PreferenceAlignment => self.preference_alignment,
        }
    }

    /// Upper bound of the flat signal total (negative weights score nothing).
    pub fn max_score_raw(&self) -> f64 {
        SignalKey::ALL
            .iter()
            .map(|key| self.for_signal(*key).max(0.0))
            .sum()
    }
}

/// Fixed user-facing category budgets; always sum to 100.
pub const CATEGORY_WEIGHTS: CategoryWeights = CategoryWeights {
    skills: 25.0,
    coursework: 25.0,
    major: 20.0,
    availability: 15.0,
    location: 15.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeights {
    pub skills: f64,
    pub coursework: f64,
    pub major: f64,
    pub availability: f64,
    pub location: f64,
}

impl CategoryWeights {
    pub fn for_category(&self, key: CategoryKey) -> f64 {
        match key {
            CategoryKey::Skills => self.skills,
            CategoryKey::Coursework => self.coursework,
            CategoryKey::Major => self.major,
            CategoryKey::Availability => self.availability,
            CategoryKey::Location => self.location,
        }
    }

    pub fn sum(&self) -> f64 {
        self.skills + self.coursework + self.major + self.availability + self.location
    }
}
