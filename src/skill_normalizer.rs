use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use strsim::damerau_levenshtein;
use unicode_normalization::UnicodeNormalization;

/// Skill alias -> canonical form mapping (O(1) lookup).
///
/// NOTE: keep this in sync with the catalog seed in the marketplace schema.
static ALIAS_TO_CANONICAL: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let aliases: &[(&str, &[&str])] = &[
        // Office and analysis tools
        (
            "excel",
            &[
                "ms excel",
                "microsoft excel",
                "excel modeling",
                "financial modeling in excel",
                "excel",
            ],
        ),
        (
            "spreadsheets",
            &["google sheets", "sheets", "spreadsheets"],
        ),
        (
            "powerpoint",
            &["ms powerpoint", "microsoft powerpoint", "slide decks", "powerpoint"],
        ),
        ("tableau", &["tableau desktop", "tableau public", "tableau"]),
        (
            "data analysis",
            &["data analytics", "data analyst", "analytics", "data analysis"],
        ),
        // Soft skills employers type in many spellings
        (
            "communication",
            &[
                "written communication",
                "verbal communication",
                "communication skills",
                "communication",
            ],
        ),
        (
            "attention to detail",
            &["detail oriented", "detail-oriented", "attention to detail"],
        ),
        (
            "leadership",
            &["team leadership", "student leadership", "leadership"],
        ),
        (
            "project management",
            &["project coordination", "project planning", "project management"],
        ),
        (
            "customer service",
            &["customer support", "client service", "customer service"],
        ),
        (
            "research",
            &["market research", "academic research", "user research", "research"],
        ),
        (
            "writing",
            &["copywriting", "content writing", "technical writing", "writing"],
        ),
        (
            "social media",
            &[
                "social media marketing",
                "social media management",
                "social media",
            ],
        ),
        ("marketing", &["digital marketing", "growth marketing", "marketing"]),
        (
            "financial modeling",
            &["financial modelling", "dcf modeling", "financial modeling"],
        ),
        ("accounting", &["bookkeeping", "accounting"]),
        // Programming stacks that show up on both sides of the marketplace
        (
            "javascript",
            &["js", "java script", "ecmascript", "es6", "javascript"],
        ),
        ("typescript", &["ts", "type script", "typescript"]),
        ("python", &["python3", "python 3", "py", "python"]),
        ("java", &["java8", "java11", "java17", "java"]),
        (
            "sql",
            &["sql queries", "postgresql", "postgres", "mysql", "sqlite", "sql"],
        ),
        ("react", &["reactjs", "react.js", "react js", "react"]),
        ("figma", &["figma design", "figma prototyping", "figma"]),
        (
            "git",
            &["github", "gitlab", "version control", "git"],
        ),
    ];

    let mut map = HashMap::new();
    for (canonical, alias_list) in aliases {
        map.insert(*canonical, *canonical);
        for alias in *alias_list {
            map.insert(*alias, *canonical);
        }
    }
    map
});

/// Compact keys (separators removed, NFKC folded) catch minor punctuation
/// drift like "React.JS" or "detail-oriented".
static COMPACT_ALIAS_TO_CANONICAL: LazyLock<HashMap<String, &'static str>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    for (alias, canonical) in ALIAS_TO_CANONICAL.iter() {
        let compact = compact_key(alias);
        map.entry(compact).or_insert(*canonical);
    }

    map
});

fn nfkc_lower_trim(input: &str) -> String {
    input.nfkc().collect::<String>().trim().to_lowercase()
}

fn compact_key(input: &str) -> String {
    input
        .nfkc()
        .collect::<String>()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ' ' | '.' | '-' | '_' | '/' | ','))
        .collect()
}

fn match_canonical_token(token: &str) -> Option<String> {
    if token.is_empty() {
        return None;
    }

    if let Some(canonical) = ALIAS_TO_CANONICAL.get(token) {
        return Some(canonical.to_string());
    }

    let compact = compact_key(token);
    if let Some(canonical) = COMPACT_ALIAS_TO_CANONICAL.get(&compact) {
        return Some((*canonical).to_string());
    }

    fuzzy_match_canonical(&compact)
}

fn split_segments(input: &str) -> impl Iterator<Item = String> + '_ {
    input
        .split(|c: char| matches!(c, ' ' | '/' | ',' | ';' | '|' | '+'))
        .map(nfkc_lower_trim)
        .filter(|s| !s.is_empty())
}

fn fuzzy_match_canonical(compact: &str) -> Option<String> {
    if compact.len() < 4 {
        return None;
    }

    let mut best: Option<(&str, usize)> = None;
    for (alias, canonical) in COMPACT_ALIAS_TO_CANONICAL.iter() {
        // Avoid fuzzy-matching short tokens (js, py, sql) to reduce false
        // positives on brief or ambiguous inputs. Short aliases and short
        // canonical targets are only matched via exact lookups above.
        if alias.len() < 5 || compact.len() < 5 || canonical.len() < 5 {
            continue;
        }

        let distance = damerau_levenshtein(compact, alias);
        if distance == 0 {
            return Some((*canonical).to_string());
        }

        let len = compact.len().max(alias.len());
        let acceptable = distance == 1 || (len >= 8 && distance == 2);
        if !acceptable {
            continue;
        }

        match best {
            None => best = Some((*canonical, distance)),
            Some((_, best_dist)) if distance < best_dist => best = Some((*canonical, distance)),
            _ => {}
        }
    }

    best.map(|(canonical, _)| canonical.to_string())
}

/// Collapses a free-text skill label to its canonical form (O(1)).
pub fn normalize_skill(skill: &str) -> String {
    let normalized = nfkc_lower_trim(skill);
    if let Some(canonical) = match_canonical_token(&normalized) {
        return canonical;
    }

    for segment in split_segments(skill) {
        if let Some(canonical) = match_canonical_token(&segment) {
            return canonical;
        }
    }

    normalized
}

/// Canonicalizes a label list into a set for overlap math.
pub fn normalize_skill_set(skills: &[String]) -> HashSet<String> {
    skills
        .iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| normalize_skill(s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_equivalence_across_spellings() {
        assert_eq!(normalize_skill("MS Excel"), "excel");
        assert_eq!(normalize_skill("Microsoft Excel"), "excel");
        assert_eq!(normalize_skill("written communication"), "communication");
        assert_eq!(normalize_skill("Detail-Oriented"), "attention to detail");
        assert_eq!(normalize_skill("Google Sheets"), "spreadsheets");
    }

    #[test]
    fn tech_aliases_collapse() {
        assert_eq!(normalize_skill("JS"), "javascript");
        assert_eq!(normalize_skill("React.js"), "react");
        assert_eq!(normalize_skill("Postgres"), "sql");
    }

    #[test]
    fn tolerates_small_typos_for_known_aliases() {
        assert_eq!(normalize_skill("pyhton"), "python");
        assert_eq!(normalize_skill("javascirpt"), "javascript");
        assert_eq!(normalize_skill("comunication"), "communication");
    }

    #[test]
    fn does_not_overmatch_short_tokens() {
        assert_eq!(normalize_skill("ab"), "ab");
        assert_eq!(normalize_skill("x"), "x");
    }

    #[test]
    fn unknown_skill_lowercases() {
        assert_eq!(normalize_skill("Pottery Wheel"), "pottery wheel");
    }

    #[test]
    fn normalization_is_bidirectional() {
        let listing = vec!["MS Excel".to_string(), "Written Communication".to_string()];
        let profile = vec!["excel".to_string(), "communication skills".to_string()];
        assert_eq!(normalize_skill_set(&listing), normalize_skill_set(&profile));
    }
}
