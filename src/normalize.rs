use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static SEPARATOR_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[_\-]+").unwrap());
static WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Canonical token form: trimmed, lowercased, `_`/`-` runs and whitespace
/// runs collapsed to single spaces.
pub fn normalize_text(value: &str) -> String {
    let lowered = value.trim().to_lowercase();
    let unseparated = SEPARATOR_RUNS.replace_all(&lowered, " ");
    WHITESPACE_RUNS
        .replace_all(unseparated.as_ref(), " ")
        .trim()
        .to_string()
}

/// Graduation-year tokens compare with whitespace removed so "Spring 2026"
/// and "spring2026" land on the same key.
pub fn normalize_grad_year_token(value: &str) -> String {
    normalize_text(value).replace(' ', "")
}

/// Normalizes a plain list field, dropping empties.
pub fn normalize_tokens(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|value| normalize_text(value))
        .filter(|token| !token.is_empty())
        .collect()
}

/// Drops empties and duplicates while keeping first-seen order. Catalog IDs
/// are compared verbatim, not case-folded.
pub fn dedup_ids(ids: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    ids.iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(id.to_string()))
        .map(|id| id.to_string())
        .collect()
}

/// Extracts the remainder of a `Key: value` line from free-form description
/// text. `line_re` must capture the remainder in group 1.
pub fn description_line(description: &str, line_re: &Regex) -> Option<String> {
    line_re
        .captures(description)
        .and_then(|caps| caps.get(1))
        .map(|m| normalize_text(m.as_str()))
        .filter(|value| !value.is_empty())
}

/// A field that upstream systems deliver either as a comma-joined string or
/// as an array. Normalization happens at token extraction so the evaluators
/// only ever see flat canonical tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenList {
    Csv(String),
    Items(Vec<String>),
}

impl Default for TokenList {
    fn default() -> Self {
        TokenList::Items(Vec::new())
    }
}

impl TokenList {
    /// Normalized tokens in declaration order, empties dropped.
    pub fn tokens(&self) -> Vec<String> {
        match self {
            TokenList::Csv(raw) => raw
                .split(',')
                .map(normalize_text)
                .filter(|token| !token.is_empty())
                .collect(),
            TokenList::Items(items) => normalize_tokens(items),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens().is_empty()
    }
}

impl From<&str> for TokenList {
    fn from(value: &str) -> Self {
        TokenList::Csv(value.to_string())
    }
}

impl From<Vec<String>> for TokenList {
    fn from(value: Vec<String>) -> Self {
        TokenList::Items(value)
    }
}

impl From<Vec<&str>> for TokenList {
    fn from(value: Vec<&str>) -> Self {
        TokenList::Items(value.into_iter().map(str::to_string).collect())
    }
}
