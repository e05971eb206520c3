//! Positive/negative classification of case records.
//!
//! This is a best-effort heuristic over free-text sheet columns, so it can
//! misclassify. Callers decide what to do with [`Classification::Unknown`]
//! instead of defaulting it to positive.

use serde::{Deserialize, Serialize};

/// Expectation class of a case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    /// Input is expected to produce Sinhala output
    Positive,
    /// Input is expected not to produce output, or must at least not break the page
    Negative,
    /// Neither the type column nor the identifier said which
    Unknown,
}

impl Classification {
    /// Short label used in listings and reports
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split an identifier into lower-cased tokens on `_`, `-` and whitespace
pub(crate) fn id_tokens(id: &str) -> impl Iterator<Item = String> + '_ {
    id.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// Classify a case from its `type` column and identifier.
///
/// The type column is checked first (`neg` before `pos`, as substrings of the
/// lower-cased value). Otherwise the first identifier token decides.
#[must_use]
pub fn classify(case_type: &str, id: &str) -> Classification {
    let kind: String = case_type
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect();
    if kind.contains("neg") {
        return Classification::Negative;
    }
    if kind.contains("pos") {
        return Classification::Positive;
    }

    match id_tokens(id).next().as_deref() {
        Some("neg" | "negative") => Classification::Negative,
        Some("pos" | "positive") => Classification::Positive,
        _ => Classification::Unknown,
    }
}

/// Check whether an identifier names a UI smoke case (`UI_…`, `Pos_UI_…`, `Neg_UI_…`)
#[must_use]
pub fn is_ui_smoke_id(id: &str) -> bool {
    let mut tokens = id_tokens(id);
    match tokens.next().as_deref() {
        Some("ui") => true,
        Some("pos" | "neg") => tokens.next().as_deref() == Some("ui"),
        _ => false,
    }
}
