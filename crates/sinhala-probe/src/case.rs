//! Case records produced by the loader.

use crate::classify::{classify, Classification};
use serde::{Deserialize, Serialize};

/// Name given to cases whose sheet row has no title
pub const UNTITLED_CASE: &str = "Untitled case";

/// One normalized test input/expectation unit derived from a sheet row.
///
/// Records are immutable once built; the scenario runner only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    id: String,
    name: String,
    input: String,
    expected_output: String,
    case_type: String,
    row_number: u32,
    classification: Classification,
}

impl TestCase {
    /// Build a case from raw field values.
    ///
    /// `id` and `name` are trimmed and replaced by a synthetic row identifier
    /// and [`UNTITLED_CASE`] when blank. `input` and `expected_output` are kept
    /// verbatim.
    #[must_use]
    pub fn new(
        id: &str,
        name: &str,
        input: impl Into<String>,
        expected_output: impl Into<String>,
        case_type: &str,
        row_number: u32,
    ) -> Self {
        let id = match id.trim() {
            "" => format!("ROW-{row_number}"),
            trimmed => trimmed.to_string(),
        };
        let name = match name.trim() {
            "" => UNTITLED_CASE.to_string(),
            trimmed => trimmed.to_string(),
        };
        let case_type = case_type.trim().to_string();
        let classification = classify(&case_type, &id);
        Self {
            id,
            name,
            input: input.into(),
            expected_output: expected_output.into(),
            case_type,
            row_number,
            classification,
        }
    }

    /// Case identifier
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable title
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text to inject
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Reference output from the sheet (may be empty)
    #[must_use]
    pub fn expected_output(&self) -> &str {
        &self.expected_output
    }

    /// Raw `type`/`category` column value
    #[must_use]
    pub fn case_type(&self) -> &str {
        &self.case_type
    }

    /// 1-based sheet row
    #[must_use]
    pub const fn row_number(&self) -> u32 {
        self.row_number
    }

    /// Heuristic classification
    #[must_use]
    pub const fn classification(&self) -> Classification {
        self.classification
    }

    /// Whether the case is classified negative
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.classification == Classification::Negative
    }

    /// Whether the input is blank
    #[must_use]
    pub fn has_empty_input(&self) -> bool {
        self.input.trim().is_empty()
    }

    /// Report key: `"<id> - <name> (Row <n>)"`
    #[must_use]
    pub fn title(&self) -> String {
        format!("{} - {} (Row {})", self.id, self.name, self.row_number)
    }
}
