//! Case Loader
//!
//! Reads the first sheet of a workbook into [`TestCase`] records.
//!
//! Sheet authors do not agree on column names, so every header is normalized
//! (trimmed, lower-cased, whitespace, `_` and `-` removed) and each logical
//! field is resolved through a priority-ordered alias list:
//!
//! ```text
//!  "TC ID" ─┐
//!  "tcid"  ─┼─ normalize ─► "tcid" ─► Field::Id
//!  "Test_Case_ID" ────────► "testcaseid" ─► Field::Id
//! ```
//!
//! Rows with nothing in them and UI smoke rows are dropped; everything else is
//! kept in sheet order.

use crate::case::TestCase;
use crate::classify::is_ui_smoke_id;
use crate::result::{ProbeError, ProbeResult};
use calamine::{open_workbook_auto, Data, Reader};
use std::collections::HashMap;
use std::path::Path;

/// Logical fields a sheet can provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Case identifier
    Id,
    /// Case title
    Name,
    /// Text to inject
    Input,
    /// Reference output
    ExpectedOutput,
    /// Positive/negative category
    Type,
}

impl Field {
    /// All fields, in resolution order
    pub const ALL: [Self; 5] = [
        Self::Id,
        Self::Name,
        Self::Input,
        Self::ExpectedOutput,
        Self::Type,
    ];

    /// Normalized header aliases, most preferred first
    #[must_use]
    pub const fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::Id => &["tcid", "testcaseid", "caseid", "testcase", "id"],
            Self::Name => &["testcasename", "name", "title", "casename", "description"],
            Self::Input => &["input", "inputtext", "singlish", "singlishinput"],
            Self::ExpectedOutput => &["expected", "expectedoutput", "output", "sinhala"],
            Self::Type => &["type", "category", "testtype", "casetype"],
        }
    }
}

/// Normalize a header name for alias lookup
#[must_use]
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .collect()
}

/// Resolution of logical fields to column indices for one header row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    columns: HashMap<Field, usize>,
}

impl HeaderMap {
    /// Resolve every [`Field`] against a header row.
    ///
    /// When two headers normalize to the same key, the later column wins.
    #[must_use]
    pub fn resolve<S: AsRef<str>>(header: &[S]) -> Self {
        let mut by_key: HashMap<String, usize> = HashMap::new();
        for (idx, name) in header.iter().enumerate() {
            let key = normalize_header(name.as_ref());
            if !key.is_empty() {
                by_key.insert(key, idx);
            }
        }

        let columns = Field::ALL
            .iter()
            .filter_map(|field| {
                field
                    .aliases()
                    .iter()
                    .find_map(|alias| by_key.get(*alias))
                    .map(|idx| (*field, *idx))
            })
            .collect();
        Self { columns }
    }

    /// Column index for a field, if the sheet has one
    #[must_use]
    pub fn column(&self, field: Field) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    /// Whether at least one data-bearing column was found
    #[must_use]
    pub fn has_data_columns(&self) -> bool {
        [Field::Id, Field::Name, Field::Input, Field::ExpectedOutput]
            .iter()
            .any(|f| self.columns.contains_key(f))
    }

    fn value<'a>(&self, row: &'a [String], field: Field) -> &'a str {
        self.column(field)
            .and_then(|idx| row.get(idx))
            .map_or("", String::as_str)
    }
}

/// Build case records from an already-extracted header and data rows.
///
/// `first_row_number` is the 1-based sheet row of the first data row (2 for a
/// header on row 1).
pub fn cases_from_rows<S, R>(
    header: &[S],
    rows: R,
    first_row_number: u32,
) -> ProbeResult<Vec<TestCase>>
where
    S: AsRef<str>,
    R: IntoIterator<Item = Vec<String>>,
{
    let map = HeaderMap::resolve(header);
    if !map.has_data_columns() {
        return Err(ProbeError::case_source(
            "no id, name, input or expected-output column found in header row",
        ));
    }

    let mut cases = Vec::new();
    for (offset, row) in rows.into_iter().enumerate() {
        let row_number = first_row_number + offset as u32;
        let id = map.value(&row, Field::Id);
        let name = map.value(&row, Field::Name);
        let input = map.value(&row, Field::Input);
        let expected = map.value(&row, Field::ExpectedOutput);

        if [id, name, input, expected].iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        if is_ui_smoke_id(id) {
            tracing::debug!(row = row_number, id, "skipping UI smoke row");
            continue;
        }

        cases.push(TestCase::new(
            id,
            name,
            input,
            expected,
            map.value(&row, Field::Type),
            row_number,
        ));
    }
    Ok(cases)
}

/// Render a cell the way a sheet author sees it
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

/// Load cases from the first sheet of a workbook.
///
/// # Errors
///
/// Returns [`ProbeError::CaseSourceNotFound`] if `path` does not exist and
/// [`ProbeError::CaseSource`] if it cannot be read as a workbook or has no
/// usable header.
pub fn load_cases(path: impl AsRef<Path>) -> ProbeResult<Vec<TestCase>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ProbeError::CaseSourceNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| ProbeError::case_source(format!("{}: {e}", path.display())))?;
    let Some(sheet) = workbook.sheet_names().first().cloned() else {
        return Err(ProbeError::case_source(format!(
            "{}: workbook has no sheets",
            path.display()
        )));
    };
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| ProbeError::case_source(format!("{}: {e}", path.display())))?;

    let Some((start_row, _)) = range.start() else {
        tracing::warn!(path = %path.display(), sheet, "first sheet is empty");
        return Ok(Vec::new());
    };

    let mut rows = range
        .rows()
        .map(|r| r.iter().map(cell_text).collect::<Vec<_>>());
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };

    // calamine rows are 0-based; the header sits on sheet row start_row + 1
    let cases = cases_from_rows(&header, rows, start_row + 2)?;
    tracing::info!(
        path = %path.display(),
        sheet,
        cases = cases.len(),
        "collected cases"
    );
    Ok(cases)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classification;
    use proptest::prelude::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| (*c).to_string()).collect()
    }

    mod normalize_tests {
        use super::*;

        #[test]
        fn test_id_variants_collapse() {
            assert_eq!(normalize_header("TC ID"), "tcid");
            assert_eq!(normalize_header("tcid"), "tcid");
            assert_eq!(normalize_header("Test_Case_ID"), "testcaseid");
            assert_eq!(normalize_header("  Expected-Output "), "expectedoutput");
        }

        #[test]
        fn test_header_map_resolves_id_variants() {
            for header in ["TC ID", "tcid", "Test_Case_ID"] {
                let map = HeaderMap::resolve(&[header, "Input"]);
                assert_eq!(map.column(Field::Id), Some(0), "header {header}");
            }
        }

        #[test]
        fn test_alias_priority() {
            // "tcid" beats "id" regardless of column order
            let map = HeaderMap::resolve(&["ID", "Input", "TC_ID"]);
            assert_eq!(map.column(Field::Id), Some(2));
        }

        #[test]
        fn test_later_duplicate_wins() {
            let map = HeaderMap::resolve(&["Input", "INPUT "]);
            assert_eq!(map.column(Field::Input), Some(1));
        }

        #[test]
        fn test_unresolved_fields() {
            let map = HeaderMap::resolve(&["Singlish"]);
            assert_eq!(map.column(Field::Input), Some(0));
            assert_eq!(map.column(Field::Id), None);
            assert_eq!(map.column(Field::Type), None);
        }
    }

    mod row_tests {
        use super::*;

        #[test]
        fn test_row_numbers_follow_header() {
            let header = row(&["TC ID", "Test case name", "Input"]);
            let rows = vec![
                row(&["Pos_Fun_0001", "Simple", "mama gedara yanawaa"]),
                row(&["Pos_Fun_0002", "Question", "oya kohomada inne?"]),
            ];
            let cases = cases_from_rows(&header, rows, 2).unwrap();
            assert_eq!(cases[0].row_number(), 2);
            assert_eq!(cases[1].row_number(), 3);
        }

        #[test]
        fn test_blank_rows_dropped_but_numbering_kept() {
            let header = row(&["TC ID", "Input"]);
            let rows = vec![
                row(&["Pos_Fun_0001", "mama"]),
                row(&["  ", " "]),
                row(&[]),
                row(&["Pos_Fun_0002", "oya"]),
            ];
            let cases = cases_from_rows(&header, rows, 2).unwrap();
            assert_eq!(cases.len(), 2);
            assert_eq!(cases[1].row_number(), 5);
        }

        #[test]
        fn test_id_only_row_is_kept() {
            let header = row(&["TC ID", "Input"]);
            let cases = cases_from_rows(&header, vec![row(&["Neg_Fun_0001", ""])], 2).unwrap();
            assert_eq!(cases.len(), 1);
            assert!(cases[0].is_negative());
            assert!(cases[0].has_empty_input());
        }

        #[test]
        fn test_ui_rows_excluded() {
            let header = row(&["TC ID", "Name", "Input", "Expected"]);
            let rows = vec![
                row(&["Pos_UI_0001", "Real-time", "mama oyata aDhara", "මම ඔයාට ආදර"]),
                row(&["Pos_Fun_0001", "Simple", "mama", "මම"]),
            ];
            let cases = cases_from_rows(&header, rows, 2).unwrap();
            assert_eq!(cases.len(), 1);
            assert_eq!(cases[0].id(), "Pos_Fun_0001");
        }

        #[test]
        fn test_type_column_feeds_classification() {
            let header = row(&["Test Case ID", "Category", "Input"]);
            let rows = vec![row(&["TC-1", "Negative", "@@@###$$$"])];
            let cases = cases_from_rows(&header, rows, 2).unwrap();
            assert_eq!(cases[0].classification(), Classification::Negative);
            assert_eq!(cases[0].case_type(), "Negative");
        }

        #[test]
        fn test_short_rows_read_as_empty() {
            let header = row(&["TC ID", "Name", "Input", "Expected"]);
            let cases = cases_from_rows(&header, vec![row(&["Pos_Fun_9"])], 2).unwrap();
            assert_eq!(cases[0].input(), "");
            assert_eq!(cases[0].expected_output(), "");
        }

        #[test]
        fn test_header_without_data_columns_is_rejected() {
            let header = row(&["Notes", "Category"]);
            let err = cases_from_rows(&header, vec![row(&["x", "y"])], 2).unwrap_err();
            assert!(matches!(err, ProbeError::CaseSource { .. }));
        }

        #[test]
        fn test_loading_is_idempotent() {
            let header = row(&["tcid", "input"]);
            let rows = || vec![row(&["Pos_1", "a"]), row(&["", ""]), row(&["Neg_2", ""])];
            let first = cases_from_rows(&header, rows(), 2).unwrap();
            let second = cases_from_rows(&header, rows(), 2).unwrap();
            assert_eq!(first, second);
        }
    }

    mod cell_tests {
        use super::*;

        #[test]
        fn test_cell_text() {
            assert_eq!(cell_text(&Data::Empty), "");
            assert_eq!(cell_text(&Data::String("mama".into())), "mama");
            assert_eq!(cell_text(&Data::Float(12.0)), "12");
            assert_eq!(cell_text(&Data::Float(1.5)), "1.5");
            assert_eq!(cell_text(&Data::Int(7)), "7");
            assert_eq!(cell_text(&Data::Bool(true)), "true");
        }
    }

    mod load_tests {
        use super::*;

        #[test]
        fn test_missing_file_is_not_found() {
            let err = load_cases("definitely/not/here.xlsx").unwrap_err();
            assert!(matches!(err, ProbeError::CaseSourceNotFound { .. }));
        }

        #[test]
        fn test_non_workbook_is_case_source_error() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("cases.xlsx");
            std::fs::write(&path, b"not a zip archive").unwrap();
            let err = load_cases(&path).unwrap_err();
            assert!(matches!(err, ProbeError::CaseSource { .. }));
        }
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(s in "[ a-zA-Z_\\-\t]{0,24}") {
            let once = normalize_header(&s);
            prop_assert_eq!(normalize_header(&once), once.clone());
            prop_assert!(!once.contains(['_', '-', ' ']));
        }

        #[test]
        fn prop_decoration_does_not_change_resolution(pad in "[ _\\-]{0,3}", upper in any::<bool>()) {
            let base = if upper { "TCID" } else { "tcid" };
            let header = format!("{pad}{base}{pad}");
            let map = HeaderMap::resolve(&[header.as_str(), "input"]);
            prop_assert_eq!(map.column(Field::Id), Some(0));
        }
    }
}
