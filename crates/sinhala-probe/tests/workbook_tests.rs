//! Loading cases from real workbooks written to a temp directory.

use rust_xlsxwriter::Workbook;
use sinhala_probe::{load_cases, Classification, ProbeError};
use std::path::{Path, PathBuf};

/// Write `rows` to the first sheet, starting at `first_row` (0-based)
fn write_sheet(dir: &Path, first_row: u32, rows: &[&[&str]]) -> PathBuf {
    let path = dir.join("testcases.xlsx");
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            if !cell.is_empty() {
                sheet
                    .write_string(first_row + r as u32, c as u16, *cell)
                    .unwrap();
            }
        }
    }
    workbook.save(&path).unwrap();
    path
}

#[test]
fn test_loads_cases_with_messy_headers() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sheet(
        dir.path(),
        0,
        &[
            &["TC ID", "Test_Case_Name", " Input ", "Expected-Output", "Category"],
            &["Pos_Fun_0001", "Simple sentence", "mama gedara yanawaa", "මම ගෙදර යනවා", "Positive"],
            &["", "", "", "", ""],
            &["Neg_Fun_0001", "Empty input", "", "", "Negative"],
            &["Pos_UI_0001", "Clear button", "mama", "මම", "Positive"],
            &["TC-17", "", "kohomada", "", ""],
        ],
    );

    let cases = load_cases(&path).unwrap();
    let ids: Vec<&str> = cases.iter().map(|c| c.id()).collect();
    assert_eq!(ids, vec!["Pos_Fun_0001", "Neg_Fun_0001", "TC-17"]);

    let rows: Vec<u32> = cases.iter().map(|c| c.row_number()).collect();
    assert_eq!(rows, vec![2, 4, 6]);

    assert_eq!(cases[0].input(), "mama gedara yanawaa");
    assert_eq!(cases[0].expected_output(), "මම ගෙදර යනවා");
    assert_eq!(cases[0].classification(), Classification::Positive);
    assert!(cases[1].is_negative());
    assert!(cases[1].has_empty_input());
    assert_eq!(cases[2].name(), "Untitled case");
    assert_eq!(cases[2].classification(), Classification::Unknown);
    assert_eq!(cases[2].title(), "TC-17 - Untitled case (Row 6)");
}

#[test]
fn test_numeric_cells_render_without_fraction() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("numbers.xlsx");
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "id").unwrap();
    sheet.write_string(0, 1, "input").unwrap();
    sheet.write_number(1, 0, 17.0).unwrap();
    sheet.write_number(1, 1, 2.5).unwrap();
    workbook.save(&path).unwrap();

    let cases = load_cases(&path).unwrap();
    assert_eq!(cases[0].id(), "17");
    assert_eq!(cases[0].input(), "2.5");
}

#[test]
fn test_header_below_blank_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sheet(
        dir.path(),
        2,
        &[&["tcid", "input", "type"], &["P1", "mama", "pos"]],
    );
    let cases = load_cases(&path).unwrap();
    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0].row_number(), 4);
}

#[test]
fn test_loading_twice_is_identical() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sheet(
        dir.path(),
        0,
        &[
            &["TC ID", "Input"],
            &["Pos_Fun_0001", "mama"],
            &["Neg_Fun_0001", "@@@"],
        ],
    );
    assert_eq!(load_cases(&path).unwrap(), load_cases(&path).unwrap());
}

#[test]
fn test_missing_workbook() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_cases(dir.path().join("nope.xlsx")).unwrap_err();
    assert!(matches!(err, ProbeError::CaseSourceNotFound { .. }));
}

#[test]
fn test_header_without_data_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sheet(dir.path(), 0, &[&["Priority", "Owner"], &["high", "nimal"]]);
    let err = load_cases(&path).unwrap_err();
    assert!(matches!(err, ProbeError::CaseSource { .. }));
}

#[test]
fn test_not_a_workbook() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cases.xlsx");
    std::fs::write(&path, "not a zip").unwrap();
    assert!(matches!(
        load_cases(&path).unwrap_err(),
        ProbeError::CaseSource { .. }
    ));
}
